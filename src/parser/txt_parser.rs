//! Parser for graphs in a specific format.
//! The supported format is based of data from
//! https://snap.stanford.edu/data/ .
//!
//! Comment lines start with `#`, one of them gives the size as
//! `# Nodes: N Edges: M`. Every line after it holds one edge `u v`.

use std::io::BufRead;

use crate::{get_line, graph::DenseGraph, parse_single_line, Error};

use super::{Input, ParseResult};

fn parse_size_comment(input: Input<'_>) -> ParseResult<'_, usize> {
    use nom::{
        bytes::complete::tag,
        character::complete::{char, space0, u64},
        combinator::map,
        sequence::{preceded, terminated, tuple},
    };

    let size_parser = preceded(tag(" Nodes: "), u64);
    let edges_parser = tuple((tag(" Edges: "), u64, space0));
    let comment_parser = preceded(char('#'), terminated(size_parser, edges_parser));

    map(comment_parser, |size| size as usize)(input)
}

fn parse_meaningless_comment(input: Input<'_>) -> ParseResult<'_, ()> {
    use nom::{
        character::complete::{char, not_line_ending},
        combinator::value,
        sequence::tuple,
    };

    let comment_line_parser = tuple((char('#'), not_line_ending));
    value((), comment_line_parser)(input)
}

fn parse_edge(input: Input<'_>) -> ParseResult<'_, (usize, usize)> {
    use nom::{
        character::complete::{multispace1, space0, u64},
        combinator::map,
        sequence::{delimited, pair, terminated},
    };

    let edge_parser = pair(terminated(u64, multispace1), u64);
    map(delimited(space0, edge_parser, space0), |(start, end)| {
        (start as usize, end as usize)
    })(input)
}

pub fn parse_txt_input<B: BufRead>(input: B) -> Result<DenseGraph, Error> {
    use nom::combinator::eof;

    let mut lines = input.lines();

    let graph_size = loop {
        get_line!(line, lines);
        if let Ok((_, graph_size)) = parse_size_comment(&line) {
            break graph_size;
        }
        parse_single_line!(_comment, parse_meaningless_comment(&line));
    };

    let mut graph = DenseGraph::new(graph_size);

    for line in lines {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        parse_single_line!(start_end, parse_edge(&line));
        let (start, end) = start_end;

        graph.try_add_edge(start, end)?;
    }

    Ok(graph)
}

#[cfg(test)]
mod test {
    use std::io::BufReader;

    use crate::{
        graph::{EditableGraph, GraphError},
        Error,
    };

    use super::*;

    #[test]
    fn test_parse_size_comment() -> Result<(), Error> {
        let comment = "# Nodes: 18772 Edges: 396160";
        let (_, parsed) = parse_size_comment(comment)?;
        assert_eq!(18772, parsed);

        Ok(())
    }

    #[test]
    fn test_parse_meaningless_comment() -> Result<(), Error> {
        let comment = "# Directed graph (each unordered pair of nodes is saved once):\n";
        Ok(parse_meaningless_comment(comment)?.1)
    }

    #[test]
    fn test_parse_edge() -> Result<(), Error> {
        assert_eq!((3, 14), parse_edge("3\t14")?.1);
        assert_eq!((0, 2), parse_edge(" 0  2 ")?.1);
        assert!(parse_edge("0 -2").is_err());
        Ok(())
    }

    #[test]
    fn test_parse_txt_input() -> Result<(), Error> {
        let txt = "# Directed graph (each unordered pair of nodes is saved once): CA-AstroPh.txt
# Collaboration network of Arxiv Astro Physics category (there is an edge if authors coauthored at least one paper)
# Nodes: 6 Edges: 4
# FromNodeId	ToNodeId
0	1
2	3

1	4
2	5
";
        let buf = BufReader::new(txt.as_bytes());
        let mut graph = DenseGraph::new(6);
        graph.add_edge(0, 1);
        graph.add_edge(2, 3);
        graph.add_edge(1, 4);
        graph.add_edge(2, 5);

        let parsed = parse_txt_input(buf)?;

        assert_eq!(graph, parsed);

        Ok(())
    }

    #[test]
    fn test_parse_txt_input_errors() {
        let too_small = "# Nodes: 2 Edges: 1\n0 2\n";
        assert!(matches!(
            parse_txt_input(too_small.as_bytes()),
            Err(Error::GraphError(GraphError::MissingVertex { vertex: 2, n: 2 }))
        ));

        let no_size = "# Just a comment\n0 1\n";
        assert!(matches!(
            parse_txt_input(no_size.as_bytes()),
            Err(Error::ParseError(_))
        ));

        let empty = "";
        assert!(matches!(
            parse_txt_input(empty.as_bytes()),
            Err(Error::IoError(_))
        ));
    }
}
