//! Binomial coefficients and the colexicographic ranking
//! of k-subsets which the generation uses to index orbits
//! of neighbourhoods. All arithmetic refuses to wrap.
use std::convert::TryFrom;

/// Largest `n` for which `n choose k` (and its intermediate
/// products) fits into a `u64`, indexed by `k <= LARGEST_K`.
const MAX_N_FOR_K: [u64; 32] = [
    0,
    u64::MAX,
    4294967296,
    3329022,
    102570,
    13467,
    3612,
    1449,
    746,
    453,
    308,
    227,
    178,
    147,
    125,
    110,
    99,
    90,
    84,
    79,
    75,
    72,
    69,
    68,
    66,
    65,
    64,
    63,
    63,
    62,
    62,
    62,
];

const LARGEST_K: u64 = 31;

/// `n choose k` as a `u64`. Panics if it would overflow.
pub fn coeff_u64(n: u64, mut k: u64) -> u64 {
    if k > n {
        return 0;
    }
    if k > n / 2 {
        k = n - k;
    }
    if k == 0 {
        return 1;
    }
    if k > LARGEST_K || n > MAX_N_FOR_K[k as usize] {
        panic!("{} choose {} overflows u64", n, k);
    }

    let mut result: u64 = 1;
    for i in 1..=k {
        result = result
            .checked_mul(n - k + i)
            .unwrap_or_else(|| panic!("{} choose {} overflows u64", n, k))
            / i;
    }
    result
}

/// `n choose k`. Panics if the value does not fit into a `usize`.
pub fn coeff(n: usize, k: usize) -> usize {
    let value = coeff_u64(n as u64, k as u64);
    usize::try_from(value)
        .unwrap_or_else(|_| panic!("{} choose {} does not fit into usize", n, k))
}

/// Colex rank of a strictly increasing sequence, i.e. the sum of
/// `c_i choose (i + 1)`. Panics on overflow.
pub fn rank(combination: &[usize]) -> usize {
    combination
        .iter()
        .enumerate()
        .fold(0usize, |rank, (i, &element)| {
            rank.checked_add(coeff(element, i + 1))
                .unwrap_or_else(|| panic!("rank of {:?} overflows usize", combination))
        })
}

/// Inverse of [`rank`]: the `k`-subset with the given colex rank.
pub fn unrank(rank: usize, k: usize) -> Vec<usize> {
    let mut combination = vec![0; k];
    let mut remaining = rank;
    for i in (0..k).rev() {
        // Walk l upwards while (l choose i+1) still fits below the remainder.
        let mut l = i + 1;
        let mut binomial = 1usize;
        while binomial <= remaining {
            binomial = binomial
                .checked_mul(l + 1)
                .unwrap_or_else(|| panic!("unrank of {} overflows usize", rank))
                / (l - i);
            l += 1;
        }
        combination[i] = l - 1;
        binomial = binomial
            .checked_mul(l - 1 - i)
            .unwrap_or_else(|| panic!("unrank of {} overflows usize", rank))
            / l;
        remaining -= binomial;
    }
    combination
}

/// All `k`-subsets of `{0, ..., n-1}` in colexicographic order,
/// so the `i`th item has [`rank`] `i`.
#[derive(Debug, Clone)]
pub struct CombinationsColex {
    n: usize,
    k: usize,
    current: Vec<usize>,
    started: bool,
    finished: bool,
}

impl CombinationsColex {
    pub fn new(n: usize, k: usize) -> Self {
        CombinationsColex {
            n,
            k,
            current: (0..k).collect(),
            started: false,
            finished: k > n,
        }
    }

    /// Advance and borrow the next subset without allocating.
    pub fn advance(&mut self) -> Option<&[usize]> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(&self.current);
        }

        let k = self.k;
        let step = (0..k).find(|&i| {
            let bound = if i + 1 < k { self.current[i + 1] } else { self.n };
            self.current[i] + 1 < bound
        });

        match step {
            Some(i) => {
                self.current[i] += 1;
                for (j, element) in self.current[..i].iter_mut().enumerate() {
                    *element = j;
                }
                Some(&self.current)
            }
            None => {
                self.finished = true;
                None
            }
        }
    }
}

impl Iterator for CombinationsColex {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        self.advance().map(|combination| combination.to_vec())
    }
}
