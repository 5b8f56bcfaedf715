//! Permutation operators used by the genetic algorithm.
//!
//! All operators work on customer permutations: the depot is implicit and
//! never appears in the slice.

use rand::seq::SliceRandom;
use rand::Rng;

/// Uniformly random ordering of the customers `1..num_stops`.
pub fn random_permutation<R: Rng + ?Sized>(num_stops: usize, rng: &mut R) -> Vec<usize> {
    let mut perm: Vec<usize> = (1..num_stops).collect();
    perm.shuffle(rng);
    perm
}

/// Swap two distinct random positions. No-op below two elements.
pub fn swap_mutation<R: Rng + ?Sized>(perm: &mut [usize], rng: &mut R) {
    let n = perm.len();
    if n < 2 {
        return;
    }
    let i = rng.gen_range(0..n);
    // Draw from the n-1 other positions so i != j.
    let mut j = rng.gen_range(0..n - 1);
    if j >= i {
        j += 1;
    }
    perm.swap(i, j);
}

/// Order Crossover (OX).
///
/// Copies a random slice of `parent1` into the child at the same positions,
/// then fills the remaining positions left to right with the missing values
/// in the order they appear in `parent2`.
pub fn order_crossover<R: Rng + ?Sized>(parent1: &[usize], parent2: &[usize], rng: &mut R) -> Vec<usize> {
    let n = parent1.len();
    if n < 2 || parent2.len() != n {
        return parent1.to_vec();
    }

    let start = rng.gen_range(0..n);
    let end = rng.gen_range(start..n);

    let max_value = parent1.iter().copied().max().unwrap_or(0);
    let mut in_slice = vec![false; max_value + 1];
    for &v in &parent1[start..=end] {
        in_slice[v] = true;
    }

    let mut fill = parent2
        .iter()
        .copied()
        .filter(|&v| v > max_value || !in_slice[v]);

    let mut child = Vec::with_capacity(n);
    for i in 0..n {
        if (start..=end).contains(&i) {
            child.push(parent1[i]);
        } else if let Some(v) = fill.next() {
            child.push(v);
        }
    }

    // Parents were not permutations of the same set.
    if child.len() != n {
        return parent1.to_vec();
    }
    child
}

/// `true` if `perm` contains every customer `1..num_stops` exactly once.
pub fn is_valid_permutation(perm: &[usize], num_stops: usize) -> bool {
    if perm.len() + 1 != num_stops {
        return false;
    }
    let mut seen = vec![false; num_stops];
    for &v in perm {
        if v == 0 || v >= num_stops || seen[v] {
            return false;
        }
        seen[v] = true;
    }
    true
}
