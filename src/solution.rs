//! Result of one optimization run.

use serde::{Deserialize, Serialize};

use crate::heuristics::operators::is_valid_permutation;
use crate::matrix::DistanceMatrix;

/// Best customer ordering found by an optimizer, with its tour cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Customer stops in visiting order (depot implicit at both ends)
    pub permutation: Vec<usize>,
    /// Total cyclic tour cost from the distance matrix
    pub distance: f64,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of generations evolved
    pub generations: usize,
}

impl Solution {
    pub fn new(matrix: &DistanceMatrix, permutation: Vec<usize>, algorithm: &str) -> Self {
        let distance = matrix.tour_cost(&permutation);
        Solution {
            permutation,
            distance,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            generations: 0,
        }
    }

    /// Check every customer is visited exactly once
    pub fn is_complete(&self, matrix: &DistanceMatrix) -> bool {
        is_valid_permutation(&self.permutation, matrix.size())
    }

    /// Full stop sequence, depot at both ends.
    pub fn stop_sequence(&self) -> Vec<usize> {
        let mut stops = Vec::with_capacity(self.permutation.len() + 2);
        stops.push(0);
        stops.extend_from_slice(&self.permutation);
        stops.push(0);
        stops
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Distance: {:.2}", self.distance)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        writeln!(f, "  Generations: {}", self.generations)?;
        writeln!(f, "  Order: {:?}", self.stop_sequence())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solution_from_permutation() {
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0.0, 1.0, 5.0],
            vec![4.0, 0.0, 2.0],
            vec![3.0, 6.0, 0.0],
        ])
        .unwrap();
        let sol = Solution::new(&matrix, vec![1, 2], "test");
        assert_eq!(sol.distance, 6.0);
        assert!(sol.is_complete(&matrix));
        assert_eq!(sol.stop_sequence(), vec![0, 1, 2, 0]);
        assert!(sol.to_string().contains("Distance: 6.00"));

        let partial = Solution::new(&matrix, vec![2], "test");
        assert!(!partial.is_complete(&matrix));
    }
}
