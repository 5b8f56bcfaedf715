//! Asymmetric stop-to-stop distance matrix built from graph shortest paths.

use log::{debug, info};
use serde::Serialize;

use crate::error::{Result, RouteError};
use crate::graph::{GraphOracle, NodeId};

/// Cost recorded for a stop pair with no connecting path.
pub const UNREACHABLE_COST: f64 = 999_999.0;

/// Dense N×N matrix of directed travel costs between stops, row-major.
///
/// `get(i, j)` is the cost of driving from stop `i` to stop `j`; it need not
/// equal `get(j, i)`. Stop 0 is the depot.
#[derive(Debug, Clone, Serialize)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
    /// Ordered pairs `(i, j)` whose cost is the sentinel because no path exists.
    unreachable: Vec<(usize, usize)>,
}

impl DistanceMatrix {
    /// All-zero matrix of the given size.
    pub fn new(size: usize) -> Self {
        DistanceMatrix {
            data: vec![0.0; size * size],
            size,
            unreachable: Vec::new(),
        }
    }

    /// Matrix from explicit rows. Fails unless the rows form a square table
    /// of finite, non-negative costs. Only entries equal to
    /// [`UNREACHABLE_COST`] are recorded as unreachable.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let size = rows.len();
        let mut matrix = DistanceMatrix::new(size);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != size {
                return Err(RouteError::InvalidInput(format!(
                    "distance matrix is not square: row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    size
                )));
            }
            for (j, cost) in row.into_iter().enumerate() {
                if !cost.is_finite() || cost < 0.0 {
                    return Err(RouteError::InvalidInput(format!(
                        "invalid cost {} at ({}, {})",
                        cost, i, j
                    )));
                }
                matrix.set(i, j, cost);
                if cost == UNREACHABLE_COST {
                    matrix.unreachable.push((i, j));
                }
            }
        }
        Ok(matrix)
    }

    #[inline]
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    #[inline]
    fn set(&mut self, from: usize, to: usize, cost: f64) {
        self.data[from * self.size + to] = cost;
    }

    /// Number of stops, depot included.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_unreachable(&self, from: usize, to: usize) -> bool {
        self.unreachable.contains(&(from, to))
    }

    pub fn unreachable_pairs(&self) -> &[(usize, usize)] {
        &self.unreachable
    }

    /// Row `from` as a slice.
    pub fn row(&self, from: usize) -> &[f64] {
        &self.data[from * self.size..(from + 1) * self.size]
    }

    /// Cyclic cost of visiting the customers in `permutation`, leaving from
    /// and returning to the depot.
    pub fn tour_cost(&self, permutation: &[usize]) -> f64 {
        let (first, last) = match (permutation.first(), permutation.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return 0.0,
        };
        let inner: f64 = permutation
            .windows(2)
            .map(|w| self.get(w[0], w[1]))
            .sum();
        self.get(0, first) + inner + self.get(last, 0)
    }

    /// Legs of the cyclic tour over `permutation` that have no real path.
    pub fn unreachable_legs(&self, permutation: &[usize]) -> Vec<(usize, usize)> {
        let mut stops = Vec::with_capacity(permutation.len() + 2);
        stops.push(0);
        stops.extend_from_slice(permutation);
        stops.push(0);
        stops
            .windows(2)
            .map(|w| (w[0], w[1]))
            .filter(|&(from, to)| self.is_unreachable(from, to))
            .collect()
    }
}

/// Build the stop-to-stop matrix for `nodes` (index 0 is the depot).
///
/// One single-source shortest-path tree is computed per origin stop.
/// Pairs without a path get [`UNREACHABLE_COST`] instead of failing.
pub fn build_distance_matrix<G>(graph: &G, nodes: &[NodeId]) -> Result<DistanceMatrix>
where
    G: GraphOracle + ?Sized,
{
    if let Some(&missing) = nodes.iter().find(|&&n| !graph.contains(n)) {
        return Err(RouteError::UnknownNode(missing));
    }

    let rows = compute_rows(graph, nodes);

    let size = nodes.len();
    let mut matrix = DistanceMatrix::new(size);
    for (i, row) in rows.into_iter().enumerate() {
        for (j, cost) in row.into_iter().enumerate() {
            if i == j {
                continue;
            }
            match cost {
                Some(cost) => matrix.set(i, j, cost),
                None => {
                    debug!("no path from stop {} (node {}) to stop {} (node {})", i, nodes[i], j, nodes[j]);
                    matrix.set(i, j, UNREACHABLE_COST);
                    matrix.unreachable.push((i, j));
                }
            }
        }
    }

    info!(
        "Built {}x{} distance matrix ({} unreachable pairs)",
        size,
        size,
        matrix.unreachable.len()
    );
    Ok(matrix)
}

#[cfg(not(feature = "parallel"))]
fn compute_rows<G>(graph: &G, nodes: &[NodeId]) -> Vec<Vec<Option<f64>>>
where
    G: GraphOracle + ?Sized,
{
    nodes
        .iter()
        .map(|&origin| graph.distances_from(origin, nodes))
        .collect()
}

#[cfg(feature = "parallel")]
fn compute_rows<G>(graph: &G, nodes: &[NodeId]) -> Vec<Vec<Option<f64>>>
where
    G: GraphOracle + ?Sized,
{
    use rayon::prelude::*;

    nodes
        .par_iter()
        .map(|&origin| graph.distances_from(origin, nodes))
        .collect()
}
