//! End-to-end planning: stops → nodes → matrix → GA → road route.

use log::{info, warn};
use serde::Serialize;

use crate::error::{Result, RouteError};
use crate::graph::{GeoPoint, GraphOracle, NodeId, RoadGraph};
use crate::heuristics::genetic::{GAConfig, GenerationStats, GeneticAlgorithm};
use crate::matrix::{build_distance_matrix, DistanceMatrix};
use crate::route::{reconstruct_route, Route};
use crate::solution::Solution;

/// Everything produced for one planning request.
#[derive(Debug, Clone, Serialize)]
pub struct RoutePlan {
    /// Graph node each stop was resolved to (index 0 = depot).
    pub stop_nodes: Vec<NodeId>,
    pub matrix: DistanceMatrix,
    pub solution: Solution,
    /// Best/mean/worst fitness per generation.
    pub history: Vec<GenerationStats>,
    pub route: Route,
}

impl RoutePlan {
    /// Tour length in kilometres, assuming metre edge lengths.
    pub fn distance_km(&self) -> f64 {
        self.solution.distance / 1000.0
    }
}

/// Runs the whole pipeline with one GA configuration.
///
/// Holds no state between requests; a single planner can serve any number
/// of graphs and stop lists.
#[derive(Debug, Clone, Default)]
pub struct RoutePlanner {
    config: GAConfig,
}

impl RoutePlanner {
    pub fn new(config: GAConfig) -> Self {
        RoutePlanner { config }
    }

    pub fn config(&self) -> &GAConfig {
        &self.config
    }

    /// Snap `stops` to their nearest nodes and plan a tour through them.
    pub fn plan(&self, graph: &RoadGraph, stops: &[GeoPoint]) -> Result<RoutePlan> {
        self.plan_with_observer(graph, stops, |_| {})
    }

    pub fn plan_with_observer<F>(&self, graph: &RoadGraph, stops: &[GeoPoint], observer: F) -> Result<RoutePlan>
    where
        F: FnMut(&GenerationStats),
    {
        let nodes = graph.nearest_nodes(stops)?;
        for (i, (stop, node)) in stops.iter().zip(&nodes).enumerate() {
            log::debug!("stop {} at ({:.6}, {:.6}) -> node {}", i, stop.lat, stop.lon, node);
        }
        self.plan_nodes_with_observer(graph, &nodes, observer)
    }

    /// Plan a tour through already-resolved stop nodes.
    pub fn plan_nodes<G>(&self, graph: &G, nodes: &[NodeId]) -> Result<RoutePlan>
    where
        G: GraphOracle + ?Sized,
    {
        self.plan_nodes_with_observer(graph, nodes, |_| {})
    }

    pub fn plan_nodes_with_observer<G, F>(&self, graph: &G, nodes: &[NodeId], observer: F) -> Result<RoutePlan>
    where
        G: GraphOracle + ?Sized,
        F: FnMut(&GenerationStats),
    {
        if nodes.len() < 2 {
            return Err(RouteError::InvalidInput(format!(
                "need a depot and at least one customer, got {} stop(s)",
                nodes.len()
            )));
        }

        let matrix = build_distance_matrix(graph, nodes)?;

        let mut ga = GeneticAlgorithm::new(&matrix, self.config.clone())?;
        let solution = ga.run_with_observer(observer);
        let history = ga.history().to_vec();

        let unreachable = matrix.unreachable_legs(&solution.permutation);
        if !unreachable.is_empty() {
            warn!(
                "best tour still uses {} leg(s) with no road path {:?}; some stops are disconnected",
                unreachable.len(),
                unreachable
            );
        }

        let route = reconstruct_route(graph, nodes, &solution.permutation)?;
        info!(
            "Planned tour over {} stops: {:.1} m, {} route nodes",
            nodes.len(),
            route.distance,
            route.len()
        );

        Ok(RoutePlan {
            stop_nodes: nodes.to_vec(),
            matrix,
            solution,
            history,
            route,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_graphs::square_ring;
    use crate::graph::RoadGraphBuilder;

    fn planner() -> RoutePlanner {
        RoutePlanner::new(GAConfig {
            population_size: 20,
            max_generations: 60,
            elite_count: 4,
            seed: Some(42),
            ..Default::default()
        })
    }

    #[test]
    fn test_plan_square_ring_from_coordinates() {
        let (graph, [a, b, c, d]) = square_ring();
        let stops = [
            GeoPoint::new(0.01, -0.01),
            GeoPoint::new(0.02, 0.98),
            GeoPoint::new(0.97, 1.02),
            GeoPoint::new(1.01, 0.03),
        ];
        let plan = planner().plan(&graph, &stops).unwrap();
        assert_eq!(plan.stop_nodes, vec![a, b, c, d]);
        assert_eq!(plan.solution.permutation, vec![1, 2, 3]);
        assert_eq!(plan.route.nodes, vec![a, b, c, d, a]);
        assert!((plan.route.distance - plan.solution.distance).abs() < 1e-9);
        assert!((plan.distance_km() - 0.004).abs() < 1e-12);
    }

    #[test]
    fn test_plan_rejects_single_stop() {
        let (graph, _) = square_ring();
        let result = planner().plan(&graph, &[GeoPoint::new(0.0, 0.0)]);
        assert!(matches!(result, Err(RouteError::InvalidInput(_))));
    }

    #[test]
    fn test_disconnected_stop_fails_reconstruction() {
        let mut b = RoadGraphBuilder::new();
        let depot = b.add_node(GeoPoint::new(0.0, 0.0));
        let near = b.add_node(GeoPoint::new(0.0, 1.0));
        let island = b.add_node(GeoPoint::new(5.0, 5.0));
        b.add_road(depot, near, 10.0);
        let graph = b.build();

        let nodes = [depot, near, island];
        let matrix = build_distance_matrix(&graph, &nodes).unwrap();
        let mut ga = GeneticAlgorithm::new(&matrix, planner().config().clone()).unwrap();
        let solution = ga.run();
        // Every tour touches the island, so the plan must warn before failing.
        assert!(!matrix.unreachable_legs(&solution.permutation).is_empty());

        let result = planner().plan_nodes(&graph, &nodes);
        assert!(matches!(result, Err(RouteError::NotFound { .. })));
    }

    #[test]
    fn test_non_finite_stop_is_rejected() {
        let (graph, _) = square_ring();
        let stops = [GeoPoint::new(f64::NAN, 0.0), GeoPoint::new(0.0, 1.0)];
        let result = RoutePlanner::default().plan(&graph, &stops);
        assert!(matches!(result, Err(RouteError::InvalidInput(_))));
    }

    #[test]
    fn test_plan_sample_data() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
        let graph = crate::loader::load_graph(dir.join("nodes.csv"), dir.join("edges.csv")).unwrap();
        let stops = crate::loader::load_stops(dir.join("stops.csv")).unwrap();

        let plan = planner().plan(&graph, &stops).unwrap();
        assert_eq!(plan.solution.permutation.len(), stops.len() - 1);
        assert!(plan.matrix.unreachable_pairs().is_empty());
        let tolerance = 1e-6 * plan.solution.distance;
        assert!((plan.route.distance - plan.solution.distance).abs() <= tolerance);
        for pair in plan.route.nodes.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn test_plan_serializes_to_json() {
        let (graph, nodes) = square_ring();
        let plan = planner().plan_nodes(&graph, &nodes).unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["solution"]["permutation"], serde_json::json!([1, 2, 3]));
        assert_eq!(json["route"]["coordinates"].as_array().unwrap().len(), 5);
    }
}
