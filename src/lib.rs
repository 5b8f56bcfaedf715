//! Delivery Route Optimizer Library
//!
//! Plans a closed delivery tour from a depot through a set of customer stops
//! on a directed road network, where streets may be one-way.
//!
//! # Features
//!
//! - Road graph with Dijkstra shortest paths and nearest-node snapping
//! - Asymmetric stop-to-stop distance matrix (sentinel cost for unreachable pairs)
//! - Genetic algorithm with elitism, swap mutation and order crossover
//! - Route reconstruction into a continuous coordinate sequence
//! - SVG visualization and operator benchmarking
//!
//! # Example
//!
//! ```
//! use delivery_route_ga::graph::{GeoPoint, RoadGraphBuilder};
//! use delivery_route_ga::{build_distance_matrix, optimize, reconstruct_route};
//!
//! let mut b = RoadGraphBuilder::new();
//! let depot = b.add_node(GeoPoint::new(0.0, 0.0));
//! let shop = b.add_node(GeoPoint::new(0.0, 0.001));
//! let home = b.add_node(GeoPoint::new(0.001, 0.001));
//! b.add_road(depot, shop, 110.0);
//! b.add_road(shop, home, 110.0);
//! b.add_directed_edge(home, depot, 150.0);
//! let graph = b.build();
//!
//! let stops = [depot, shop, home];
//! let matrix = build_distance_matrix(&graph, &stops).unwrap();
//! let (order, distance) = optimize(&matrix, 50, 20, 4, Some(42)).unwrap();
//! let route = reconstruct_route(&graph, &stops, &order).unwrap();
//!
//! assert_eq!(order, vec![1, 2]);
//! assert!((route.distance - distance).abs() < 1e-9);
//! ```

pub mod error;
pub mod graph;
pub mod matrix;
pub mod heuristics;
pub mod route;
pub mod solution;
pub mod planner;
pub mod loader;
pub mod benchmark;
pub mod visualization;

pub use error::{Result, RouteError};
pub use graph::{GeoPoint, GraphOracle, NodeId, RoadGraph, RoadGraphBuilder};
pub use heuristics::genetic::{optimize, GAConfig, GeneticAlgorithm, ReproductionOperator};
pub use matrix::{build_distance_matrix, DistanceMatrix, UNREACHABLE_COST};
pub use planner::{RoutePlan, RoutePlanner};
pub use route::{reconstruct_route, Route};
pub use solution::Solution;
