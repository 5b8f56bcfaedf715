//! Error type shared by graph loading, matrix building and route reconstruction.

use thiserror::Error;

use crate::graph::NodeId;

/// Errors produced by the route optimizer.
///
/// Unreachable stop pairs are deliberately *not* an error while building the
/// distance matrix; they only become [`RouteError::NotFound`] when a path has
/// to be materialized.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no path from node {from} to node {to}")]
    NotFound { from: NodeId, to: NodeId },

    #[error("node {0} not found in graph")]
    UnknownNode(NodeId),

    #[error("graph has no nodes")]
    EmptyGraph,

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RouteError>;
