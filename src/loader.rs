//! Reading road graphs and stop lists from CSV files.
//!
//! Expected headers:
//!
//! - nodes: `id,lat,lon` where `id` is any unique external id (e.g. OSM)
//! - edges: `from,to,length[,oneway]`; `length` in metres, `oneway`
//!   defaults to true and `false` also adds the reverse edge
//! - stops: `lat,lon`; the first row is the depot

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::info;
use serde::{Deserialize, Deserializer};

use crate::error::{Result, RouteError};
use crate::graph::{GeoPoint, NodeId, RoadGraph, RoadGraphBuilder};

#[derive(Debug, Deserialize)]
struct NodeRecord {
    id: u64,
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    from: u64,
    to: u64,
    length: f64,
    #[serde(default = "default_oneway", deserialize_with = "flexible_bool")]
    oneway: bool,
}

fn default_oneway() -> bool {
    true
}

/// Accepts `true/false`, `True/False`, `1/0` and `yes/no`.
fn flexible_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(serde::de::Error::custom(format!("invalid oneway flag '{}'", other))),
    }
}

/// Load a road graph from a nodes file and an edges file.
pub fn load_graph<P: AsRef<Path>, Q: AsRef<Path>>(nodes_path: P, edges_path: Q) -> Result<RoadGraph> {
    let graph = read_graph(File::open(nodes_path.as_ref())?, File::open(edges_path.as_ref())?)?;
    info!(
        "Loaded road graph from {:?}: {} nodes, {} edges",
        nodes_path.as_ref(),
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Build a road graph from CSV readers.
pub fn read_graph<R: Read, S: Read>(nodes: R, edges: S) -> Result<RoadGraph> {
    let node_records: Vec<NodeRecord> = csv::Reader::from_reader(nodes)
        .deserialize()
        .collect::<std::result::Result<_, _>>()?;
    let edge_records: Vec<EdgeRecord> = csv::Reader::from_reader(edges)
        .deserialize()
        .collect::<std::result::Result<_, _>>()?;

    let two_way = edge_records.iter().filter(|e| !e.oneway).count();
    let mut builder = RoadGraphBuilder::with_capacity(node_records.len(), edge_records.len() + two_way);
    let mut by_external: HashMap<u64, NodeId> = HashMap::with_capacity(node_records.len());

    for record in node_records {
        if !record.lat.is_finite() || !record.lon.is_finite() {
            return Err(RouteError::Parse(format!("node {} has invalid coordinates", record.id)));
        }
        let id = builder.add_node_with_external_id(record.id, GeoPoint::new(record.lat, record.lon));
        if by_external.insert(record.id, id).is_some() {
            return Err(RouteError::Parse(format!("duplicate node id {}", record.id)));
        }
    }

    let lookup = |external: u64| {
        by_external
            .get(&external)
            .copied()
            .ok_or_else(|| RouteError::Parse(format!("edge references unknown node {}", external)))
    };

    let mut edges_read = Vec::with_capacity(edge_records.len());
    for record in edge_records {
        if !record.length.is_finite() || record.length < 0.0 {
            return Err(RouteError::Parse(format!(
                "edge {} -> {} has invalid length {}",
                record.from, record.to, record.length
            )));
        }
        edges_read.push((lookup(record.from)?, lookup(record.to)?, record.length, record.oneway));
    }

    for (from, to, length, oneway) in edges_read {
        if oneway {
            builder.add_directed_edge(from, to, length);
        } else {
            builder.add_road(from, to, length);
        }
    }

    Ok(builder.build())
}

/// Load stop coordinates; the first stop is the depot.
pub fn load_stops<P: AsRef<Path>>(path: P) -> Result<Vec<GeoPoint>> {
    read_stops(File::open(path)?)
}

pub fn read_stops<R: Read>(reader: R) -> Result<Vec<GeoPoint>> {
    let mut stops = Vec::new();
    for (row, record) in csv::Reader::from_reader(reader).deserialize().enumerate() {
        let point: GeoPoint = record?;
        if !point.is_finite() {
            return Err(RouteError::Parse(format!("stop {} has invalid coordinates", row)));
        }
        stops.push(point);
    }
    Ok(stops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphOracle;
    use std::io::Write;

    const NODES: &str = "id,lat,lon\n1001,-9.930,-76.242\n1002,-9.931,-76.242\n1003,-9.931,-76.241\n";

    #[test]
    fn test_read_graph_oneway_and_twoway() {
        let edges = "from,to,length,oneway\n1001,1002,120.5,False\n1002,1003,80,true\n";
        let graph = read_graph(NODES.as_bytes(), edges.as_bytes()).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 3);

        let (a, b, c) = (NodeId(0), NodeId(1), NodeId(2));
        assert_eq!(graph.external_id(c), Some(1003));
        assert_eq!(graph.distance(a, c), Some(200.5));
        assert_eq!(graph.distance(b, a), Some(120.5));
        assert_eq!(graph.distance(c, b), None);
    }

    #[test]
    fn test_oneway_column_is_optional() {
        let edges = "from,to,length\n1001,1002,10\n";
        let graph = read_graph(NODES.as_bytes(), edges.as_bytes()).unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_unknown_endpoint_rejected() {
        let edges = "from,to,length\n1001,9999,10\n";
        let result = read_graph(NODES.as_bytes(), edges.as_bytes());
        assert!(matches!(result, Err(RouteError::Parse(msg)) if msg.contains("9999")));
    }

    #[test]
    fn test_negative_length_rejected() {
        let edges = "from,to,length\n1001,1002,-3\n";
        assert!(matches!(
            read_graph(NODES.as_bytes(), edges.as_bytes()),
            Err(RouteError::Parse(_))
        ));
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let nodes = "id,lat,lon\n1,0,0\n1,0,1\n";
        assert!(matches!(
            read_graph(nodes.as_bytes(), "from,to,length\n".as_bytes()),
            Err(RouteError::Parse(_))
        ));
    }

    #[test]
    fn test_non_finite_stop_rejected() {
        let result = read_stops("lat,lon\nNaN,0\n0,1\n".as_bytes());
        assert!(matches!(result, Err(RouteError::Parse(msg)) if msg.contains("stop 0")));
        assert!(read_stops("lat,lon\n0,0\n1,inf\n".as_bytes()).is_err());
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let nodes_path = dir.path().join("nodes.csv");
        let edges_path = dir.path().join("edges.csv");
        let stops_path = dir.path().join("stops.csv");
        std::fs::File::create(&nodes_path).unwrap().write_all(NODES.as_bytes()).unwrap();
        std::fs::File::create(&edges_path)
            .unwrap()
            .write_all(b"from,to,length\n1001,1002,5\n")
            .unwrap();
        std::fs::File::create(&stops_path)
            .unwrap()
            .write_all(b"lat,lon\n-9.930,-76.242\n-9.931,-76.241\n")
            .unwrap();

        let graph = load_graph(&nodes_path, &edges_path).unwrap();
        assert_eq!(graph.node_count(), 3);

        let stops = load_stops(&stops_path).unwrap();
        assert_eq!(stops, vec![GeoPoint::new(-9.930, -76.242), GeoPoint::new(-9.931, -76.241)]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(load_stops("/nonexistent/stops.csv"), Err(RouteError::Io(_))));
    }
}
