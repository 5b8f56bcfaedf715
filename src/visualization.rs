//! Visualization utilities for planned routes.
//!
//! Generates SVG drawings of the road route and the GA convergence curve,
//! and exports plain-text data for external plotting.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::graph::GeoPoint;
use crate::heuristics::genetic::GenerationStats;
use crate::planner::RoutePlan;

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Stop marker radius
    pub node_radius: f64,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            node_radius: 8.0,
        }
    }
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate SVG of the road route with depot and customer markers.
    pub fn generate_svg(&self, plan: &RoutePlan, stops: &[GeoPoint]) -> String {
        let mut svg = String::new();

        let points: Vec<GeoPoint> = plan.route.coordinates.iter().chain(stops).copied().collect();
        let (min_lon, max_lon, min_lat, max_lat) = bounds(&points);

        let scale_x = (self.width - 2.0 * self.margin) / (max_lon - min_lon).max(1e-9);
        let scale_y = (self.height - 2.0 * self.margin) / (max_lat - min_lat).max(1e-9);
        let scale = scale_x.min(scale_y);

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .depot {{ fill: #27ae60; stroke: #1e8449; stroke-width: 2; }}
    .customer {{ fill: #3498db; stroke: #2c3e50; stroke-width: 2; }}
    .route {{ stroke: #e74c3c; stroke-width: 4; stroke-opacity: 0.8; fill: none; }}
    .label {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">Total distance: {:.2} km | {} | {} generations</text>
"##,
            self.margin,
            plan.distance_km(),
            plan.solution.algorithm,
            plan.solution.generations
        ));

        let transform = |p: &GeoPoint| -> (f64, f64) {
            let x = self.margin + (p.lon - min_lon) * scale;
            let y = self.height - self.margin - (p.lat - min_lat) * scale;
            (x, y)
        };

        if plan.route.coordinates.len() > 1 {
            let polyline: Vec<String> = plan
                .route
                .coordinates
                .iter()
                .map(|p| {
                    let (x, y) = transform(p);
                    format!("{:.2},{:.2}", x, y)
                })
                .collect();
            svg.push_str(&format!(
                r#"<polyline points="{}" class="route"/>
"#,
                polyline.join(" ")
            ));
        }

        // Visit order of each stop, depot excluded.
        let mut visit_rank = vec![0usize; stops.len()];
        for (rank, &stop) in plan.solution.permutation.iter().enumerate() {
            if stop < visit_rank.len() {
                visit_rank[stop] = rank + 1;
            }
        }

        for (i, stop) in stops.iter().enumerate() {
            let (x, y) = transform(stop);
            let (class, label) = if i == 0 {
                ("depot", "Depot".to_string())
            } else {
                ("customer", format!("Customer {} (#{})", i, visit_rank[i]))
            };

            svg.push_str(&format!(
                r##"<circle cx="{:.2}" cy="{:.2}" r="{}" class="{}"/>
"##,
                x, y, self.node_radius, class
            ));
            svg.push_str(&format!(
                r##"<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"##,
                x,
                y - self.node_radius - 3.0,
                label
            ));
        }

        let legend_y = self.height - 30.0;
        svg.push_str(&format!(
            r##"
<rect x="{}" y="{}" width="15" height="15" class="depot"/>
<text x="{}" y="{}" class="label">Depot</text>
<rect x="{}" y="{}" width="15" height="15" class="customer"/>
<text x="{}" y="{}" class="label">Customer</text>
"##,
            self.margin,
            legend_y,
            self.margin + 20.0,
            legend_y + 12.0,
            self.margin + 80.0,
            legend_y,
            self.margin + 100.0,
            legend_y + 12.0
        ));

        svg.push_str("</svg>");

        svg
    }

    /// Generate SVG of best and mean fitness per generation.
    pub fn generate_convergence_svg(&self, history: &[GenerationStats]) -> String {
        let mut svg = String::new();

        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .best {{ stroke: #e74c3c; stroke-width: 2; fill: none; }}
    .mean {{ stroke: #3498db; stroke-width: 1; fill: none; stroke-dasharray: 4 2; }}
    .axis {{ stroke: #2c3e50; stroke-width: 1; }}
    .label {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height
        ));

        if history.len() > 1 {
            let max_gen = history.len() as f64 - 1.0;
            let lo = history.iter().map(|s| s.best).fold(f64::INFINITY, f64::min);
            let hi = history.iter().map(|s| s.mean).fold(f64::NEG_INFINITY, f64::max);
            let span = (hi - lo).max(1e-9);

            let plot_w = self.width - 2.0 * self.margin;
            let plot_h = self.height - 2.0 * self.margin;
            let point = |g: usize, v: f64| -> String {
                let x = self.margin + g as f64 / max_gen * plot_w;
                let y = self.height - self.margin - (v - lo) / span * plot_h;
                format!("{:.2},{:.2}", x, y)
            };

            let best: Vec<String> = history.iter().map(|s| point(s.generation, s.best)).collect();
            let mean: Vec<String> = history.iter().map(|s| point(s.generation, s.mean)).collect();

            svg.push_str(&format!(
                r#"<line x1="{m}" y1="{b}" x2="{r}" y2="{b}" class="axis"/>
<line x1="{m}" y1="{m}" x2="{m}" y2="{b}" class="axis"/>
<polyline points="{}" class="mean"/>
<polyline points="{}" class="best"/>
<text x="{m}" y="{t}" class="label">best {:.2} / start {:.2}</text>
"#,
                mean.join(" "),
                best.join(" "),
                lo,
                history[0].best,
                m = self.margin,
                b = self.height - self.margin,
                r = self.width - self.margin,
                t = self.margin - 10.0,
            ));
        }

        svg.push_str("</svg>");
        svg
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Export data for external plotting (e.g., matplotlib)
    pub fn export_plot_data(&self, plan: &RoutePlan) -> String {
        let mut data = String::new();

        data.push_str("# Delivery Route Data\n");
        data.push_str(&format!("# Distance: {:.2}\n", plan.solution.distance));
        data.push_str(&format!("# Algorithm: {}\n\n", plan.solution.algorithm));

        data.push_str("# Stop order: stop indices, depot first and last\n");
        let order: Vec<String> = plan.solution.stop_sequence().iter().map(|s| s.to_string()).collect();
        data.push_str(&order.join(","));
        data.push('\n');

        data.push_str("\n# Route: node, lat, lon\n");
        for (node, p) in plan.route.nodes.iter().zip(&plan.route.coordinates) {
            data.push_str(&format!("{},{},{}\n", node, p.lat, p.lon));
        }

        data
    }
}

/// `(min_lon, max_lon, min_lat, max_lat)` of `points`.
fn bounds(points: &[GeoPoint]) -> (f64, f64, f64, f64) {
    let mut min_lon = f64::INFINITY;
    let mut max_lon = f64::NEG_INFINITY;
    let mut min_lat = f64::INFINITY;
    let mut max_lat = f64::NEG_INFINITY;

    for p in points {
        min_lon = min_lon.min(p.lon);
        max_lon = max_lon.max(p.lon);
        min_lat = min_lat.min(p.lat);
        max_lat = max_lat.max(p.lat);
    }

    if points.is_empty() {
        return (0.0, 1.0, 0.0, 1.0);
    }
    (min_lon, max_lon, min_lat, max_lat)
}
