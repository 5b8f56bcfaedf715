//! Benchmarking of reproduction operators over repeated seeded runs.
//!
//! Provides tools for running experiments, collecting statistics,
//! and comparing operator performance on one distance matrix.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::Result;
use crate::heuristics::genetic::{GAConfig, GeneticAlgorithm, ReproductionOperator};
use crate::matrix::DistanceMatrix;

/// Result of a single seeded run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Algorithm name
    pub algorithm: String,
    /// Seed used for the run
    pub seed: u64,
    /// Number of stops, depot included
    pub stops: usize,
    /// Best tour distance
    pub distance: f64,
    /// Computation time in seconds
    pub time: f64,
    /// Generations evolved
    pub generations: usize,
    /// Gap to the best distance seen across all runs, in percent
    pub gap_to_best: Option<f64>,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    /// Algorithm name
    pub algorithm: String,
    /// Number of runs
    pub num_runs: usize,
    /// Average distance
    pub avg_distance: f64,
    /// Best distance
    pub best_distance: f64,
    /// Worst distance
    pub worst_distance: f64,
    /// Standard deviation of distance
    pub std_distance: f64,
    /// Average time
    pub avg_time: f64,
    /// Number of runs that hit the best distance seen
    pub hits_best: usize,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of seeded runs per operator (seeds 0..num_runs)
    pub num_runs: usize,
    /// GA settings shared by every run; `reproduction` and `seed` are overridden
    pub ga: GAConfig,
    /// Operators to compare
    pub operators: Vec<ReproductionOperator>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 10,
            ga: GAConfig::default(),
            operators: vec![ReproductionOperator::SwapMutation, ReproductionOperator::OrderCrossover],
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Run every configured operator `num_runs` times on `matrix`.
    pub fn run(&mut self, matrix: &DistanceMatrix) -> Result<()> {
        info!(
            "Running benchmark: {} operator(s) x {} run(s) on {} stops",
            self.config.operators.len(),
            self.config.num_runs,
            matrix.size()
        );

        for &operator in &self.config.operators {
            for seed in 0..self.config.num_runs as u64 {
                let config = GAConfig {
                    reproduction: operator,
                    seed: Some(seed),
                    ..self.config.ga.clone()
                };
                let mut ga = GeneticAlgorithm::new(matrix, config)?;
                let solution = ga.run();

                self.results.push(RunResult {
                    algorithm: solution.algorithm,
                    seed,
                    stops: matrix.size(),
                    distance: solution.distance,
                    time: solution.computation_time,
                    generations: solution.generations,
                    gap_to_best: None,
                });
            }
        }

        self.update_gaps();
        Ok(())
    }

    fn best_distance(&self) -> Option<f64> {
        self.results
            .iter()
            .map(|r| r.distance)
            .fold(None, |best, d| Some(best.map_or(d, |b: f64| b.min(d))))
    }

    fn update_gaps(&mut self) {
        if let Some(best) = self.best_distance() {
            for result in &mut self.results {
                result.gap_to_best = if best > 0.0 {
                    Some((result.distance - best) / best * 100.0)
                } else {
                    Some(0.0)
                };
            }
        }
    }

    /// Compute per-algorithm statistics, best average first
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let best = self.best_distance().unwrap_or(f64::INFINITY);

        let mut by_algorithm: HashMap<&str, Vec<&RunResult>> = HashMap::new();
        for result in &self.results {
            by_algorithm.entry(result.algorithm.as_str()).or_default().push(result);
        }

        let mut statistics: Vec<AlgorithmStatistics> = by_algorithm
            .into_iter()
            .map(|(algorithm, runs)| {
                let distances: Vec<f64> = runs.iter().map(|r| r.distance).collect();
                let times: Vec<f64> = runs.iter().map(|r| r.time).collect();
                let std_distance = if distances.len() > 1 {
                    distances.iter().std_dev()
                } else {
                    0.0
                };

                AlgorithmStatistics {
                    algorithm: algorithm.to_string(),
                    num_runs: runs.len(),
                    avg_distance: distances.iter().mean(),
                    best_distance: distances.iter().cloned().fold(f64::INFINITY, f64::min),
                    worst_distance: distances.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
                    std_distance,
                    avg_time: times.iter().mean(),
                    hits_best: distances.iter().filter(|&&d| (d - best).abs() < 1e-9).count(),
                }
            })
            .collect();

        statistics.sort_by(|a, b| a.avg_distance.total_cmp(&b.avg_distance));

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("     Delivery Route Benchmark Report\n");
        report.push_str("========================================\n\n");

        report.push_str(&format!("{:<20} {:>6} {:>12} {:>12} {:>12} {:>10} {:>10}\n",
            "Algorithm", "Runs", "Avg Dist", "Best Dist", "Std Dev", "Hits Best", "Avg Time"));
        report.push_str("-".repeat(88).as_str());
        report.push('\n');

        for stat in self.compute_statistics() {
            report.push_str(&format!("{:<20} {:>6} {:>12.2} {:>12.2} {:>12.2} {:>10} {:>10.4}\n",
                stat.algorithm,
                stat.num_runs,
                stat.avg_distance,
                stat.best_distance,
                stat.std_distance,
                stat.hits_best,
                stat.avg_time));
        }

        report.push_str("-".repeat(88).as_str());
        report.push('\n');

        if let Some(best) = self.best_distance() {
            report.push_str(&format!("\nBest distance over all runs: {:.2}\n", best));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> DistanceMatrix {
        DistanceMatrix::from_rows(vec![
            vec![0.0, 3.0, 8.0, 5.0, 9.0],
            vec![4.0, 0.0, 2.0, 7.0, 6.0],
            vec![8.0, 3.0, 0.0, 1.0, 4.0],
            vec![6.0, 7.0, 2.0, 0.0, 2.0],
            vec![1.0, 5.0, 6.0, 3.0, 0.0],
        ])
        .unwrap()
    }

    fn small_config(num_runs: usize) -> BenchmarkConfig {
        BenchmarkConfig {
            num_runs,
            ga: GAConfig {
                population_size: 20,
                max_generations: 40,
                elite_count: 4,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 10);
        assert_eq!(config.operators.len(), 2);
    }

    #[test]
    fn test_benchmark_runs_every_operator_and_seed() {
        let mut benchmark = Benchmark::new(small_config(3));
        benchmark.run(&matrix()).unwrap();
        assert_eq!(benchmark.results().len(), 6);

        let stats = benchmark.compute_statistics();
        assert_eq!(stats.len(), 2);
        for stat in &stats {
            assert_eq!(stat.num_runs, 3);
            assert!(stat.best_distance <= stat.avg_distance);
            assert!(stat.avg_distance <= stat.worst_distance);
        }
        assert!(benchmark.results().iter().all(|r| r.gap_to_best.unwrap() >= 0.0));
        assert!(benchmark.generate_report().contains("GA-OrderCrossover"));
    }

    #[test]
    fn test_single_run_has_zero_std() {
        let mut benchmark = Benchmark::new(small_config(1));
        benchmark.run(&matrix()).unwrap();
        assert!(benchmark.compute_statistics().iter().all(|s| s.std_distance == 0.0));
    }

    #[test]
    fn test_export_to_csv() {
        let mut benchmark = Benchmark::new(small_config(2));
        benchmark.run(&matrix()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        benchmark.export_to_csv(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("algorithm,seed,stops,distance"));
        assert_eq!(content.lines().count(), 5);
    }
}
