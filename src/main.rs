//! Delivery Route Optimizer - Command Line Interface
//!
//! Plans a closed delivery tour over a road network loaded from CSV files.

use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use delivery_route_ga::benchmark::{Benchmark, BenchmarkConfig};
use delivery_route_ga::graph::{GeoPoint, RoadGraph};
use delivery_route_ga::heuristics::genetic::{GAConfig, ReproductionOperator};
use delivery_route_ga::loader::{load_graph, load_stops};
use delivery_route_ga::matrix::build_distance_matrix;
use delivery_route_ga::planner::RoutePlanner;
use delivery_route_ga::visualization::Visualizer;
use delivery_route_ga::Result;

use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "delivery-route-ga")]
#[command(version = "1.0")]
#[command(about = "Genetic-algorithm delivery route planning on directed road networks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Road graph and stop files shared by every subcommand.
#[derive(Args)]
struct InputArgs {
    /// Nodes CSV (id,lat,lon)
    #[arg(long)]
    nodes: PathBuf,

    /// Edges CSV (from,to,length[,oneway])
    #[arg(long)]
    edges: PathBuf,

    /// Stops CSV (lat,lon); the first row is the depot
    #[arg(long)]
    stops: PathBuf,
}

/// Genetic algorithm overrides; unset flags keep the config file value.
#[derive(Args)]
struct GaArgs {
    /// JSON file with GA settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of generations
    #[arg(short, long)]
    generations: Option<usize>,

    /// Population size
    #[arg(short, long)]
    population: Option<usize>,

    /// Elite individuals kept each generation
    #[arg(short, long)]
    elite: Option<usize>,

    /// Offspring operator
    #[arg(short, long, value_enum)]
    reproduction: Option<Reproduction>,

    /// Random seed
    #[arg(short, long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Plan the shortest tour through the stops
    Solve {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        ga: GaArgs,

        /// Write the full plan as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write an SVG drawing of the route
        #[arg(long)]
        svg: Option<PathBuf>,

        /// Write the stop order and route coordinates as plain text
        #[arg(long)]
        plot_data: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the stop-to-stop distance matrix
    Matrix {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Compare reproduction operators over seeded runs
    Benchmark {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        ga: GaArgs,

        /// Number of runs (seeds 0..runs) per operator
        #[arg(long, default_value = "10")]
        runs: usize,

        /// Output CSV file for per-run results
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Reproduction {
    /// Copy one elite parent and swap two stops
    SwapMutation,
    /// Order crossover of two elite parents, then a swap
    OrderCrossover,
}

impl From<Reproduction> for ReproductionOperator {
    fn from(value: Reproduction) -> Self {
        match value {
            Reproduction::SwapMutation => ReproductionOperator::SwapMutation,
            Reproduction::OrderCrossover => ReproductionOperator::OrderCrossover,
        }
    }
}

impl GaArgs {
    fn to_config(&self) -> Result<GAConfig> {
        let mut config = match &self.config {
            Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
            None => GAConfig::default(),
        };
        if let Some(generations) = self.generations {
            config.max_generations = generations;
        }
        if let Some(population) = self.population {
            config.population_size = population;
        }
        if let Some(elite) = self.elite {
            config.elite_count = elite;
        }
        if let Some(reproduction) = self.reproduction {
            config.reproduction = reproduction.into();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve { input, ga, output, svg, plot_data, verbose } => {
            solve(&input, &ga, output, svg, plot_data, verbose)
        }
        Commands::Matrix { input } => print_matrix(&input),
        Commands::Benchmark { input, ga, runs, output } => run_benchmark(&input, &ga, runs, output),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_inputs(input: &InputArgs) -> Result<(RoadGraph, Vec<GeoPoint>)> {
    println!("Loading road graph from {:?} and {:?}...", input.nodes, input.edges);
    let graph = load_graph(&input.nodes, &input.edges)?;
    let stops = load_stops(&input.stops)?;
    println!(
        "Graph: {} nodes, {} edges | Stops: {} (1 depot, {} customers)",
        graph.node_count(),
        graph.edge_count(),
        stops.len(),
        stops.len().saturating_sub(1)
    );
    Ok((graph, stops))
}

fn solve(
    input: &InputArgs,
    ga: &GaArgs,
    output: Option<PathBuf>,
    svg: Option<PathBuf>,
    plot_data: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let config = ga.to_config()?;
    let (graph, stops) = load_inputs(input)?;

    println!(
        "Evolving {} routes for {} generations ({:?})...",
        config.population_size, config.max_generations, config.reproduction
    );

    let progress = ProgressBar::new(config.max_generations as u64);
    progress.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} gen | {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let start = Instant::now();
    let planner = RoutePlanner::new(config);
    let plan = planner.plan_with_observer(&graph, &stops, |stats| {
        progress.set_position(stats.generation as u64);
        progress.set_message(format!("best {:.1} m", stats.best));
    });
    progress.finish_and_clear();
    let plan = plan?;
    let elapsed = start.elapsed();

    println!("\n========== Results ==========");
    println!("Algorithm: {}", plan.solution.algorithm);
    println!("Visit order: {:?}", plan.solution.stop_sequence());
    println!("Total distance: {:.2} km", plan.distance_km());
    println!("Route nodes: {}", plan.route.len());
    println!("Time: {:.4}s", elapsed.as_secs_f64());

    if verbose {
        println!("\nStop nodes: {:?}", plan.stop_nodes);
        if let (Some(first), Some(last)) = (plan.history.first(), plan.history.last()) {
            println!("Best distance: generation 0 {:.2} -> generation {} {:.2}", first.best, last.generation, last.best);
        }
        println!("Recomputed route length: {:.2} m", plan.route.distance);
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&plan)?;
        std::fs::write(&out_path, json)?;
        println!("\nPlan saved to {:?}", out_path);
    }

    if let Some(svg_path) = svg {
        let viz = Visualizer::new();
        viz.save_svg(&viz.generate_svg(&plan, &stops), &svg_path)?;
        println!("Route drawing saved to {:?}", svg_path);

        let convergence_path = svg_path.with_extension("convergence.svg");
        viz.save_svg(&viz.generate_convergence_svg(&plan.history), &convergence_path)?;
        println!("Convergence plot saved to {:?}", convergence_path);
    }

    if let Some(data_path) = plot_data {
        std::fs::write(&data_path, Visualizer::new().export_plot_data(&plan))?;
        println!("Plot data saved to {:?}", data_path);
    }

    Ok(())
}

fn print_matrix(input: &InputArgs) -> Result<()> {
    let (graph, stops) = load_inputs(input)?;
    let nodes = graph.nearest_nodes(&stops)?;
    let matrix = build_distance_matrix(&graph, &nodes)?;

    print!("{:>8}", "");
    for j in 0..matrix.size() {
        print!(" {:>12}", format!("stop {}", j));
    }
    println!();
    for i in 0..matrix.size() {
        print!("{:>8}", format!("stop {}", i));
        for &cost in matrix.row(i) {
            print!(" {:>12.1}", cost);
        }
        println!();
    }

    if !matrix.unreachable_pairs().is_empty() {
        println!("\nUnreachable pairs (from, to): {:?}", matrix.unreachable_pairs());
    }
    Ok(())
}

fn run_benchmark(input: &InputArgs, ga: &GaArgs, runs: usize, output: Option<PathBuf>) -> Result<()> {
    let base = ga.to_config()?;
    let (graph, stops) = load_inputs(input)?;
    let nodes = graph.nearest_nodes(&stops)?;
    let matrix = build_distance_matrix(&graph, &nodes)?;

    let mut benchmark = Benchmark::new(BenchmarkConfig {
        num_runs: runs,
        ga: base,
        ..Default::default()
    });
    benchmark.run(&matrix)?;

    println!("\n{}", benchmark.generate_report());

    if let Some(out_path) = output {
        benchmark.export_to_csv(&out_path)?;
        println!("Results exported to {:?}", out_path);

        let stats_path = out_path.with_extension("stats.csv");
        benchmark.export_statistics_csv(&stats_path)?;
        println!("Statistics exported to {:?}", stats_path);
    }
    Ok(())
}
