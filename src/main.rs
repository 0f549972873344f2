//! Command-line entry point: load an instance, run the genetic algorithm and
//! report the best assignment found.

use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use table_ga::config::Config;
use table_ga::error::Error;
use table_ga::fitness::SiteScore;
use table_ga::problem::Problem;
use table_ga::utils::save_solution;
use table_ga::{GeneticAlgorithm, Verbosity};

#[derive(Parser, Debug)]
#[command(name = "table_ga", version, about = "Assign tables to compatible sites with a genetic algorithm")]
struct Args {
    /// Problem instance (JSON with `name`, `compatibility` and optional `scores`)
    #[arg(short, long)]
    instance: PathBuf,

    /// Run parameters (JSON); command-line flags take precedence
    #[arg(short, long)]
    params: Option<PathBuf>,

    #[arg(long)]
    max_iterations: Option<u32>,

    #[arg(long)]
    population_size: Option<usize>,

    #[arg(long)]
    crossover_fraction: Option<f64>,

    #[arg(long)]
    mutation_probability: Option<f64>,

    #[arg(long)]
    child_insertion_fraction: Option<f64>,

    #[arg(long)]
    stagnation_fraction: Option<f64>,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// <0 silent, 0 final results, 1 per generation, 2+ per operator
    #[arg(short, long, default_value_t = 1, allow_hyphen_values = true)]
    verbosity: i32,

    /// Write the best assignment to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn config(&self) -> Result<Config, Error> {
        let mut config = match &self.params {
            Some(path) => Config::from_file(path)?,
            None => Config::new(),
        };

        if let Some(v) = self.max_iterations {
            config = config.with_max_iterations(v);
        }
        if let Some(v) = self.population_size {
            config = config.with_population_size(v);
        }
        if let Some(v) = self.crossover_fraction {
            config = config.with_crossover_fraction(v);
        }
        if let Some(v) = self.mutation_probability {
            config = config.with_mutation_probability(v);
        }
        if let Some(v) = self.child_insertion_fraction {
            config = config.with_child_insertion_fraction(v);
        }
        if let Some(v) = self.stagnation_fraction {
            config = config.with_stagnation_fraction(v);
        }
        if let Some(v) = self.seed {
            config = config.with_seed(v);
        }
        Ok(config)
    }
}

fn run(args: &Args, verbosity: Verbosity) -> Result<(), Error> {
    let problem = Problem::from_file(&args.instance)?;
    info!(
        "Loaded instance {} with {} tables and {} sites",
        problem.name,
        problem.num_tables(),
        problem.num_sites()
    );

    let config = args.config()?.resolve()?;
    let fitness = SiteScore::new(&problem);
    let mut algorithm = GeneticAlgorithm::new(problem, fitness, config);

    let best = algorithm.run(verbosity)?.clone();

    if let Some(path) = &args.output {
        let best_fitness = algorithm.best_fitness().unwrap_or(f64::NAN);
        save_solution(&best, best_fitness, algorithm.problem(), path)?;
        info!("Best assignment written to {}", path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let verbosity = Verbosity::from_level(args.verbosity);

    let default_filter = match verbosity {
        Verbosity::Silent => "error",
        Verbosity::Summary | Verbosity::Progress => "info",
        Verbosity::Detailed => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match run(&args, verbosity) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
