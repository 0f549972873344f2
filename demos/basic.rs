//! Basic example of using the table_ga library.

use std::env;
use table_ga::config::Config;
use table_ga::fitness::SiteScore;
use table_ga::problem::Problem;
use table_ga::utils::{format_duration, save_solution};
use table_ga::{GeneticAlgorithm, Verbosity};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Get instance path from command line or use default
    let args: Vec<String> = env::args().collect();
    let instance_path = if args.len() > 1 {
        &args[1]
    } else {
        "demos/instance.json"
    };

    // Load problem
    println!("Loading problem from: {}", instance_path);
    let problem = Problem::from_file(instance_path)?;
    println!(
        "Loaded problem: {} with {} tables and {} sites",
        problem.name,
        problem.num_tables(),
        problem.num_sites()
    );

    // Configure algorithm
    let config = Config::new()
        .with_max_iterations(500)
        .with_population_size(60)
        .with_crossover_fraction(0.5)
        .with_mutation_probability(0.2)
        .with_child_insertion_fraction(0.5)
        .with_stagnation_fraction(0.3)
        .with_seed(2024);

    let fitness = SiteScore::new(&problem);
    let mut algorithm = GeneticAlgorithm::from_config(problem.clone(), fitness, &config)?;

    println!("Starting search");
    let best = algorithm.run(Verbosity::Summary)?.clone();

    // Print results
    println!("Search completed in {}", format_duration(algorithm.run_time()));
    println!("Generations: {}", algorithm.generation());
    println!("Best assignment: {}", best);

    let fitness = algorithm
        .summary()
        .map_or(f64::NAN, |summary| summary.best_fitness);
    println!("Best fitness: {}", fitness);

    // Save solution
    let output_path = format!("{}.sol", problem.name);
    println!("Saving solution to: {}", output_path);
    save_solution(&best, fitness, &problem, &output_path)?;

    Ok(())
}
