//! Integration tests for the full genetic algorithm run.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use table_ga::chromosome::{site_of, table_of, Gene};
use table_ga::config::{Config, RunConfig};
use table_ga::fitness::SiteScore;
use table_ga::problem::Problem;
use table_ga::{GeneticAlgorithm, RunState, TerminationReason, Verbosity};

/// Creates a moderate problem: 24 tables, 8 sites, scores favouring one site
/// per table and a sparse compatibility pattern.
fn create_moderate_problem() -> Problem {
    let tables = 24;
    let sites = 8;
    let compatibility = (1..=tables)
        .map(|t| (1..=sites).map(|s| (t * 7 + s * 3) % 5 != 0).collect())
        .collect();
    let scores = (1..=tables)
        .map(|t| {
            (1..=sites)
                .map(|s| if s == t % sites + 1 { 10.0 } else { (s % 3) as f64 })
                .collect()
        })
        .collect();
    Problem::new("ModerateTestProblem".to_string(), compatibility, Some(scores)).unwrap()
}

fn flat(_: &[Gene]) -> f64 {
    1.0
}

fn site_sum(genes: &[Gene]) -> f64 {
    genes.iter().map(|&g| site_of(g) as f64).sum()
}

#[test]
fn test_state_transitions() {
    let problem = create_moderate_problem();
    let fitness = SiteScore::new(&problem);
    let config = RunConfig::new(5, 20, 0.5, 0.2, 0.5, 1.0).unwrap();
    let mut algorithm = GeneticAlgorithm::new(problem, fitness, config);
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    assert_eq!(algorithm.state(), RunState::NotStarted);
    assert!(algorithm.population().is_none());
    assert!(algorithm.select_parents(&mut rng).is_none());
    assert!(algorithm.evolve(&[], &mut rng).is_none());

    algorithm.initialize(&mut rng).unwrap();
    assert_eq!(algorithm.state(), RunState::Initialized);
    assert_eq!(algorithm.population().unwrap().len(), 20);
    assert!(algorithm.best_fitness().unwrap() > 0.0);
    assert!(algorithm.sum_fitness().unwrap() > 0.0);
    assert!(algorithm.best_slot().unwrap() < 20);

    let report = algorithm.step(&mut rng, Verbosity::Silent).unwrap().unwrap();
    assert_eq!(report.generation, 1);
    assert!(matches!(
        algorithm.state(),
        RunState::Running | RunState::Terminated(_)
    ));

    while !algorithm.is_terminated() {
        algorithm.step(&mut rng, Verbosity::Silent).unwrap();
    }
    assert!(algorithm.generation() <= 5);
}

#[test]
fn test_operators_through_driver() {
    let problem = create_moderate_problem();
    let fitness = SiteScore::new(&problem);
    let config = RunConfig::new(10, 16, 0.75, 0.5, 1.0, 1.0).unwrap();
    let mut algorithm = GeneticAlgorithm::new(problem.clone(), fitness, config);
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    algorithm.initialize(&mut rng).unwrap();

    let parents = algorithm.select_parents(&mut rng).unwrap();
    assert_eq!(parents.len(), 12);

    let children = algorithm.crossover(&parents, &mut rng);
    assert_eq!(children.len(), 6);

    let (children, mutated) = algorithm.mutate(children, &mut rng);
    assert_eq!(children.len(), 6);
    assert!(mutated <= 6);

    for child in &children {
        assert!(child.is_valid(&problem));
        child.fitness(algorithm.fitness_function());
    }

    let best_before = algorithm.best_fitness().unwrap();
    let improved = algorithm.evolve(&children, &mut rng).unwrap();
    if improved {
        assert!(algorithm.best_fitness().unwrap() > best_before);
    } else {
        assert_eq!(algorithm.best_fitness().unwrap(), best_before);
    }
    for member in algorithm.population().unwrap().members() {
        assert!(member.is_valid(&problem));
    }
}

#[test]
fn test_full_run_produces_valid_best() {
    let problem = create_moderate_problem();
    let fitness = SiteScore::new(&problem);
    let config = Config::new()
        .with_max_iterations(200)
        .with_population_size(40)
        .with_crossover_fraction(0.5)
        .with_mutation_probability(0.3)
        .with_child_insertion_fraction(0.5)
        .with_stagnation_fraction(0.25)
        .with_seed(17);
    let mut algorithm = GeneticAlgorithm::from_config(problem.clone(), fitness, &config).unwrap();

    let best = algorithm.run(Verbosity::Silent).unwrap().clone();
    assert!(best.is_valid(&problem));

    let summary = algorithm.summary().unwrap().clone();
    assert!(summary.generations >= 1);
    assert!(summary.generations <= 200);
    assert!(summary.best_fitness >= summary.initial_best_fitness);
    assert_eq!(best.cached_fitness(), Some(summary.best_fitness));
    assert_eq!(Some(summary.initial_best_fitness), algorithm.initial_best_fitness());

    // Final population is ranked best first
    let population = algorithm.population().unwrap();
    let values: Vec<f64> = population
        .members()
        .iter()
        .map(|m| m.cached_fitness().unwrap())
        .collect();
    assert!(values.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(values[0], summary.best_fitness);
    assert_eq!(*values.last().unwrap(), summary.worst_fitness);

    let mean_10 = values[..10].iter().sum::<f64>() / 10.0;
    let mean_20 = values[..20].iter().sum::<f64>() / 20.0;
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    assert!((summary.mean_top_10 - mean_10).abs() < 1e-9);
    assert!((summary.mean_top_20 - mean_20).abs() < 1e-9);
    assert!((summary.mean_fitness - mean).abs() < 1e-9);
    assert!(summary.mean_top_10 >= summary.mean_top_20);
    assert!(summary.mean_top_20 >= summary.mean_fitness);

    for member in population.members() {
        assert!(member.is_valid(&problem));
    }
}

#[test]
fn test_best_fitness_is_monotonic() {
    let problem = create_moderate_problem();
    let config = RunConfig::new(150, 30, 0.6, 0.4, 0.5, 1.0).unwrap();
    let mut algorithm = GeneticAlgorithm::new(problem, site_sum, config);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    algorithm.initialize(&mut rng).unwrap();

    let mut best = algorithm.best_fitness().unwrap();
    let mut stagnation = 0;
    while !algorithm.is_terminated() {
        let report = algorithm.step(&mut rng, Verbosity::Silent).unwrap().unwrap();
        assert!(report.best_fitness >= best);
        assert_eq!(report.new_best, report.best_fitness > best);

        stagnation = if report.new_best { 0 } else { stagnation + 1 };
        assert_eq!(report.stagnation_counter, stagnation);
        best = report.best_fitness;
    }
}

#[test]
fn test_stagnation_stops_the_run() {
    let problem = create_moderate_problem();
    // limit = ceil(100 * 0.1) = 10
    let config = RunConfig::new(100, 10, 0.6, 0.5, 0.5, 0.1).unwrap();
    let mut algorithm = GeneticAlgorithm::new(problem, flat, config);
    let mut rng = ChaCha8Rng::seed_from_u64(4);

    algorithm.run_with_rng(&mut rng, Verbosity::Silent).unwrap();

    assert_eq!(
        algorithm.state(),
        RunState::Terminated(TerminationReason::Stagnated)
    );
    assert_eq!(algorithm.generation(), 10);
    assert_eq!(algorithm.stagnation_counter(), 10);
    assert_eq!(
        algorithm.summary().unwrap().termination,
        TerminationReason::Stagnated
    );
}

#[test]
fn test_iteration_limit_stops_the_run() {
    let problem = create_moderate_problem();
    let config = RunConfig::new(8, 20, 0.6, 0.5, 0.5, 1.0).unwrap();
    let mut algorithm = GeneticAlgorithm::new(problem, site_sum, config);
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    algorithm.run_with_rng(&mut rng, Verbosity::Silent).unwrap();

    assert_eq!(algorithm.generation(), 8);
    assert!(algorithm.is_terminated());
}

#[test]
fn test_zero_iterations_only_initializes() {
    let problem = create_moderate_problem();
    let config = RunConfig::new(0, 10, 0.6, 0.5, 0.5, 0.5).unwrap();
    let mut algorithm = GeneticAlgorithm::new(problem, site_sum, config);
    let mut rng = ChaCha8Rng::seed_from_u64(6);

    let best = algorithm.run_with_rng(&mut rng, Verbosity::Silent).unwrap().clone();

    assert_eq!(algorithm.generation(), 0);
    assert_eq!(
        algorithm.state(),
        RunState::Terminated(TerminationReason::IterationLimitReached)
    );
    assert_eq!(Some(&best), algorithm.initial_best());
}

#[test]
fn test_step_after_termination_is_a_no_op() {
    let problem = create_moderate_problem();
    let config = RunConfig::new(2, 10, 0.6, 0.5, 0.5, 1.0).unwrap();
    let mut algorithm = GeneticAlgorithm::new(problem, flat, config);
    let mut rng = ChaCha8Rng::seed_from_u64(9);

    while !algorithm.is_terminated() {
        assert!(algorithm.step(&mut rng, Verbosity::Silent).unwrap().is_some());
    }
    let state = algorithm.state();
    let generation = algorithm.generation();
    let sum = algorithm.sum_fitness();
    assert_eq!(generation, 2);

    for _ in 0..3 {
        assert!(algorithm.step(&mut rng, Verbosity::Silent).unwrap().is_none());
    }
    assert_eq!(algorithm.state(), state);
    assert_eq!(algorithm.generation(), generation);
    assert_eq!(algorithm.sum_fitness(), sum);
}

#[test]
fn test_manual_step_honours_zero_iterations() {
    let problem = create_moderate_problem();
    let config = RunConfig::new(0, 10, 0.6, 0.5, 0.5, 0.5).unwrap();
    let mut algorithm = GeneticAlgorithm::new(problem, site_sum, config);
    let mut rng = ChaCha8Rng::seed_from_u64(10);

    let report = algorithm.step(&mut rng, Verbosity::Silent).unwrap();

    assert!(report.is_none());
    assert_eq!(algorithm.generation(), 0);
    assert!(algorithm.population().is_some());
    assert_eq!(
        algorithm.state(),
        RunState::Terminated(TerminationReason::IterationLimitReached)
    );

    let mut algorithm = GeneticAlgorithm::new(
        create_moderate_problem(),
        site_sum,
        RunConfig::new(0, 10, 0.6, 0.5, 0.5, 0.5).unwrap(),
    );
    algorithm.initialize(&mut rng).unwrap();
    assert!(algorithm.is_terminated());
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let problem = create_moderate_problem();
    let config = RunConfig::new(60, 24, 0.5, 0.3, 0.5, 0.5)
        .unwrap()
        .with_seed(1234);

    let mut first = GeneticAlgorithm::new(problem.clone(), SiteScore::new(&problem), config.clone());
    let mut second = GeneticAlgorithm::new(problem.clone(), SiteScore::new(&problem), config);

    let a = first.run(Verbosity::Silent).unwrap().clone();
    let b = second.run(Verbosity::Silent).unwrap().clone();

    assert_eq!(a, b);
    assert_eq!(first.generation(), second.generation());
    assert_eq!(first.sum_fitness(), second.sum_fitness());
}

#[test]
fn test_two_member_population() {
    let problem = create_moderate_problem();
    let mut algorithm =
        GeneticAlgorithm::with_parameters(problem.clone(), site_sum, 30, 2, 1.0, 0.5, 1.0, 0.5)
            .unwrap();
    assert_eq!(algorithm.config().crossover_count(), 2);
    assert_eq!(algorithm.config().child_insertion_count(), 1);

    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let best = algorithm.run_with_rng(&mut rng, Verbosity::Silent).unwrap().clone();

    assert!(best.is_valid(&problem));
    let summary = algorithm.summary().unwrap();
    assert_eq!(summary.mean_top_10, summary.mean_fitness);
    assert_eq!(summary.mean_top_20, summary.mean_fitness);
}

#[test]
fn test_invalid_parameters_are_rejected() {
    let problem = create_moderate_problem();
    let result = GeneticAlgorithm::with_parameters(problem, site_sum, 10, 10, 0.05, 0.5, 0.5, 0.5);
    assert!(result.is_err());
}

#[test]
fn test_decoded_best_respects_compatibility() {
    let problem = create_moderate_problem();
    let config = RunConfig::new(40, 20, 0.5, 0.3, 0.5, 0.5).unwrap();
    let mut algorithm = GeneticAlgorithm::new(problem.clone(), SiteScore::new(&problem), config);
    let mut rng = ChaCha8Rng::seed_from_u64(8);

    let best = algorithm.run_with_rng(&mut rng, Verbosity::Silent).unwrap();

    for table in 1..=problem.num_tables() {
        let site = best.site_of_table(table);
        assert!(problem.is_compatible(table, site));
    }
    let tables: Vec<usize> = best.assignment().iter().map(|&g| table_of(g)).collect();
    assert_eq!(tables.len(), problem.num_tables());
}
