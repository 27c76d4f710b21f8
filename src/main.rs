//! Training driver: evolves a population of snake agents and writes the
//! best-ever agent record at the end of the run.

use std::fs::File;
use std::io::BufReader;

use tracing::info;
use tracing_subscriber::EnvFilter;

use serpent::simulation::params::Params;
use serpent::simulation::persist::{self, SeedOptions};
use serpent::simulation::population::Population;
use serpent::simulation::rng;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let params = match std::env::args().nth(1) {
        Some(path) => {
            let file = File::open(&path)?;
            serde_json::from_reader(BufReader::new(file))?
        }
        None => Params::default(),
    };

    run(&params)
}

fn run(params: &Params) -> Result<(), Box<dyn std::error::Error>> {
    let mut master_rng = rng::create_rng(params.seed);

    let mut population = Population::new(params.population_size, params.games_per_generation);
    match &params.seed_manifest {
        Some(manifest) => {
            let agents =
                persist::load_seed_population(manifest, &SeedOptions::default(), &mut master_rng)?;
            info!(count = agents.len(), "population seeded from manifest");
            population.initialize_with(agents);
        }
        None => population.initialize(&mut master_rng),
    }

    info!(
        population = population.size(),
        games_per_generation = params.games_per_generation,
        generations = params.generations,
        seed = params.seed,
        "training started"
    );

    for _ in 0..params.generations {
        population.run_generation(&params.rules, params.mutation_rate, &mut master_rng);
    }

    if let Some(best) = population.best_agent() {
        persist::save_agent(best, &params.best_agent_path)?;
        info!(
            path = %params.best_agent_path.display(),
            name = %best.name,
            species = %best.species,
            score = population.best_score(),
            "best agent saved"
        );
    }

    Ok(())
}
