use std::fs;
use std::path::Path;

use concierge_db::{RestaurantSeedDataset, SeedResult};

use crate::commands::{
    load_sqlite_config, open_database, runtime, CommandResult, Failure, EXIT_INPUT,
};

pub fn run(path: &Path) -> CommandResult {
    let config = match load_sqlite_config("seed") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let dataset = match read_dataset(path) {
        Ok(dataset) => dataset,
        Err(failure) => return CommandResult::from_failure("seed", failure),
    };

    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_database(&config).await?;
        let loaded = dataset
            .load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), EXIT_INPUT));
        pool.close().await;
        loaded
    });

    match result {
        Ok(loaded) => CommandResult::success("seed", summarize(&loaded)),
        Err(failure) => CommandResult::from_failure("seed", failure),
    }
}

fn read_dataset(path: &Path) -> Result<RestaurantSeedDataset, Failure> {
    let raw = fs::read_to_string(path).map_err(|error| {
        ("invalid_input", format!("could not read `{}`: {error}", path.display()), EXIT_INPUT)
    })?;
    RestaurantSeedDataset::from_json(&raw)
        .map_err(|error| ("invalid_input", error.to_string(), EXIT_INPUT))
}

fn summarize(loaded: &SeedResult) -> String {
    if loaded.cuisines.is_empty() {
        return format!("loaded {} restaurants", loaded.restaurants_loaded);
    }

    let cuisines: Vec<&str> = loaded.cuisines.iter().map(String::as_str).collect();
    format!(
        "loaded {} restaurants across cuisines: {}",
        loaded.restaurants_loaded,
        cuisines.join(", ")
    )
}
