/*
 * Copyright (C) 2023 Asim Ihsan
 * SPDX-License-Identifier: AGPL-3.0-only
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU Affero General Public License as published by the Free
 * Software Foundation, version 3.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A
 * PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License along
 * with this program. If not, see <https://www.gnu.org/licenses/>
 */

use robot_evolution::{Evolution, EvolutionConfig, Step};

const DEFAULT_SEED: u64 = 42;

// Evolve robots headless and print what a UI would show.
//
// Usage: robot-evolution-bin [config.json]
//
// RUST_LOG=info shows per-generation progress. ROBOT_EVOLUTION_SEED overrides the seed.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => EvolutionConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => EvolutionConfig::default(),
    };
    let seed = match std::env::var("ROBOT_EVOLUTION_SEED") {
        Ok(seed) => seed.parse::<u64>()?,
        Err(_) => DEFAULT_SEED,
    };
    log::info!("seed {}, config {:?}", seed, config);

    let mut evolution = Evolution::new(config, seed)?;
    evolution.start();
    while evolution.is_running() {
        if let Step::Advanced(snapshot) = evolution.step()? {
            println!("{}", serde_json::to_string(&snapshot)?);
        }
    }

    if let Some(first) = evolution.first_generation() {
        println!(
            "best of generation 1: fitness {}, turns alive {}",
            first.fitness, first.turns_alive
        );
        println!("{}", first.render());
    }
    match evolution.best() {
        Some(best) => {
            println!(
                "best ever: fitness {} in generation {}, turns alive {}",
                best.fitness,
                best.generation + 1,
                best.turns_alive
            );
            println!("{}", best.render());
        }
        None => println!("no robot collected anything"),
    }
    Ok(())
}
