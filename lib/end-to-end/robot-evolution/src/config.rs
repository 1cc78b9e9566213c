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

use genetic_algorithm::BreedingParams;
use robot_maze_logic::{Grid, MazeError};
use serde::{Deserialize, Serialize};

use crate::robot::{COLLECTIBLE_REWARD, INITIAL_ENERGY};
use crate::{Float, Int};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Maze(#[from] MazeError),

    #[error("start region must be between 1 and {interior}: {start_region}")]
    StartRegionOutOfBounds { start_region: usize, interior: usize },

    #[error("population size must be at least 1")]
    EmptyPopulation,

    #[error("generations must be at least 1")]
    ZeroGenerations,

    #[error("tournament size must be between 1 and the population size {population_size}: {tournament_size}")]
    TournamentSizeOutOfRange {
        tournament_size: usize,
        population_size: usize,
    },

    #[error("elite fraction must be in [0, 1]: {0}")]
    EliteFractionOutOfRange(Float),

    #[error("mutation rate must be in [0, 1]: {0}")]
    MutationRateOutOfRange(Float),

    #[error("fitness for collecting all {collectibles} collectibles does not fit in an Int")]
    FitnessOverflow { collectibles: usize },

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything that shapes a run. Immutable once handed to an [`crate::Evolution`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub grid_size: usize,
    pub collectible_density: Float,
    pub start_region: usize,
    pub population_size: usize,
    pub generations: usize,
    pub elite_fraction: Float,
    pub tournament_size: usize,
    pub mutation_rate: Float,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            grid_size: 22,
            collectible_density: 0.4,
            start_region: 10,
            population_size: 200,
            generations: 100,
            elite_fraction: 0.5,
            tournament_size: 10,
            mutation_rate: 0.03,
        }
    }
}

impl EvolutionConfig {
    /// Parse a config from JSON. Missing fields take their default value. The result is validated.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: EvolutionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Fitness of a robot that collects every collectible in the maze. Turn counts never exceed
    /// this plus the initial energy, so both must fit in an `Int`.
    pub fn max_possible_fitness(&self) -> Result<Int, ConfigError> {
        let collectibles = Grid::collectible_target(self.grid_size, self.collectible_density)?;
        Int::try_from(collectibles)
            .ok()
            .and_then(|count| count.checked_mul(COLLECTIBLE_REWARD))
            .filter(|max| max.checked_add(INITIAL_ENERGY).is_some())
            .ok_or(ConfigError::FitnessOverflow { collectibles })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.max_possible_fitness()?;

        let interior = self.grid_size - 2;
        if self.start_region == 0 || self.start_region > interior {
            return Err(ConfigError::StartRegionOutOfBounds {
                start_region: self.start_region,
                interior,
            });
        }
        if self.population_size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.generations == 0 {
            return Err(ConfigError::ZeroGenerations);
        }
        if self.tournament_size == 0 || self.tournament_size > self.population_size {
            return Err(ConfigError::TournamentSizeOutOfRange {
                tournament_size: self.tournament_size,
                population_size: self.population_size,
            });
        }
        if !(0.0..=1.0).contains(&self.elite_fraction) {
            return Err(ConfigError::EliteFractionOutOfRange(self.elite_fraction));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(ConfigError::MutationRateOutOfRange(self.mutation_rate));
        }
        Ok(())
    }

    pub fn breeding_params(&self) -> BreedingParams {
        BreedingParams {
            population_size: self.population_size,
            elite_fraction: self.elite_fraction,
            tournament_size: self.tournament_size,
            mutation_rate: self.mutation_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EvolutionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_density_of_one_is_rejected() {
        let config = EvolutionConfig {
            collectible_density: 1.0,
            ..EvolutionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Maze(MazeError::DensityOutOfRange(_)))
        ));
    }

    #[test]
    fn test_tiny_grid_is_rejected() {
        let config = EvolutionConfig {
            grid_size: 2,
            ..EvolutionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Maze(MazeError::GridTooSmall(2)))
        ));
    }

    #[test]
    fn test_start_region_must_fit_interior() {
        let config = EvolutionConfig {
            grid_size: 8,
            ..EvolutionConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StartRegionOutOfBounds {
                start_region: 10,
                interior: 6
            })
        ));
        let config = EvolutionConfig {
            start_region: 0,
            ..EvolutionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_population_generation_and_tournament_bounds() {
        let empty = EvolutionConfig {
            population_size: 0,
            ..EvolutionConfig::default()
        };
        assert!(matches!(empty.validate(), Err(ConfigError::EmptyPopulation)));

        let no_generations = EvolutionConfig {
            generations: 0,
            ..EvolutionConfig::default()
        };
        assert!(matches!(
            no_generations.validate(),
            Err(ConfigError::ZeroGenerations)
        ));

        let big_tournament = EvolutionConfig {
            population_size: 4,
            tournament_size: 5,
            ..EvolutionConfig::default()
        };
        assert!(matches!(
            big_tournament.validate(),
            Err(ConfigError::TournamentSizeOutOfRange { .. })
        ));

        let zero_tournament = EvolutionConfig {
            tournament_size: 0,
            ..EvolutionConfig::default()
        };
        assert!(zero_tournament.validate().is_err());
    }

    #[test]
    fn test_rates_must_be_probabilities() {
        let elite = EvolutionConfig {
            elite_fraction: 1.5,
            ..EvolutionConfig::default()
        };
        assert!(matches!(
            elite.validate(),
            Err(ConfigError::EliteFractionOutOfRange(_))
        ));
        let mutation = EvolutionConfig {
            mutation_rate: -0.1,
            ..EvolutionConfig::default()
        };
        assert!(matches!(
            mutation.validate(),
            Err(ConfigError::MutationRateOutOfRange(_))
        ));
    }

    #[test]
    fn test_max_possible_fitness_must_fit() {
        assert_eq!(EvolutionConfig::default().max_possible_fitness().expect("max"), 800);
        let huge = EvolutionConfig {
            grid_size: 21_000,
            collectible_density: 0.99,
            ..EvolutionConfig::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(ConfigError::FitnessOverflow { .. })
        ));
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let config =
            EvolutionConfig::from_json(r#"{"population_size": 20, "generations": 5}"#)
                .expect("config");
        assert_eq!(config.population_size, 20);
        assert_eq!(config.generations, 5);
        assert_eq!(config.grid_size, 22);
        assert_eq!(config.tournament_size, 10);
    }

    #[test]
    fn test_from_json_validates() {
        assert!(matches!(
            EvolutionConfig::from_json(r#"{"generations": 0}"#),
            Err(ConfigError::ZeroGenerations)
        ));
        assert!(matches!(
            EvolutionConfig::from_json("not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_breeding_params_mirror_config() {
        let params = EvolutionConfig::default().breeding_params();
        assert_eq!(params.population_size, 200);
        assert_eq!(params.elite_count(), 100);
        assert_eq!(params.tournament_size, 10);
    }
}
