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

// Robots with a rule-table genome evolve to collect energy in random mazes.
//
// The maze lives in robot-maze-logic and the selection / breeding machinery in genetic-algorithm.
// This crate is the glue: the genome, the robot that walks the maze, the trial runner and the
// generation loop a host steps through.

pub mod config;
pub mod evolution;
pub mod genome;
pub mod robot;
pub mod trial;

pub use config::{ConfigError, EvolutionConfig};
pub use evolution::{ArchivedTrial, Evolution, EvolutionState, GenerationSnapshot, Step};
pub use genetic_algorithm::{Float, Int, Rng};
pub use genome::{Action, Genome, Rule, RULE_COUNT};
pub use robot::{Outcome, Robot, COLLECTIBLE_REWARD, INITIAL_ENERGY};
pub use trial::{run_trial, Trial, TrialOutcome};

#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Maze(#[from] robot_maze_logic::MazeError),

    #[error(transparent)]
    Evolver(#[from] genetic_algorithm::EvolverError),

    #[error("robot has not been placed on a grid")]
    RobotNotPlaced,

    #[error("robot must start inside the border walls, not at {0:?}")]
    OutsideInterior(robot_maze_logic::Position),
}
