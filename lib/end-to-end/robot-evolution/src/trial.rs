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

use genetic_algorithm::{Heritable, Scored};
use robot_maze_logic::Grid;

use crate::genome::Genome;
use crate::robot::Robot;
use crate::{EvolutionError, Int, Rng};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialOutcome {
    pub fitness: Int,
    pub turns_alive: Int,
}

/// Place `robot` in `grid` and let it sense-act until its energy runs out.
///
/// Always terminates: every action costs one energy and only collectibles, which are finite and
/// never replenished, restore it.
pub fn run_trial(
    robot: &mut Robot,
    grid: &mut Grid,
    start_region: usize,
    rng: &mut Rng,
) -> Result<TrialOutcome, EvolutionError> {
    robot.place_randomly(grid, start_region, rng)?;
    robot.sense(grid)?;
    while robot.is_alive() {
        robot.step(grid, rng)?;
    }
    Ok(TrialOutcome {
        fitness: robot.fitness(),
        turns_alive: robot.turns_alive(),
    })
}

/// A robot paired with the maze it was evaluated on. Ranking a population of trials keeps each
/// grid next to its robot.
#[derive(Debug, Clone)]
pub struct Trial {
    robot: Robot,
    grid: Grid,
}

impl Trial {
    pub fn new(robot: Robot, grid: Grid) -> Self {
        Self { robot, grid }
    }

    pub fn run(
        &mut self,
        start_region: usize,
        rng: &mut Rng,
    ) -> Result<TrialOutcome, EvolutionError> {
        run_trial(&mut self.robot, &mut self.grid, start_region, rng)
    }

    pub fn robot(&self) -> &Robot {
        &self.robot
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn into_robot(self) -> Robot {
        self.robot
    }
}

impl Scored for Trial {
    fn fitness(&self) -> Int {
        self.robot.fitness()
    }
}

impl Heritable for Trial {
    type Genome = Genome;

    fn genome(&self) -> &Genome {
        self.robot.genome()
    }
}
