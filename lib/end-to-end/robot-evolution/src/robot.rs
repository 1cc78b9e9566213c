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

use rand::Rng as _;
use robot_maze_logic::{Cell, Direction, Grid, Percept, Position, Sensed};

use crate::genome::Genome;
use crate::{EvolutionError, Int, Rng};

pub const INITIAL_ENERGY: Int = 5;
pub const COLLECTIBLE_REWARD: Int = 5;

/// What happened when the robot tried to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Target was a wall. The robot stayed put but still paid for the turn.
    Blocked,
    Moved,
    Collected,
}

/// An individual: a genome plus the state of its current trial.
///
/// The genome survives between generations. Everything else is trial-scoped and cleared by
/// [`Robot::reset`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Robot {
    genome: Genome,
    position: Option<Position>,
    percept: Percept,
    energy: Int,
    fitness: Int,
    turns_alive: Int,
    path: Vec<Position>,
}

impl Robot {
    pub fn new(genome: Genome) -> Self {
        Self {
            genome,
            position: None,
            percept: [Sensed::Empty; 4],
            energy: INITIAL_ENERGY,
            fitness: 0,
            turns_alive: 0,
            path: Vec::new(),
        }
    }

    pub fn random(rng: &mut Rng) -> Self {
        Robot::new(Genome::random(rng))
    }

    /// Fresh robot carrying its own copy of this robot's genome.
    pub fn offspring(&self) -> Self {
        Robot::new(self.genome)
    }

    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn genome_mut(&mut self) -> &mut Genome {
        &mut self.genome
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn percept(&self) -> &Percept {
        &self.percept
    }

    pub fn energy(&self) -> Int {
        self.energy
    }

    pub fn fitness(&self) -> Int {
        self.fitness
    }

    pub fn turns_alive(&self) -> Int {
        self.turns_alive
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }

    pub fn is_alive(&self) -> bool {
        self.energy > 0
    }

    /// Place the robot uniformly at random in the top-left `start_region` x `start_region`
    /// square of the interior. A collectible under the start cell is overwritten without reward.
    pub fn place_randomly(
        &mut self,
        grid: &mut Grid,
        start_region: usize,
        rng: &mut Rng,
    ) -> Result<(), EvolutionError> {
        let region = start_region.clamp(1, grid.size() - 2);
        let position = Position::new(1 + rng.gen_range(0..region), 1 + rng.gen_range(0..region));
        self.place_at(grid, position)
    }

    /// Place the robot at an interior `position`. The grid must not already host this robot.
    pub fn place_at(
        &mut self,
        grid: &mut Grid,
        position: Position,
    ) -> Result<(), EvolutionError> {
        let interior = 1..grid.size() - 1;
        if !interior.contains(&position.row) || !interior.contains(&position.col) {
            return Err(EvolutionError::OutsideInterior(position));
        }
        grid.set(position, Cell::Robot);
        self.position = Some(position);
        self.path = vec![position];
        Ok(())
    }

    pub fn sense(&mut self, grid: &Grid) -> Result<(), EvolutionError> {
        let position = self.position.ok_or(EvolutionError::RobotNotPlaced)?;
        self.percept = grid.percept(position);
        Ok(())
    }

    /// Index of the rule that fires for the current percept. Always in `0..RULE_COUNT`.
    pub fn select_action(&self) -> usize {
        self.genome.select_rule(&self.percept)
    }

    pub fn choose_direction(&self, rng: &mut Rng) -> Direction {
        self.genome.rule(self.select_action()).action.resolve(rng)
    }

    /// Try to move one cell in `direction`. Costs one energy and one turn whatever happens.
    pub fn act(
        &mut self,
        grid: &mut Grid,
        direction: Direction,
    ) -> Result<Outcome, EvolutionError> {
        let from = self.position.ok_or(EvolutionError::RobotNotPlaced)?;
        self.energy -= 1;
        self.turns_alive += 1;

        let to = from.neighbor(direction);
        let outcome = match grid.get(to) {
            Cell::Wall => Outcome::Blocked,
            target => {
                let outcome = if target == Cell::Collectible {
                    self.energy += COLLECTIBLE_REWARD;
                    self.fitness += COLLECTIBLE_REWARD;
                    Outcome::Collected
                } else {
                    Outcome::Moved
                };
                grid.set(from, Cell::Empty);
                grid.set(to, Cell::Robot);
                self.position = Some(to);
                self.path.push(to);
                outcome
            }
        };

        self.sense(grid)?;
        Ok(outcome)
    }

    /// Sense-act once: pick the direction the genome asks for and move.
    pub fn step(&mut self, grid: &mut Grid, rng: &mut Rng) -> Result<Outcome, EvolutionError> {
        let direction = self.choose_direction(rng);
        self.act(grid, direction)
    }

    /// Clear trial state. The genome is untouched.
    pub fn reset(&mut self) {
        self.position = None;
        self.percept = [Sensed::Empty; 4];
        self.energy = INITIAL_ENERGY;
        self.fitness = 0;
        self.turns_alive = 0;
        self.path.clear();
    }
}
