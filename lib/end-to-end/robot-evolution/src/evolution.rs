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

use genetic_algorithm::{evolve_generation, rank_by_fitness};
use rand::SeedableRng;
use robot_maze_logic::{cell_char, Grid, Position};
use serde::{Deserialize, Serialize};

use crate::config::EvolutionConfig;
use crate::genome::Genome;
use crate::robot::Robot;
use crate::trial::Trial;
use crate::{EvolutionError, Float, Int, Rng};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvolutionState {
    /// Fresh random population, nothing evaluated yet.
    Idle,
    Running,
    /// Suspended between generations.
    Paused,
    Completed,
}

/// Deep copy of a notable trial. Never refers back into the live population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedTrial {
    pub generation: usize,
    pub fitness: Int,
    pub turns_alive: Int,
    pub genome: Genome,
    pub path: Vec<Position>,
    pub grid: Grid,
}

impl ArchivedTrial {
    fn capture(trial: &Trial, generation: usize) -> Self {
        let robot = trial.robot();
        Self {
            generation,
            fitness: robot.fitness(),
            turns_alive: robot.turns_alive(),
            genome: *robot.genome(),
            path: robot.path().to_vec(),
            grid: trial.grid().clone(),
        }
    }

    /// The grid as text, with the visited cells marked 'o' and the final position 'R'.
    pub fn render(&self) -> String {
        let size = self.grid.size();
        let mut chars: Vec<char> = self.grid.cells().iter().map(|&c| cell_char(c)).collect();
        for position in &self.path {
            chars[position.row * size + position.col] = 'o';
        }
        if let Some(last) = self.path.last() {
            chars[last.row * size + last.col] = 'R';
        }
        chars
            .chunks(size)
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<String>>()
            .join("\n")
    }
}

/// What a host needs to display after each generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationSnapshot {
    /// Completed generations.
    pub generation: usize,
    pub total_generations: usize,
    /// Mean fitness of the latest completed generation.
    pub average_fitness: Float,
    pub best_fitness: Int,
    /// 0-based index of the generation that produced the best-ever trial.
    pub best_generation: Option<usize>,
    pub best_turns_alive: Int,
    pub max_possible_fitness: Int,
    pub running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// One full generation ran.
    Advanced(GenerationSnapshot),
    /// Nothing ran because the loop is not running.
    Waiting(EvolutionState),
}

/// The generation loop. A host drives it by calling [`Evolution::step`] once per generation, and
/// can pause, resume or reset in between. A generation in progress is never interrupted.
#[derive(Debug, Clone)]
pub struct Evolution {
    config: EvolutionConfig,
    rng: Rng,
    state: EvolutionState,
    generation: usize,
    population: Vec<Robot>,
    average_fitness_history: Vec<Float>,
    best: Option<ArchivedTrial>,
    first_generation: Option<ArchivedTrial>,
    max_possible_fitness: Int,
}

impl Evolution {
    pub fn new(config: EvolutionConfig, seed: u64) -> Result<Self, EvolutionError> {
        Evolution::with_rng(config, Rng::seed_from_u64(seed))
    }

    pub fn with_rng(config: EvolutionConfig, rng: Rng) -> Result<Self, EvolutionError> {
        config.validate()?;
        let max_possible_fitness = config.max_possible_fitness()?;
        let mut evolution = Self {
            config,
            rng,
            state: EvolutionState::Idle,
            generation: 0,
            population: Vec::new(),
            average_fitness_history: Vec::new(),
            best: None,
            first_generation: None,
            max_possible_fitness,
        };
        evolution.reset();
        Ok(evolution)
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn state(&self) -> EvolutionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == EvolutionState::Running
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population(&self) -> &[Robot] {
        &self.population
    }

    pub fn average_fitness_history(&self) -> &[Float] {
        &self.average_fitness_history
    }

    /// Best trial seen so far. `None` until some robot scores above zero.
    pub fn best(&self) -> Option<&ArchivedTrial> {
        self.best.as_ref()
    }

    /// Top-ranked trial of generation 0, for before/after comparison.
    pub fn first_generation(&self) -> Option<&ArchivedTrial> {
        self.first_generation.as_ref()
    }

    /// Begin running. From `Completed` this first resets to a new random population; from
    /// `Paused` it resumes.
    pub fn start(&mut self) {
        match self.state {
            EvolutionState::Completed => {
                self.reset();
                self.state = EvolutionState::Running;
            }
            EvolutionState::Idle | EvolutionState::Paused => self.state = EvolutionState::Running,
            EvolutionState::Running => {}
        }
        log::debug!("start: now {:?}", self.state);
    }

    pub fn toggle_pause(&mut self) {
        self.state = match self.state {
            EvolutionState::Running => EvolutionState::Paused,
            EvolutionState::Paused => EvolutionState::Running,
            other => other,
        };
        log::debug!("toggle pause: now {:?}", self.state);
    }

    /// Back to `Idle` with a new random population. History and archives are discarded.
    pub fn reset(&mut self) {
        self.population = (0..self.config.population_size)
            .map(|_| Robot::random(&mut self.rng))
            .collect();
        self.state = EvolutionState::Idle;
        self.generation = 0;
        self.average_fitness_history.clear();
        self.best = None;
        self.first_generation = None;
        log::debug!("reset: {} random robots", self.config.population_size);
    }

    /// Yield point. Runs exactly one generation if running, otherwise does nothing.
    pub fn step(&mut self) -> Result<Step, EvolutionError> {
        if self.state != EvolutionState::Running {
            return Ok(Step::Waiting(self.state));
        }
        self.run_generation()?;
        Ok(Step::Advanced(self.snapshot()))
    }

    /// Start and step until completed. Returns the final snapshot.
    pub fn run_to_completion(&mut self) -> Result<GenerationSnapshot, EvolutionError> {
        self.start();
        while self.state == EvolutionState::Running {
            self.step()?;
        }
        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> GenerationSnapshot {
        GenerationSnapshot {
            generation: self.generation,
            total_generations: self.config.generations,
            average_fitness: self.average_fitness_history.last().copied().unwrap_or(0.0),
            best_fitness: self.best.as_ref().map_or(0, |best| best.fitness),
            best_generation: self.best.as_ref().map(|best| best.generation),
            best_turns_alive: self.best.as_ref().map_or(0, |best| best.turns_alive),
            max_possible_fitness: self.max_possible_fitness,
            running: self.is_running(),
        }
    }

    fn run_generation(&mut self) -> Result<(), EvolutionError> {
        let mut trials = self.evaluate()?;

        let total: Int = trials.iter().map(|trial| trial.robot().fitness()).sum();
        let average = Float::from(total) / trials.len() as Float;
        self.average_fitness_history.push(average);

        rank_by_fitness(&mut trials);
        self.archive(&trials);

        log::info!(
            "generation {}/{}: average fitness {:.2}, best ever {}",
            self.generation + 1,
            self.config.generations,
            average,
            self.best.as_ref().map_or(0, |best| best.fitness)
        );

        self.generation += 1;
        if self.generation < self.config.generations {
            let genomes =
                evolve_generation(&trials, &self.config.breeding_params(), &mut self.rng)?;
            self.population = genomes.into_iter().map(Robot::new).collect();
        } else {
            self.population = trials.into_iter().map(Trial::into_robot).collect();
            self.state = EvolutionState::Completed;
            log::info!("completed {} generations", self.generation);
        }
        Ok(())
    }

    fn evaluate(&mut self) -> Result<Vec<Trial>, EvolutionError> {
        let population = std::mem::take(&mut self.population);
        let mut trials = Vec::with_capacity(population.len());
        for mut robot in population {
            let grid = Grid::new(
                self.config.grid_size,
                self.config.collectible_density,
                &mut self.rng,
            )?;
            robot.reset();
            let mut trial = Trial::new(robot, grid);
            trial.run(self.config.start_region, &mut self.rng)?;
            trials.push(trial);
        }
        Ok(trials)
    }

    fn archive(&mut self, ranked: &[Trial]) {
        let Some(top) = ranked.first() else {
            return;
        };
        if self.generation == 0 {
            self.first_generation = Some(ArchivedTrial::capture(top, self.generation));
        }
        let best_fitness = self.best.as_ref().map_or(0, |best| best.fitness);
        if top.robot().fitness() > best_fitness {
            log::info!(
                "new best fitness {} in generation {}",
                top.robot().fitness(),
                self.generation + 1
            );
            self.best = Some(ArchivedTrial::capture(top, self.generation));
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use robot_maze_logic::Cell;

    use super::*;
    use crate::config::ConfigError;

    fn small_config() -> EvolutionConfig {
        EvolutionConfig {
            population_size: 4,
            generations: 3,
            elite_fraction: 0.5,
            tournament_size: 2,
            mutation_rate: 0.0,
            ..EvolutionConfig::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = EvolutionConfig {
            tournament_size: 5,
            ..small_config()
        };
        assert!(matches!(
            Evolution::new(config, 1),
            Err(EvolutionError::Config(_))
        ));
    }

    #[test]
    fn test_new_is_idle() {
        let evolution = Evolution::new(small_config(), 1).expect("evolution");
        assert_eq!(evolution.state(), EvolutionState::Idle);
        assert_eq!(evolution.generation(), 0);
        assert_eq!(evolution.population().len(), 4);
        assert!(evolution.average_fitness_history().is_empty());
        assert!(evolution.best().is_none());
    }

    #[test]
    fn test_step_waits_unless_running() {
        let mut evolution = Evolution::new(small_config(), 1).expect("evolution");
        assert_eq!(
            evolution.step().expect("step"),
            Step::Waiting(EvolutionState::Idle)
        );
        assert_eq!(evolution.generation(), 0);
    }

    #[test]
    fn test_small_run_end_to_end() {
        let mut evolution = Evolution::new(small_config(), 42).expect("evolution");
        evolution.start();

        let mut previous_best = 0;
        let mut steps = 0;
        while evolution.is_running() {
            match evolution.step().expect("step") {
                Step::Advanced(snapshot) => {
                    steps += 1;
                    assert_eq!(snapshot.generation, steps);
                    assert_eq!(snapshot.total_generations, 3);
                    assert!(snapshot.best_fitness >= previous_best);
                    previous_best = snapshot.best_fitness;
                }
                Step::Waiting(state) => panic!("unexpected wait in {:?}", state),
            }
        }

        assert_eq!(steps, 3);
        assert_eq!(evolution.state(), EvolutionState::Completed);
        assert_eq!(evolution.average_fitness_history().len(), 3);
        assert_eq!(evolution.population().len(), 4);
        assert!(evolution.first_generation().is_some());
        assert!(!evolution.snapshot().running);
        assert_eq!(
            evolution.step().expect("step"),
            Step::Waiting(EvolutionState::Completed)
        );
    }

    #[test]
    fn test_average_fitness_is_population_mean() {
        let config = EvolutionConfig {
            generations: 1,
            ..small_config()
        };
        let mut evolution = Evolution::new(config, 8).expect("evolution");
        evolution.run_to_completion().expect("run");
        let total: Int = evolution.population().iter().map(|r| r.fitness()).sum();
        assert_relative_eq!(
            evolution.average_fitness_history()[0],
            Float::from(total) / 4.0
        );
    }

    #[test]
    fn test_best_is_a_deep_copy_of_the_top_trial() {
        let config = EvolutionConfig {
            population_size: 30,
            generations: 6,
            tournament_size: 5,
            ..EvolutionConfig::default()
        };
        let mut evolution = Evolution::new(config, 3).expect("evolution");
        evolution.start();

        let mut seen: Option<ArchivedTrial> = None;
        while evolution.is_running() {
            evolution.step().expect("step");
            if let Some(best) = evolution.best() {
                if let Some(previous) = &seen {
                    if previous.generation == best.generation {
                        // The live population was rebuilt, the archive was not.
                        assert_eq!(previous, best);
                    } else {
                        assert!(best.fitness > previous.fitness);
                    }
                }
                seen = Some(best.clone());
            }
        }

        let best = seen.expect("some robot collects something");
        let snapshot = evolution.snapshot();
        assert!(best.fitness > 0);
        assert_eq!(snapshot.best_fitness, best.fitness);
        assert_eq!(snapshot.best_generation, Some(best.generation));
        assert_eq!(snapshot.best_turns_alive, best.turns_alive);
        let last = *best.path.last().expect("path");
        assert_eq!(best.grid.get(last), Cell::Robot);
        assert_eq!(best.grid.count(Cell::Robot), 1);
    }

    #[test]
    fn test_elites_carry_over_unmodified() {
        let config = EvolutionConfig {
            population_size: 10,
            generations: 2,
            mutation_rate: 1.0,
            tournament_size: 3,
            ..EvolutionConfig::default()
        };
        let mut evolution = Evolution::new(config, 21).expect("evolution");
        evolution.start();

        let first = evolution.population().to_vec();
        evolution.step().expect("step");
        let top_genome = evolution
            .first_generation()
            .expect("first generation archived")
            .genome;
        assert!(first.iter().any(|robot| *robot.genome() == top_genome));
        assert_eq!(*evolution.population()[0].genome(), top_genome);
    }

    #[test]
    fn test_pause_and_resume_at_generation_boundaries() {
        let mut evolution = Evolution::new(small_config(), 5).expect("evolution");
        evolution.start();
        evolution.step().expect("step");
        evolution.toggle_pause();
        assert_eq!(evolution.state(), EvolutionState::Paused);
        assert!(!evolution.snapshot().running);

        assert_eq!(
            evolution.step().expect("step"),
            Step::Waiting(EvolutionState::Paused)
        );
        assert_eq!(evolution.generation(), 1);
        assert_eq!(evolution.average_fitness_history().len(), 1);

        evolution.toggle_pause();
        assert!(evolution.is_running());
        evolution.step().expect("step");
        assert_eq!(evolution.generation(), 2);
    }

    #[test]
    fn test_start_resumes_when_paused() {
        let mut evolution = Evolution::new(small_config(), 5).expect("evolution");
        evolution.start();
        evolution.step().expect("step");
        evolution.toggle_pause();
        evolution.start();
        assert!(evolution.is_running());
        assert_eq!(evolution.generation(), 1);
    }

    #[test]
    fn test_toggle_pause_ignored_when_idle() {
        let mut evolution = Evolution::new(small_config(), 5).expect("evolution");
        evolution.toggle_pause();
        assert_eq!(evolution.state(), EvolutionState::Idle);
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut evolution = Evolution::new(small_config(), 5).expect("evolution");
        evolution.start();
        evolution.step().expect("step");
        evolution.reset();
        assert_eq!(evolution.state(), EvolutionState::Idle);
        assert_eq!(evolution.generation(), 0);
        assert!(evolution.average_fitness_history().is_empty());
        assert!(evolution.best().is_none());
        assert!(evolution.first_generation().is_none());
        assert_eq!(evolution.population().len(), 4);
    }

    #[test]
    fn test_start_after_completion_begins_a_new_run() {
        let mut evolution = Evolution::new(small_config(), 5).expect("evolution");
        evolution.run_to_completion().expect("run");
        evolution.start();
        assert!(evolution.is_running());
        assert_eq!(evolution.generation(), 0);
        assert!(evolution.average_fitness_history().is_empty());
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = Evolution::new(small_config(), 77).expect("evolution");
        let mut b = Evolution::new(small_config(), 77).expect("evolution");
        assert_eq!(
            a.run_to_completion().expect("run"),
            b.run_to_completion().expect("run")
        );
        assert_eq!(a.average_fitness_history(), b.average_fitness_history());
    }

    #[test]
    fn test_max_possible_fitness() {
        let evolution = Evolution::new(small_config(), 1).expect("evolution");
        assert_eq!(evolution.snapshot().max_possible_fitness, 800);
    }

    #[test]
    fn test_new_rejects_unrepresentable_max_fitness() {
        let config = EvolutionConfig {
            grid_size: 21_000,
            collectible_density: 0.99,
            ..small_config()
        };
        assert!(matches!(
            Evolution::new(config, 1),
            Err(EvolutionError::Config(ConfigError::FitnessOverflow { .. }))
        ));
    }

    #[test]
    fn test_render_marks_path() {
        let mut grid = Grid::walled(4).expect("grid");
        grid.set(Position::new(2, 2), Cell::Robot);
        let archived = ArchivedTrial {
            generation: 0,
            fitness: 0,
            turns_alive: 2,
            genome: Genome::random(&mut Rng::seed_from_u64(1)),
            path: vec![Position::new(1, 1), Position::new(1, 2), Position::new(2, 2)],
            grid,
        };
        assert_eq!(archived.render(), "####\n#oo#\n#.R#\n####");
    }
}
