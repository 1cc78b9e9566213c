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

// Genetic algorithm with elitism, tournament selection and crossover.
//
// See:
// -  Chapter 4: Search in Complex Environments, section 4.1.4 Evolutionary algorithms

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

pub type Int = i32;
pub type Float = f64;
pub type Rng = rand_pcg::Pcg64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvolverError {
    #[error("cannot select from an empty population")]
    EmptyPopulation,

    #[error("tournament size must be at least 1")]
    ZeroTournamentSize,

    #[error("next generation size must be at least 1")]
    ZeroTargetSize,
}

/// Anything that has been evaluated and carries a fitness score. Higher is better.
pub trait Scored {
    fn fitness(&self) -> Int;
}

/// Heritable material. Recombination always yields exactly two children and never changes the
/// shape of the genome.
pub trait Genome: Clone {
    fn crossover_and_mutate(&self, other: &Self, mutation_rate: Float, rng: &mut Rng)
        -> [Self; 2];
}

/// An evaluated member of a population that can pass its genome on.
pub trait Heritable {
    type Genome: Genome;

    fn genome(&self) -> &Self::Genome;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreedingParams {
    pub population_size: usize,
    pub elite_fraction: Float,
    pub tournament_size: usize,
    pub mutation_rate: Float,
}

impl BreedingParams {
    /// floor(population_size * elite_fraction), never more than the population.
    pub fn elite_count(&self) -> usize {
        let count = (self.population_size as Float * self.elite_fraction).floor();
        (count.max(0.0) as usize).min(self.population_size)
    }
}

/// Stable descending sort by fitness. Equal fitness keeps the original relative order; there is
/// no secondary criterion.
pub fn rank_by_fitness<P: Scored>(population: &mut [P]) {
    population.sort_by(|a, b| b.fitness().cmp(&a.fitness()));
}

/// Copies of the genomes of the first `count` members of a ranked population.
pub fn select_elite<P: Heritable>(ranked: &[P], count: usize) -> Vec<P::Genome> {
    ranked
        .iter()
        .take(count)
        .map(|member| member.genome().clone())
        .collect()
}

/// Draw `tournament_size` members uniformly at random, with replacement, and return the fittest.
/// On a tie the earliest draw wins. Does not depend on the order of `population`.
pub fn tournament_select<'a, P: Scored>(
    population: &'a [P],
    tournament_size: usize,
    rng: &mut Rng,
) -> Result<&'a P, EvolverError> {
    if tournament_size == 0 {
        return Err(EvolverError::ZeroTournamentSize);
    }
    let mut best: Option<&P> = None;
    for _ in 0..tournament_size {
        let candidate = population
            .choose(rng)
            .ok_or(EvolverError::EmptyPopulation)?;
        match best {
            Some(current) if current.fitness() >= candidate.fitness() => {}
            _ => best = Some(candidate),
        }
    }
    best.ok_or(EvolverError::EmptyPopulation)
}

/// Build the genomes of the next generation from a ranked population: elites first, then pairs of
/// crossover children from tournament-selected parents until exactly `population_size` genomes
/// exist. The second child of the last pair is dropped if it would overflow.
pub fn evolve_generation<P: Scored + Heritable>(
    ranked: &[P],
    params: &BreedingParams,
    rng: &mut Rng,
) -> Result<Vec<P::Genome>, EvolverError> {
    if params.population_size == 0 {
        return Err(EvolverError::ZeroTargetSize);
    }

    let mut next_generation = Vec::with_capacity(params.population_size);
    next_generation.extend(select_elite(ranked, params.elite_count()));
    let elite_count = next_generation.len();

    while next_generation.len() < params.population_size {
        let parent1 = tournament_select(ranked, params.tournament_size, rng)?;
        let parent2 = tournament_select(ranked, params.tournament_size, rng)?;
        let [child1, child2] =
            parent1
                .genome()
                .crossover_and_mutate(parent2.genome(), params.mutation_rate, rng);
        next_generation.push(child1);
        if next_generation.len() < params.population_size {
            next_generation.push(child2);
        }
    }

    log::debug!(
        "bred next generation: {} elites, {} offspring",
        elite_count,
        next_generation.len() - elite_count
    );
    Ok(next_generation)
}
