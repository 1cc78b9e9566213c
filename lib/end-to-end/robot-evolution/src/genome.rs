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

use rand::distributions::{Distribution, Standard};
use rand::Rng as _;
use robot_maze_logic::{Direction, Percept};
use serde::{Deserialize, Serialize};

use crate::{Float, Rng};

/// Number of rules in every genome. The last rule doubles as the fallback.
pub const RULE_COUNT: usize = 16;

/// What a rule tells the robot to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    North,
    East,
    South,
    West,
    /// Pick one of the four directions uniformly at random each time the rule fires.
    Random,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::North,
        Action::East,
        Action::South,
        Action::West,
        Action::Random,
    ];

    pub fn resolve(self, rng: &mut Rng) -> Direction {
        match self {
            Action::North => Direction::North,
            Action::East => Direction::East,
            Action::South => Direction::South,
            Action::West => Direction::West,
            Action::Random => rng.gen(),
        }
    }
}

impl Distribution<Action> for Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Action {
        Action::ALL[rng.gen_range(0..Action::ALL.len())]
    }
}

/// One condition -> action entry of the rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub pattern: Percept,
    pub action: Action,
}

/// Fixed-length rule table. Copying a genome copies every rule, so a child never shares state
/// with its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Genome {
    rules: [Rule; RULE_COUNT],
}

impl Genome {
    pub fn new(rules: [Rule; RULE_COUNT]) -> Self {
        Self { rules }
    }

    /// Every pattern slot uniform over {Empty, Collectible, Wall}, every action uniform over the
    /// five actions.
    pub fn random(rng: &mut Rng) -> Self {
        let rules = std::array::from_fn(|_| Rule {
            pattern: rng.gen(),
            action: rng.gen(),
        });
        Self { rules }
    }

    /// A genome where every rule has the same action. Patterns are random.
    pub fn uniform_action(action: Action, rng: &mut Rng) -> Self {
        let mut genome = Genome::random(rng);
        for rule in genome.rules.iter_mut() {
            rule.action = action;
        }
        genome
    }

    pub fn rules(&self) -> &[Rule; RULE_COUNT] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> &Rule {
        &self.rules[index]
    }

    pub fn set_rule(&mut self, index: usize, rule: Rule) {
        self.rules[index] = rule;
    }

    /// Index of the first rule whose pattern equals `percept`, or the last rule if none does.
    pub fn select_rule(&self, percept: &Percept) -> usize {
        self.rules
            .iter()
            .position(|rule| rule.pattern == *percept)
            .unwrap_or(RULE_COUNT - 1)
    }
}

impl genetic_algorithm::Genome for Genome {
    /// Each rule slot flips its own fair coin to decide which parent feeds which child. Only
    /// pattern values mutate; actions are always inherited as-is. A mutation draw is shared by
    /// both children at that position, and each child then resamples its value independently.
    fn crossover_and_mutate(
        &self,
        other: &Self,
        mutation_rate: Float,
        rng: &mut Rng,
    ) -> [Self; 2] {
        let mut child1 = *self;
        let mut child2 = *other;
        for slot in 0..RULE_COUNT {
            let (from1, from2) = if rng.gen_bool(0.5) {
                (self, other)
            } else {
                (other, self)
            };
            child1.rules[slot] = from1.rules[slot];
            child2.rules[slot] = from2.rules[slot];

            for value in 0..child1.rules[slot].pattern.len() {
                if rng.gen::<Float>() < mutation_rate {
                    child1.rules[slot].pattern[value] = rng.gen();
                    child2.rules[slot].pattern[value] = rng.gen();
                }
            }
        }
        [child1, child2]
    }
}
