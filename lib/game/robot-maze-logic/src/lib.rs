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

#![warn(missing_docs)]

//! Robot maze logic.
//!
//! A square arena surrounded by walls, with collectible cells scattered over the interior. A
//! single robot walks the maze and senses its four neighbours. This crate knows nothing about
//! genomes or evolution; it is the environment only.

use rand::distributions::{Distribution, Standard};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Robot maze error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MazeError {
    /// Collectible density must be in [0, 1), otherwise placement would never finish.
    #[error("collectible density must be in [0, 1): {0}")]
    DensityOutOfRange(f64),

    /// Grid needs at least one interior cell inside the border walls.
    #[error("grid size must be at least 3: {0}")]
    GridTooSmall(usize),
}

/// Maze cell. Part of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cell {
    /// Nothing here.
    Empty,

    /// Restores energy when a robot steps onto it. Consumed on pickup.
    Collectible,

    /// Impassable. The outer ring of every grid is wall.
    Wall,

    /// The robot currently stands here.
    Robot,
}

impl Cell {
    /// What a robot standing next to this cell senses. Only one robot ever walks a grid, so a
    /// neighbouring robot is never observed; it reads as empty floor.
    pub fn sensed(self) -> Sensed {
        match self {
            Cell::Empty | Cell::Robot => Sensed::Empty,
            Cell::Collectible => Sensed::Collectible,
            Cell::Wall => Sensed::Wall,
        }
    }
}

/// The value of one slot of a sensed pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sensed {
    /// Empty floor.
    Empty,

    /// A collectible.
    Collectible,

    /// A wall.
    Wall,
}

impl Sensed {
    /// All sensed values, in code order.
    pub const ALL: [Sensed; 3] = [Sensed::Empty, Sensed::Collectible, Sensed::Wall];
}

impl Distribution<Sensed> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Sensed {
        Sensed::ALL[rng.gen_range(0..Sensed::ALL.len())]
    }
}

/// Cardinal direction. The numeric order north, east, south, west is also the slot order of a
/// [`Percept`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Up, towards row 0.
    North,

    /// Right, towards the last column.
    East,

    /// Down, towards the last row.
    South,

    /// Left, towards column 0.
    West,
}

impl Direction {
    /// All directions, in slot order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Slot index of this direction within a [`Percept`].
    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }
}

impl Distribution<Direction> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Direction {
        Direction::ALL[rng.gen_range(0..Direction::ALL.len())]
    }
}

/// What a robot senses: one value per direction, indexed by [`Direction::index`].
pub type Percept = [Sensed; 4];

/// Location of a cell on the grid. Row 0 is the top wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Row, counted from the top.
    pub row: usize,

    /// Column, counted from the left.
    pub col: usize,
}

impl Position {
    /// Create a new position.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// The adjacent position in `direction`. Only valid for interior positions, which is the
    /// only place a robot can stand.
    pub fn neighbor(self, direction: Direction) -> Position {
        match direction {
            Direction::North => Position::new(self.row - 1, self.col),
            Direction::East => Position::new(self.row, self.col + 1),
            Direction::South => Position::new(self.row + 1, self.col),
            Direction::West => Position::new(self.row, self.col - 1),
        }
    }
}

/// Square maze. Cells are stored row-major, so cloning is a single buffer copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

// '#' wall, '*' collectible, '.' empty, 'R' robot.
impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = String::with_capacity((self.size + 1) * self.size);
        for row in 0..self.size {
            for col in 0..self.size {
                s.push(cell_char(self.get(Position::new(row, col))));
            }
            if row < self.size - 1 {
                s.push('\n');
            }
        }
        write!(f, "{}", s)
    }
}

/// Character used by the text rendering of a grid.
pub fn cell_char(cell: Cell) -> char {
    match cell {
        Cell::Empty => '.',
        Cell::Collectible => '*',
        Cell::Wall => '#',
        Cell::Robot => 'R',
    }
}

impl Grid {
    /// Create a new grid of `size` x `size` with border walls, and place exactly
    /// `floor(density * (size - 2)^2)` collectibles at uniformly random interior cells.
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        collectible_density: f64,
        rng: &mut R,
    ) -> Result<Self, MazeError> {
        let target = Grid::collectible_target(size, collectible_density)?;
        let mut grid = Grid::walled(size)?;

        let mut placed = 0;
        while placed < target {
            let position = Position::new(rng.gen_range(1..size - 1), rng.gen_range(1..size - 1));
            if grid.get(position) == Cell::Empty {
                grid.set(position, Cell::Collectible);
                placed += 1;
            }
        }
        Ok(grid)
    }

    /// Create a grid with border walls and an empty interior.
    pub fn walled(size: usize) -> Result<Self, MazeError> {
        if size < 3 {
            return Err(MazeError::GridTooSmall(size));
        }
        let mut grid = Self {
            size,
            cells: vec![Cell::Empty; size * size],
        };
        for i in 0..size {
            grid.set(Position::new(0, i), Cell::Wall);
            grid.set(Position::new(size - 1, i), Cell::Wall);
            grid.set(Position::new(i, 0), Cell::Wall);
            grid.set(Position::new(i, size - 1), Cell::Wall);
        }
        Ok(grid)
    }

    /// Number of collectibles a freshly constructed grid of this size and density holds.
    pub fn collectible_target(size: usize, collectible_density: f64) -> Result<usize, MazeError> {
        if !(0.0..1.0).contains(&collectible_density) {
            return Err(MazeError::DensityOutOfRange(collectible_density));
        }
        if size < 3 {
            return Err(MazeError::GridTooSmall(size));
        }
        let interior = (size - 2) * (size - 2);
        Ok((collectible_density * interior as f64).floor() as usize)
    }

    /// Side length of the grid, walls included.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of cells inside the border walls.
    pub fn interior_cell_count(&self) -> usize {
        (self.size - 2) * (self.size - 2)
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Get the cell at `position`.
    pub fn get(&self, position: Position) -> Cell {
        self.cells[self.index(position)]
    }

    /// Overwrite the cell at `position`.
    pub fn set(&mut self, position: Position, cell: Cell) {
        let index = self.index(position);
        self.cells[index] = cell;
    }

    /// Count cells of the given kind.
    pub fn count(&self, cell: Cell) -> usize {
        self.cells.iter().filter(|&&c| c == cell).count()
    }

    /// True if `position` lies on the outer ring.
    pub fn is_border(&self, position: Position) -> bool {
        position.row == 0
            || position.col == 0
            || position.row == self.size - 1
            || position.col == self.size - 1
    }

    /// Sense the four neighbours of an interior `position`. The border is always wall, so every
    /// neighbour of an interior cell is in bounds.
    pub fn percept(&self, position: Position) -> Percept {
        Direction::ALL.map(|direction| self.get(position.neighbor(direction)).sensed())
    }

    fn index(&self, position: Position) -> usize {
        debug_assert!(position.row < self.size && position.col < self.size);
        position.row * self.size + position.col
    }
}
