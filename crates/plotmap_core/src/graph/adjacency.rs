//! Edge-distance adjacency graph.
//!
//! # Responsibility
//! - Build the undirected graph where two cells are linked iff their
//!   `edge_distance` is at most the threshold.
//! - Answer the two purchase guards: candidate sets must be connected, and
//!   every candidate must touch the buyer's existing holding.
//!
//! # Invariants
//! - Graph construction is O(n²) over cell pairs; inputs are purchase-sized.
//! - The threshold comparison is inclusive (`<=`).

use crate::geometry::{edge_distance, Bounds};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// A graph vertex: cell id and its bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub id: String,
    pub bounds: Bounds,
}

impl Cell {
    pub fn new(id: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            id: id.into(),
            bounds,
        }
    }
}

/// Adjacency guard failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdjacencyError {
    /// The candidate set splits into more than one component.
    NotConnected,
    /// This candidate is not within the threshold of any owned cell.
    NotAdjacentToExisting(String),
}

impl Display for AdjacencyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConnected => write!(f, "selected plots are not connected"),
            Self::NotAdjacentToExisting(id) => {
                write!(f, "plot `{id}` is not adjacent to any owned plot")
            }
        }
    }
}

impl Error for AdjacencyError {}

/// Returns whether two boxes are within `threshold` edge distance.
pub fn are_adjacent(a: &Bounds, b: &Bounds, threshold: f64) -> bool {
    edge_distance(a, b) <= threshold
}

/// Undirected adjacency graph in adjacency-list form.
#[derive(Debug, Clone)]
pub struct AdjacencyGraph {
    cells: Vec<Cell>,
    neighbours: Vec<Vec<usize>>,
}

impl AdjacencyGraph {
    /// Links every unordered pair within `threshold`.
    pub fn build(cells: &[Cell], threshold: f64) -> Self {
        let mut neighbours = vec![Vec::new(); cells.len()];
        for i in 0..cells.len() {
            for j in (i + 1)..cells.len() {
                if are_adjacent(&cells[i].bounds, &cells[j].bounds, threshold) {
                    neighbours[i].push(j);
                    neighbours[j].push(i);
                }
            }
        }
        Self {
            cells: cells.to_vec(),
            neighbours,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Ids adjacent to `id`, in input order. Empty for unknown ids.
    pub fn neighbours_of(&self, id: &str) -> Vec<&str> {
        let Some(index) = self.cells.iter().position(|cell| cell.id == id) else {
            return Vec::new();
        };
        let mut found: Vec<usize> = self.neighbours[index].clone();
        found.sort_unstable();
        found
            .into_iter()
            .map(|neighbour| self.cells[neighbour].id.as_str())
            .collect()
    }

    /// BFS from the first cell; true when every cell is reached.
    ///
    /// Empty and single-cell graphs are connected.
    pub fn is_connected(&self) -> bool {
        if self.cells.len() <= 1 {
            return true;
        }
        let mut visited = vec![false; self.cells.len()];
        let mut queue = VecDeque::from([0usize]);
        visited[0] = true;
        let mut reached = 1;
        while let Some(current) = queue.pop_front() {
            for &next in &self.neighbours[current] {
                if !visited[next] {
                    visited[next] = true;
                    reached += 1;
                    queue.push_back(next);
                }
            }
        }
        reached == self.cells.len()
    }
}

/// Fails with `NotConnected` unless the cells form one component.
pub fn verify_connected(cells: &[Cell], threshold: f64) -> Result<(), AdjacencyError> {
    if AdjacencyGraph::build(cells, threshold).is_connected() {
        Ok(())
    } else {
        Err(AdjacencyError::NotConnected)
    }
}

/// Fails unless every candidate is adjacent to at least one owned cell.
///
/// An empty `owned` slice fails for the first candidate; callers skip this
/// check for buyers without holdings.
pub fn verify_adjacent_to_existing(
    candidates: &[Cell],
    owned: &[Cell],
    threshold: f64,
) -> Result<(), AdjacencyError> {
    for candidate in candidates {
        let touches = owned
            .iter()
            .any(|cell| are_adjacent(&candidate.bounds, &cell.bounds, threshold));
        if !touches {
            return Err(AdjacencyError::NotAdjacentToExisting(candidate.id.clone()));
        }
    }
    Ok(())
}

/// Cells from `pool` within `threshold` of `target`, excluding `target`.
pub fn adjacent_cells<'a>(target: &Cell, pool: &'a [Cell], threshold: f64) -> Vec<&'a Cell> {
    pool.iter()
        .filter(|cell| cell.id != target.id && are_adjacent(&target.bounds, &cell.bounds, threshold))
        .collect()
}
