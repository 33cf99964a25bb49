//! Pure adjacency analysis over plot cells.

pub mod adjacency;

pub use adjacency::{
    adjacent_cells, are_adjacent, verify_adjacent_to_existing, verify_connected, AdjacencyError,
    AdjacencyGraph, Cell,
};
