//! Domain model for map documents and the plot marketplace.
//!
//! # Responsibility
//! - Define the map document shape (layers, items, environment) exactly as it
//!   is exported and imported.
//! - Define persisted marketplace records (plots, plot sets, transactions).
//!
//! # Invariants
//! - Every `Item::layer_id` in a valid `MapData` resolves to one of its layers.
//! - Plot ids are the ids of the `category=plot` items they were derived from.
//! - Ownership history is append-only; plots are archived, never erased.

pub mod catalog;
pub mod item;
pub mod layer;
pub mod map;
pub mod plot;
