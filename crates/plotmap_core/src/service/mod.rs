//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce marketplace rules (limits, adjacency) before anything is written.
//! - Keep callers decoupled from storage details.

pub mod activation_service;
pub mod ledger_service;
pub mod map_service;
