//! Spatial placement and ownership engine for community plot maps.
//! Map editing rules and the plot ownership ledger live here; callers only
//! drive them.

pub mod config;
pub mod db;
pub mod editor;
pub mod geometry;
pub mod graph;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, EngineConfig, LoggingConfig};
pub use db::{open_db, open_db_in_memory, open_db_with_timeout, DbError};
pub use editor::{CollisionPolicy, EditorError, LayerDirection, MapEditor, NewItem, SelectionFilter};
pub use geometry::{Bounds, Point, SnapSettings};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::item::{Item, ItemCategory, ItemId, PlotProperties};
pub use model::layer::{Layer, LayerId};
pub use model::map::{MapData, MapDataError, MapRecord};
pub use model::plot::{
    AccountId, MapId, Plot, PlotId, PlotSet, PlotStatus, PlotTransaction, TransactionType,
};
pub use repo::map_repo::{MapRepository, SqliteMapRepository};
pub use repo::plot_repo::{PlotRepository, PurchaseReceipt, ReconcileReport, SqlitePlotRepository};
pub use repo::{RepoError, RepoResult};
pub use service::activation_service::{ActivationError, ActivationReport, MapActivation};
pub use service::ledger_service::{LedgerError, OwnershipLedger, PurchaseRequest};
pub use service::map_service::{MapService, MapServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
