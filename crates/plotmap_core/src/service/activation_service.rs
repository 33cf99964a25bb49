//! Map activation: switch the active map and sync its plots.
//!
//! # Responsibility
//! - Flag one stored map as active.
//! - Derive the map's plot cells and reconcile them into the ledger.
//! - Archive available plots left behind by the previously active map.
//!
//! # Invariants
//! - Owned plots are never archived or rewritten by activation.
//! - Switching the active map and syncing its plots is atomic; a failed
//!   activation leaves the previous active map and its plots untouched.

use crate::model::plot::MapId;
use crate::repo::map_repo::MapRepository;
use crate::repo::plot_repo::{PlotRepository, ReconcileReport};
use crate::service::ledger_service::{LedgerError, OwnershipLedger};
use crate::service::map_service::{MapService, MapServiceError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ActivationError {
    Map(MapServiceError),
    Ledger(LedgerError),
}

impl Display for ActivationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Map(err) => write!(f, "{err}"),
            Self::Ledger(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ActivationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Map(err) => Some(err),
            Self::Ledger(err) => Some(err),
        }
    }
}

impl From<MapServiceError> for ActivationError {
    fn from(value: MapServiceError) -> Self {
        Self::Map(value)
    }
}

impl From<LedgerError> for ActivationError {
    fn from(value: LedgerError) -> Self {
        Self::Ledger(value)
    }
}

/// Outcome of one activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    pub map_id: MapId,
    /// Changes to plots declared by the activated map.
    pub reconcile: ReconcileReport,
    /// Available plots of other maps archived by this activation.
    pub archived_elsewhere: usize,
}

/// Coordinates the map store and the ownership ledger.
pub struct MapActivation<M: MapRepository, P: PlotRepository> {
    maps: MapService<M>,
    ledger: OwnershipLedger<P>,
}

impl<M: MapRepository, P: PlotRepository> MapActivation<M, P> {
    pub fn new(maps: MapService<M>, ledger: OwnershipLedger<P>) -> Self {
        Self { maps, ledger }
    }

    pub fn maps(&self) -> &MapService<M> {
        &self.maps
    }

    pub fn ledger(&self) -> &OwnershipLedger<P> {
        &self.ledger
    }

    /// Activates `map_id` and reconciles its plot items into the ledger.
    ///
    /// The active flag, the reconciliation and the archiving of other maps'
    /// available plots commit in one transaction.
    pub fn activate(&self, map_id: MapId) -> Result<ActivationReport, ActivationError> {
        match self.ledger.activate_map(map_id) {
            Ok(switch) => {
                info!(
                    "event=map_activation module=service status=ok map_id={map_id} declared={} inserted={} revived={} archived={}",
                    switch.declared,
                    switch.reconcile.inserted,
                    switch.reconcile.revived,
                    switch.reconcile.archived + switch.archived_elsewhere
                );
                Ok(ActivationReport {
                    map_id,
                    reconcile: switch.reconcile,
                    archived_elsewhere: switch.archived_elsewhere,
                })
            }
            Err(LedgerError::MapNotFound(id)) => Err(MapServiceError::MapNotFound(id).into()),
            Err(err) => {
                warn!("event=map_activation module=service status=error map_id={map_id} error={err}");
                Err(err.into())
            }
        }
    }
}
