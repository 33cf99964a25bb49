//! Ownership ledger use-cases.
//!
//! # Responsibility
//! - Validate purchases against availability, the per-account limit and the
//!   adjacency rules before handing them to the repository.
//! - Expose sale, house customization and marketplace read paths.
//! - Reconcile declared plot items into stored plots on map activation.
//!
//! # Invariants
//! - Guard order: input shape, then `PlotNotFound`/`AlreadyOwned`, then
//!   `LimitExceeded`, then `NotAdjacentToExisting`, then `NotConnected`.
//! - A failed purchase changes no plot, plot set or transaction row.

use crate::config::EngineConfig;
use crate::graph::{
    adjacent_cells, verify_adjacent_to_existing, verify_connected, AdjacencyError, Cell,
};
use crate::model::item::Item;
use crate::model::plot::{
    AccountId, DeclaredPlot, MapId, Plot, PlotId, PlotSet, PlotSetId, PlotStatus,
    PlotTransaction,
};
use crate::repo::plot_repo::{
    MapSwitch, PlotRepoError, PlotRepository, PurchaseOrder, PurchaseReceipt, ReconcileReport,
};
use crate::repo::RepoError;
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Ledger use-case failures.
#[derive(Debug)]
pub enum LedgerError {
    EmptyPurchase,
    DuplicatePlot(PlotId),
    PlotNotFound(PlotId),
    MapNotFound(MapId),
    AlreadyOwned(PlotId),
    NotOwner(PlotId),
    LimitExceeded {
        owned: usize,
        requested: usize,
        limit: usize,
    },
    NotAdjacentToExisting(PlotId),
    NotConnected,
    /// Lock contention outlasted the busy timeout; safe to retry.
    StorageUnavailable(RepoError),
    Repo(RepoError),
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyPurchase => write!(f, "purchase must name at least one plot"),
            Self::DuplicatePlot(id) => write!(f, "plot `{id}` is listed more than once"),
            Self::PlotNotFound(id) => write!(f, "plot not found: {id}"),
            Self::MapNotFound(id) => write!(f, "map not found: {id}"),
            Self::AlreadyOwned(id) => write!(f, "plot already owned: {id}"),
            Self::NotOwner(id) => write!(f, "plot `{id}` is not owned by the caller"),
            Self::LimitExceeded {
                owned,
                requested,
                limit,
            } => write!(
                f,
                "owning {owned} plots, buying {requested} more would exceed the limit of {limit}"
            ),
            Self::NotAdjacentToExisting(id) => {
                write!(f, "plot `{id}` is not adjacent to any owned plot")
            }
            Self::NotConnected => write!(f, "selected plots are not connected"),
            Self::StorageUnavailable(err) => write!(f, "storage busy, retry later: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) | Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LedgerError {
    fn from(value: RepoError) -> Self {
        if value.is_busy() {
            Self::StorageUnavailable(value)
        } else {
            Self::Repo(value)
        }
    }
}

impl From<PlotRepoError> for LedgerError {
    fn from(value: PlotRepoError) -> Self {
        match value {
            PlotRepoError::PlotNotFound(id) => Self::PlotNotFound(id),
            PlotRepoError::MapNotFound(id) => Self::MapNotFound(id),
            PlotRepoError::AlreadyOwned(id) => Self::AlreadyOwned(id),
            PlotRepoError::NotOwner(id) => Self::NotOwner(id),
            PlotRepoError::LimitExceeded {
                owned,
                requested,
                limit,
            } => Self::LimitExceeded {
                owned,
                requested,
                limit,
            },
            PlotRepoError::Repo(err) => err.into(),
        }
    }
}

impl From<AdjacencyError> for LedgerError {
    fn from(value: AdjacencyError) -> Self {
        match value {
            AdjacencyError::NotConnected => Self::NotConnected,
            AdjacencyError::NotAdjacentToExisting(id) => Self::NotAdjacentToExisting(id),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Purchase input.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRequest {
    /// Account that will own the plots.
    pub account_id: AccountId,
    /// User performing the purchase; recorded on each transaction.
    pub acting_user_id: AccountId,
    pub plot_ids: Vec<PlotId>,
    pub house_type: Option<String>,
    pub house_color: Option<String>,
}

impl PurchaseRequest {
    pub fn new<S: Into<PlotId>>(
        account_id: impl Into<AccountId>,
        plot_ids: impl IntoIterator<Item = S>,
    ) -> Self {
        let account_id = account_id.into();
        Self {
            acting_user_id: account_id.clone(),
            account_id,
            plot_ids: plot_ids.into_iter().map(Into::into).collect(),
            house_type: None,
            house_color: None,
        }
    }

    pub fn acting_as(mut self, user_id: impl Into<AccountId>) -> Self {
        self.acting_user_id = user_id.into();
        self
    }

    pub fn with_house(mut self, house_type: impl Into<String>, house_color: impl Into<String>) -> Self {
        self.house_type = Some(house_type.into());
        self.house_color = Some(house_color.into());
        self
    }
}

/// Ownership ledger facade over a plot repository.
pub struct OwnershipLedger<R: PlotRepository> {
    repo: R,
    adjacency_threshold: f64,
    max_plots_per_account: usize,
    default_plot_price: f64,
}

impl<R: PlotRepository> OwnershipLedger<R> {
    /// Creates a ledger with limits taken from `config`.
    pub fn new(repo: R, config: &EngineConfig) -> Self {
        Self {
            repo,
            adjacency_threshold: config.adjacency_threshold,
            max_plots_per_account: config.max_plots_per_account,
            default_plot_price: config.default_plot_price,
        }
    }

    pub fn adjacency_threshold(&self) -> f64 {
        self.adjacency_threshold
    }

    pub fn max_plots_per_account(&self) -> usize {
        self.max_plots_per_account
    }

    /// Buys one or more plots atomically.
    ///
    /// More than one plot creates a plot set. Every purchased plot gets one
    /// `purchase` transaction row.
    pub fn purchase(&self, request: &PurchaseRequest) -> LedgerResult<PurchaseReceipt> {
        if request.plot_ids.is_empty() {
            return Err(LedgerError::EmptyPurchase);
        }
        let mut seen = HashSet::with_capacity(request.plot_ids.len());
        for plot_id in &request.plot_ids {
            if !seen.insert(plot_id.as_str()) {
                return Err(LedgerError::DuplicatePlot(plot_id.clone()));
            }
        }

        let mut candidates = Vec::with_capacity(request.plot_ids.len());
        for plot_id in &request.plot_ids {
            let plot = self
                .repo
                .get_plot(plot_id)?
                .ok_or_else(|| LedgerError::PlotNotFound(plot_id.clone()))?;
            match plot.status {
                PlotStatus::Available => candidates.push(plot_cell(&plot)),
                PlotStatus::Owned => return Err(LedgerError::AlreadyOwned(plot_id.clone())),
                PlotStatus::Archived => return Err(LedgerError::PlotNotFound(plot_id.clone())),
            }
        }

        let owned = self.repo.plots_by_owner(&request.account_id)?;
        if owned.len() + candidates.len() > self.max_plots_per_account {
            return Err(LedgerError::LimitExceeded {
                owned: owned.len(),
                requested: candidates.len(),
                limit: self.max_plots_per_account,
            });
        }
        if !owned.is_empty() {
            let owned_cells: Vec<Cell> = owned.iter().map(plot_cell).collect();
            verify_adjacent_to_existing(&candidates, &owned_cells, self.adjacency_threshold)?;
        }
        if candidates.len() > 1 {
            verify_connected(&candidates, self.adjacency_threshold)?;
        }

        let order = PurchaseOrder {
            owner_id: request.account_id.clone(),
            acting_user_id: request.acting_user_id.clone(),
            plot_ids: request.plot_ids.clone(),
            house_type: request.house_type.clone(),
            house_color: request.house_color.clone(),
            max_plots: self.max_plots_per_account,
        };
        match self.repo.apply_purchase(&order) {
            Ok(receipt) => {
                info!(
                    "event=ledger_purchase module=service status=ok plot_count={}",
                    receipt.plots.len()
                );
                Ok(receipt)
            }
            Err(err) => {
                let err = LedgerError::from(err);
                warn!("event=ledger_purchase module=service status=error error={err}");
                Err(err)
            }
        }
    }

    /// Releases an owned plot back to the market.
    pub fn sell(&self, plot_id: &str, owner_id: &str, acting_user_id: &str) -> LedgerResult<PlotTransaction> {
        let transaction = self.repo.apply_sale(plot_id, owner_id, acting_user_id)?;
        info!("event=ledger_sale module=service status=ok");
        Ok(transaction)
    }

    /// Changes house type/colour on a plot the caller owns.
    pub fn update_house(
        &self,
        plot_id: &str,
        owner_id: &str,
        house_type: Option<&str>,
        house_color: Option<&str>,
    ) -> LedgerResult<Plot> {
        Ok(self
            .repo
            .update_house(plot_id, owner_id, house_type, house_color)?)
    }

    pub fn plot(&self, plot_id: &str) -> LedgerResult<Plot> {
        self.repo
            .get_plot(plot_id)?
            .ok_or_else(|| LedgerError::PlotNotFound(plot_id.to_string()))
    }

    pub fn owned_plots(&self, account_id: &str) -> LedgerResult<Vec<Plot>> {
        Ok(self.repo.plots_by_owner(account_id)?)
    }

    /// Active (not emptied) plot sets of an account.
    pub fn plot_sets(&self, account_id: &str) -> LedgerResult<Vec<PlotSet>> {
        Ok(self.repo.plot_sets_by_owner(account_id)?)
    }

    /// Looks up a plot set, including soft-deleted ones.
    pub fn plot_set(&self, plot_set_id: PlotSetId) -> LedgerResult<Option<PlotSet>> {
        Ok(self.repo.get_plot_set(plot_set_id)?)
    }

    /// Ownership history of one plot, newest first.
    pub fn transactions(&self, plot_id: &str) -> LedgerResult<Vec<PlotTransaction>> {
        Ok(self.repo.transactions_for_plot(plot_id)?)
    }

    pub fn available_plots(&self, map_id: MapId) -> LedgerResult<Vec<Plot>> {
        Ok(self.repo.plots_for_map(map_id, Some(PlotStatus::Available))?)
    }

    /// Available plots of the same map within the adjacency threshold.
    pub fn adjacent_available_plots(&self, plot_id: &str) -> LedgerResult<Vec<Plot>> {
        let target = self.plot(plot_id)?;
        let pool = self.available_plots(target.map_id)?;
        let cells: Vec<Cell> = pool.iter().map(plot_cell).collect();
        let adjacent: HashSet<&str> = adjacent_cells(&plot_cell(&target), &cells, self.adjacency_threshold)
            .into_iter()
            .map(|cell| cell.id.as_str())
            .collect();
        Ok(pool
            .iter()
            .filter(|plot| adjacent.contains(plot.id.as_str()))
            .cloned()
            .collect())
    }

    /// Syncs stored plots with the plot items of an activated map.
    ///
    /// Non-plot items are ignored. Owned plots are never touched.
    pub fn reconcile_map_activation(&self, map_id: MapId, items: &[Item]) -> LedgerResult<ReconcileReport> {
        let declared: Vec<DeclaredPlot> = items
            .iter()
            .filter_map(|item| DeclaredPlot::from_item(item, self.default_plot_price))
            .collect();
        let report = self.repo.reconcile_map(map_id, &declared)?;
        info!(
            "event=ledger_reconcile module=service status=ok map_id={map_id} declared={} archived={}",
            declared.len(),
            report.archived
        );
        Ok(report)
    }

    /// Archives available plots that are not part of `map_id`.
    pub fn archive_superseded(&self, map_id: MapId) -> LedgerResult<usize> {
        Ok(self.repo.archive_available_outside(map_id)?)
    }

    /// Makes `map_id` the active map and syncs plots with its stored
    /// document in one transaction.
    pub fn activate_map(&self, map_id: MapId) -> LedgerResult<MapSwitch> {
        Ok(self.repo.activate_map(map_id, self.default_plot_price)?)
    }
}

fn plot_cell(plot: &Plot) -> Cell {
    Cell::new(plot.id.clone(), plot.position)
}
