//! Plot ledger repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist plots, plot sets and ownership transactions.
//! - Apply purchases, sales and map reconciliation as single transactions.
//!
//! # Invariants
//! - Ownership changes use conditional updates (`status`/`owner_id` guards),
//!   so two writers racing on one plot cannot both succeed.
//! - Every ownership change appends exactly one `plot_transactions` row.
//! - Owned plots are never modified by reconciliation.
//! - Switching the active map, reconciling its plots and archiving plots of
//!   other maps commit together or not at all.

use super::map_repo::{load_map, switch_active};
use super::{ensure_schema_ready, now_epoch_ms, RepoError, RepoResult};
use crate::geometry::Bounds;
use crate::model::plot::{
    AccountId, DeclaredPlot, MapId, Plot, PlotId, PlotSet, PlotSetId, PlotStatus, PlotTransaction,
    TransactionType,
};
use log::{debug, info};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const PLOT_SELECT_SQL: &str = "SELECT
    id,
    name,
    plot_type,
    map_id,
    pos_x,
    pos_y,
    width,
    height,
    owner_id,
    plot_set_id,
    status,
    price,
    house_type,
    house_color,
    created_at,
    updated_at
FROM plots";

const TRANSACTION_SELECT_SQL: &str = "SELECT
    id,
    plot_id,
    transaction_type,
    previous_owner_id,
    new_owner_id,
    price,
    transaction_date,
    user_id
FROM plot_transactions";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("community_maps", &["id", "map_data", "is_active"]),
    (
        "plots",
        &["id", "map_id", "owner_id", "plot_set_id", "status", "price"],
    ),
    ("plot_sets", &["id", "owner_id", "deleted_at"]),
    (
        "plot_transactions",
        &["id", "plot_id", "transaction_type", "transaction_date", "user_id"],
    ),
];

pub type PlotRepoResult<T> = Result<T, PlotRepoError>;

/// Ledger write conflicts and storage failures.
#[derive(Debug)]
pub enum PlotRepoError {
    /// Unknown or archived plot.
    PlotNotFound(PlotId),
    MapNotFound(MapId),
    AlreadyOwned(PlotId),
    NotOwner(PlotId),
    LimitExceeded {
        owned: usize,
        requested: usize,
        limit: usize,
    },
    Repo(RepoError),
}

impl Display for PlotRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
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
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PlotRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PlotRepoError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for PlotRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

/// A validated purchase to apply atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseOrder {
    pub owner_id: AccountId,
    pub acting_user_id: AccountId,
    pub plot_ids: Vec<PlotId>,
    pub house_type: Option<String>,
    pub house_color: Option<String>,
    /// Per-account plot cap, re-checked inside the write transaction.
    pub max_plots: usize,
}

/// Outcome of a committed purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseReceipt {
    pub plots: Vec<Plot>,
    pub plot_set_id: Option<PlotSetId>,
    pub transactions: Vec<PlotTransaction>,
}

/// Row counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub inserted: usize,
    pub refreshed: usize,
    pub revived: usize,
    pub archived: usize,
    pub skipped_owned: usize,
}

/// Outcome of `PlotRepository::activate_map`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapSwitch {
    /// Plot items declared by the activated document.
    pub declared: usize,
    pub reconcile: ReconcileReport,
    /// Available plots of other maps archived by the switch.
    pub archived_elsewhere: usize,
}

/// Repository interface for the plot ledger.
pub trait PlotRepository {
    fn get_plot(&self, plot_id: &str) -> PlotRepoResult<Option<Plot>>;
    fn plots_by_owner(&self, owner_id: &str) -> PlotRepoResult<Vec<Plot>>;
    fn plots_for_map(&self, map_id: MapId, status: Option<PlotStatus>) -> PlotRepoResult<Vec<Plot>>;
    fn plot_sets_by_owner(&self, owner_id: &str) -> PlotRepoResult<Vec<PlotSet>>;
    fn get_plot_set(&self, plot_set_id: PlotSetId) -> PlotRepoResult<Option<PlotSet>>;
    /// Newest first.
    fn transactions_for_plot(&self, plot_id: &str) -> PlotRepoResult<Vec<PlotTransaction>>;
    fn apply_purchase(&self, order: &PurchaseOrder) -> PlotRepoResult<PurchaseReceipt>;
    fn apply_sale(
        &self,
        plot_id: &str,
        owner_id: &str,
        acting_user_id: &str,
    ) -> PlotRepoResult<PlotTransaction>;
    fn update_house(
        &self,
        plot_id: &str,
        owner_id: &str,
        house_type: Option<&str>,
        house_color: Option<&str>,
    ) -> PlotRepoResult<Plot>;
    fn reconcile_map(&self, map_id: MapId, declared: &[DeclaredPlot]) -> PlotRepoResult<ReconcileReport>;
    /// Archives available plots that belong to any other map.
    fn archive_available_outside(&self, map_id: MapId) -> PlotRepoResult<usize>;
    /// Flags `map_id` active, reconciles the plot items of its stored
    /// document and archives available plots of other maps, in one
    /// transaction.
    fn activate_map(&self, map_id: MapId, default_plot_price: f64) -> PlotRepoResult<MapSwitch>;
}

/// SQLite-backed plot ledger.
pub struct SqlitePlotRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePlotRepository<'conn> {
    /// Creates a repository over a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn, REQUIRED_SCHEMA)?;
        Ok(Self { conn })
    }
}

impl PlotRepository for SqlitePlotRepository<'_> {
    fn get_plot(&self, plot_id: &str) -> PlotRepoResult<Option<Plot>> {
        Ok(load_plot(self.conn, plot_id)?)
    }

    fn plots_by_owner(&self, owner_id: &str) -> PlotRepoResult<Vec<Plot>> {
        Ok(query_plots(
            self.conn,
            &format!("{PLOT_SELECT_SQL} WHERE owner_id = ?1 AND status = 'owned' ORDER BY id ASC;"),
            params![owner_id],
        )?)
    }

    fn plots_for_map(&self, map_id: MapId, status: Option<PlotStatus>) -> PlotRepoResult<Vec<Plot>> {
        Ok(query_plots(
            self.conn,
            &format!(
                "{PLOT_SELECT_SQL}
                 WHERE map_id = ?1 AND (?2 IS NULL OR status = ?2)
                 ORDER BY id ASC;"
            ),
            params![map_id.to_string(), status.map(PlotStatus::as_str)],
        )?)
    }

    fn plot_sets_by_owner(&self, owner_id: &str) -> PlotRepoResult<Vec<PlotSet>> {
        let mut stmt = self.conn.prepare(
            "SELECT id FROM plot_sets
             WHERE owner_id = ?1 AND deleted_at IS NULL
             ORDER BY created_at ASC, id ASC;",
        )?;
        let ids = stmt
            .query_map([owner_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut sets = Vec::with_capacity(ids.len());
        for id in ids {
            let id = parse_uuid(&id, "plot_sets.id")?;
            if let Some(set) = load_plot_set(self.conn, id)? {
                sets.push(set);
            }
        }
        Ok(sets)
    }

    fn get_plot_set(&self, plot_set_id: PlotSetId) -> PlotRepoResult<Option<PlotSet>> {
        Ok(load_plot_set(self.conn, plot_set_id)?)
    }

    fn transactions_for_plot(&self, plot_id: &str) -> PlotRepoResult<Vec<PlotTransaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TRANSACTION_SELECT_SQL}
             WHERE plot_id = ?1
             ORDER BY transaction_date DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([plot_id])?;
        let mut transactions = Vec::new();
        while let Some(row) = rows.next()? {
            transactions.push(parse_transaction_row(row)?);
        }
        Ok(transactions)
    }

    fn apply_purchase(&self, order: &PurchaseOrder) -> PlotRepoResult<PurchaseReceipt> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let now = now_epoch_ms();

        let mut prices = Vec::with_capacity(order.plot_ids.len());
        for plot_id in &order.plot_ids {
            let plot = load_plot(&tx, plot_id)?
                .ok_or_else(|| PlotRepoError::PlotNotFound(plot_id.clone()))?;
            match plot.status {
                PlotStatus::Available => prices.push(plot.price),
                PlotStatus::Owned => return Err(PlotRepoError::AlreadyOwned(plot_id.clone())),
                PlotStatus::Archived => return Err(PlotRepoError::PlotNotFound(plot_id.clone())),
            }
        }

        let owned = count_owned(&tx, &order.owner_id)?;
        if owned + order.plot_ids.len() > order.max_plots {
            return Err(PlotRepoError::LimitExceeded {
                owned,
                requested: order.plot_ids.len(),
                limit: order.max_plots,
            });
        }

        let plot_set_id = if order.plot_ids.len() > 1 {
            let id = Uuid::new_v4();
            tx.execute(
                "INSERT INTO plot_sets (id, owner_id, name, created_at)
                 VALUES (?1, ?2, 'Plot Set ' || strftime('%Y-%m-%d', ?3 / 1000, 'unixepoch'), ?3);",
                params![id.to_string(), order.owner_id, now],
            )?;
            Some(id)
        } else {
            None
        };

        let mut transactions = Vec::with_capacity(order.plot_ids.len());
        for (plot_id, price) in order.plot_ids.iter().zip(prices) {
            let changed = tx.execute(
                "UPDATE plots
                 SET
                    owner_id = ?1,
                    plot_set_id = ?2,
                    status = 'owned',
                    house_type = ?3,
                    house_color = ?4,
                    updated_at = ?5
                 WHERE id = ?6 AND status = 'available' AND owner_id IS NULL;",
                params![
                    order.owner_id,
                    plot_set_id.map(|id| id.to_string()),
                    order.house_type,
                    order.house_color,
                    now,
                    plot_id,
                ],
            )?;
            if changed == 0 {
                return Err(PlotRepoError::AlreadyOwned(plot_id.clone()));
            }

            let transaction = PlotTransaction {
                id: Uuid::new_v4(),
                plot_id: plot_id.clone(),
                kind: TransactionType::Purchase,
                previous_owner_id: None,
                new_owner_id: Some(order.owner_id.clone()),
                price: Some(price),
                timestamp: now,
                acting_user_id: order.acting_user_id.clone(),
            };
            insert_transaction(&tx, &transaction)?;
            transactions.push(transaction);
        }

        let mut plots = Vec::with_capacity(order.plot_ids.len());
        for plot_id in &order.plot_ids {
            let plot = load_plot(&tx, plot_id)?
                .ok_or_else(|| PlotRepoError::PlotNotFound(plot_id.clone()))?;
            plots.push(plot);
        }
        tx.commit()?;

        info!(
            "event=plot_purchase module=repo status=ok plot_count={} plot_set={}",
            plots.len(),
            plot_set_id.is_some()
        );
        Ok(PurchaseReceipt {
            plots,
            plot_set_id,
            transactions,
        })
    }

    fn apply_sale(
        &self,
        plot_id: &str,
        owner_id: &str,
        acting_user_id: &str,
    ) -> PlotRepoResult<PlotTransaction> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let now = now_epoch_ms();

        let plot = load_plot(&tx, plot_id)?
            .ok_or_else(|| PlotRepoError::PlotNotFound(plot_id.to_string()))?;
        if !plot.is_owned_by(owner_id) {
            return Err(PlotRepoError::NotOwner(plot_id.to_string()));
        }

        let changed = tx.execute(
            "UPDATE plots
             SET
                owner_id = NULL,
                plot_set_id = NULL,
                house_type = NULL,
                house_color = NULL,
                status = 'available',
                updated_at = ?1
             WHERE id = ?2 AND owner_id = ?3 AND status = 'owned';",
            params![now, plot_id, owner_id],
        )?;
        if changed == 0 {
            return Err(PlotRepoError::NotOwner(plot_id.to_string()));
        }

        let transaction = PlotTransaction {
            id: Uuid::new_v4(),
            plot_id: plot_id.to_string(),
            kind: TransactionType::Sale,
            previous_owner_id: Some(owner_id.to_string()),
            new_owner_id: None,
            price: Some(plot.price),
            timestamp: now,
            acting_user_id: acting_user_id.to_string(),
        };
        insert_transaction(&tx, &transaction)?;

        if let Some(set_id) = plot.plot_set_id {
            tx.execute(
                "UPDATE plot_sets
                 SET deleted_at = ?1
                 WHERE id = ?2
                   AND deleted_at IS NULL
                   AND NOT EXISTS (SELECT 1 FROM plots WHERE plot_set_id = ?2);",
                params![now, set_id.to_string()],
            )?;
        }
        tx.commit()?;

        info!("event=plot_sale module=repo status=ok");
        Ok(transaction)
    }

    fn update_house(
        &self,
        plot_id: &str,
        owner_id: &str,
        house_type: Option<&str>,
        house_color: Option<&str>,
    ) -> PlotRepoResult<Plot> {
        let changed = self.conn.execute(
            "UPDATE plots
             SET house_type = ?1, house_color = ?2, updated_at = ?3
             WHERE id = ?4 AND owner_id = ?5 AND status = 'owned';",
            params![house_type, house_color, now_epoch_ms(), plot_id, owner_id],
        )?;
        let plot = load_plot(self.conn, plot_id)?
            .ok_or_else(|| PlotRepoError::PlotNotFound(plot_id.to_string()))?;
        if changed == 0 {
            return Err(PlotRepoError::NotOwner(plot_id.to_string()));
        }
        Ok(plot)
    }

    fn reconcile_map(&self, map_id: MapId, declared: &[DeclaredPlot]) -> PlotRepoResult<ReconcileReport> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let report = reconcile_declared(&tx, map_id, declared, now_epoch_ms())?;
        tx.commit()?;

        debug!(
            "event=plot_reconcile module=repo status=ok inserted={} refreshed={} revived={} archived={} skipped_owned={}",
            report.inserted, report.refreshed, report.revived, report.archived, report.skipped_owned
        );
        Ok(report)
    }

    fn archive_available_outside(&self, map_id: MapId) -> PlotRepoResult<usize> {
        Ok(archive_outside(self.conn, map_id, now_epoch_ms())?)
    }

    fn activate_map(&self, map_id: MapId, default_plot_price: f64) -> PlotRepoResult<MapSwitch> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let record = load_map(&tx, map_id)?.ok_or(PlotRepoError::MapNotFound(map_id))?;
        switch_active(&tx, map_id)?;

        let declared: Vec<DeclaredPlot> = record
            .map_data
            .plot_items()
            .filter_map(|item| DeclaredPlot::from_item(item, default_plot_price))
            .collect();
        let now = now_epoch_ms();
        let reconcile = reconcile_declared(&tx, map_id, &declared, now)?;
        let archived_elsewhere = archive_outside(&tx, map_id, now)?;
        tx.commit()?;

        info!(
            "event=map_switch module=repo status=ok map_id={map_id} declared={} inserted={} revived={} archived={}",
            declared.len(),
            reconcile.inserted,
            reconcile.revived,
            reconcile.archived + archived_elsewhere
        );
        Ok(MapSwitch {
            declared: declared.len(),
            reconcile,
            archived_elsewhere,
        })
    }
}

/// Syncs stored plots of `map_id` with `declared`. Callers own the transaction.
fn reconcile_declared(
    conn: &Connection,
    map_id: MapId,
    declared: &[DeclaredPlot],
    now: i64,
) -> RepoResult<ReconcileReport> {
    let map_id_text = map_id.to_string();
    let mut report = ReconcileReport::default();

    let mut declared_ids = HashSet::with_capacity(declared.len());
    for plot in declared {
        if !declared_ids.insert(plot.id.as_str()) {
            continue;
        }
        let status: Option<String> = conn
            .query_row("SELECT status FROM plots WHERE id = ?1;", [&plot.id], |row| {
                row.get(0)
            })
            .optional()?;
        let status = match status {
            Some(text) => Some(parse_status(&text)?),
            None => None,
        };

        match status {
            None => {
                conn.execute(
                    "INSERT INTO plots (
                        id, name, plot_type, map_id, pos_x, pos_y, width, height,
                        status, price, created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'available', ?9, ?10, ?10);",
                    params![
                        plot.id,
                        plot.name,
                        plot.plot_type,
                        map_id_text,
                        plot.position.x,
                        plot.position.y,
                        plot.position.width,
                        plot.position.height,
                        plot.price,
                        now,
                    ],
                )?;
                report.inserted += 1;
            }
            Some(PlotStatus::Owned) => report.skipped_owned += 1,
            Some(previous) => {
                conn.execute(
                    "UPDATE plots
                     SET
                        name = ?1,
                        plot_type = ?2,
                        map_id = ?3,
                        pos_x = ?4,
                        pos_y = ?5,
                        width = ?6,
                        height = ?7,
                        price = ?8,
                        status = 'available',
                        updated_at = ?9
                     WHERE id = ?10 AND status IN ('available', 'archived');",
                    params![
                        plot.name,
                        plot.plot_type,
                        map_id_text,
                        plot.position.x,
                        plot.position.y,
                        plot.position.width,
                        plot.position.height,
                        plot.price,
                        now,
                        plot.id,
                    ],
                )?;
                if previous == PlotStatus::Archived {
                    report.revived += 1;
                } else {
                    report.refreshed += 1;
                }
            }
        }
    }

    let mut stmt = conn.prepare(
        "SELECT id FROM plots WHERE map_id = ?1 AND status = 'available';",
    )?;
    let available = stmt
        .query_map([&map_id_text], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    drop(stmt);
    for plot_id in available {
        if declared_ids.contains(plot_id.as_str()) {
            continue;
        }
        report.archived += conn.execute(
            "UPDATE plots SET status = 'archived', updated_at = ?1
             WHERE id = ?2 AND status = 'available';",
            params![now, plot_id],
        )?;
    }
    Ok(report)
}

/// Archives available plots that do not belong to `map_id`.
fn archive_outside(conn: &Connection, map_id: MapId, now: i64) -> RepoResult<usize> {
    Ok(conn.execute(
        "UPDATE plots SET status = 'archived', updated_at = ?1
         WHERE status = 'available' AND map_id <> ?2;",
        params![now, map_id.to_string()],
    )?)
}

fn load_plot(conn: &Connection, plot_id: &str) -> RepoResult<Option<Plot>> {
    let mut stmt = conn.prepare(&format!("{PLOT_SELECT_SQL} WHERE id = ?1;"))?;
    let mut rows = stmt.query([plot_id])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_plot_row(row)?));
    }
    Ok(None)
}

fn query_plots(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> RepoResult<Vec<Plot>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut plots = Vec::new();
    while let Some(row) = rows.next()? {
        plots.push(parse_plot_row(row)?);
    }
    Ok(plots)
}

fn count_owned(conn: &Connection, owner_id: &str) -> RepoResult<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM plots WHERE owner_id = ?1 AND status = 'owned';",
        [owner_id],
        |row| row.get(0),
    )?;
    usize::try_from(count).map_err(|_| RepoError::InvalidData(format!("negative plot count {count}")))
}

fn load_plot_set(conn: &Connection, plot_set_id: PlotSetId) -> RepoResult<Option<PlotSet>> {
    let id_text = plot_set_id.to_string();
    let row = conn
        .query_row(
            "SELECT owner_id, name, created_at, deleted_at FROM plot_sets WHERE id = ?1;",
            [&id_text],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                ))
            },
        )
        .optional()?;
    let Some((owner_id, name, created_at, deleted_at)) = row else {
        return Ok(None);
    };

    let mut stmt = conn.prepare("SELECT id FROM plots WHERE plot_set_id = ?1 ORDER BY id ASC;")?;
    let member_plot_ids = stmt
        .query_map([&id_text], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some(PlotSet {
        id: plot_set_id,
        owner_id,
        name,
        member_plot_ids,
        created_at,
        deleted_at,
    }))
}

fn insert_transaction(conn: &Connection, transaction: &PlotTransaction) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO plot_transactions (
            id,
            plot_id,
            transaction_type,
            previous_owner_id,
            new_owner_id,
            price,
            transaction_date,
            user_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            transaction.id.to_string(),
            transaction.plot_id,
            transaction.kind.as_str(),
            transaction.previous_owner_id,
            transaction.new_owner_id,
            transaction.price,
            transaction.timestamp,
            transaction.acting_user_id,
        ],
    )?;
    Ok(())
}

fn parse_plot_row(row: &Row<'_>) -> RepoResult<Plot> {
    let map_id: String = row.get("map_id")?;
    let plot_set_id = match row.get::<_, Option<String>>("plot_set_id")? {
        Some(value) => Some(parse_uuid(&value, "plots.plot_set_id")?),
        None => None,
    };
    let status: String = row.get("status")?;

    Ok(Plot {
        id: row.get("id")?,
        name: row.get("name")?,
        plot_type: row.get("plot_type")?,
        position: Bounds::new(
            row.get("pos_x")?,
            row.get("pos_y")?,
            row.get("width")?,
            row.get("height")?,
        ),
        map_id: parse_uuid(&map_id, "plots.map_id")?,
        owner_id: row.get("owner_id")?,
        plot_set_id,
        status: parse_status(&status)?,
        price: row.get("price")?,
        house_type: row.get("house_type")?,
        house_color: row.get("house_color")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_transaction_row(row: &Row<'_>) -> RepoResult<PlotTransaction> {
    let id: String = row.get("id")?;
    let kind: String = row.get("transaction_type")?;
    Ok(PlotTransaction {
        id: parse_uuid(&id, "plot_transactions.id")?,
        plot_id: row.get("plot_id")?,
        kind: TransactionType::parse(&kind).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid transaction type `{kind}` in plot_transactions.transaction_type"
            ))
        })?,
        previous_owner_id: row.get("previous_owner_id")?,
        new_owner_id: row.get("new_owner_id")?,
        price: row.get("price")?,
        timestamp: row.get("transaction_date")?,
        acting_user_id: row.get("user_id")?,
    })
}

fn parse_status(value: &str) -> RepoResult<PlotStatus> {
    PlotStatus::parse(value)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid plot status `{value}` in plots.status")))
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
