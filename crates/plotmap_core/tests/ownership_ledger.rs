use plotmap_core::config::EngineConfig;
use plotmap_core::db::{open_db_in_memory, open_db_with_timeout};
use plotmap_core::editor::{CollisionPolicy, MapEditor, NewItem};
use plotmap_core::geometry::{Bounds, SnapSettings};
use plotmap_core::model::item::ItemCategory;
use plotmap_core::model::map::MapData;
use plotmap_core::model::plot::{MapId, PlotStatus, TransactionType};
use plotmap_core::repo::map_repo::SqliteMapRepository;
use plotmap_core::repo::plot_repo::SqlitePlotRepository;
use plotmap_core::service::activation_service::{ActivationError, ActivationReport, MapActivation};
use plotmap_core::service::ledger_service::{LedgerError, OwnershipLedger, PurchaseRequest};
use plotmap_core::service::map_service::{MapService, MapServiceError};
use rusqlite::Connection;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use uuid::Uuid;

const ROW: &[(&str, f64, f64)] = &[
    ("a", 0.0, 0.0),
    ("b", 10.0, 0.0),
    ("c", 20.0, 0.0),
    ("d", 30.0, 0.0),
    ("e", 40.0, 0.0),
    ("f", 50.0, 0.0),
    ("far", 120.0, 0.0),
];

fn plot_map(cells: &[(&str, f64, f64)]) -> MapData {
    let mut editor = MapEditor::new(MapData::new_default(), SnapSettings::default()).unwrap();
    let layer = editor
        .layer_for_category(ItemCategory::Plot, "plot-standard")
        .unwrap();
    for &(id, x, y) in cells {
        let item = NewItem::new(
            "plot-standard",
            ItemCategory::Plot,
            layer.clone(),
            Bounds::new(x, y, 10.0, 10.0),
        )
        .with_id(id);
        editor.place_item(item, CollisionPolicy::Reject).unwrap();
    }
    editor.into_map()
}

fn activation<'conn>(
    conn: &'conn Connection,
    config: &EngineConfig,
) -> MapActivation<SqliteMapRepository<'conn>, SqlitePlotRepository<'conn>> {
    MapActivation::new(
        MapService::new(SqliteMapRepository::try_new(conn).unwrap()),
        OwnershipLedger::new(SqlitePlotRepository::try_new(conn).unwrap(), config),
    )
}

fn save_and_activate(conn: &Connection, config: &EngineConfig, map: &MapData) -> (MapId, ActivationReport) {
    let activation = activation(conn, config);
    let record = activation.maps().save_map(map).unwrap();
    let report = activation.activate(record.id).unwrap();
    (record.id, report)
}

fn ledger<'conn>(conn: &'conn Connection, config: &EngineConfig) -> OwnershipLedger<SqlitePlotRepository<'conn>> {
    OwnershipLedger::new(SqlitePlotRepository::try_new(conn).unwrap(), config)
}

fn owned_ids(ledger: &OwnershipLedger<SqlitePlotRepository<'_>>, account: &str) -> Vec<String> {
    ledger
        .owned_plots(account)
        .unwrap()
        .into_iter()
        .map(|plot| plot.id)
        .collect()
}

#[test]
fn activation_lists_declared_plots_with_defaults() {
    let conn = open_db_in_memory().unwrap();
    let config = EngineConfig::for_testing();
    let (map_id, report) = save_and_activate(&conn, &config, &plot_map(&ROW[..3]));
    assert_eq!(report.reconcile.inserted, 3);

    let ledger = ledger(&conn, &config);
    let available = ledger.available_plots(map_id).unwrap();
    assert_eq!(available.len(), 3);
    assert_eq!(available[0].id, "a");
    assert_eq!(available[0].name, "Plot a");
    assert_eq!(available[0].price, 100.0);
    assert_eq!(available[0].position, Bounds::new(0.0, 0.0, 10.0, 10.0));
    assert!(available.iter().all(|plot| plot.owner_id.is_none()));
}

#[test]
fn single_plot_purchase_records_one_transaction_and_no_set() {
    let conn = open_db_in_memory().unwrap();
    let config = EngineConfig::for_testing();
    save_and_activate(&conn, &config, &plot_map(ROW));
    let ledger = ledger(&conn, &config);

    let request = PurchaseRequest::new("alice", ["a"])
        .acting_as("admin")
        .with_house("cottage", "#ff0000");
    let receipt = ledger.purchase(&request).unwrap();

    assert_eq!(receipt.plot_set_id, None);
    let plot = &receipt.plots[0];
    assert_eq!(plot.status, PlotStatus::Owned);
    assert_eq!(plot.owner_id.as_deref(), Some("alice"));
    assert_eq!(plot.house_type.as_deref(), Some("cottage"));

    let history = ledger.transactions("a").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, TransactionType::Purchase);
    assert_eq!(history[0].new_owner_id.as_deref(), Some("alice"));
    assert_eq!(history[0].acting_user_id, "admin");
    assert_eq!(history[0].price, Some(100.0));
    assert!(ledger.plot_sets("alice").unwrap().is_empty());
}

#[test]
fn purchase_over_the_limit_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let config = EngineConfig::for_testing();
    assert_eq!(config.max_plots_per_account, 4);
    save_and_activate(&conn, &config, &plot_map(ROW));
    let ledger = ledger(&conn, &config);

    ledger
        .purchase(&PurchaseRequest::new("alice", ["a", "b", "c"]))
        .unwrap();
    let sets_before = ledger.plot_sets("alice").unwrap();

    let err = ledger
        .purchase(&PurchaseRequest::new("alice", ["d", "e"]))
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::LimitExceeded {
            owned: 3,
            requested: 2,
            limit: 4
        }
    ));

    assert_eq!(owned_ids(&ledger, "alice"), vec!["a", "b", "c"]);
    assert!(ledger.plot("d").unwrap().is_available());
    assert!(ledger.plot("e").unwrap().is_available());
    assert!(ledger.transactions("d").unwrap().is_empty());
    assert_eq!(ledger.plot_sets("alice").unwrap(), sets_before);
}

#[test]
fn connectivity_follows_the_configured_threshold() {
    let cells = [("a", 0.0, 0.0), ("b", 50.0, 0.0)];

    let conn = open_db_in_memory().unwrap();
    let strict = EngineConfig {
        adjacency_threshold: 25.0,
        ..EngineConfig::for_testing()
    };
    save_and_activate(&conn, &strict, &plot_map(&cells));
    let err = ledger(&conn, &strict)
        .purchase(&PurchaseRequest::new("alice", ["a", "b"]))
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotConnected));
    assert!(ledger(&conn, &strict).plot("a").unwrap().is_available());

    let conn = open_db_in_memory().unwrap();
    let relaxed = EngineConfig {
        adjacency_threshold: 30.0,
        ..EngineConfig::for_testing()
    };
    save_and_activate(&conn, &relaxed, &plot_map(&cells));
    let ledger = ledger(&conn, &relaxed);
    let receipt = ledger
        .purchase(&PurchaseRequest::new("alice", ["a", "b"]))
        .unwrap();

    let set_id = receipt.plot_set_id.unwrap();
    let set = ledger.plot_set(set_id).unwrap().unwrap();
    assert!(set.name.starts_with("Plot Set "));
    assert_eq!(set.owner_id, "alice");
    assert_eq!(set.member_plot_ids.len(), 2);
    assert!(receipt
        .plots
        .iter()
        .all(|plot| plot.plot_set_id == Some(set_id)));
    assert_eq!(receipt.transactions.len(), 2);
}

#[test]
fn later_purchases_must_touch_existing_holdings() {
    let conn = open_db_in_memory().unwrap();
    let config = EngineConfig::for_testing();
    save_and_activate(&conn, &config, &plot_map(ROW));
    let ledger = ledger(&conn, &config);

    ledger.purchase(&PurchaseRequest::new("alice", ["a"])).unwrap();

    let err = ledger
        .purchase(&PurchaseRequest::new("alice", ["far"]))
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotAdjacentToExisting(ref id) if id == "far"));

    // A newcomer may start anywhere.
    ledger.purchase(&PurchaseRequest::new("bob", ["far"])).unwrap();
    ledger.purchase(&PurchaseRequest::new("alice", ["b"])).unwrap();
    assert_eq!(owned_ids(&ledger, "alice"), vec!["a", "b"]);
}

#[test]
fn guards_report_in_a_fixed_order() {
    let conn = open_db_in_memory().unwrap();
    let config = EngineConfig::for_testing();
    save_and_activate(&conn, &config, &plot_map(ROW));
    let ledger = ledger(&conn, &config);

    assert!(matches!(
        ledger.purchase(&PurchaseRequest::new("alice", Vec::<String>::new())),
        Err(LedgerError::EmptyPurchase)
    ));
    assert!(matches!(
        ledger.purchase(&PurchaseRequest::new("alice", ["a", "a"])),
        Err(LedgerError::DuplicatePlot(_))
    ));
    assert!(matches!(
        ledger.purchase(&PurchaseRequest::new("alice", ["missing"])),
        Err(LedgerError::PlotNotFound(_))
    ));

    ledger
        .purchase(&PurchaseRequest::new("alice", ["a", "b", "c", "d"]))
        .unwrap();
    // Already owned wins over the limit.
    assert!(matches!(
        ledger.purchase(&PurchaseRequest::new("alice", ["d"])),
        Err(LedgerError::AlreadyOwned(_))
    ));
    // The limit wins over adjacency.
    assert!(matches!(
        ledger.purchase(&PurchaseRequest::new("alice", ["far"])),
        Err(LedgerError::LimitExceeded { .. })
    ));
    assert!(matches!(
        ledger.purchase(&PurchaseRequest::new("bob", ["a"])),
        Err(LedgerError::AlreadyOwned(ref id)) if id == "a"
    ));
}

#[test]
fn selling_releases_the_plot_and_retires_the_emptied_set() {
    let conn = open_db_in_memory().unwrap();
    let config = EngineConfig::for_testing();
    save_and_activate(&conn, &config, &plot_map(ROW));
    let ledger = ledger(&conn, &config);

    let receipt = ledger
        .purchase(&PurchaseRequest::new("alice", ["a", "b"]).with_house("villa", "#00ff00"))
        .unwrap();
    let set_id = receipt.plot_set_id.unwrap();

    assert!(matches!(
        ledger.sell("a", "bob", "bob"),
        Err(LedgerError::NotOwner(_))
    ));

    let sale = ledger.sell("a", "alice", "alice").unwrap();
    assert_eq!(sale.kind, TransactionType::Sale);
    assert_eq!(sale.previous_owner_id.as_deref(), Some("alice"));
    assert_eq!(sale.new_owner_id, None);
    assert_eq!(sale.price, Some(100.0));

    let released = ledger.plot("a").unwrap();
    assert_eq!(released.status, PlotStatus::Available);
    assert_eq!(released.owner_id, None);
    assert_eq!(released.plot_set_id, None);
    assert_eq!(released.house_type, None);
    assert_eq!(ledger.plot_sets("alice").unwrap().len(), 1);

    ledger.sell("b", "alice", "alice").unwrap();
    assert!(ledger.plot_sets("alice").unwrap().is_empty());
    let retired = ledger.plot_set(set_id).unwrap().unwrap();
    assert!(retired.deleted_at.is_some());
    assert!(retired.member_plot_ids.is_empty());

    let history = ledger.transactions("a").unwrap();
    let kinds: Vec<TransactionType> = history.iter().map(|entry| entry.kind).collect();
    assert_eq!(kinds, vec![TransactionType::Sale, TransactionType::Purchase]);

    ledger.purchase(&PurchaseRequest::new("bob", ["a"])).unwrap();
    assert_eq!(ledger.transactions("a").unwrap().len(), 3);
}

#[test]
fn only_the_owner_can_change_the_house() {
    let conn = open_db_in_memory().unwrap();
    let config = EngineConfig::for_testing();
    save_and_activate(&conn, &config, &plot_map(ROW));
    let ledger = ledger(&conn, &config);
    ledger.purchase(&PurchaseRequest::new("alice", ["a"])).unwrap();

    let plot = ledger
        .update_house("a", "alice", Some("tower"), Some("#123456"))
        .unwrap();
    assert_eq!(plot.house_type.as_deref(), Some("tower"));
    assert_eq!(plot.house_color.as_deref(), Some("#123456"));

    assert!(matches!(
        ledger.update_house("a", "bob", Some("shed"), None),
        Err(LedgerError::NotOwner(_))
    ));
    assert!(matches!(
        ledger.update_house("b", "alice", Some("shed"), None),
        Err(LedgerError::NotOwner(_))
    ));
    assert_eq!(ledger.plot("a").unwrap().house_type.as_deref(), Some("tower"));
}

#[test]
fn adjacent_available_plots_exclude_far_and_owned_cells() {
    let conn = open_db_in_memory().unwrap();
    let config = EngineConfig::for_testing();
    save_and_activate(&conn, &config, &plot_map(ROW));
    let ledger = ledger(&conn, &config);
    ledger.purchase(&PurchaseRequest::new("bob", ["b"])).unwrap();

    let ids: Vec<String> = ledger
        .adjacent_available_plots("c")
        .unwrap()
        .into_iter()
        .map(|plot| plot.id)
        .collect();
    assert!(ids.contains(&"d".to_string()));
    assert!(!ids.contains(&"b".to_string()));
    assert!(!ids.contains(&"c".to_string()));
    assert!(!ids.contains(&"far".to_string()));
}

#[test]
fn switching_maps_archives_and_revives_plots_but_keeps_owners() {
    let conn = open_db_in_memory().unwrap();
    let config = EngineConfig::for_testing();
    let (first, _) = save_and_activate(&conn, &config, &plot_map(&[("a", 0.0, 0.0), ("b", 10.0, 0.0)]));
    ledger(&conn, &config)
        .purchase(&PurchaseRequest::new("alice", ["a"]))
        .unwrap();

    let (second, report) = save_and_activate(&conn, &config, &plot_map(&[("c", 0.0, 20.0)]));
    assert_eq!(report.reconcile.inserted, 1);
    assert_eq!(report.archived_elsewhere, 1);

    let ledger = ledger(&conn, &config);
    assert_eq!(ledger.plot("a").unwrap().status, PlotStatus::Owned);
    assert_eq!(ledger.plot("b").unwrap().status, PlotStatus::Archived);
    assert!(matches!(
        ledger.purchase(&PurchaseRequest::new("bob", ["b"])),
        Err(LedgerError::PlotNotFound(_))
    ));
    assert_eq!(ledger.available_plots(second).unwrap().len(), 1);

    let report = activation(&conn, &config).activate(first).unwrap();
    assert_eq!(report.reconcile.revived, 1);
    assert_eq!(report.reconcile.skipped_owned, 1);
    assert_eq!(report.archived_elsewhere, 1);
    assert_eq!(ledger.plot("b").unwrap().status, PlotStatus::Available);
    assert_eq!(ledger.plot("c").unwrap().status, PlotStatus::Archived);

    // Re-running activation converges.
    let again = activation(&conn, &config).activate(first).unwrap();
    assert_eq!(again.reconcile.refreshed, 1);
    assert_eq!(again.reconcile.revived, 0);
    assert_eq!(again.archived_elsewhere, 0);
}

#[test]
fn selling_always_returns_the_plot_to_available() {
    let conn = open_db_in_memory().unwrap();
    let config = EngineConfig::for_testing();
    let maps = MapService::new(SqliteMapRepository::try_new(&conn).unwrap());
    let ledger = ledger(&conn, &config);

    // Reconciled without activating the map.
    let record = maps.save_map(&plot_map(&[("a", 0.0, 0.0)])).unwrap();
    ledger
        .reconcile_map_activation(record.id, &record.map_data.items)
        .unwrap();
    ledger.purchase(&PurchaseRequest::new("alice", ["a"])).unwrap();
    ledger.sell("a", "alice", "alice").unwrap();
    assert_eq!(ledger.plot("a").unwrap().status, PlotStatus::Available);
    ledger.purchase(&PurchaseRequest::new("bob", ["a"])).unwrap();

    // Sold after another map became active; archived by the next switch.
    let (other, _) = save_and_activate(&conn, &config, &plot_map(&[("z", 0.0, 0.0)]));
    ledger.sell("a", "bob", "bob").unwrap();
    assert_eq!(ledger.plot("a").unwrap().status, PlotStatus::Available);

    let report = activation(&conn, &config).activate(other).unwrap();
    assert_eq!(report.archived_elsewhere, 1);
    assert_eq!(ledger.plot("a").unwrap().status, PlotStatus::Archived);
}

#[test]
fn activating_an_unknown_map_changes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let config = EngineConfig::for_testing();
    let (map_id, _) = save_and_activate(&conn, &config, &plot_map(&[("a", 0.0, 0.0)]));

    let activation = activation(&conn, &config);
    assert!(matches!(
        activation.activate(Uuid::new_v4()),
        Err(ActivationError::Map(MapServiceError::MapNotFound(_)))
    ));
    assert_eq!(activation.maps().active_map().unwrap().unwrap().id, map_id);
    assert_eq!(activation.ledger().plot("a").unwrap().status, PlotStatus::Available);
}

#[test]
fn edited_map_reactivation_archives_removed_plots() {
    let conn = open_db_in_memory().unwrap();
    let config = EngineConfig::for_testing();
    let (map_id, _) = save_and_activate(&conn, &config, &plot_map(&[("a", 0.0, 0.0), ("b", 10.0, 0.0)]));

    let activation = activation(&conn, &config);
    let mut map = activation.maps().get_map(map_id).unwrap().map_data;
    map.items.retain(|item| item.id != "b");
    activation.maps().save_map(&map).unwrap();
    let report = activation.activate(map_id).unwrap();

    assert_eq!(report.reconcile.archived, 1);
    assert_eq!(report.reconcile.refreshed, 1);
    assert_eq!(
        activation.ledger().plot("b").unwrap().status,
        PlotStatus::Archived
    );
}

#[test]
fn racing_buyers_cannot_both_own_a_plot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.db");
    let config = EngineConfig::for_testing();
    {
        let conn = open_db_with_timeout(&path, Duration::from_secs(5)).unwrap();
        save_and_activate(&conn, &config, &plot_map(ROW));
    }

    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = ["alice", "bob"]
        .into_iter()
        .map(|account| {
            let barrier = Arc::clone(&barrier);
            let path = path.clone();
            let config = config.clone();
            thread::spawn(move || {
                let conn = open_db_with_timeout(&path, Duration::from_secs(5)).unwrap();
                let ledger = ledger(&conn, &config);
                barrier.wait();
                ledger.purchase(&PurchaseRequest::new(account, ["a"]))
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();
    let successes = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(results
        .iter()
        .any(|result| matches!(result, Err(LedgerError::AlreadyOwned(_)))));

    let conn = open_db_with_timeout(&path, Duration::from_secs(5)).unwrap();
    let ledger = ledger(&conn, &config);
    let history = ledger.transactions("a").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, TransactionType::Purchase);
}

#[test]
fn concurrent_activations_leave_one_consistent_map() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("switch.db");
    let config = EngineConfig::for_testing();
    let (west, east) = {
        let conn = open_db_with_timeout(&path, Duration::from_secs(5)).unwrap();
        let maps = MapService::new(SqliteMapRepository::try_new(&conn).unwrap());
        let west = maps
            .save_map(&plot_map(&[("w1", 0.0, 0.0), ("w2", 10.0, 0.0)]))
            .unwrap();
        let east = maps
            .save_map(&plot_map(&[("e1", 0.0, 20.0), ("e2", 10.0, 20.0)]))
            .unwrap();
        (west.id, east.id)
    };

    for _ in 0..5 {
        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = [west, east]
            .into_iter()
            .map(|map_id| {
                let barrier = Arc::clone(&barrier);
                let path = path.clone();
                let config = config.clone();
                thread::spawn(move || {
                    let conn = open_db_with_timeout(&path, Duration::from_secs(5)).unwrap();
                    let activation = activation(&conn, &config);
                    barrier.wait();
                    activation.activate(map_id).map(|report| report.map_id)
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let conn = open_db_with_timeout(&path, Duration::from_secs(5)).unwrap();
        let activation = activation(&conn, &config);
        let active = activation.maps().active_map().unwrap().unwrap().id;
        let inactive = if active == west { east } else { west };
        assert_eq!(activation.ledger().available_plots(active).unwrap().len(), 2);
        assert!(activation.ledger().available_plots(inactive).unwrap().is_empty());
    }
}

#[test]
fn lock_contention_surfaces_as_storage_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("busy.db");
    let config = EngineConfig::for_testing();
    {
        let conn = open_db_with_timeout(&path, Duration::from_secs(5)).unwrap();
        save_and_activate(&conn, &config, &plot_map(&[("a", 0.0, 0.0)]));
    }

    let conn = open_db_with_timeout(&path, Duration::from_millis(50)).unwrap();
    let ledger = ledger(&conn, &config);
    let maps = MapService::new(SqliteMapRepository::try_new(&conn).unwrap());

    let holder = open_db_with_timeout(&path, Duration::from_secs(5)).unwrap();
    holder.execute_batch("BEGIN IMMEDIATE;").unwrap();

    assert!(matches!(
        ledger.purchase(&PurchaseRequest::new("alice", ["a"])),
        Err(LedgerError::StorageUnavailable(_))
    ));
    assert!(matches!(
        maps.save_map(&MapData::new("Blocked", 50.0, 50.0)),
        Err(MapServiceError::StorageUnavailable(_))
    ));

    holder.execute_batch("ROLLBACK;").unwrap();
    ledger.purchase(&PurchaseRequest::new("alice", ["a"])).unwrap();
    assert_eq!(ledger.plot("a").unwrap().status, PlotStatus::Owned);
}
