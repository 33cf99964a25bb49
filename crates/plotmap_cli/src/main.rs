//! CLI smoke entry point.
//!
//! # Responsibility
//! - Run one end-to-end pass over `plotmap_core`: draw a map, store and
//!   activate it, buy plots, print the ledger.
//! - Keep output deterministic apart from generated ids.
//!
//! Usage: `plotmap_cli [DB_PATH] [--config CONFIG_JSON]`. Without `DB_PATH`
//! the run uses an in-memory database.

use clap::Parser;
use log::info;
use plotmap_core::{
    open_db_in_memory, open_db_with_timeout, EngineConfig, MapActivation,
    MapData, MapEditor, MapService, OwnershipLedger, PurchaseRequest, SqliteMapRepository,
    SqlitePlotRepository,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

const DEMO_ACCOUNT: &str = "demo-account";

#[derive(Parser, Debug)]
#[command(name = "plotmap_cli")]
#[command(about = "Smoke run over the plot map editor and ownership ledger")]
struct Args {
    /// SQLite database file; in-memory when omitted
    db_path: Option<PathBuf>,

    /// Engine configuration JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("plotmap_cli error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn Error>> {
    println!("plotmap_core ping={}", plotmap_core::ping());
    println!("plotmap_core version={}", plotmap_core::core_version());

    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    plotmap_core::init_from_config(&config.logging)?;

    let conn = match &args.db_path {
        Some(path) => open_db_with_timeout(path, config.busy_timeout())?,
        None => open_db_in_memory()?,
    };

    let mut editor = MapEditor::with_config(MapData::new_default(), &config)?;
    let mut plot_ids = Vec::new();
    for x in [0.0, 10.0, 20.0] {
        let id = editor.place_catalog_item("plot-standard", x, 0.0, None, config.collision_policy)?;
        plot_ids.push(id);
    }
    editor.place_catalog_item("street-main", 30.0, 0.0, None, config.collision_policy)?;
    for entry in editor.render_order(false) {
        let world = editor.world_position(&entry.item.id, config.unit_size)?;
        println!(
            "draw type={} depth={:.2} world=({:.1}, {:.1})",
            entry.item.kind, entry.key.depth, world.x, world.z
        );
    }

    let activation = MapActivation::new(
        MapService::new(SqliteMapRepository::try_new(&conn)?),
        OwnershipLedger::new(SqlitePlotRepository::try_new(&conn)?, &config),
    );
    let record = activation.maps().save_map(editor.map())?;
    let report = activation.activate(record.id)?;
    println!(
        "map id={} plots_inserted={} archived={}",
        record.id, report.reconcile.inserted, report.archived_elsewhere
    );

    let request = PurchaseRequest::new(DEMO_ACCOUNT, plot_ids.iter().take(2).cloned())
        .with_house("cottage", "#aa5533");
    let receipt = activation.ledger().purchase(&request)?;
    println!(
        "purchase plots={} plot_set={}",
        receipt.plots.len(),
        receipt
            .plot_set_id
            .map_or_else(|| "none".to_string(), |id| id.to_string())
    );

    for plot in activation.ledger().owned_plots(DEMO_ACCOUNT)? {
        println!("owned id={} name={} price={}", plot.id, plot.name, plot.price);
    }
    for plot in activation.ledger().available_plots(record.id)? {
        println!("available id={} name={}", plot.id, plot.name);
    }
    info!("event=cli_smoke module=cli status=ok");
    Ok(())
}
