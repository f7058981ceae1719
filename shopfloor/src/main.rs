//! Command line entry point
//!
//! Loads a seed file into the in-memory store and runs one lifecycle command
//! against it, printing the result as JSON. Writes only outlive the run with
//! `--save`, which stores the tables back into the seed file. `watch` keeps
//! the poller running until Ctrl+C or the tick budget is spent.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::signal;

use shared::{logging, logging::Component, shop_debug, shop_info, CompletionAction, OperationId};
use shopfloor::{
    services::{InMemoryShopStore, SeedData},
    Poller, ShopContext, ShopFloor, ShopFloorConfig,
};

/// Shop-floor operation lifecycle tool
#[derive(Parser)]
#[command(name = "shopfloor")]
#[command(about = "Assigns operations to machines, tracks completion and recommends work for idle machines")]
pub struct Args {
    /// Seed file with machines, orders, operations, shift records and documents.
    /// Changes are discarded at exit unless --save is given.
    #[arg(long)]
    pub seed: PathBuf,

    /// Write the store back into the seed file after the command
    #[arg(long)]
    pub save: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Poller interval in seconds (overrides SHOPFLOOR_POLL_INTERVAL_SECS)
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Reject incompatible machine/operation pairs on assign
    #[arg(long)]
    pub enforce_compatibility: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Recommend operations for an idle machine
    Plan { machine: String },
    /// Completion state of a machine's current operation
    Check { machine: String },
    /// Assign an operation to a machine
    Assign { machine: String, operation: u64 },
    /// Act on a completion prompt (complete, continue, plan_new)
    Complete { machine: String, action: String },
    /// Take an operation off a machine
    Unassign { machine: String, operation: u64 },
    /// List active operations that reached their target
    Scan,
    /// Repair drift between machines and operations
    Reconcile,
    /// Run detection and reconciliation periodically
    Watch {
        /// Stop after this many passes (runs until Ctrl+C if not specified)
        #[arg(long)]
        ticks: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));

    let mut config = ShopFloorConfig::from_env()?;
    if let Some(secs) = args.poll_interval {
        config = config.with_poll_interval_secs(secs)?;
    }
    if args.enforce_compatibility {
        config.enforce_compatibility_on_assign = true;
    }
    shop_debug!(Component::Cli, "Configuration: {:?}", config);

    let seed = SeedData::load(&args.seed)
        .await
        .with_context(|| format!("failed to load seed {}", args.seed.display()))?;
    let store = Arc::new(InMemoryShopStore::new());
    seed.apply(&store).await?;

    let context = ShopContext::in_memory(store.clone())
        .with_documents(Arc::new(seed.document_source()))
        .with_config(config);
    let shop_floor = ShopFloor::new(context);

    match args.command {
        Command::Plan { machine } => print_json(&shop_floor.plan_operations_for_machine(&machine).await?)?,
        Command::Check { machine } => print_json(&shop_floor.check_operation_completion(&machine).await?)?,
        Command::Assign { machine, operation } => {
            print_json(&shop_floor.assign_operation(&machine, OperationId(operation)).await?)?
        }
        Command::Complete { machine, action } => {
            let action: CompletionAction = action.parse()?;
            print_json(&shop_floor.complete_operation(&machine, action).await?)?
        }
        Command::Unassign { machine, operation } => {
            print_json(&shop_floor.unassign_operation(&machine, OperationId(operation)).await?)?
        }
        Command::Scan => print_json(&shop_floor.check_all_active_operations().await?)?,
        Command::Reconcile => print_json(&shop_floor.reconcile().await?)?,
        Command::Watch { ticks } => watch(shop_floor, ticks).await?,
    }

    if args.save {
        SeedData::capture(&store, seed.documents)
            .await?
            .save(&args.seed)
            .await
            .with_context(|| format!("failed to save seed {}", args.seed.display()))?;
        shop_info!(Component::Cli, "💾 Saved {}", args.seed.display());
    }

    Ok(())
}

async fn watch(shop_floor: ShopFloor, ticks: Option<u32>) -> anyhow::Result<()> {
    logging::log_startup(Component::Poller, "shop-floor poller");
    let mut poller = Poller::from_config(shop_floor);

    let shutdown_sender = poller.shutdown_sender();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                logging::log_shutdown(Component::Cli, "Received Ctrl+C signal");
                let _ = shutdown_sender.send(()).await;
            }
            Err(err) => {
                logging::log_error(Component::Cli, "Signal handling", &err);
            }
        }
    });

    let stats = poller.run(ticks).await?;
    shop_info!(Component::Cli, "{:?}", stats);
    logging::log_success(Component::Poller, "Poller stopped gracefully");
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
