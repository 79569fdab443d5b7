//! Headless bot runner.
//!
//! Opens tables through a `TableManager`, seats bots at them and lets the
//! table actors deal hands until every table has played its quota or run
//! out of players.

mod bot;
mod config;
mod decision;

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::Error;
use casino_poker::{TableManager, entities::Phase, table::TableId};
use ctrlc::set_handler;
use log::{error, info, warn};
use pico_args::Arguments;
use tokio::task::JoinHandle;

use crate::{bot::Bot, config::BotsConfig, decision::BotStyle};

const HELP: &str = "\
Fill casino poker tables with bots and play hands

USAGE:
  cp_bots [OPTIONS]

OPTIONS:
  --tables     N           Number of tables to open    [default: env BOT_TABLES or 1]
  --bots       N           Bots seated at each table   [default: env BOTS_PER_TABLE or 6]
  --hands      N           Hands to play per table     [default: env TARGET_HANDS or 50]
  --seed       N           Seed tables and bots for a reproducible run

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  TABLE_SMALL_BLIND        Small blind                 [default: 10]
  TABLE_BIG_BLIND          Big blind                   [default: 20]
  TABLE_STARTING_CHIPS     Stack each bot sits with    [default: 1000]
  TURN_TIMEOUT_MS          Time a bot has to act       [default: 2000]
  BOT_STALL_CHANCE         Chance a bot lets its timer run out [default: 0.02]
  RUST_LOG                 Log filter (e.g. info, cp_bots=debug)
  (See README.md for all configuration options)
";

/// How often the runner checks on its tables
const POLL_INTERVAL: Duration = Duration::from_millis(250);

struct Args {
    num_tables: Option<usize>,
    bots: Option<usize>,
    hands: Option<u32>,
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        num_tables: pargs.opt_value_from_str("--tables")?,
        bots: pargs.opt_value_from_str("--bots")?,
        hands: pargs.opt_value_from_str("--hands")?,
        seed: pargs.opt_value_from_str("--seed")?,
    };

    let config = BotsConfig::from_env(args.num_tables, args.bots, args.hands, args.seed);
    config.validate()?;

    // Catching signals for exit.
    let stop = Arc::new(AtomicBool::new(false));
    let stop_flag = stop.clone();
    set_handler(move || stop_flag.store(true, Ordering::SeqCst))?;

    env_logger::builder().format_target(false).init();
    info!(
        "Starting {} table(s) with {} bots each, {} hands per table",
        config.num_tables, config.bots_per_table, config.target_hands
    );

    let manager = Arc::new(TableManager::new(config.table.clone()));
    let mut tables = Vec::with_capacity(config.num_tables);
    let mut bots: Vec<JoinHandle<()>> = Vec::new();

    for index in 0..config.num_tables {
        let table_id = manager.create_table(config.table_config(index)).await?;
        info!("Created table {} with ID {}", index + 1, table_id);
        tables.push(table_id);

        for seat in 0..config.bots_per_table {
            let player_id = table_id * 100 + seat as i64 + 1;
            let style = BotStyle::ALL[seat % BotStyle::ALL.len()];
            let bot = Bot::new(
                player_id,
                table_id,
                style,
                config.equity_iterations,
                config.stall_chance,
                config.think_time_ms,
                config.seed,
            );
            match bot.sit_down(&manager).await {
                Ok(inbox) => bots.push(tokio::spawn(bot.run(manager.clone(), inbox))),
                Err(e) => error!("Failed to seat bot {}: {}", player_id, e),
            }
        }
    }

    info!("Bots are playing. Press Ctrl+C to stop.");
    let mut remaining = tables;
    while !remaining.is_empty() {
        if stop.load(Ordering::SeqCst) {
            info!("Interrupted, closing {} table(s)", remaining.len());
            for table_id in remaining.drain(..) {
                finish_table(&manager, table_id).await;
            }
            break;
        }
        tokio::time::sleep(POLL_INTERVAL).await;

        let mut still_running = Vec::with_capacity(remaining.len());
        for table_id in remaining {
            if is_done(&manager, table_id, config.target_hands).await {
                finish_table(&manager, table_id).await;
            } else {
                still_running.push(table_id);
            }
        }
        remaining = still_running;
    }

    for handle in bots {
        if let Err(e) = handle.await {
            warn!("Bot task failed: {}", e);
        }
    }
    manager.prune_closed().await;
    info!("All tables closed");

    Ok(())
}

/// A table is done once it has finished on its own, or has played its
/// quota and no hand is in progress.
async fn is_done(manager: &TableManager, table_id: TableId, target_hands: u32) -> bool {
    match manager.get_table_state(table_id).await {
        Ok(state) => {
            state.phase == Phase::Finished
                || (state.hand_number >= target_hands && !state.phase.is_betting())
        }
        // Closed already, nothing left to wait for.
        Err(_) => true,
    }
}

/// Log the final stacks and close the table
async fn finish_table(manager: &TableManager, table_id: TableId) {
    match manager.get_view(table_id, None).await {
        Ok(view) => {
            info!(
                "Table {} done after {} hand(s):",
                table_id, view.hand_number
            );
            let mut players = view.players;
            players.sort_by(|a, b| b.chips.cmp(&a.chips));
            for player in players {
                info!("  - {}: ${}", player.name, player.chips);
            }
        }
        Err(e) => warn!("Couldn't read table {} before closing: {}", table_id, e),
    }

    if let Err(e) = manager.close_table(table_id).await {
        error!("Failed to close table {}: {}", table_id, e);
    }
}
