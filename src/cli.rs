//! CLI interface for fieldbook.
//!
//! - `fieldbook console` runs the capture conversation in the terminal,
//!   with stdin as the technician's chat and stdout as the bot's replies.
//! - `fieldbook rows` prints what has been saved to the ledger.

mod format;

use std::io::{self, BufRead};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use crate::bot::Bot;
use crate::config::Config;
use crate::gateway::Gateway;
use crate::identity::resolve_user;
use crate::model::{COLUMNS, ChatId, Update};
use crate::storage::{BlobStore, Ledger, Storage};
use crate::transport::{ConsoleTransport, Transport};

use format::{format_row, rows_to_json};

/// Fieldbook: guided field registration.
#[derive(Debug, Parser)]
#[command(name = "fieldbook", after_long_help = CONSOLE_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const CONSOLE_HELP: &str = r"Console input:
  /start  /new  /cancel       commands
  T-100                       free text answers the current step
  @loc -12.05 -77.03          share a location
  @photo ./box.jpg            send a photo from disk
  @tap 1                      press button 1 of the latest keyboard
  @tap confirm:TICKET         press a button by its token";

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a capture conversation in this terminal.
    Console {
        /// Technician id. Falls back to `FIELDBOOK_USER`, then `default-user`.
        #[arg(long = "as")]
        user: Option<i64>,

        /// Chat id to talk on. Defaults to the technician id (a private chat).
        #[arg(long)]
        chat: Option<i64>,
    },

    /// List saved ledger rows, oldest first.
    Rows {
        /// Show at most this many of the most recent rows.
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Print a JSON array of objects keyed by column name.
        #[arg(long)]
        json: bool,
    },
}

pub fn run(config: &Config, storage: Storage) -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::Console { user, chat } => cmd_console(config, storage, user, chat),
        Command::Rows { limit, json } => cmd_rows(&storage, limit, json),
    }
}

fn cmd_console(
    config: &Config,
    storage: Storage,
    user: Option<i64>,
    chat: Option<i64>,
) -> Result<(), String> {
    let user = resolve_user(user, config.default_user)?;
    let chat = chat.map_or(ChatId(user.0), ChatId);

    let storage = Arc::new(storage);
    let console = Arc::new(ConsoleTransport::new(io::stdout()));
    let gateway = Gateway {
        ledger: Arc::clone(&storage) as Arc<dyn Ledger>,
        transport: Arc::clone(&console) as Arc<dyn Transport>,
        supervisors: config.supervisors(),
        time_zone: config.time_zone()?,
    };
    let bot = Bot::new(gateway, storage as Arc<dyn BlobStore>);

    info!(%user, %chat, "console session ready");
    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| format!("failed to read input: {e}"))?;
        match console.parse_line(&line) {
            Ok(Some(inbound)) => bot.handle(Update {
                chat,
                user,
                inbound,
            }),
            Ok(None) => {}
            Err(e) => eprintln!("{e}"),
        }
    }

    if !bot.store().is_empty() {
        warn!(%user, "input closed with a registration in progress; it is discarded");
    }
    Ok(())
}

fn cmd_rows(storage: &Storage, limit: usize, json: bool) -> Result<(), String> {
    let rows = storage
        .list_rows(limit)
        .map_err(|e| format!("failed to read ledger: {e}"))?;

    if json {
        println!("{}", rows_to_json(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No rows");
        return Ok(());
    }

    println!("{}", COLUMNS.join("\t"));
    for row in &rows {
        println!("{}", format_row(row));
    }
    Ok(())
}
