//! CLI entry point for the grocery list core.
//!
//! # Responsibility
//! - Verify `grocery_core` linkage (`ping`).
//! - Drive the item store from a shell against a database file.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use grocery_core::{
    default_log_level, format_due_date, init_logging, open_list_controller, parse_due_date, Item,
    ItemId, ItemPatch, SqliteListController,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

const DB_FILE_NAME: &str = "grocery_list.sqlite3";

#[derive(Parser)]
#[command(name = "grocery", version, about = "Shared grocery list on the command line")]
struct Cli {
    /// SQLite file holding the list (defaults to the temp directory)
    #[arg(long, global = true, env = "GROCERY_DB_PATH")]
    db: Option<PathBuf>,

    /// Directory for rolling log files; logging is off when unset
    #[arg(long, global = true, env = "GROCERY_LOG_DIR")]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the core probe
    Ping,
    /// Show all items
    List,
    /// Add an item
    Add {
        title: String,
        /// Due date as YYYY-MM-DD
        #[arg(value_parser = parse_date)]
        due: Option<NaiveDate>,
    },
    /// Flip completion
    Toggle { id: ItemId },
    /// Change the title
    Rename { id: ItemId, title: String },
    /// Set the due date, or clear it with `none`
    Due {
        id: ItemId,
        #[arg(value_parser = parse_due_change)]
        due: DueChange,
    },
    /// Delete one or more items
    Delete {
        #[arg(required = true)]
        ids: Vec<ItemId>,
    },
    /// Delete every item
    Clear,
    /// Add starter items to an empty list
    Seed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DueChange {
    Set(NaiveDate),
    Clear,
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(default_log_level(), log_dir)?;
    }

    let command = match cli.command {
        None | Some(Command::Ping) => {
            print_probe();
            return Ok(());
        }
        Some(command) => command,
    };

    let mut controller = open_list_controller(resolve_db_path(cli.db))?;
    match command {
        Command::Ping | Command::List => {}
        Command::Add { title, due } => {
            controller
                .add_item(&title, due)
                .map_err(|err| err.to_string())?;
        }
        Command::Toggle { id } => {
            controller
                .toggle_completed(id)
                .map_err(|err| err.to_string())?;
        }
        Command::Rename { id, title } => {
            controller
                .update_item(id, &ItemPatch::title(title))
                .map_err(|err| err.to_string())?;
        }
        Command::Due { id, due } => {
            let due = match due {
                DueChange::Set(date) => Some(date),
                DueChange::Clear => None,
            };
            controller
                .update_item(id, &ItemPatch::due_date(due))
                .map_err(|err| err.to_string())?;
        }
        Command::Delete { ids } => {
            let ids: HashSet<ItemId> = ids.into_iter().collect();
            let deleted = controller
                .delete_many(&ids)
                .map_err(|err| err.to_string())?;
            if deleted < ids.len() {
                println!("deleted {deleted} of {} item(s)", ids.len());
            }
        }
        Command::Clear => {
            controller.request_clear_all();
            let deleted = controller
                .confirm_clear_all()
                .map_err(|err| err.to_string())?;
            println!("deleted {deleted} item(s)");
        }
        Command::Seed => {
            controller
                .seed_starter_items()
                .map_err(|err| err.to_string())?;
        }
    }

    print_list(&controller);
    Ok(())
}

fn print_probe() {
    println!("grocery_core ping={}", grocery_core::ping());
    println!("grocery_core version={}", grocery_core::core_version());
}

fn print_list(controller: &SqliteListController) {
    if controller.items().is_empty() {
        println!("Empty cart. Run `grocery seed` or `grocery add <title>`.");
        return;
    }
    for item in controller.items() {
        println!("{}", format_item(item));
    }
}

fn format_item(item: &Item) -> String {
    let mark = if item.is_completed { "x" } else { " " };
    match item.due_date {
        Some(due) => format!(
            "[{mark}] {}  (due {})  {}",
            item.title,
            format_due_date(due),
            item.id
        ),
        None => format!("[{mark}] {}  {}", item.title, item.id),
    }
}

fn resolve_db_path(flag: Option<PathBuf>) -> PathBuf {
    flag.filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME))
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    parse_due_date(raw.trim()).ok_or_else(|| format!("invalid date `{raw}`; expected YYYY-MM-DD"))
}

fn parse_due_change(raw: &str) -> Result<DueChange, String> {
    if raw.trim().eq_ignore_ascii_case("none") {
        return Ok(DueChange::Clear);
    }
    parse_date(raw).map(DueChange::Set)
}
