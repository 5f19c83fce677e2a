use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::Parser;
use env_logger::Env;
use log::{info, warn};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use crate::config::Config;
use crate::controller::{Controller, Flow};
use crate::editor::LedgerHelper;
use crate::export::CsvExporter;
use crate::ledger::Ledger;
use crate::render::TableRenderer;

mod aggregate;
mod command;
mod common;
mod config;
mod controller;
mod editor;
mod entry;
mod export;
mod ledger;
mod render;
mod speech;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// Ledger file path, defaults to ~/.flatledger/ledger.json
    file: Option<PathBuf>,

    /// Config file path, defaults to ~/.flatledger/config.toml
    #[clap(long)]
    config: Option<PathBuf>,
}

static COMMAND_HISTORY_FILE: &str = ".flatledger_history";
static PROMPT: &str = "> ";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli: Cli = Cli::parse();

    let config = match cli.config.or_else(config::default_config_path) {
        Some(config_path) => Config::load_from_file(&config_path)?,
        None => Config::default(),
    };
    let ledger_path = config.ledger_path(cli.file)
        .ok_or_else(|| anyhow!("No home directory found, pass the ledger file path explicitly"))?;

    let ledger = Ledger::load(&ledger_path);
    if let Some(path) = ledger.file_path() {
        info!("Using ledger {}", path.display());
    }

    let mut controller = Controller::new(
        ledger,
        TableRenderer,
        speech::from_config(&config.speech),
        Box::new(CsvExporter),
        config.export_dir(),
    );
    controller.refresh();

    let mut rl = Editor::<LedgerHelper, DefaultHistory>::new().context("Unable to start line editor")?;
    rl.set_helper(Some(LedgerHelper::new(PROMPT)));
    if rl.load_history(COMMAND_HISTORY_FILE).is_err() {
        println!("No previous history. Type HELP for usage.");
    }

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if let Err(e) = rl.add_history_entry(line) {
                    warn!("Unable to record history: {e}");
                }

                if controller.run_command(line) == Flow::Quit {
                    break;
                }
            },
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break
            },
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break
            },
            Err(err) => {
                println!("Error: {:?}", err);
                break
            }
        }
    }

    if let Err(e) = rl.save_history(COMMAND_HISTORY_FILE) {
        warn!("Unable to save history: {e}");
    }
    Ok(())
}
