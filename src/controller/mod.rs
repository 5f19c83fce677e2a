use std::path::PathBuf;

use log::{debug, error, info, warn};

use crate::aggregate::filter_entries;
use crate::command::{self, Command, ExportScope, USAGE};
use crate::entry::{parse_entry, Entry, Field, FORMAT_HINT};
use crate::export::{ExportError, Exporter, FILTERED_TABLE_FILE, MAIN_TABLE_FILE};
use crate::ledger::Ledger;
use crate::render::{Renderer, View};
use crate::speech::TranscriptSource;

/// Everything that changes while the shell runs
pub(crate) struct AppState {
    pub(crate) ledger: Ledger,
    pub(crate) filter: String,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Quit,
}

/// Owns the application state. Each mutation is saved, then the renderer gets a fresh view.
pub(crate) struct Controller<R: Renderer> {
    state: AppState,
    renderer: R,
    transcriber: Box<dyn TranscriptSource>,
    exporter: Box<dyn Exporter>,
    export_dir: PathBuf,
}

impl<R: Renderer> Controller<R> {
    pub(crate) fn new(ledger: Ledger, renderer: R, transcriber: Box<dyn TranscriptSource>,
                      exporter: Box<dyn Exporter>, export_dir: PathBuf) -> Controller<R> {
        Controller {
            state: AppState { ledger, filter: String::new() },
            renderer,
            transcriber,
            exporter,
            export_dir,
        }
    }

    /// Parse and run one line typed into the shell
    pub(crate) fn run_command(&mut self, line: &str) -> Flow {
        let command = match command::parse(line) {
            Ok(command) => command,
            Err(e) => {
                self.renderer.notify(&e.to_string());
                return Flow::Continue;
            }
        };
        debug!("{command:?}");

        match command {
            Command::Add(text) => {
                self.add_entry(&text);
            }
            Command::Voice => {
                self.capture_voice();
            }
            Command::Edit(id, field, value) => {
                self.edit_entry(id, field, &value);
            }
            Command::Delete(id) => {
                self.delete_entry(id);
            }
            Command::Filter(token) => self.set_filter(&token),
            Command::ClearFilter => self.set_filter(""),
            Command::Show => self.refresh(),
            Command::Export(scope, file_path) => {
                match self.export(scope, file_path) {
                    Ok(destination) => self.renderer.notify(&format!("Exported to {}", destination.display())),
                    Err(e) => self.renderer.notify(&e.to_string()),
                }
            }
            Command::Help => self.renderer.notify(USAGE),
            Command::Quit => return Flow::Quit,
        }

        Flow::Continue
    }

    /// Add an entry from free text. Returns the new id, or None when nothing was added.
    pub(crate) fn add_entry(&mut self, text: &str) -> Option<u32> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        match parse_entry(text) {
            Ok(parsed) => {
                let id = self.state.ledger.add(parsed);
                info!("Added entry {id}");
                self.commit();
                Some(id)
            }
            Err(e) => {
                debug!("Rejected '{text}': {e}");
                self.renderer.notify(FORMAT_HINT);
                None
            }
        }
    }

    pub(crate) fn edit_entry(&mut self, id: u32, field: Field, value: &str) -> bool {
        if self.state.ledger.update_field(id, field, value) {
            info!("Updated {field} of entry {id}");
            self.commit();
            true
        } else {
            warn!("Edit of unknown entry {id} ignored");
            self.renderer.notify(&format!("No entry with id {id}"));
            false
        }
    }

    /// Remove an entry. An unknown id leaves the ledger untouched.
    pub(crate) fn delete_entry(&mut self, id: u32) -> bool {
        if self.state.ledger.delete(id) {
            info!("Deleted entry {id}");
            self.commit();
            true
        } else {
            warn!("Delete of unknown entry {id} ignored");
            self.renderer.notify(&format!("No entry with id {id}"));
            false
        }
    }

    pub(crate) fn set_filter(&mut self, token: &str) {
        self.state.filter = token.to_string();
        self.refresh();
    }

    /// Take one transcript from the recogniser and add it like typed input
    pub(crate) fn capture_voice(&mut self) -> Option<u32> {
        match self.transcriber.capture() {
            Ok(transcript) => {
                self.renderer.notify(&format!("Heard: {transcript}"));
                self.add_entry(&transcript)
            }
            Err(e) => {
                warn!("{e}");
                self.renderer.notify(&e.to_string());
                None
            }
        }
    }

    /// Export the full or the filtered table. Without a path, a default file name in the export directory is used.
    pub(crate) fn export(&self, scope: ExportScope, file_path: Option<String>) -> Result<PathBuf, ExportError> {
        let entries = self.state.ledger.entries();
        let (rows, default_file): (Vec<&Entry>, &str) = match scope {
            ExportScope::All => (entries.iter().collect(), MAIN_TABLE_FILE),
            ExportScope::Filtered => (filter_entries(entries, &self.state.filter), FILTERED_TABLE_FILE),
        };

        let destination = match file_path {
            Some(file_path) => PathBuf::from(file_path),
            None => self.export_dir.join(default_file),
        };
        self.exporter.export(&rows, &destination)?;
        Ok(destination)
    }

    /// Redraw everything from the current state
    pub(crate) fn refresh(&mut self) {
        let view = View::new(self.state.ledger.entries(), &self.state.filter);
        self.renderer.render(&view);
    }

    fn commit(&mut self) {
        if let Err(e) = self.state.ledger.save() {
            error!("{e}");
            self.renderer.notify(&format!("Changes are kept in memory only: {e}"));
        }
        self.refresh();
    }
}
