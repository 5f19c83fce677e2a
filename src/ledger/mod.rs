use std::{fmt, fs, io};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::entry::{Entry, Field, ParsedEntry};

#[derive(Debug)]
pub(crate) enum LedgerError {
    Io(io::Error),
    Serialize(serde_json::Error),
}

impl fmt::Display for LedgerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LedgerError::Io(e) => write!(f, "unable to write ledger file: {e}"),
            LedgerError::Serialize(e) => write!(f, "unable to encode ledger: {e}"),
        }
    }
}

impl std::error::Error for LedgerError {}

impl From<io::Error> for LedgerError {
    fn from(e: io::Error) -> Self {
        LedgerError::Io(e)
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialize(e)
    }
}

/// Insertion ordered collection of entries, backed by a single JSON file.
///
/// The file holds the whole sequence as a JSON array and is rewritten in full on every save.
pub(crate) struct Ledger {
    /// Next id to hand out. Always greater than every id in `entries`.
    entry_id_seed: u32,
    entries: Vec<Entry>,
    file_path: Option<PathBuf>,
}

impl Ledger {
    /// An empty ledger. Without a file path nothing is ever written to disk.
    pub(crate) fn new(file_path: Option<PathBuf>) -> Ledger {
        Ledger {
            entry_id_seed: 1,
            entries: vec![],
            file_path,
        }
    }

    /// Load the ledger from `path`. A missing, unreadable or corrupt file gives an empty ledger.
    pub(crate) fn load(path: &Path) -> Ledger {
        let mut ledger = Ledger::new(Some(path.to_path_buf()));
        if !path.exists() {
            info!("No ledger at {}, starting empty", path.display());
            return ledger;
        }

        let entries = match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<Vec<Entry>>(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Ledger file {} is corrupt ({e}), starting empty", path.display());
                    return ledger;
                }
            },
            Err(e) => {
                warn!("Unable to read ledger file {} ({e}), starting empty", path.display());
                return ledger;
            }
        };

        ledger.restore(entries);
        info!("Loaded {} entries from {}", ledger.entries.len(), path.display());
        ledger
    }

    /// Take over previously stored entries, keeping their order.
    /// Entries without an id, or with an id already seen, get a fresh one.
    fn restore(&mut self, entries: Vec<Entry>) {
        let highest = entries.iter().map(|e| e.id).max().unwrap_or(0);

        // Not enough ids left above the highest one, start over from 1
        if u64::from(highest) + entries.len() as u64 >= u64::from(u32::MAX) {
            warn!("Stored entry ids reach {highest}, renumbering all entries");
            self.entries = entries;
            self.renumber();
            return;
        }

        self.entry_id_seed = highest + 1;
        let mut seen = HashSet::new();
        for mut entry in entries {
            if entry.id == 0 || !seen.insert(entry.id) {
                entry.id = self.next_id();
                seen.insert(entry.id);
            }
            self.entries.push(entry);
        }
    }

    /// Give every entry a new id in ledger order, starting at 1
    fn renumber(&mut self) {
        let mut id: u32 = 1;
        for entry in self.entries.iter_mut() {
            entry.id = id;
            id = id.saturating_add(1);
        }
        self.entry_id_seed = id;
    }

    /// Write all entries to disk, replacing the previous content
    pub(crate) fn save(&self) -> Result<(), LedgerError> {
        let Some(file_path) = &self.file_path else {
            return Ok(());
        };

        if let Some(parent) = file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let encoded = serde_json::to_string_pretty(&self.entries)?;
        fs::write(file_path, encoded)?;
        Ok(())
    }

    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub(crate) fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    fn next_id(&mut self) -> u32 {
        if self.entry_id_seed == u32::MAX {
            warn!("Entry ids exhausted, renumbering all entries");
            self.renumber();
        }
        let id = self.entry_id_seed;
        self.entry_id_seed = self.entry_id_seed.saturating_add(1);
        id
    }

    /// Append a parsed entry and return its id
    pub(crate) fn add(&mut self, parsed: ParsedEntry) -> u32 {
        let id = self.next_id();
        self.entries.push(parsed.into_entry(id));
        id
    }

    /// Update a single field of an entry. Returns false if no entry has this id.
    pub(crate) fn update_field(&mut self, id: u32, field: Field, value: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.set_field(field, value);
                true
            }
            None => false,
        }
    }

    /// Remove the entry with this id. Returns false if there was none.
    pub(crate) fn delete(&mut self, id: u32) -> bool {
        let count_before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != count_before
    }
}
