use super::VersionLedger;
use crate::error::{LedgerError, Result};
use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Opaque token identifying the ledger state a snapshot was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision(String);

impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Revision(token.into())
    }
}

/// A ledger together with the revision it was read at
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub ledger: VersionLedger,
    pub revision: Revision,
}

/// Persistent home of the version ledger.
///
/// Writers never overwrite blindly: a write only lands if the stored
/// ledger is still at the revision the writer read.
pub trait LedgerStore {
    /// Read the whole ledger
    fn load(&self) -> Result<Snapshot>;

    /// Replace the ledger if it is still at `expected`.
    ///
    /// # Returns
    /// * `Ok(true)` - The new ledger was written
    /// * `Ok(false)` - Someone else wrote first; nothing was written
    /// * `Err` - The store could not be read or written
    fn compare_and_swap(&self, expected: &Revision, ledger: &VersionLedger) -> Result<bool>;
}

/// Load, mutate and write back the ledger.
///
/// When another writer got in between, the ledger is reloaded and `mutate`
/// is applied again, at most `retries` more times. If the conflict persists
/// the error is returned and this caller has written nothing.
pub fn update_ledger<S, F>(store: &S, retries: u32, mut mutate: F) -> Result<VersionLedger>
where
    S: LedgerStore + ?Sized,
    F: FnMut(&VersionLedger) -> Result<VersionLedger>,
{
    let attempts = retries + 1;
    for attempt in 1..=attempts {
        let snapshot = store.load()?;
        let updated = mutate(&snapshot.ledger)?;

        if store.compare_and_swap(&snapshot.revision, &updated)? {
            debug!(attempt, "ledger written");
            return Ok(updated);
        }
        warn!(attempt, attempts, "ledger changed while updating, reloading");
    }

    Err(LedgerError::conflict(format!(
        "ledger was modified concurrently on all {} attempts",
        attempts
    )))
}

/// Ledger stored as a JSON file
#[derive(Debug, Clone)]
pub struct FileLedgerStore {
    path: PathBuf,
}

impl FileLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileLedgerStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LedgerError::ledger(format!(
                    "Version ledger not found at '{}'",
                    self.path.display()
                ))
            } else {
                LedgerError::Io(e)
            }
        })
    }
}

impl LedgerStore for FileLedgerStore {
    fn load(&self) -> Result<Snapshot> {
        let text = self.read()?;
        let ledger = VersionLedger::from_json(&text)?;
        Ok(Snapshot {
            ledger,
            revision: Revision(text),
        })
    }

    fn compare_and_swap(&self, expected: &Revision, ledger: &VersionLedger) -> Result<bool> {
        let current = self.read()?;
        if current != expected.0 {
            return Ok(false);
        }

        // Write next to the target so the rename stays on one filesystem
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let permissions = fs::metadata(&self.path)?.permissions();
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(ledger.to_json()?.as_bytes())?;
        tmp.flush()?;
        // The temp file is created 0600; keep the ledger's own mode
        tmp.as_file().set_permissions(permissions)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %self.path.display(), "ledger file replaced");
        Ok(true)
    }
}

struct MemoryState {
    ledger: VersionLedger,
    generation: u64,
}

/// In-memory ledger store.
///
/// Concurrent writers can be simulated with [`MemoryLedgerStore::queue_concurrent_write`]:
/// each queued ledger lands just before the next compare-and-swap.
pub struct MemoryLedgerStore {
    state: Mutex<MemoryState>,
    interleaved: Mutex<VecDeque<VersionLedger>>,
}

impl MemoryLedgerStore {
    pub fn new(ledger: VersionLedger) -> Self {
        MemoryLedgerStore {
            state: Mutex::new(MemoryState {
                ledger,
                generation: 0,
            }),
            interleaved: Mutex::new(VecDeque::new()),
        }
    }

    /// Make another writer replace the ledger right before the next swap
    pub fn queue_concurrent_write(&self, ledger: VersionLedger) {
        self.lock_interleaved().push_back(ledger);
    }

    /// Current stored ledger
    pub fn ledger(&self) -> VersionLedger {
        self.lock_state().ledger.clone()
    }

    /// Number of successful writes so far
    pub fn generation(&self) -> u64 {
        self.lock_state().generation
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_interleaved(&self) -> std::sync::MutexGuard<'_, VecDeque<VersionLedger>> {
        self.interleaved
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn load(&self) -> Result<Snapshot> {
        let state = self.lock_state();
        Ok(Snapshot {
            ledger: state.ledger.clone(),
            revision: Revision(state.generation.to_string()),
        })
    }

    fn compare_and_swap(&self, expected: &Revision, ledger: &VersionLedger) -> Result<bool> {
        let concurrent = self.lock_interleaved().pop_front();
        let mut state = self.lock_state();

        if let Some(other) = concurrent {
            state.ledger = other;
            state.generation += 1;
        }

        if state.generation.to_string() != expected.0 {
            return Ok(false);
        }
        state.ledger = ledger.clone();
        state.generation += 1;
        Ok(true)
    }
}
