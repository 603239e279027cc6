// crates/bankws-client/src/request_id.rs
// ============================================================================
// Module: Request Ids
// Description: Daily request-id counter with pluggable persistence.
// Purpose: Give every WebService call a unique `RequestId`.
// Dependencies: serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! Request ids are `YYYYMMDD` followed by a five-digit counter starting at
//! `00001`. The counter resets when the date changes and is persisted after
//! every increment so ids stay unique across runs.
//! Invariants:
//! - An id is handed out only after the advanced counter was stored.
//! - A day allows at most [`MAX_DAILY_REQUESTS`] ids.
//! - A corrupt store fails closed instead of restarting the counter.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use time::Date;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Largest counter value of one day.
pub const MAX_DAILY_REQUESTS: u32 = 99_999;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Request-id store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestIdError {
    /// Reading or writing the store failed.
    #[error("request id store io error: {0}")]
    Io(String),
    /// Stored state is unreadable.
    #[error("request id store is corrupt: {0}")]
    Corrupt(String),
    /// The day's counter is used up.
    #[error("request ids exhausted for {0}")]
    Exhausted(String),
}

// ============================================================================
// SECTION: State and Stores
// ============================================================================

/// Persisted counter state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestIdState {
    /// Day of the counter as `YYYYMMDD`.
    pub day: String,
    /// Last counter value handed out that day.
    pub counter: u32,
}

/// Persistence of the counter state.
pub trait RequestIdStore: Send + Sync {
    /// Loads the last state, `None` when nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`RequestIdError`] when the store cannot be read.
    fn load(&self) -> Result<Option<RequestIdState>, RequestIdError>;

    /// Stores the state.
    ///
    /// # Errors
    ///
    /// Returns [`RequestIdError`] when the store cannot be written.
    fn save(&self, state: &RequestIdState) -> Result<(), RequestIdError>;
}

/// Store that forgets its state with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Current state.
    state: Mutex<Option<RequestIdState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestIdStore for MemoryStore {
    fn load(&self) -> Result<Option<RequestIdState>, RequestIdError> {
        let guard = self
            .state
            .lock()
            .map_err(|_| RequestIdError::Io("request id store mutex poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, state: &RequestIdState) -> Result<(), RequestIdError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| RequestIdError::Io("request id store mutex poisoned".to_string()))?;
        *guard = Some(state.clone());
        drop(guard);
        Ok(())
    }
}

/// Store keeping the state in a JSON file.
///
/// Writes go to a sibling temporary file that is renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// State file path.
    path: PathBuf,
}

impl JsonFileStore {
    /// Creates a store for `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
        }
    }

    /// Returns the state file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RequestIdStore for JsonFileStore {
    fn load(&self) -> Result<Option<RequestIdState>, RequestIdError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(RequestIdError::Io(err.to_string())),
        };
        let state: RequestIdState = serde_json::from_slice(&bytes)
            .map_err(|err| RequestIdError::Corrupt(err.to_string()))?;
        Ok(Some(state))
    }

    fn save(&self, state: &RequestIdState) -> Result<(), RequestIdError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|err| RequestIdError::Io(err.to_string()))?;
        }
        let bytes =
            serde_json::to_vec(state).map_err(|err| RequestIdError::Io(err.to_string()))?;
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        fs::write(&temp, bytes).map_err(|err| RequestIdError::Io(err.to_string()))?;
        fs::rename(&temp, &self.path).map_err(|err| RequestIdError::Io(err.to_string()))
    }
}

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Hands out request ids from a store.
pub struct RequestIdGenerator {
    /// Backing store.
    store: Box<dyn RequestIdStore>,
    /// Serializes load-increment-save cycles.
    lock: Mutex<()>,
}

impl RequestIdGenerator {
    /// Creates a generator over `store`.
    #[must_use]
    pub fn new(store: Box<dyn RequestIdStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Creates a generator that keeps its state in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()))
    }

    /// Returns the next id for `today`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestIdError`] when the store fails or the day is exhausted.
    pub fn next_id(&self, today: Date) -> Result<String, RequestIdError> {
        let guard = self
            .lock
            .lock()
            .map_err(|_| RequestIdError::Io("request id mutex poisoned".to_string()))?;
        let day = day_prefix(today);
        let previous = match self.store.load()? {
            Some(state) if state.day == day => state.counter,
            _ => 0,
        };
        if previous >= MAX_DAILY_REQUESTS {
            return Err(RequestIdError::Exhausted(day));
        }
        let state = RequestIdState {
            day,
            counter: previous + 1,
        };
        self.store.save(&state)?;
        drop(guard);
        Ok(format!("{}{:05}", state.day, state.counter))
    }
}

/// Formats a date as `YYYYMMDD`.
fn day_prefix(date: Date) -> String {
    format!("{:04}{:02}{:02}", date.year(), u8::from(date.month()), date.day())
}

#[cfg(test)]
mod tests;
