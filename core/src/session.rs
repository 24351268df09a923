//! Persistent named slots for session data.
//!
//! The auth context keeps the bearer token and the user profile here so a
//! restart can pick the session back up. `MemorySessionStore` is for tests;
//! `FileSessionStore` keeps the slots as one JSON object on disk.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::SessionError;

pub const TOKEN_SLOT: &str = "token";
pub const USER_SLOT: &str = "user";

pub trait SessionStore: Send + Sync {
    fn get(&self, slot: &str) -> Result<Option<String>, SessionError>;
    fn set(&self, slot: &str, value: &str) -> Result<(), SessionError>;
    fn remove(&self, slot: &str) -> Result<(), SessionError>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slots: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, slot: &str) -> Result<Option<String>, SessionError> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(slot).cloned())
    }

    fn set(&self, slot: &str, value: &str) -> Result<(), SessionError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.insert(slot.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, slot: &str) -> Result<(), SessionError> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.remove(slot);
        Ok(())
    }
}

/// Slots stored as a flat JSON object. A missing file reads as empty.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, SessionError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, slots: &BTreeMap<String, String>) -> Result<(), SessionError> {
        if slots.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        fs::write(&self.path, serde_json::to_string_pretty(slots)?)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, slot: &str) -> Result<Option<String>, SessionError> {
        Ok(self.read()?.remove(slot))
    }

    fn set(&self, slot: &str, value: &str) -> Result<(), SessionError> {
        let mut slots = self.read()?;
        slots.insert(slot.to_string(), value.to_string());
        self.write(&slots)
    }

    fn remove(&self, slot: &str) -> Result<(), SessionError> {
        let mut slots = self.read()?;
        if slots.remove(slot).is_some() {
            self.write(&slots)?;
        }
        Ok(())
    }
}
