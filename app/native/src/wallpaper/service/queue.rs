//! Ordered wallpaper queue with a current position.

use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;

/// In-memory playback queue.
///
/// The index always points inside the queue unless it is empty, in which
/// case it is `0`.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    entries: Vec<PathBuf>,
    index: usize,
}

impl Queue {
    /// Replaces the entries, optionally shuffling them, and resets the index.
    pub fn replace(&mut self, mut entries: Vec<PathBuf>, shuffle: bool) {
        if shuffle {
            entries.shuffle(&mut rand::rng());
        }
        self.entries = entries;
        self.index = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    #[must_use]
    pub const fn index(&self) -> usize { self.index }

    #[must_use]
    pub fn entries(&self) -> &[PathBuf] { &self.entries }

    /// Returns the entry at the current index.
    #[must_use]
    pub fn current(&self) -> Option<&PathBuf> { self.entries.get(self.index) }

    /// Returns the entry one position ahead, wrapping at the end.
    #[must_use]
    pub fn peek_next(&self) -> Option<&PathBuf> {
        if self.entries.is_empty() {
            return None;
        }
        self.entries.get((self.index + 1) % self.entries.len())
    }

    /// Returns the entry one position back, wrapping at the start.
    #[must_use]
    pub fn peek_previous(&self) -> Option<&PathBuf> {
        let previous = self.index.checked_sub(1).or_else(|| self.entries.len().checked_sub(1))?;
        self.entries.get(previous)
    }

    /// Points the index at `path` if it is queued. Returns whether it was.
    pub fn select(&mut self, path: &Path) -> bool {
        match self.entries.iter().position(|entry| entry == path) {
            Some(position) => {
                self.index = position;
                true
            }
            None => false,
        }
    }

    /// Shuffles the entries in place, keeping the current entry selected.
    pub fn shuffle(&mut self) {
        let current = self.current().cloned();
        self.entries.shuffle(&mut rand::rng());
        if let Some(current) = current {
            self.select(&current);
        }
    }
}
