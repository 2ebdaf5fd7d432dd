//! Registry of live usernames
//!
//! Maps each registered name to that session's outbound `Sink`. The registry
//! itself is plain data; it is owned by the `ChatServer` actor, which
//! serializes every mutation and snapshot.

use std::collections::HashMap;

use crate::error::RegistryError;
use crate::session::Sink;
use crate::types::Username;

#[derive(Debug)]
struct Entry {
    /// Registration order, used for stable snapshots
    seq: u64,
    sink: Sink,
}

/// Username → Sink table
///
/// At most one entry per name. Iteration order is registration order.
#[derive(Debug, Default)]
pub struct Registry {
    entries: HashMap<Username, Entry>,
    next_seq: u64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new name
    ///
    /// Fails with `AlreadyTaken` if the name is present, leaving the existing
    /// entry untouched.
    pub fn register(&mut self, name: Username, sink: Sink) -> Result<(), RegistryError> {
        if self.contains(name.as_str()) {
            return Err(RegistryError::AlreadyTaken(name.to_string()));
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(name, Entry { seq, sink });
        Ok(())
    }

    /// Remove a name if present
    ///
    /// Returns the removed sink; absent names are not an error.
    pub fn deregister(&mut self, name: &str) -> Option<Sink> {
        self.entries.remove(name).map(|entry| entry.sink)
    }

    /// Point lookup for private delivery
    pub fn lookup(&self, name: &str) -> Result<&Sink, RegistryError> {
        self.entries
            .get(name)
            .map(|entry| &entry.sink)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All current names in registration order
    pub fn snapshot_names(&self) -> Vec<String> {
        self.ordered()
            .into_iter()
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Apply `f` to every entry except `exclude`
    ///
    /// `None` excludes nobody. Entries are visited in registration order.
    pub fn for_each_except<F>(&self, exclude: Option<&str>, mut f: F)
    where
        F: FnMut(&Username, &Sink),
    {
        for (name, sink) in self.ordered() {
            if exclude == Some(name.as_str()) {
                continue;
            }
            f(name, sink);
        }
    }

    fn ordered(&self) -> Vec<(&Username, &Sink)> {
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by_key(|(_, entry)| entry.seq);
        entries
            .into_iter()
            .map(|(name, entry)| (name, &entry.sink))
            .collect()
    }
}
