//! Ordered ranking of task names.

use talus_core::error::StackError;

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    posture: bool,
}

/// Ordered sequence of ranked task names, highest priority first.
///
/// Invariants: no name appears twice, and a posture entry is kept at the
/// lowest rank across every mutation until it is explicitly removed.
/// The stack holds names only; task objects live in the facade's
/// registry, so removing a rank entry never destroys a task.
#[derive(Debug, Clone, Default)]
pub struct PriorityStack {
    entries: Vec<Entry>,
}

impl PriorityStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Append at the lowest priority; a ranked posture entry is re-sorted
    /// to stay last.
    pub fn push(&mut self, name: impl Into<String>, posture: bool) -> Result<(), StackError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(StackError::AlreadyRanked(name));
        }
        self.entries.push(Entry { name, posture });
        self.sink_posture();
        Ok(())
    }

    /// Insert at an explicit rank (0 = highest priority).
    pub fn insert(
        &mut self,
        rank: usize,
        name: impl Into<String>,
        posture: bool,
    ) -> Result<(), StackError> {
        let name = name.into();
        if self.contains(&name) {
            return Err(StackError::AlreadyRanked(name));
        }
        if rank > self.entries.len() {
            return Err(StackError::RankOutOfRange {
                rank,
                len: self.entries.len(),
            });
        }
        self.entries.insert(rank, Entry { name, posture });
        self.sink_posture();
        Ok(())
    }

    /// Remove by name. Silent no-op when the name is not ranked; callers
    /// check membership with [`list`](Self::list) first if they care.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }

    /// Remove and return the lowest-priority entry.
    pub fn pop(&mut self) -> Option<String> {
        self.entries.pop().map(|e| e.name)
    }

    /// Ranked names, highest priority first.
    pub fn list(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Raise a task one rank. Returns false if absent or already highest.
    pub fn move_up(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|e| e.name == name) {
            Some(i) if i > 0 => {
                self.entries.swap(i, i - 1);
                self.sink_posture();
                true
            }
            _ => false,
        }
    }

    /// Lower a task one rank. Returns false if absent or already lowest.
    pub fn move_down(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|e| e.name == name) {
            Some(i) if i + 1 < self.entries.len() => {
                self.entries.swap(i, i + 1);
                self.sink_posture();
                true
            }
            _ => false,
        }
    }

    /// Restore the posture-last invariant, preserving the relative order
    /// of everything else.
    fn sink_posture(&mut self) {
        self.entries.sort_by_key(|e| e.posture);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
