//! Bounded undo and redo stacks of scene snapshots

use std::collections::VecDeque;

use crate::scene::Snapshot;

/// Number of undo steps kept by default
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    /// Remember the state before a mutation; the redo stack is discarded
    pub fn record(&mut self, before: Snapshot) {
        if self.undo.len() == self.limit {
            self.undo.pop_front();
        }
        self.undo.push_back(before);
        self.redo.clear();
    }

    /// Step back: returns the state to restore and keeps `current` for redo
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let previous = self.undo.pop_back()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Step forward again after an undo
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Node, NodeKind};

    fn state(n: usize) -> Snapshot {
        Snapshot {
            nodes: (0..n)
                .map(|i| Node::new(i, NodeKind::Process, "x", "p[x]"))
                .collect(),
            edges: vec![],
        }
    }

    #[test]
    fn test_undo_then_redo() {
        let mut history = History::default();
        history.record(state(1));
        assert!(history.can_undo());
        assert_eq!(history.undo(state(2)), Some(state(1)));
        assert!(!history.can_undo());
        assert!(history.can_redo());
        assert_eq!(history.redo(state(1)), Some(state(2)));
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::default();
        history.record(state(0));
        history.undo(state(1));
        history.record(state(2));
        assert!(!history.can_redo());
        assert_eq!(history.redo(state(3)), None);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::new(2);
        history.record(state(1));
        history.record(state(2));
        history.record(state(3));
        assert_eq!(history.undo(state(4)), Some(state(3)));
        assert_eq!(history.undo(state(3)), Some(state(2)));
        assert_eq!(history.undo(state(2)), None);
    }

    #[test]
    fn test_empty_history() {
        let mut history = History::default();
        assert_eq!(history.undo(state(0)), None);
        assert!(!history.can_redo());
    }
}
