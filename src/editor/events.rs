//! Typed notifications from the editor to its host

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::parser::NodeEdit;
use crate::scene::{Selection, Snapshot};

/// Something the host may want to react to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EditorEvent {
    ZoomChanged { scale: f64 },
    SelectionChanged { selection: Option<Selection> },
    HistoryChanged { can_undo: bool, can_redo: bool },
    /// Inline text edit committed; the host can patch its source with it
    NodeEdited(NodeEdit),
    /// The user asked to edit an edge label; answer with `Editor::set_edge_label`
    EdgeLabelRequested { edge: usize, current: Option<String> },
    DataChanged(Snapshot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    ZoomChanged,
    SelectionChanged,
    HistoryChanged,
    NodeEdited,
    EdgeLabelRequested,
    DataChanged,
}

impl EditorEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EditorEvent::ZoomChanged { .. } => EventKind::ZoomChanged,
            EditorEvent::SelectionChanged { .. } => EventKind::SelectionChanged,
            EditorEvent::HistoryChanged { .. } => EventKind::HistoryChanged,
            EditorEvent::NodeEdited(_) => EventKind::NodeEdited,
            EditorEvent::EdgeLabelRequested { .. } => EventKind::EdgeLabelRequested,
            EditorEvent::DataChanged(_) => EventKind::DataChanged,
        }
    }
}

/// Handle returned by `Listeners::on`, used to remove the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&EditorEvent)>;

/// Listeners per event kind, called synchronously in registration order
#[derive(Default)]
pub struct Listeners {
    next: u64,
    by_kind: BTreeMap<EventKind, Vec<(ListenerId, Callback)>>,
}

impl Listeners {
    pub fn on(&mut self, kind: EventKind, callback: impl FnMut(&EditorEvent) + 'static) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        let callback: Callback = Box::new(callback);
        self.by_kind.entry(kind).or_default().push((id, callback));
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn off(&mut self, id: ListenerId) -> bool {
        for listeners in self.by_kind.values_mut() {
            if let Some(index) = listeners.iter().position(|(l, _)| *l == id) {
                listeners.remove(index);
                return true;
            }
        }
        false
    }

    pub fn emit(&mut self, event: &EditorEvent) {
        log::trace!("event {:?}", event.kind());
        if let Some(listeners) = self.by_kind.get_mut(&event.kind()) {
            for (_, callback) in listeners.iter_mut() {
                callback(event);
            }
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<_, _> = self.by_kind.iter().map(|(k, v)| (k, v.len())).collect();
        f.debug_struct("Listeners").field("by_kind", &counts).finish()
    }
}
