//! Interactive editor state: view, selection, dragging, inline text edits
//! and undo/redo
//!
//! The editor owns a [`Scene`] and a [`Viewport`]. Hosts feed it pointer,
//! wheel and key input in screen coordinates, call [`Editor::draw`] after
//! each change and subscribe to [`EditorEvent`]s. Every data mutation records
//! the previous state so it can be undone.

pub mod events;
pub mod history;

pub use events::{EditorEvent, EventKind, ListenerId, Listeners};
pub use history::History;

use crate::error::Diagnostic;
use crate::export::{self, ExportError, ExportOptions};
use crate::layout::{self, LayoutConfig, Point, Viewport};
use crate::parser::{self, Diagram, NodeEdit, NodeId, NodeKind};
use crate::renderer::{route_edges, render_scene, Surface, SvgConfig};
use crate::scene::{Scene, Selection, Snapshot};
use crate::theme::{Palette, Theme};

/// Pointer travel (screen pixels) under which a press counts as a click
pub const CLICK_THRESHOLD: f64 = 3.0;
/// Edge hit distance in screen pixels
pub const EDGE_HIT_TOLERANCE: f64 = 6.0;
pub const WHEEL_ZOOM_IN: f64 = 1.08;
pub const WHEEL_ZOOM_OUT: f64 = 0.92;
pub const ZOOM_IN_STEP: f64 = 1.2;
pub const ZOOM_OUT_STEP: f64 = 0.83;

/// A pointer press in progress
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    /// Pressed on a block; may become a drag
    Block { start: Point },
    /// Pressed on empty canvas; moving pans the view
    Pan { start: Point, last: Point },
}

/// An open inline text edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub node: NodeId,
    /// Text when the edit started
    pub original: String,
    /// Text as currently typed
    pub buffer: String,
}

/// Keys with meaning during an inline text edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Enter { shift: bool },
    Escape,
}

/// What a double click started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoubleClick {
    TextEdit(NodeId),
    EdgeLabel(usize),
    Nothing,
}

#[derive(Debug)]
pub struct Editor {
    scene: Scene,
    viewport: Viewport,
    history: History,
    listeners: Listeners,
    layout: LayoutConfig,
    svg: SvgConfig,
    theme: Theme,
    gesture: Option<Gesture>,
    text_edit: Option<TextEdit>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl Editor {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            scene: Scene::new(),
            viewport,
            history: History::default(),
            listeners: Listeners::default(),
            layout: LayoutConfig::default(),
            svg: SvgConfig::default(),
            theme: Theme::default(),
            gesture: None,
            text_edit: None,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_layout_config(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_svg_config(mut self, svg: SvgConfig) -> Self {
        self.svg = svg;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history = History::new(limit);
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn selection(&self) -> Option<Selection> {
        self.scene.selection()
    }

    pub fn text_edit(&self) -> Option<&TextEdit> {
        self.text_edit.as_ref()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Register a listener for one kind of event
    pub fn on(&mut self, kind: EventKind, callback: impl FnMut(&EditorEvent) + 'static) -> ListenerId {
        self.listeners.on(kind, callback)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.off(id)
    }

    // Loading

    /// Parse, lay out and show a source text; returns the parse diagnostics
    pub fn load_source(&mut self, source: &str) -> Vec<Diagnostic> {
        let mut diagram = parser::parse(source);
        let diagnostics = std::mem::take(&mut diagram.diagnostics);
        self.load_diagram(diagram);
        diagnostics
    }

    /// Replace the scene with a parsed diagram; history starts over
    pub fn load_diagram(&mut self, diagram: Diagram) {
        self.text_edit = None;
        self.gesture = None;
        self.scene = Scene::from_diagram(diagram);
        let (nodes, edges) = self.scene.parts_mut();
        layout::layout(nodes, edges, &self.layout);
        self.history.clear();
        self.fit_to_screen();
        self.history_changed();
        self.data_changed();
    }

    // Pointer input, all in screen coordinates

    pub fn pointer_down(&mut self, at: Point) {
        let logical = self.viewport.to_logical(at);
        self.gesture = match self.scene.node_at(logical) {
            Some(node) => {
                self.scene.start_drag(node, logical);
                Some(Gesture::Block { start: at })
            }
            None => Some(Gesture::Pan { start: at, last: at }),
        };
    }

    pub fn pointer_move(&mut self, at: Point) {
        match self.gesture {
            Some(Gesture::Block { start }) => {
                let logical = self.viewport.to_logical(at);
                let Some(drag) = self.scene.drag_mut() else {
                    return;
                };
                if !drag.active && at.distance(start) < CLICK_THRESHOLD {
                    return;
                }
                drag.active = true;
                let drag = *drag;
                if let Some(node) = self.scene.node_mut(drag.node) {
                    node.x = drag.origin.x + (logical.x - drag.grab.x);
                    node.y = drag.origin.y + (logical.y - drag.grab.y);
                }
            }
            Some(Gesture::Pan { start, last }) => {
                self.viewport.pan(at.x - last.x, at.y - last.y);
                self.gesture = Some(Gesture::Pan { start, last: at });
            }
            None => {}
        }
    }

    pub fn pointer_up(&mut self, at: Point) {
        match self.gesture.take() {
            Some(Gesture::Block { .. }) => {
                let Some(drag) = self.scene.end_drag() else {
                    return;
                };
                if !drag.active {
                    self.select(Some(Selection::Node(drag.node)));
                    return;
                }
                let moved = self
                    .scene
                    .node(drag.node)
                    .is_some_and(|n| n.x != drag.origin.x || n.y != drag.origin.y);
                if moved {
                    let mut before = self.scene.snapshot();
                    if let Some(node) = before.nodes.iter_mut().find(|n| n.id == drag.node) {
                        node.x = drag.origin.x;
                        node.y = drag.origin.y;
                    }
                    self.history.record(before);
                    self.history_changed();
                    self.data_changed();
                }
            }
            Some(Gesture::Pan { start, .. }) => {
                if at.distance(start) < CLICK_THRESHOLD {
                    let hit = self.hit_test(at);
                    self.select(hit);
                }
            }
            None => {}
        }
    }

    /// Zoom around the cursor; negative `delta_y` zooms in
    pub fn wheel(&mut self, delta_y: f64, at: Point) {
        let factor = if delta_y < 0.0 {
            WHEEL_ZOOM_IN
        } else {
            WHEEL_ZOOM_OUT
        };
        if self.viewport.zoom_at(factor, at) {
            self.zoom_changed();
        }
    }

    pub fn double_click(&mut self, at: Point) -> DoubleClick {
        match self.hit_test(at) {
            Some(Selection::Node(id)) => {
                if self.begin_text_edit(id) {
                    DoubleClick::TextEdit(id)
                } else {
                    DoubleClick::Nothing
                }
            }
            Some(Selection::Edge(index)) => {
                let current = self.scene.edge(index).and_then(|e| e.label.clone());
                self.listeners
                    .emit(&EditorEvent::EdgeLabelRequested { edge: index, current });
                DoubleClick::EdgeLabel(index)
            }
            None => DoubleClick::Nothing,
        }
    }

    /// Block or edge under a screen point; blocks win over edges
    pub fn hit_test(&self, at: Point) -> Option<Selection> {
        let logical = self.viewport.to_logical(at);
        if let Some(node) = self.scene.node_at(logical) {
            return Some(Selection::Node(node));
        }
        let tolerance = EDGE_HIT_TOLERANCE / self.viewport.scale;
        route_edges(self.scene.nodes(), self.scene.edges(), self.svg.fan_spread)
            .into_iter()
            .map(|route| (route.distance_to(logical), route.edge))
            .filter(|(distance, _)| *distance <= tolerance)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, edge)| Selection::Edge(edge))
    }

    pub fn select(&mut self, selection: Option<Selection>) {
        if self.scene.select(selection) {
            self.listeners.emit(&EditorEvent::SelectionChanged {
                selection: self.scene.selection(),
            });
        }
    }

    // View

    pub fn zoom_in(&mut self) {
        if self.viewport.zoom_centered(ZOOM_IN_STEP) {
            self.zoom_changed();
        }
    }

    pub fn zoom_out(&mut self) {
        if self.viewport.zoom_centered(ZOOM_OUT_STEP) {
            self.zoom_changed();
        }
    }

    /// Center the diagram in the surface
    pub fn fit_to_screen(&mut self) {
        if let Some(bounds) = self.scene.bounds() {
            self.viewport.fit(&bounds);
            self.zoom_changed();
        }
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.resize(width, height);
    }

    // Inline text editing

    /// Open a text edit on a block whose label can be edited
    ///
    /// An edit already open elsewhere loses focus and is committed first.
    pub fn begin_text_edit(&mut self, id: NodeId) -> bool {
        if self.text_edit.is_some() {
            self.commit_text_edit();
        }
        let Some(node) = self.scene.node(id) else {
            return false;
        };
        if !node.kind.has_editable_text() {
            return false;
        }
        self.text_edit = Some(TextEdit {
            node: id,
            original: node.text.clone(),
            buffer: node.text.clone(),
        });
        true
    }

    pub fn update_text(&mut self, text: impl Into<String>) {
        if let Some(edit) = self.text_edit.as_mut() {
            edit.buffer = text.into();
        }
    }

    /// Handle a key during a text edit; returns whether the edit closed
    pub fn key(&mut self, key: EditKey) -> bool {
        if self.text_edit.is_none() {
            return false;
        }
        match key {
            EditKey::Enter { shift: true } => false,
            EditKey::Enter { shift: false } => {
                self.commit_text_edit();
                true
            }
            EditKey::Escape => {
                self.cancel_text_edit();
                true
            }
        }
    }

    /// Focus left the edit box
    pub fn blur(&mut self) -> Option<NodeEdit> {
        self.commit_text_edit()
    }

    /// Close the edit and apply it if the text changed and is not empty
    pub fn commit_text_edit(&mut self) -> Option<NodeEdit> {
        let edit = self.text_edit.take()?;
        let new_text = edit.buffer.trim();
        if new_text.is_empty() || new_text == edit.original {
            return None;
        }
        let config = &self.layout;
        let before = self.scene.snapshot();
        let node = self.scene.node_mut(edit.node)?;
        let change = NodeEdit::new(node.id, &node.text, new_text, &node.source_token);
        node.text = change.new_text.clone();
        node.source_token = change.new_token.clone();
        let (width, height) = layout::measure_node(node, config);
        node.width = width;
        node.height = height;

        self.history.record(before);
        log::debug!("block {} renamed to {:?}", change.node, change.new_text);
        self.listeners.emit(&EditorEvent::NodeEdited(change.clone()));
        self.history_changed();
        self.data_changed();
        Some(change)
    }

    pub fn cancel_text_edit(&mut self) {
        self.text_edit = None;
    }

    // Undoable edits

    /// Set or clear an edge label; blank labels clear it
    pub fn set_edge_label(&mut self, index: usize, label: Option<&str>) -> bool {
        let label = label.map(str::trim).filter(|l| !l.is_empty()).map(str::to_string);
        self.mutate(|scene| {
            let edge = scene.edge_mut(index)?;
            if edge.label == label {
                return None;
            }
            edge.label = label;
            Some(())
        })
        .is_some()
    }

    pub fn move_node(&mut self, id: NodeId, x: f64, y: f64) -> bool {
        self.mutate(|scene| {
            let node = scene.node_mut(id)?;
            if node.x == x && node.y == y {
                return None;
            }
            node.x = x;
            node.y = y;
            Some(())
        })
        .is_some()
    }

    pub fn resize_node(&mut self, id: NodeId, width: f64, height: f64) -> bool {
        let (width, height) = (width.max(1.0), height.max(1.0));
        self.mutate(|scene| {
            let node = scene.node_mut(id)?;
            if node.width == width && node.height == height {
                return None;
            }
            node.width = width;
            node.height = height;
            Some(())
        })
        .is_some()
    }

    /// Draw a block as another shape, or as its own kind with `None`; the
    /// block is measured again for the new shape
    pub fn set_shape(&mut self, id: NodeId, shape: Option<NodeKind>) -> bool {
        let config = self.layout.clone();
        self.mutate(|scene| {
            let node = scene.node_mut(id)?;
            if node.shape_override == shape {
                return None;
            }
            node.shape_override = shape;
            let (width, height) = layout::measure_node(node, &config);
            node.width = width;
            node.height = height;
            Some(())
        })
        .is_some()
    }

    pub fn set_style(&mut self, id: NodeId, style: Option<Palette>) -> bool {
        self.mutate(|scene| {
            let node = scene.node_mut(id)?;
            if node.style_override == style {
                return None;
            }
            node.style_override = style;
            Some(())
        })
        .is_some()
    }

    pub fn delete_node(&mut self, id: NodeId) -> bool {
        let had_selection = self.scene.selection().is_some();
        let deleted = self.mutate(|scene| scene.delete_node(id)).is_some();
        if deleted && had_selection {
            self.selection_cleared();
        }
        deleted
    }

    pub fn delete_edge(&mut self, index: usize) -> bool {
        let had_selection = self.scene.selection().is_some();
        let deleted = self.mutate(|scene| scene.delete_edge(index)).is_some();
        if deleted && had_selection {
            self.selection_cleared();
        }
        deleted
    }

    /// Delete whatever is selected
    pub fn delete_selection(&mut self) -> bool {
        match self.scene.selection() {
            Some(Selection::Node(id)) => self.delete_node(id),
            Some(Selection::Edge(index)) => self.delete_edge(index),
            None => false,
        }
    }

    /// Place every block again, keeping sizes, and fit the view
    pub fn auto_layout(&mut self) {
        if self.scene.is_empty() {
            return;
        }
        let config = self.layout.clone();
        self.mutate(|scene| {
            let before = scene.snapshot();
            let (nodes, edges) = scene.parts_mut();
            layout::arrange(nodes, edges, &config);
            (scene.snapshot() != before).then_some(())
        });
        self.fit_to_screen();
    }

    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.history.undo(self.scene.snapshot()) else {
            return false;
        };
        self.restore(previous);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(next) = self.history.redo(self.scene.snapshot()) else {
            return false;
        };
        self.restore(next);
        true
    }

    // Output

    /// The live canvas with grid, view transform and selection
    pub fn draw(&self) -> String {
        render_scene(
            &self.scene,
            &self.theme,
            &self.layout,
            &self.svg,
            Surface::Live(self.viewport),
        )
    }

    pub fn export_svg(&self) -> String {
        export::export_svg(&self.scene, &self.theme, &self.layout, &self.svg)
    }

    pub fn export_png(&self, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
        export::export_png(&self.scene, &self.theme, &self.layout, &self.svg, options)
    }

    // Internals

    /// Run a mutation; when it reports a change, the prior state is recorded
    fn mutate<T>(&mut self, change: impl FnOnce(&mut Scene) -> Option<T>) -> Option<T> {
        let before = self.scene.snapshot();
        let result = change(&mut self.scene)?;
        self.history.record(before);
        self.history_changed();
        self.data_changed();
        Some(result)
    }

    fn restore(&mut self, snapshot: Snapshot) {
        let had_selection = self.scene.selection().is_some();
        self.text_edit = None;
        self.gesture = None;
        self.scene.restore(snapshot);
        if had_selection {
            self.selection_cleared();
        }
        self.history_changed();
        self.data_changed();
    }

    fn selection_cleared(&mut self) {
        self.listeners
            .emit(&EditorEvent::SelectionChanged { selection: None });
    }

    fn zoom_changed(&mut self) {
        self.listeners.emit(&EditorEvent::ZoomChanged {
            scale: self.viewport.scale,
        });
    }

    fn history_changed(&mut self) {
        self.listeners.emit(&EditorEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    fn data_changed(&mut self) {
        self.listeners
            .emit(&EditorEvent::DataChanged(self.scene.snapshot()));
    }
}
