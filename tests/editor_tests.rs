//! Editor behaviour through the public API

use std::cell::RefCell;
use std::rc::Rc;

use bridgechart::editor::{EditKey, Editor, EditorEvent, EventKind};
use bridgechart::layout::{Point, Viewport};
use bridgechart::parser::NodeKind;
use bridgechart::scene::Selection;
use bridgechart::theme::Palette;

const SOURCE: &str = r#"ts()
p["Load order"]
d<"In stock?">
p["Ship"]
te()
...
ts()
a>
p["Load order"]
a>
d<"In stock?">
a*Yes*>
p["Ship"]
a>
te()
"#;

fn editor() -> Editor {
    let mut editor = Editor::new(Viewport::new(1280.0, 720.0));
    assert!(editor.load_source(SOURCE).is_empty());
    editor
}

#[test]
fn test_undo_redo_inverse_law() {
    let mut editor = editor();
    let initial = editor.scene().snapshot();

    assert!(editor.move_node(1, -300.0, 40.0));
    assert!(editor.set_shape(2, Some(NodeKind::Process)));
    assert!(editor.set_style(3, Some(Palette::new("#101010", "#22c55e", "#dcfce7", "rgba(0,0,0,0)"))));
    assert!(editor.set_edge_label(0, Some("go")));
    assert!(editor.delete_edge(3));
    assert!(editor.delete_node(4));
    let last = editor.scene().snapshot();

    for _ in 0..6 {
        assert!(editor.undo());
    }
    assert!(!editor.can_undo());
    assert_eq!(editor.scene().snapshot(), initial);

    for _ in 0..6 {
        assert!(editor.redo());
    }
    assert!(!editor.can_redo());
    assert_eq!(editor.scene().snapshot(), last);
}

#[test]
fn test_new_mutation_discards_redo() {
    let mut editor = editor();
    assert!(editor.move_node(0, 10.0, 10.0));
    assert!(editor.undo());
    assert!(editor.can_redo());
    assert!(editor.move_node(0, 20.0, 20.0));
    assert!(!editor.can_redo());
}

#[test]
fn test_history_is_bounded() {
    let mut editor = Editor::new(Viewport::new(800.0, 600.0)).with_history_limit(3);
    editor.load_source(SOURCE);
    for i in 0..5 {
        assert!(editor.move_node(0, i as f64 * 10.0, 0.0));
    }
    let mut steps = 0;
    while editor.undo() {
        steps += 1;
    }
    assert_eq!(steps, 3);
}

#[test]
fn test_inline_edit_reports_source_rewrite() {
    let mut editor = editor();
    let edits = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&edits);
    editor.on(EventKind::NodeEdited, move |event| {
        if let EditorEvent::NodeEdited(edit) = event {
            sink.borrow_mut().push(edit.clone());
        }
    });

    assert!(editor.begin_text_edit(3));
    editor.update_text("Ship today");
    assert!(editor.key(EditKey::Enter { shift: false }));

    let edits = edits.borrow();
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].new_token, r#"p["Ship today"]"#);
    let rewritten = edits[0].apply(SOURCE);
    assert_eq!(rewritten.matches(r#"p["Ship today"]"#).count(), 2);

    // The rewritten source reloads to the same shape
    let mut reloaded = Editor::default();
    assert!(reloaded.load_source(&rewritten).is_empty());
    assert_eq!(reloaded.scene().node(3).map(|n| n.text.as_str()), Some("Ship today"));
    assert_eq!(reloaded.scene().edges().len(), editor.scene().edges().len());
}

#[test]
fn test_selection_events_follow_clicks() {
    let mut editor = editor();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let id = editor.on(EventKind::SelectionChanged, move |event| {
        sink.borrow_mut().push(event.clone());
    });

    let center = editor.scene().node(2).unwrap().center();
    let at = editor.viewport().to_screen(center);
    editor.pointer_down(at);
    editor.pointer_up(at);
    editor.pointer_down(Point::new(1.0, 1.0));
    editor.pointer_up(Point::new(1.0, 1.0));

    assert_eq!(
        *seen.borrow(),
        vec![
            EditorEvent::SelectionChanged {
                selection: Some(Selection::Node(2))
            },
            EditorEvent::SelectionChanged { selection: None },
        ]
    );

    assert!(editor.off(id));
    editor.select(Some(Selection::Node(0)));
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn test_zoom_buttons_and_fit() {
    let mut editor = editor();
    let fitted = *editor.viewport();
    editor.zoom_in();
    assert!((editor.viewport().scale - fitted.scale * 1.2).abs() < 1e-9);
    editor.zoom_out();
    editor.fit_to_screen();
    assert_eq!(*editor.viewport(), fitted);
}

#[test]
fn test_data_changed_carries_snapshot() {
    let mut editor = editor();
    let latest = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&latest);
    editor.on(EventKind::DataChanged, move |event| {
        if let EditorEvent::DataChanged(snapshot) = event {
            *sink.borrow_mut() = Some(snapshot.clone());
        }
    });
    assert!(editor.resize_node(1, 250.0, 80.0));
    let latest = latest.borrow();
    let snapshot = latest.as_ref().unwrap();
    assert_eq!(snapshot.nodes[1].width, 250.0);
    assert_eq!(snapshot, &editor.scene().snapshot());
}
