//! Tests for membership events and declaration/usage tracking.
mod common;
use common::*;
use std::cell::RefCell;
use std::rc::Rc;
use tsunagi::helpers::declarations::bump_suffix;
use tsunagi::prelude::*;

/// `main` declaring `x` and `other` using it twice through a VarSet.
fn session_with_usages() -> (Session, BlockId, BlockId, BlockId) {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let main = on_canvas(ws, function("main"));
    let init = create(ws, var_init("x", DataType::Int, true));
    nest(ws, main, ConnectorRole::FunctionBody, init);

    let other = on_canvas(ws, function("other"));
    let set = create(ws, BlockData::VarSet);
    nest(ws, other, ConnectorRole::FunctionBody, set);
    let target = create(ws, variable("x"));
    plug(ws, set, ConnectorRole::Target, 0, target);
    let read = create(ws, variable("x"));
    plug(ws, set, ConnectorRole::Input, 0, read);

    session.flush().expect("Failed to flush events");
    (session, init, target, read)
}

fn names(session: &Session) -> Vec<String> {
    session.variables().names()
}

#[test]
fn test_bump_suffix() {
    assert_eq!(bump_suffix("x"), "x1");
    assert_eq!(bump_suffix("x1"), "x2");
    assert_eq!(bump_suffix("count9"), "count10");
}

#[test]
fn test_membership_events() {
    let mut session = Session::new();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    session.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    let note = on_canvas(session.workspace_mut(), comment("note"));
    session.flush().expect("Failed to flush events");
    assert_eq!(
        *events.borrow(),
        vec![WorkspaceEvent::WorkspaceAdded {
            block: note,
            subtree: vec![note],
        }]
    );

    // A drag within the canvas nets out to nothing.
    let ws = session.workspace_mut();
    ws.disconnect_self(note).expect("Failed to disconnect");
    ws.add_to_canvas(note, None).expect("Failed to re-add");
    session.flush().expect("Failed to flush events");
    assert_eq!(events.borrow().len(), 1);

    let ws = session.workspace_mut();
    ws.disconnect_self(note).expect("Failed to disconnect");
    ws.add_to_drawer(note, None).expect("Failed to move to drawer");
    session.flush().expect("Failed to flush events");
    assert_eq!(
        events.borrow().last(),
        Some(&WorkspaceEvent::WorkspaceRemoved {
            block: note,
            subtree: vec![note],
        })
    );
}

#[test]
fn test_events_wait_for_the_next_tick() {
    let mut session = Session::new();
    let init = on_canvas(session.workspace_mut(), var_init("x", DataType::Int, false));
    assert!(session.variables().get(init).is_none());
    assert_eq!(session.workspace().pending_tasks(), 1);

    session.tick().expect("Tick should succeed");
    assert!(session.variables().get(init).is_some());
}

#[test]
fn test_declaration_gets_drawer_companion() {
    let (session, init, target, read) = session_with_usages();
    let ws = session.workspace();

    let tracked = session.variables().get(init).expect("x should be tracked");
    assert_eq!(tracked.name, "x");
    assert_eq!(tracked.signature, (DataType::Int, true));
    assert_eq!(tracked.usages.iter().copied().collect::<Vec<_>>(), vec![target, read]);

    let companion = tracked.companion.expect("Companion should exist");
    assert!(ws.block(companion).unwrap().is_in_drawer());
    assert!(ws.children_of(ws.drawer()).unwrap().contains(&companion));
    assert_eq!(session.variables().declaration_of(companion), Some(init));

    // Usages take the declared type and mutability.
    assert_eq!(
        ws.data(read).unwrap(),
        BlockData::Variable {
            name: "x".to_string(),
            data_type: DataType::Int,
            mutable: true,
            declaration: Some(init),
        }
    );
}

#[test]
fn test_duplicate_declaration_is_renamed() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let first = on_canvas(ws, var_init("x", DataType::Int, false));
    let second = on_canvas(ws, var_init("x", DataType::Int, false));
    session.flush().expect("Failed to flush events");

    assert_eq!(names(&session), vec!["x".to_string(), "x1".to_string()]);
    assert_eq!(session.variables().get(first).unwrap().name, "x");
    assert_eq!(
        session.workspace().data(second).unwrap(),
        var_init("x1", DataType::Int, false)
    );
}

#[test]
fn test_colliding_rename_is_reverted() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    on_canvas(ws, var_init("x", DataType::Int, false));
    let y = on_canvas(ws, var_init("y", DataType::Int, false));
    session.flush().expect("Failed to flush events");
    let before = names(&session);

    session
        .workspace_mut()
        .update_data(y, |d| *d = var_init("x", DataType::Int, false))
        .expect("Update should succeed");
    session.flush().expect("Failed to flush events");

    assert_eq!(names(&session), before);
    assert_eq!(
        session.workspace().data(y).unwrap(),
        var_init("y", DataType::Int, false)
    );
}

#[test]
fn test_rename_propagates_to_usages() {
    let (mut session, init, target, read) = session_with_usages();
    session
        .workspace_mut()
        .update_data(init, |d| *d = var_init("count", DataType::Int, true))
        .expect("Update should succeed");
    session.flush().expect("Failed to flush events");

    let ws = session.workspace();
    let companion = session.variables().get(init).unwrap().companion.unwrap();
    for usage in [target, read, companion] {
        match ws.data(usage).unwrap() {
            BlockData::Variable { name, .. } => assert_eq!(name, "count"),
            other => panic!("Expected a variable, got {:?}", other),
        }
    }
    assert_eq!(names(&session), vec!["count".to_string()]);
}

#[test]
fn test_type_change_revalidates_usages() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let main = on_canvas(ws, function("main"));
    let init = create(ws, var_init("n", DataType::Int, false));
    nest(ws, main, ConnectorRole::FunctionBody, init);
    let print = create(ws, template(ExpressionTemplate::IntToString));
    append(ws, init, print);
    let read = create(ws, variable("n"));
    plug(ws, print, ConnectorRole::Input, 0, read);
    session.flush().expect("Failed to flush events");
    assert_eq!(
        session.workspace().upstream(read).unwrap().map(|e| e.block),
        Some(print)
    );

    session
        .workspace_mut()
        .update_data(init, |d| *d = var_init("n", DataType::Bool, false))
        .expect("Update should succeed");
    session.flush().expect("Failed to flush events");

    let ws = session.workspace();
    assert_eq!(ws.upstream(read).unwrap().map(|e| e.block), Some(ws.root()));
}

#[test]
fn test_removing_declaration_removes_usages() {
    let (mut session, init, target, read) = session_with_usages();
    let companion = session.variables().get(init).unwrap().companion.unwrap();

    session.delete_block(init).expect("Failed to delete block");
    session.flush().expect("Failed to flush events");

    let ws = session.workspace();
    for gone in [init, target, read, companion] {
        assert!(!ws.contains(gone), "{} should have been removed", gone);
    }
    assert!(!ws.children_of(ws.drawer()).unwrap().contains(&companion));
    assert!(session.variables().names().is_empty());
}

#[test]
fn test_pending_usage_resolves_when_declared() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let main = on_canvas(ws, function("main"));
    let set = create(ws, BlockData::VarSet);
    nest(ws, main, ConnectorRole::FunctionBody, set);
    let target = create(ws, variable("late"));
    plug(ws, set, ConnectorRole::Target, 0, target);
    session.flush().expect("Failed to flush events");
    assert_eq!(session.unresolved_usages(), vec![target]);

    let ws = session.workspace_mut();
    let init = create(ws, var_init("late", DataType::String, true));
    let body = socket(ws, main, ConnectorType::Inner, ConnectorRole::FunctionBody, 0);
    attach(ws, main, body, init);
    session.flush().expect("Failed to flush events");

    assert!(session.unresolved_usages().is_empty());
    assert_eq!(session.variables().declaration_of(target), Some(init));
    // The VarSet was pushed behind the new declaration.
    assert_eq!(session.workspace().next_in_chain(init).unwrap(), Some(set));
}

#[test]
fn test_drawer_clone_is_bound() {
    let (mut session, init, _, _) = session_with_usages();
    let companion = session.variables().get(init).unwrap().companion.unwrap();

    let copy = session
        .workspace_mut()
        .clone_block(companion)
        .expect("Failed to clone");
    session.flush().expect("Failed to flush events");

    assert_eq!(session.variables().declaration_of(copy), Some(init));
    assert!(session.variables().get(init).unwrap().usages.contains(&copy));
}

#[test]
fn test_function_usage_takes_signature() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    on_canvas(
        ws,
        function_with("add", &[("a", DataType::Int), ("b", DataType::Int)], DataType::Int),
    );
    let main = on_canvas(ws, function("main"));
    let call = create(ws, invoke("add", DataType::Void));
    nest(ws, main, ConnectorRole::FunctionBody, call);
    session.flush().expect("Failed to flush events");

    let ws = session.workspace();
    assert_eq!(ws.connectors_of(call, ConnectorType::Extension).unwrap().len(), 2);
    match ws.data(call).unwrap() {
        BlockData::FunctionInvoke {
            params, return_type, ..
        } => {
            assert_eq!(params.len(), 2);
            assert_eq!(return_type, DataType::Int);
        }
        other => panic!("Expected an invocation, got {:?}", other),
    }
    assert_eq!(
        session.functions().names(),
        vec!["add".to_string(), "main".to_string()]
    );
}

#[test]
fn test_drawer_blocks_are_not_tracked() {
    let mut session = Session::new();
    let init = create(session.workspace_mut(), var_init("x", DataType::Int, false));
    session
        .workspace_mut()
        .add_to_drawer(init, None)
        .expect("Failed to add to drawer");
    session.flush().expect("Failed to flush events");

    assert!(session.variables().get(init).is_none());
}

#[test]
fn test_bump_suffix_does_not_overflow() {
    assert_eq!(bump_suffix("x18446744073709551615"), "x184467440737095516151");

    let mut session = Session::new();
    let ws = session.workspace_mut();
    on_canvas(ws, var_init("x18446744073709551615", DataType::Int, false));
    on_canvas(ws, var_init("x18446744073709551615", DataType::Int, false));
    session.flush().expect("Failed to flush events");

    assert_eq!(
        names(&session),
        vec![
            "x18446744073709551615".to_string(),
            "x184467440737095516151".to_string()
        ]
    );
}

#[test]
fn test_drawer_connections_follow_membership_rule() {
    let mut session = Session::new();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    session.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    // A fresh block entering the Drawer is still announced.
    let palette = create(session.workspace_mut(), comment("palette"));
    session
        .workspace_mut()
        .add_to_drawer(palette, None)
        .expect("Failed to add to drawer");
    session.flush().expect("Failed to flush events");
    assert_eq!(
        *events.borrow(),
        vec![WorkspaceEvent::WorkspaceAdded {
            block: palette,
            subtree: vec![palette],
        }]
    );

    let note = on_canvas(session.workspace_mut(), comment("note"));
    session.flush().expect("Failed to flush events");
    assert_eq!(events.borrow().len(), 2);

    // Moving a canvas block under a Drawer member is neither event.
    let ws = session.workspace_mut();
    ws.disconnect_self(note).expect("Failed to disconnect");
    append(ws, palette, note);
    session.flush().expect("Failed to flush events");
    assert_eq!(events.borrow().len(), 2);
    assert!(session.workspace().block(note).unwrap().is_in_drawer());
}

#[test]
fn test_dragging_palette_block_leaves_companion_in_drawer() {
    let mut session = Session::new();
    let ws = session.workspace_mut();
    let f = on_canvas(ws, function("f"));
    let main = on_canvas(ws, function("main"));
    let first = create(ws, comment("first"));
    nest(ws, main, ConnectorRole::FunctionBody, first);
    session.flush().expect("Failed to flush events");

    let companion = session.functions().get(f).unwrap().companion.unwrap();
    let ws = session.workspace_mut();
    let first_after = after(ws, first);
    ws.set_connector_position(first_after, Point::new(0.0, 10.0));
    ws.set_block_position(companion, Point::new(100.0, 100.0));
    let companion_before = before(ws, companion);
    ws.set_connector_position(companion_before, Point::new(100.0, 100.0));

    let dropped = session
        .drop_block(companion, Point::new(-100.0, -88.0))
        .expect("Drop should succeed");
    let copy = dropped.block;
    assert_ne!(copy, companion);

    let ws = session.workspace_mut();
    assert_eq!(dropped.connection, Some(Connection::new(before(ws, copy), first_after)));
    assert!(ws.children_of(ws.drawer()).unwrap().contains(&companion));
    let tail = create(ws, comment("tail"));
    append(ws, copy, tail);
    session.flush().expect("Failed to flush events");
    assert_eq!(session.functions().declaration_of(copy), Some(f));

    session.delete_block(f).expect("Failed to delete block");
    session.flush().expect("Failed to flush events");

    let ws = session.workspace();
    assert!(!ws.contains(companion));
    assert!(!ws.contains(copy));
    assert!(ws.contains(tail));
    assert_eq!(ws.next_in_chain(first).unwrap(), Some(tail));
}
