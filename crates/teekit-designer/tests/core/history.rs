use std::sync::Arc;

use teekit_core::{Error, NotFoundError};
use teekit_designer::{
    ApproximateMeasurer, AreaId, EditorSession, ElementInit, ElementPatch, HistoryStep,
};
use teekit_settings::{Config, HistorySettings};

fn session_with(config: Config) -> EditorSession {
    let mut session = EditorSession::with_measurer(config, Arc::new(ApproximateMeasurer));
    session.new_document("History");
    session
}

fn session() -> EditorSession {
    session_with(Config::default())
}

#[test]
fn test_add_then_undo_leaves_front_empty() {
    let mut session = session();
    let before = session.document_snapshot().unwrap();

    session
        .add_element(AreaId::Front, ElementInit::text("Hi"))
        .unwrap();
    assert_eq!(session.elements_in(AreaId::Front).unwrap().len(), 1);

    let step = session.undo().unwrap();
    assert_eq!(step, HistoryStep::Undone("Add Element".to_string()));
    assert!(session.elements_in(AreaId::Front).unwrap().is_empty());
    assert_eq!(*session.document_snapshot().unwrap(), *before);
    assert!(session.can_redo());
}

#[test]
fn test_empty_stacks_report_nothing_to_do() {
    let mut session = session();
    assert_eq!(session.undo().unwrap(), HistoryStep::NothingToUndo);
    assert_eq!(session.redo().unwrap(), HistoryStep::NothingToRedo);
}

#[test]
fn test_new_command_invalidates_redo() {
    let mut session = session();
    let id = session.add_element(AreaId::Front, ElementInit::text("a")).unwrap();
    session
        .update_element(id, &ElementPatch::new().content("b"))
        .unwrap();
    session.undo().unwrap();
    assert!(session.can_redo());

    session
        .update_element(id, &ElementPatch::new().content("c"))
        .unwrap();
    assert!(!session.can_redo());
    assert_eq!(session.redo().unwrap(), HistoryStep::NothingToRedo);
    assert_eq!(
        session.get_element(id).unwrap().as_text().unwrap().content,
        "c"
    );
}

#[test]
fn test_redo_restores_removed_element_at_same_index() {
    let mut session = session();
    let a = session.add_element(AreaId::Front, ElementInit::text("a")).unwrap();
    let b = session.add_element(AreaId::Front, ElementInit::text("b")).unwrap();
    session.remove_element(a).unwrap();
    session.undo().unwrap();

    let ids: Vec<_> = session
        .elements_in(AreaId::Front)
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![a, b]);

    session.redo().unwrap();
    assert!(matches!(
        session.get_element(a),
        Err(Error::NotFound(NotFoundError::Element { .. }))
    ));
}

#[test]
fn test_depth_cap_evicts_oldest() {
    let mut config = Config::default();
    config.history = HistorySettings { max_depth: Some(2) };
    let mut session = session_with(config);

    let id = session.add_element(AreaId::Front, ElementInit::text("0")).unwrap();
    session
        .update_element(id, &ElementPatch::new().content("1"))
        .unwrap();
    session
        .update_element(id, &ElementPatch::new().content("2"))
        .unwrap();

    assert!(session.undo().unwrap().changed());
    assert!(session.undo().unwrap().changed());
    assert_eq!(session.undo().unwrap(), HistoryStep::NothingToUndo);

    // The add was evicted, so the element survives
    assert_eq!(
        session.get_element(id).unwrap().as_text().unwrap().content,
        "0"
    );
}

#[test]
fn test_purge_unreferenced_element_keeps_history() {
    let mut session = session();
    let id = session.add_element(AreaId::Front, ElementInit::text("a")).unwrap();
    let other = session.add_element(AreaId::Back, ElementInit::text("b")).unwrap();

    // Drop history entries that mention `other` by starting from a loaded copy
    let json = session.to_json().unwrap();
    session.load_json(&json).unwrap();
    session
        .update_element(id, &ElementPatch::new().content("a2"))
        .unwrap();

    session.purge_element(other).unwrap();
    assert!(session.can_undo());
    assert!(session.get_element(other).is_err());
}

#[test]
fn test_purge_referenced_element_clears_history() {
    let mut session = session();
    let id = session.add_element(AreaId::Front, ElementInit::text("a")).unwrap();

    session.purge_element(id).unwrap();
    assert!(!session.can_undo());
    assert!(!session.can_redo());
    assert!(session.elements_in(AreaId::Front).unwrap().is_empty());
}

#[test]
fn test_purge_tombstone_makes_delete_permanent() {
    let mut session = session();
    let id = session.add_element(AreaId::Front, ElementInit::text("a")).unwrap();
    session.remove_element(id).unwrap();

    session.purge_element(id).unwrap();
    assert_eq!(session.undo().unwrap(), HistoryStep::NothingToUndo);
    assert!(session.get_element(id).is_err());

    let err = session.purge_element(id).unwrap_err();
    assert!(matches!(err, Error::NotFound(NotFoundError::Element { .. })));
}
