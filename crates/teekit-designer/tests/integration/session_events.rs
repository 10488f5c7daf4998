use std::sync::Arc;

use parking_lot::Mutex;
use teekit_core::{EventCategory, EventFilter};
use teekit_designer::{
    ApproximateMeasurer, AreaId, DocumentEvent, EditorEvent, EditorSession, ElementInit,
    HistoryEvent, SelectionEvent,
};
use teekit_settings::Config;

fn session() -> EditorSession {
    EditorSession::with_measurer(Config::default(), Arc::new(ApproximateMeasurer))
}

fn record(session: &EditorSession, filter: EventFilter) -> Arc<Mutex<Vec<EditorEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    session
        .events()
        .subscribe(filter, move |event| sink.lock().push(event));
    events
}

#[test]
fn test_document_lifecycle_events() {
    let mut session = session();
    let events = record(&session, EventFilter::Categories(vec![EventCategory::Document]));

    let doc = session.new_document("Events");
    session
        .add_element(AreaId::Front, ElementInit::text("Hi"))
        .unwrap();
    assert!(session.close());
    assert!(!session.close());

    let events = events.lock();
    assert_eq!(events.len(), 3);
    assert!(matches!(
        &events[0],
        EditorEvent::Document(DocumentEvent::Opened { document_id, .. }) if *document_id == doc.id
    ));
    match &events[1] {
        EditorEvent::Document(DocumentEvent::Changed { revision, snapshot }) => {
            assert_eq!(*revision, snapshot.revision());
            assert_eq!(snapshot.element_count(), 1);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert!(matches!(
        &events[2],
        EditorEvent::Document(DocumentEvent::Closed { .. })
    ));
}

#[test]
fn test_history_events() {
    let mut session = session();
    session.new_document("History events");
    let events = record(&session, EventFilter::Categories(vec![EventCategory::History]));

    let id = session
        .add_element(AreaId::Front, ElementInit::text("Hi"))
        .unwrap();
    session.undo().unwrap();
    session.redo().unwrap();
    session.purge_element(id).unwrap();

    let events = events.lock();
    let kinds: Vec<_> = events
        .iter()
        .map(|e| match e {
            EditorEvent::History(h) => h.clone(),
            other => panic!("unexpected event {:?}", other),
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            HistoryEvent::Changed { can_undo: true, can_redo: false },
            HistoryEvent::Changed { can_undo: false, can_redo: true },
            HistoryEvent::Changed { can_undo: true, can_redo: false },
            HistoryEvent::Cleared,
            HistoryEvent::Changed { can_undo: false, can_redo: false },
        ]
    );
}

#[test]
fn test_selection_events() {
    let mut session = session();
    session.new_document("Selection events");
    let id = session
        .add_element(AreaId::Back, ElementInit::text("Hi"))
        .unwrap();
    let events = record(&session, EventFilter::Categories(vec![EventCategory::Selection]));

    session.select(id).unwrap();
    session.select(id).unwrap();
    session.remove_element(id).unwrap();

    let events = events.lock();
    assert_eq!(events.len(), 2);
    assert!(matches!(
        &events[0],
        EditorEvent::Selection(SelectionEvent::Changed { selected: Some(s), active_area: AreaId::Back }) if *s == id
    ));
    assert!(matches!(
        &events[1],
        EditorEvent::Selection(SelectionEvent::Changed { selected: None, .. })
    ));
}

#[test]
fn test_sessions_are_independent() {
    let mut first = session();
    let mut second = session();
    first.new_document("First");
    second.new_document("Second");
    let seen = record(&second, EventFilter::All);

    first
        .add_element(AreaId::Front, ElementInit::text("only here"))
        .unwrap();

    assert!(seen.lock().is_empty());
    assert!(second.elements_in(AreaId::Front).unwrap().is_empty());
    assert!(first.is_modified());
    assert!(!second.is_modified());
}
