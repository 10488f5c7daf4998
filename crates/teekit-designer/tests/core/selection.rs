use std::sync::Arc;

use teekit_designer::{
    ApproximateMeasurer, AreaId, DragMode, EditorSession, ElementId, ElementInit, HistoryStep,
    Point,
};
use teekit_settings::Config;

fn session() -> EditorSession {
    let mut session = EditorSession::with_measurer(Config::default(), Arc::new(ApproximateMeasurer));
    session.new_document("Selection");
    session
}

fn add_text(session: &mut EditorSession, area: AreaId, x: f64, y: f64) -> ElementId {
    session
        .add_element(area, ElementInit::text("Select me").at(x, y))
        .unwrap()
}

#[test]
fn test_select_unknown_id_is_noop() {
    let mut session = session();
    assert!(!session.select(ElementId(42)).unwrap());
    assert_eq!(session.get_selection(), None);
}

#[test]
fn test_select_switches_active_area() {
    let mut session = session();
    let id = add_text(&mut session, AreaId::LeftSleeve, 0.0, 0.0);
    assert_eq!(session.active_area(), AreaId::Front);

    assert!(session.select(id).unwrap());
    assert_eq!(session.get_selection(), Some(id));
    assert_eq!(session.active_area(), AreaId::LeftSleeve);

    assert!(session.set_active_area(AreaId::Back));
    assert_eq!(session.get_selection(), None);
}

#[test]
fn test_removal_and_undo_invalidate_selection() {
    let mut session = session();
    let id = add_text(&mut session, AreaId::Front, 0.0, 0.0);
    session.select(id).unwrap();

    session.remove_element(id).unwrap();
    assert_eq!(session.get_selection(), None);

    session.undo().unwrap();
    session.select(id).unwrap();
    // Undoing the add removes the element again
    session.undo().unwrap();
    assert_eq!(session.get_selection(), None);
}

#[test]
fn test_select_at_hits_topmost() {
    let mut session = session();
    let lower = add_text(&mut session, AreaId::Front, 10.0, 10.0);
    let upper = add_text(&mut session, AreaId::Front, 10.0, 10.0);

    assert_eq!(session.select_at(Point::new(15.0, 15.0)).unwrap(), Some(upper));
    session.send_to_back(upper).unwrap();
    assert_eq!(session.select_at(Point::new(15.0, 15.0)).unwrap(), Some(lower));

    assert_eq!(session.select_at(Point::new(190.0, 240.0)).unwrap(), None);
    assert_eq!(session.get_selection(), None);
}

#[test]
fn test_drag_is_one_undo_step() {
    let mut session = session();
    let id = add_text(&mut session, AreaId::Front, 20.0, 20.0);
    session.select(id).unwrap();

    assert!(session
        .begin_drag(DragMode::Move, Point::new(25.0, 25.0))
        .unwrap());
    for step in 1..=10 {
        let offset = step as f64 * 3.0;
        session
            .update_drag(Point::new(25.0 + offset, 25.0 + offset))
            .unwrap();
    }

    // Document untouched until the drag ends
    assert_eq!(session.get_element(id).unwrap().position(), Point::new(20.0, 20.0));
    let preview = session.preview_element().unwrap();
    assert_eq!(preview.position(), Point::new(50.0, 50.0));

    assert!(session.end_drag().unwrap());
    assert_eq!(session.get_element(id).unwrap().position(), Point::new(50.0, 50.0));
    assert_eq!(session.undo_name().as_deref(), Some("Transform Element"));

    assert_eq!(
        session.undo().unwrap(),
        HistoryStep::Undone("Transform Element".to_string())
    );
    assert_eq!(session.get_element(id).unwrap().position(), Point::new(20.0, 20.0));
}

#[test]
fn test_cancelled_or_still_drag_records_nothing() {
    let mut session = session();
    let id = add_text(&mut session, AreaId::Front, 20.0, 20.0);
    session.select(id).unwrap();

    session
        .begin_drag(DragMode::Rotate { snap: true }, Point::new(0.0, 0.0))
        .unwrap();
    session.update_drag(Point::new(100.0, 0.0)).unwrap();
    assert!(session.cancel_drag());
    assert!(session.preview_element().is_none());

    session
        .begin_drag(DragMode::Move, Point::new(0.0, 0.0))
        .unwrap();
    assert!(!session.end_drag().unwrap());
    assert_eq!(session.undo_name().as_deref(), Some("Add Element"));
}

#[test]
fn test_begin_drag_without_selection() {
    let mut session = session();
    assert!(!session
        .begin_drag(DragMode::Move, Point::new(0.0, 0.0))
        .unwrap());
}

#[test]
fn test_keyboard_edits() {
    let mut session = session();
    let id = add_text(&mut session, AreaId::Front, 20.0, 20.0);
    assert!(!session.nudge(1.0, 0.0).unwrap());

    session.select(id).unwrap();
    assert!(session.nudge(1.0, -2.0).unwrap());
    assert_eq!(session.get_element(id).unwrap().position(), Point::new(21.0, 18.0));

    assert!(session.rotate_selected(-15.0).unwrap());
    assert_eq!(session.get_element(id).unwrap().rotation(), 345.0);

    assert!(session.delete_selected().unwrap());
    assert!(session.get_element(id).is_err());
    assert_eq!(session.get_selection(), None);

    session.undo().unwrap();
    assert!(session.get_element(id).is_ok());
}
