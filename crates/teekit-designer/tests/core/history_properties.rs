use proptest::prelude::*;

use teekit_designer::{
    AreaId, Color, DesignerCommand, Document, Element, ElementId, ElementInit, ElementPatch,
    ElementTransform, ElementVariant, History, Scale, Size, SourceRef,
};

#[derive(Debug, Clone)]
enum Op {
    AddText { area: usize, x: f64, y: f64 },
    AddImage { area: usize, x: f64, y: f64, width: f64, height: f64 },
    Remove(usize),
    Move { pick: usize, dx: f64, dy: f64 },
    Rotate { pick: usize, degrees: f64 },
    Reorder { pick: usize, to: usize },
    Update { pick: usize, scale: f64, font_size: f64, shade: u8 },
    Background { area: usize, shade: u8 },
    Batch { pick: usize, dx: f64, shade: u8, poisoned: bool },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4, -50.0..250.0f64, -50.0..250.0f64)
            .prop_map(|(area, x, y)| Op::AddText { area, x, y }),
        (0usize..4, -50.0..250.0f64, -50.0..250.0f64, 1.0..400.0f64, 1.0..400.0f64).prop_map(
            |(area, x, y, width, height)| Op::AddImage { area, x, y, width, height }
        ),
        any::<usize>().prop_map(Op::Remove),
        (any::<usize>(), -20.0..20.0f64, -20.0..20.0f64)
            .prop_map(|(pick, dx, dy)| Op::Move { pick, dx, dy }),
        (any::<usize>(), -720.0..720.0f64)
            .prop_map(|(pick, degrees)| Op::Rotate { pick, degrees }),
        (any::<usize>(), 0usize..6).prop_map(|(pick, to)| Op::Reorder { pick, to }),
        (any::<usize>(), 0.0001..8.0f64, 1.0..144.0f64, any::<u8>()).prop_map(
            |(pick, scale, font_size, shade)| Op::Update { pick, scale, font_size, shade }
        ),
        (0usize..4, any::<u8>()).prop_map(|(area, shade)| Op::Background { area, shade }),
        (any::<usize>(), -20.0..20.0f64, any::<u8>(), any::<bool>()).prop_map(
            |(pick, dx, shade, poisoned)| Op::Batch { pick, dx, shade, poisoned }
        ),
    ]
}

/// A command plus whether it is expected to be rejected
struct Planned {
    command: DesignerCommand,
    fails: bool,
}

impl Planned {
    fn ok(command: DesignerCommand) -> Self {
        Self { command, fails: false }
    }
}

fn pick(doc: &Document, index: usize) -> Option<Element> {
    let elements: Vec<&Element> = doc.elements().collect();
    if elements.is_empty() {
        return None;
    }
    Some(elements[index % elements.len()].clone())
}

fn add(doc: &Document, area: usize, init: ElementInit, natural: Size) -> Option<Planned> {
    let id = ElementId(doc.next_element_id());
    let element =
        teekit_designer::create_element(id, AreaId::ALL[area], init, |_| Some(natural)).ok()?;
    Some(Planned::ok(DesignerCommand::add(element)))
}

fn background(doc: &Document, area: AreaId, shade: u8) -> DesignerCommand {
    let before = doc.area(area).background_color;
    DesignerCommand::set_background(area, before, Color::rgb(shade, 255 - shade, shade / 2))
}

/// Translate an op into a command against the current document
fn command_for(op: &Op, doc: &Document) -> Option<Planned> {
    match op {
        Op::AddText { area, x, y } => add(
            doc,
            *area,
            ElementInit::text("p").at(*x, *y),
            Size::new(0.0, 0.0),
        ),
        Op::AddImage { area, x, y, width, height } => add(
            doc,
            *area,
            ElementInit::image(SourceRef::from_bytes(b"swatch")).at(*x, *y),
            Size::new(*width, *height),
        ),
        Op::Remove(index) => {
            pick(doc, *index).map(|e| Planned::ok(DesignerCommand::remove(e.id)))
        }
        Op::Move { pick: index, dx, dy } => pick(doc, *index).map(|e| {
            Planned::ok(DesignerCommand::transform(
                e.id,
                e.transform,
                e.transform.translated(*dx, *dy),
            ))
        }),
        Op::Rotate { pick: index, degrees } => pick(doc, *index).map(|e| {
            let after = ElementTransform::new(e.position(), *degrees, Scale::uniform(1.0));
            Planned::ok(DesignerCommand::transform(e.id, e.transform, after))
        }),
        Op::Reorder { pick: index, to } => pick(doc, *index).and_then(|e| {
            let from = doc.index_of(e.id)?;
            let len = doc.area(e.area_id).len();
            let to = (*to).min(len - 1);
            Some(Planned::ok(DesignerCommand::reorder(e.id, from, to)))
        }),
        Op::Update { pick: index, scale, font_size, shade } => pick(doc, *index).and_then(|e| {
            let patch = match e.variant() {
                ElementVariant::Text => ElementPatch::new()
                    .scale(*scale, *scale)
                    .font_size(*font_size)
                    .fill(Color::rgb(*shade, 0, 0)),
                ElementVariant::Image => ElementPatch::new()
                    .scale(*scale, *scale / 2.0)
                    .rotation(f64::from(*shade)),
            };
            let after = patch.apply_to(&e).ok()?;
            Some(Planned::ok(DesignerCommand::update(e, after)))
        }),
        Op::Background { area, shade } => {
            Some(Planned::ok(background(doc, AreaId::ALL[*area], *shade)))
        }
        Op::Batch { pick: index, dx, shade, poisoned } => {
            let mut children = Vec::new();
            let area = match pick(doc, *index) {
                Some(e) => {
                    children.push(DesignerCommand::transform(
                        e.id,
                        e.transform,
                        e.transform.translated(*dx, 0.0),
                    ));
                    e.area_id
                }
                None => AreaId::Front,
            };
            children.push(background(doc, area, *shade));
            if *poisoned {
                // No document ever reaches this id
                children.push(DesignerCommand::remove(ElementId(u64::MAX)));
            }
            Some(Planned {
                command: DesignerCommand::composite("Batch", children),
                fails: *poisoned,
            })
        }
    }
}

proptest! {
    #[test]
    fn prop_undo_all_restores_initial_document(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let mut doc = Document::new("prop");
        let initial = doc.clone();
        let mut history = History::with_max_depth(None);
        let mut executed = 0;

        for op in &ops {
            if let Some(planned) = command_for(op, &doc) {
                let before = doc.clone();
                let depth = history.undo_len();
                let result = history.execute(planned.command, &mut doc);
                if planned.fails {
                    prop_assert!(result.is_err());
                    prop_assert_eq!(&doc, &before);
                    prop_assert_eq!(history.undo_len(), depth);
                } else {
                    prop_assert!(result.is_ok());
                    executed += 1;
                }
                prop_assert!(doc.check_integrity().is_ok());
            }
        }

        let after = doc.clone();
        for _ in 0..executed {
            prop_assert!(history.undo(&mut doc).unwrap().changed());
            prop_assert!(doc.check_integrity().is_ok());
        }
        prop_assert_eq!(&doc, &initial);

        for _ in 0..executed {
            prop_assert!(history.redo(&mut doc).unwrap().changed());
        }
        prop_assert_eq!(&doc, &after);
    }

    #[test]
    fn prop_execute_then_undo_is_identity(ops in prop::collection::vec(op_strategy(), 1..20), last in op_strategy()) {
        let mut doc = Document::new("prop");
        let mut history = History::with_max_depth(None);
        for op in &ops {
            if let Some(planned) = command_for(op, &doc) {
                let _ = history.execute(planned.command, &mut doc);
            }
        }

        let before = doc.clone();
        if let Some(planned) = command_for(&last, &doc) {
            if !planned.fails {
                history.execute(planned.command, &mut doc).unwrap();
                history.undo(&mut doc).unwrap();
                prop_assert_eq!(&doc, &before);
                prop_assert!(history.can_redo());
            }
        }
    }

    #[test]
    fn prop_every_area_reference_resolves(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut doc = Document::new("prop");
        let mut history = History::new();
        for (i, op) in ops.iter().enumerate() {
            if let Some(planned) = command_for(op, &doc) {
                let _ = history.execute(planned.command, &mut doc);
            }
            if i % 3 == 2 {
                history.undo(&mut doc).unwrap();
            }
        }

        let mut referenced = 0;
        for area in doc.areas() {
            for id in &area.elements {
                let element = doc.element(*id);
                prop_assert!(element.is_some());
                prop_assert_eq!(element.map(|e| e.area_id), Some(area.id));
                referenced += 1;
            }
        }
        prop_assert_eq!(referenced, doc.element_count());
    }
}
