use std::io::Cursor;

use proptest::prelude::*;

use teekit_designer::{
    create_element, load_document, save_document, AreaId, Color, Document, ElementId, ElementInit,
    ImageStore, Scale,
};

#[derive(Debug, Clone)]
struct Placement {
    area: usize,
    image: bool,
    x: f64,
    y: f64,
    rotation: f64,
    sx: f64,
    sy: f64,
}

fn coordinate() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1.0e4..1.0e4f64,
        prop::num::f64::NORMAL.prop_filter("finite", |v| v.is_finite()),
    ]
}

fn placement_strategy() -> impl Strategy<Value = Placement> {
    (
        0usize..4,
        any::<bool>(),
        coordinate(),
        coordinate(),
        -1.0e4..1.0e4f64,
        1.0e-6..1.0e3f64,
        1.0e-6..1.0e3f64,
    )
        .prop_map(|(area, image, x, y, rotation, sx, sy)| Placement {
            area,
            image,
            x,
            y,
            rotation,
            sx,
            sy,
        })
}

fn swatch() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([9, 80, 160, 255]));
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

proptest! {
    #[test]
    fn prop_save_then_load_is_lossless(
        placements in prop::collection::vec(placement_strategy(), 0..24),
        shade in any::<u8>(),
    ) {
        let store = ImageStore::new();
        let source = store.ingest(&swatch(), Some("image/png")).unwrap();

        let mut doc = Document::new("prop");
        doc.set_area_background(AreaId::Back, Color::rgba(shade, 0, 255 - shade, shade))
            .unwrap();
        for placement in &placements {
            let init = if placement.image {
                ElementInit::image(source.clone())
            } else {
                ElementInit::text(format!("x = {}", placement.x))
            };
            let init = init
                .at(placement.x, placement.y)
                .with_rotation(placement.rotation)
                .with_scale(Scale::new(placement.sx, placement.sy));
            let id = ElementId(doc.next_element_id());
            let element = create_element(id, AreaId::ALL[placement.area], init, |r| {
                store.natural_size(r)
            })
            .unwrap();
            doc.add_element(element, None).unwrap();
        }

        let json = save_document(&doc, Some(&store)).unwrap();
        let loaded = load_document(&json, Some(&store)).unwrap();
        prop_assert_eq!(&loaded, &doc);
        for element in doc.elements() {
            let back = loaded.element(element.id).unwrap();
            prop_assert_eq!(back.transform.position.x.to_bits(), element.transform.position.x.to_bits());
            prop_assert_eq!(back.transform.rotation.to_bits(), element.transform.rotation.to_bits());
            prop_assert_eq!(back.transform.scale.sx.to_bits(), element.transform.scale.sx.to_bits());
        }
    }
}
