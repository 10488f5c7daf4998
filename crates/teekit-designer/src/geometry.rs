//! Geometry and transform helpers.
//!
//! All coordinates are area-local design units (1/96 inch) with the origin at
//! the top-left corner of the area and y pointing down.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::font_manager::TextMeasurer;
use crate::model::{Element, ElementKind, ElementTransform, Scale};

/// Tolerance used for containment checks
pub const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn scaled(&self, scale: Scale) -> Self {
        Self::new(self.width * scale.sx, self.height * scale.sy)
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x: min_x.min(max_x),
            min_y: min_y.min(max_y),
            max_x: max_x.max(min_x),
            max_y: max_y.max(min_y),
        }
    }

    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Smallest rectangle containing all points
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut rect = Rect::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            rect.min_x = rect.min_x.min(p.x);
            rect.min_y = rect.min_y.min(p.y);
            rect.max_x = rect.max_x.max(p.x);
            rect.max_y = rect.max_y.max(p.y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x - EPSILON
            && p.x <= self.max_x + EPSILON
            && p.y >= self.min_y - EPSILON
            && p.y <= self.max_y + EPSILON
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }
        Some(Rect {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        })
    }
}

/// Normalize an angle in degrees into `[0, 360)`
pub fn normalize_degrees(degrees: f64) -> f64 {
    let r = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

/// Build the affine matrix mapping element-local coordinates (origin at the
/// top-left of the intrinsic box) into area coordinates.
///
/// Order: scale, rotate about the centre of the scaled box, translate to
/// `position`.
#[rustfmt::skip]
pub fn compose_transform(transform: &ElementTransform, intrinsic: Size) -> Matrix3<f64> {
    let scaled = intrinsic.scaled(transform.scale);
    let half_w = scaled.width / 2.0;
    let half_h = scaled.height / 2.0;
    let (sin, cos) = transform.rotation.to_radians().sin_cos();

    let scale = Matrix3::new(
        transform.scale.sx, 0.0, 0.0,
        0.0, transform.scale.sy, 0.0,
        0.0, 0.0, 1.0,
    );
    let to_center = translation(-half_w, -half_h);
    let rotation = Matrix3::new(
        cos, -sin, 0.0,
        sin, cos, 0.0,
        0.0, 0.0, 1.0,
    );
    let from_center = translation(
        transform.position.x + half_w,
        transform.position.y + half_h,
    );

    from_center * rotation * to_center * scale
}

#[rustfmt::skip]
pub fn translation(dx: f64, dy: f64) -> Matrix3<f64> {
    Matrix3::new(
        1.0, 0.0, dx,
        0.0, 1.0, dy,
        0.0, 0.0, 1.0,
    )
}

pub fn transform_point(matrix: &Matrix3<f64>, p: Point) -> Point {
    let v = matrix * Vector3::new(p.x, p.y, 1.0);
    Point::new(v.x, v.y)
}

/// Corners of the intrinsic box mapped through `matrix`, clockwise from
/// the local origin
pub fn transformed_corners(matrix: &Matrix3<f64>, intrinsic: Size) -> [Point; 4] {
    [
        transform_point(matrix, Point::new(0.0, 0.0)),
        transform_point(matrix, Point::new(intrinsic.width, 0.0)),
        transform_point(matrix, Point::new(intrinsic.width, intrinsic.height)),
        transform_point(matrix, Point::new(0.0, intrinsic.height)),
    ]
}

/// Axis-aligned bounds of the intrinsic box under `matrix`
pub fn transformed_bounds(matrix: &Matrix3<f64>, intrinsic: Size) -> Rect {
    let corners = transformed_corners(matrix, intrinsic);
    Rect::from_points(&corners).unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0))
}

/// Analytic extent of a `width` x `height` rectangle rotated by `degrees`
pub fn rotated_rect_extent(width: f64, height: f64, degrees: f64) -> Size {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Size::new(
        width * cos.abs() + height * sin.abs(),
        width * sin.abs() + height * cos.abs(),
    )
}

/// Unscaled size of an element's content box
pub fn intrinsic_size(element: &Element, measurer: &dyn TextMeasurer) -> Size {
    match &element.kind {
        ElementKind::Text(text) => measurer.layout(text).size,
        ElementKind::Image(image) => Size::new(image.natural_width, image.natural_height),
    }
}

/// Local-to-area matrix for an element
pub fn element_matrix(element: &Element, measurer: &dyn TextMeasurer) -> Matrix3<f64> {
    compose_transform(&element.transform, intrinsic_size(element, measurer))
}

/// Axis-aligned bounding box of an element in area coordinates
pub fn bounding_box(element: &Element, measurer: &dyn TextMeasurer) -> Rect {
    let intrinsic = intrinsic_size(element, measurer);
    transformed_bounds(&compose_transform(&element.transform, intrinsic), intrinsic)
}

/// Whether `point` (area coordinates) falls inside the element's rotated box
pub fn hit_test(point: Point, element: &Element, measurer: &dyn TextMeasurer) -> bool {
    let intrinsic = intrinsic_size(element, measurer);
    let matrix = compose_transform(&element.transform, intrinsic);
    let Some(inverse) = matrix.try_inverse() else {
        return false;
    };
    let local = transform_point(&inverse, point);
    Rect::new(0.0, 0.0, intrinsic.width, intrinsic.height).contains(local)
}
