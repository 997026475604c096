//! Pointer geometry.
//!
//! All coordinates are page-space pixels. Directions are derived from the
//! pointer's angle relative to a box center, mapped on a 360° circle where
//! 0° points right, negative angles are above the center and ±180° points
//! left.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0 + self.x, self.height / 2.0 + self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Top,
    Bottom,
    Left,
    Right,
    Unknown,
}

/// Angle in degrees of the pointer relative to the rect center, in
/// `(-180, 180]`. Returns 0 when the pointer sits exactly on the center.
pub fn mouse_angle(rect: Rect, pointer: Point) -> f64 {
    let center = rect.center();
    let vx = pointer.x - center.x;
    let vy = pointer.y - center.y;
    let length = (vx * vx + vy * vy).sqrt();
    if length == 0.0 {
        return 0.0;
    }
    (vy / length).atan2(vx / length).to_degrees()
}

/// Above-center pointers resolve to `Top`, everything else to `Bottom`.
pub fn mouse_direction_y(rect: Rect, pointer: Point) -> Direction {
    if mouse_angle(rect, pointer) < 0.0 {
        Direction::Top
    } else {
        Direction::Bottom
    }
}

/// `Left` only inside the 130°..180° wedges on either side of the axis, so
/// horizontal reordering favors "insert after".
pub fn mouse_direction_x(rect: Rect, pointer: Point) -> Direction {
    let angle = mouse_angle(rect, pointer);
    if (angle > -180.0 && angle <= -130.0) || (angle <= 180.0 && angle > 130.0) {
        Direction::Left
    } else {
        Direction::Right
    }
}

/// Size of the sensitive band around a container's perimeter.
const BORDER_AROUND: f64 = 10.0;

/// Which 10px border band of `rect` the pointer is in, if any. Checked in
/// top, bottom, left, right order; the first hit wins.
pub fn border_under_mouse(rect: Rect, pointer: Point) -> Direction {
    let x = rect.x.abs().floor();
    let y = rect.y.abs().floor();
    let bottom = (y + rect.height).floor();
    let right = (x + rect.width).floor();

    if pointer.y > y && pointer.y <= y + BORDER_AROUND {
        Direction::Top
    } else if pointer.y < bottom && pointer.y >= bottom - BORDER_AROUND {
        Direction::Bottom
    } else if pointer.x > x && pointer.x <= x + BORDER_AROUND {
        Direction::Left
    } else if pointer.x < right && pointer.x >= right - BORDER_AROUND {
        Direction::Right
    } else {
        Direction::Unknown
    }
}
