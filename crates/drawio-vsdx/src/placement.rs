// crates/drawio-vsdx/src/placement.rs
//
// Coordinate conversion from the page frame (origin bottom-left, y up, inches) to the
// output frame (origin top-left, y down, screen units), and the rotation transforms applied
// after a subtree has been placed.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Rotates about `center` by `degrees`, clockwise on screen (y down).
    pub fn rotate_about(self, center: Point, degrees: f64) -> Point {
        if degrees == 0.0 {
            return self;
        }
        let (sin, cos) = degrees.to_radians().sin_cos();
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        Point {
            x: center.x + dx * cos - dy * sin,
            y: center.y + dx * sin + dy * cos,
        }
    }

    pub fn round2(self) -> Point {
        Point::new(round2(self.x), round2(self.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Moves the rectangle so its center is rotated about `pivot`; the size is unchanged.
    pub fn rotate_center_about(&self, pivot: Point, degrees: f64) -> Rect {
        let c = self.center().rotate_about(pivot, degrees);
        Rect {
            x: c.x - self.width / 2.0,
            y: c.y - self.height / 2.0,
            ..*self
        }
    }
}

/// Pin, local pin and size of a shape (or of its text block), in screen units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    pub pin: Point,
    pub loc_pin: Point,
    pub width: f64,
    pub height: f64,
}

impl Transform {
    pub fn is_centered(&self) -> bool {
        (self.loc_pin.x - self.width / 2.0).abs() < 1e-9
            && (self.loc_pin.y - self.height / 2.0).abs() < 1e-9
    }

    /// Top-left corner in the output frame. `rotation` is clockwise screen degrees; when it
    /// is non-zero and the local pin is off-center, the box is placed so the pin stays at the
    /// same absolute point.
    pub fn origin(&self, parent_height: f64, rotation: f64) -> Point {
        let Transform {
            pin,
            loc_pin,
            width: w,
            height: h,
        } = *self;
        if rotation == 0.0 || self.is_centered() {
            return Point::new(pin.x - loc_pin.x, parent_height - (pin.y + (h - loc_pin.y)));
        }
        // Center relative to the pin in the unrotated local frame (y up), turned by the
        // counter-clockwise source angle.
        let local = Point::new(w / 2.0 - loc_pin.x, h / 2.0 - loc_pin.y);
        let (sin, cos) = (360.0 - rotation).to_radians().sin_cos();
        let cx = pin.x + local.x * cos - local.y * sin;
        let cy = pin.y + local.x * sin + local.y * cos;
        Point::new(cx - w / 2.0, parent_height - cy - h / 2.0)
    }

    pub fn rect(&self, parent_height: f64, rotation: f64) -> Rect {
        let origin = self.origin(parent_height, rotation);
        Rect {
            x: origin.x,
            y: origin.y,
            width: self.width,
            height: self.height,
        }
    }
}

/// Source angle (radians, counter-clockwise) to output rotation (degrees, clockwise),
/// rounded to two decimals and normalized into `[0, 360)`.
pub fn screen_rotation(radians: f64) -> f64 {
    let degrees = radians.to_degrees();
    let r = round2((360.0 - degrees).rem_euclid(360.0));
    if r >= 360.0 { 0.0 } else { r }
}

/// Rotation of a child given its own rotation and its parent's effective rotation.
pub fn accumulate(own: f64, parent: f64) -> f64 {
    let r = round2((own + parent).rem_euclid(360.0));
    if r >= 360.0 { 0.0 } else { r }
}

pub fn round2(v: f64) -> f64 {
    let r = (v * 100.0).round() / 100.0;
    if r == 0.0 { 0.0 } else { r }
}
