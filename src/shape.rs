// Shape mask: decides, per pixel of the object's bounding box, whether the
// pixel sits in the bezel band, how deep, and which way the rim faces.
// Visual: the band is the glowing rim you see in the preview; everything
// inside it (and outside the object) stays neutral.

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// Outward anti-aliasing margin, in device pixels.
const AA_MARGIN: f64 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Circle,
    Squircle,
    Rectangle,
    Pill,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 4] = [ShapeKind::Circle, ShapeKind::Squircle, ShapeKind::Rectangle, ShapeKind::Pill];

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Circle => "circle",
            ShapeKind::Squircle => "squircle",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Pill => "pill",
        }
    }

    /// Next kind in `ALL`, wrapping around (preview hotkey).
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

/// Which shape to carve the glass into.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeDescriptor {
    pub kind: ShapeKind,
    /// 0 = sharp corners, 1 = fully rounded. Ignored by circle and pill.
    pub corner_radius: f64,
    /// Superellipse exponent; only read for squircles. 2 = round, large = boxy.
    pub squircle_exponent: f64,
}

impl Default for ShapeDescriptor {
    fn default() -> Self {
        Self { kind: ShapeKind::Circle, corner_radius: 1.0, squircle_exponent: 4.0 }
    }
}

impl ShapeDescriptor {
    pub fn circle() -> Self {
        Self::default()
    }

    pub fn pill() -> Self {
        Self { kind: ShapeKind::Pill, ..Self::default() }
    }

    pub fn rectangle(corner_radius: f64) -> Self {
        Self { kind: ShapeKind::Rectangle, corner_radius, ..Self::default() }
    }

    pub fn squircle(corner_radius: f64, exponent: f64) -> Self {
        Self { kind: ShapeKind::Squircle, corner_radius, squircle_exponent: exponent }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.corner_radius) {
            return Err(Error::invalid(
                "corner_radius",
                format!("must be within [0, 1], got {}", self.corner_radius),
            ));
        }
        if self.kind == ShapeKind::Squircle && !(self.squircle_exponent >= 2.0 && self.squircle_exponent.is_finite()) {
            return Err(Error::invalid(
                "squircle_exponent",
                format!("must be finite and >= 2, got {}", self.squircle_exponent),
            ));
        }
        Ok(())
    }

    /// Corner radius in the same unit as `width`/`height`.
    pub fn corner_radius_for(&self, width: f64, height: f64) -> f64 {
        let max_radius = width.min(height) / 2.0;
        match self.kind {
            ShapeKind::Circle | ShapeKind::Pill => max_radius,
            ShapeKind::Rectangle | ShapeKind::Squircle => self.corner_radius * max_radius,
        }
    }

    /// Metric used inside the corner regions.
    pub fn metric(&self) -> DistanceMetric {
        match self.kind {
            ShapeKind::Squircle if self.corner_radius > 0.0 => {
                DistanceMetric::Superellipse { exponent: self.squircle_exponent }
            }
            _ => DistanceMetric::Euclidean,
        }
    }
}

/// Distance from a corner centre to an offset (x, y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DistanceMetric {
    Euclidean,
    Superellipse { exponent: f64 },
}

impl DistanceMetric {
    #[inline]
    pub fn distance(&self, x: f64, y: f64, radius: f64) -> f64 {
        match *self {
            DistanceMetric::Euclidean => (x * x + y * y).sqrt(),
            DistanceMetric::Superellipse { exponent } => squircle_distance(x, y, radius, exponent),
        }
    }
}

/// `((|x|/r)^n + (|y|/r)^n)^(1/n) * r`, evaluated as
/// `max * (1 + (min/max)^n)^(1/n)` so large exponents cannot overflow.
/// Falls back to Euclidean distance for r = 0.
pub fn squircle_distance(x: f64, y: f64, radius: f64, exponent: f64) -> f64 {
    if radius == 0.0 {
        return (x * x + y * y).sqrt();
    }
    let a = x.abs() / radius;
    let b = y.abs() / radius;
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    if hi == 0.0 {
        return 0.0;
    }
    hi * (1.0 + (lo / hi).powf(exponent)).powf(1.0 / exponent) * radius
}

/// How a corner pixel's distance is tested against the band.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Membership {
    /// distance_to_edge within [-1, bezel].
    Linear,
    /// Squared centre distance within [inner_sq, outer_sq]; avoids a sqrt
    /// for pixels that are rejected. Euclidean corners only.
    SquaredBand { inner_sq: f64, outer_sq: f64 },
}

/// One classified bezel pixel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezelSample {
    /// Depth into the glass from the rim; negative inside the AA margin.
    pub distance_to_edge: f64,
    /// Outward unit normal (zero at a degenerate corner centre).
    pub normal_x: f64,
    pub normal_y: f64,
    /// 1 inside the object, fading to 0 across the AA margin.
    pub opacity: f64,
}

/// Per-object geometry in device pixels, computed once per generation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezelGeometry {
    width: f64,
    height: f64,
    corner_radius: f64,
    bezel_width: f64,
    // Straight run between the two corner centres on each axis, never negative.
    between_x: f64,
    between_y: f64,
    metric: DistanceMetric,
    membership: Membership,
}

impl BezelGeometry {
    /// Geometry for a shape drawn into a `width` x `height` object.
    pub fn for_shape(shape: &ShapeDescriptor, width: f64, height: f64, bezel_width: f64) -> Self {
        let corner_radius = shape.corner_radius_for(width, height);
        Self::new(width, height, corner_radius, bezel_width, shape.metric(), Membership::Linear)
    }

    /// Circular-corner geometry with an explicit radius, using the squared
    /// distance band. Same classification as a Euclidean `for_shape`.
    pub fn circular(width: f64, height: f64, radius: f64, bezel_width: f64) -> Self {
        let radius = radius.max(0.0);
        let outer_sq = (radius + AA_MARGIN).powi(2);
        // Pixels deeper than the bezel are interior; a bezel wider than the
        // radius reaches the corner centre.
        let inner_sq = if radius > bezel_width { (radius - bezel_width).powi(2) } else { 0.0 };
        Self::new(
            width,
            height,
            radius,
            bezel_width,
            DistanceMetric::Euclidean,
            Membership::SquaredBand { inner_sq, outer_sq },
        )
    }

    fn new(
        width: f64,
        height: f64,
        corner_radius: f64,
        bezel_width: f64,
        metric: DistanceMetric,
        membership: Membership,
    ) -> Self {
        Self {
            width,
            height,
            corner_radius,
            bezel_width,
            between_x: (width - corner_radius * 2.0).max(0.0),
            between_y: (height - corner_radius * 2.0).max(0.0),
            metric,
            membership,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn corner_radius(&self) -> f64 {
        self.corner_radius
    }

    pub fn bezel_width(&self) -> f64 {
        self.bezel_width
    }

    /// Classify the pixel (x1, y1) of the object's bounding box, sampled at
    /// its centre. None means interior or outside the band.
    pub fn classify(&self, x1: usize, y1: usize) -> Option<BezelSample> {
        let r = self.corner_radius;
        let px = x1 as f64 + 0.5;
        let py = y1 as f64 + 0.5;

        let left = px < r;
        let right = !left && px > r + self.between_x;
        let top = py < r;
        let bottom = !top && py > r + self.between_y;

        match (left || right, top || bottom) {
            (true, true) => {
                // Offset from the nearest corner centre.
                let ox = if left { px - r } else { px - r - self.between_x };
                let oy = if top { py - r } else { py - r - self.between_y };
                self.corner(ox, oy)
            }
            (true, false) => {
                let d = if left { px } else { self.width - px };
                self.band(d, if left { -1.0 } else { 1.0 }, 0.0)
            }
            (false, true) => {
                let d = if top { py } else { self.height - py };
                self.band(d, 0.0, if top { -1.0 } else { 1.0 })
            }
            (false, false) => None,
        }
    }

    fn corner(&self, ox: f64, oy: f64) -> Option<BezelSample> {
        let r = self.corner_radius;
        let distance_to_edge = match self.membership {
            Membership::Linear => r - self.metric.distance(ox, oy, r),
            Membership::SquaredBand { inner_sq, outer_sq } => {
                let d2 = ox * ox + oy * oy;
                if d2 > outer_sq || d2 < inner_sq {
                    return None;
                }
                r - d2.sqrt()
            }
        };

        // A zero offset has no direction: magnitude falls back to 1, so the
        // normal (and the displacement) is zero there.
        let mut magnitude = (ox * ox + oy * oy).sqrt();
        if magnitude == 0.0 {
            magnitude = 1.0;
        }
        self.band(distance_to_edge, ox / magnitude, oy / magnitude)
    }

    #[inline]
    fn band(&self, distance_to_edge: f64, normal_x: f64, normal_y: f64) -> Option<BezelSample> {
        if !(distance_to_edge >= -AA_MARGIN && distance_to_edge <= self.bezel_width) {
            return None;
        }
        let opacity = if distance_to_edge >= 0.0 { 1.0 } else { (1.0 + distance_to_edge).max(0.0) };
        Some(BezelSample { distance_to_edge, normal_x, normal_y, opacity })
    }
}
