// Pixel buffer encoder: walks the object's bounding box, asks the shape mask
// which pixels are in the bezel, looks up how far the glass bends light
// there, and writes the push as R/G around the neutral 128.
// Visual: the rim of the object lights up red/green; the rest stays flat.

use crate::error::{Error, ensure_positive};
use crate::profile::RefractionProfile;
use crate::shape::{BezelGeometry, BezelSample, ShapeDescriptor};
use crate::types::{DisplacementBuffer, device_size, encode_channel};
use log::{debug, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Everything a map generation needs besides the shape and the profile.
/// Sizes are logical; they are scaled by `device_pixel_ratio` (default 1).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapParams {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub object_width: f64,
    pub object_height: f64,
    pub bezel_width: f64,
    /// Displacement that maps to a full +-127 channel swing.
    pub max_displacement: f64,
    #[serde(default)]
    pub device_pixel_ratio: Option<f64>,
}

impl MapParams {
    /// Object fills the whole canvas.
    pub fn filled(width: f64, height: f64, bezel_width: f64, max_displacement: f64) -> Self {
        Self {
            canvas_width: width,
            canvas_height: height,
            object_width: width,
            object_height: height,
            bezel_width,
            max_displacement,
            device_pixel_ratio: None,
        }
    }

    pub fn with_device_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = Some(ratio);
        self
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio.unwrap_or(1.0)
    }

    pub fn validate(&self) -> Result<(), Error> {
        ensure_positive("canvas_width", self.canvas_width)?;
        ensure_positive("canvas_height", self.canvas_height)?;
        ensure_positive("object_width", self.object_width)?;
        ensure_positive("object_height", self.object_height)?;
        ensure_positive("bezel_width", self.bezel_width)?;
        ensure_positive("max_displacement", self.max_displacement)?;
        if let Some(ratio) = self.device_pixel_ratio {
            ensure_positive("device_pixel_ratio", ratio)?;
        }
        Ok(())
    }
}

/// Encode one classified bezel pixel as RGBA.
#[inline]
pub fn encode_sample(sample: &BezelSample, profile: &RefractionProfile, bezel_width: f64, max_displacement: f64) -> [u8; 4] {
    let magnitude = profile.lookup(sample.distance_to_edge, bezel_width);
    let dx = -sample.normal_x * magnitude / max_displacement;
    let dy = -sample.normal_y * magnitude / max_displacement;
    [encode_channel(dx, sample.opacity), encode_channel(dy, sample.opacity), 0, 255]
}

/// Displacement map for a shaped glass object centred in the canvas.
pub fn generate_with_shape(params: &MapParams, shape: &ShapeDescriptor, profile: &RefractionProfile) -> DisplacementBuffer {
    let dpr = params.device_pixel_ratio();
    let geometry = BezelGeometry::for_shape(
        shape,
        params.object_width * dpr,
        params.object_height * dpr,
        params.bezel_width * dpr,
    );
    debug!(
        "{} map: corner radius {:.2}px, bezel {:.2}px",
        shape.kind.name(),
        geometry.corner_radius(),
        geometry.bezel_width()
    );
    render(params, &geometry, profile)
}

/// Displacement map for rounded-corner glass with an explicit logical
/// `radius`, classified with the squared-distance band.
pub fn generate_circular(params: &MapParams, radius: f64, profile: &RefractionProfile) -> DisplacementBuffer {
    let dpr = params.device_pixel_ratio();
    let geometry = BezelGeometry::circular(
        params.object_width * dpr,
        params.object_height * dpr,
        radius * dpr,
        params.bezel_width * dpr,
    );
    debug!("circular map: radius {:.2}px, bezel {:.2}px", geometry.corner_radius(), geometry.bezel_width());
    render(params, &geometry, profile)
}

fn render(params: &MapParams, geometry: &BezelGeometry, profile: &RefractionProfile) -> DisplacementBuffer {
    let started = Instant::now();
    let (width, height) = device_size(params.canvas_width, params.canvas_height, params.device_pixel_ratio);
    let mut buffer = DisplacementBuffer::neutral(width, height);
    if buffer.is_empty() {
        return buffer;
    }
    if profile.is_empty() {
        warn!("empty refraction profile: map will be flat");
    }

    // Object's bounding box in buffer pixels; may hang off the buffer.
    let cols = geometry.width().max(0.0).ceil() as isize;
    let rows = geometry.height().max(0.0).ceil() as isize;
    let left = ((width as f64 - geometry.width()) / 2.0).floor() as isize;
    let top = ((height as f64 - geometry.height()) / 2.0).floor() as isize;
    let x_start = left.max(0) as usize;
    let x_end = (left + cols).clamp(0, width as isize) as usize;

    let bezel = geometry.bezel_width();
    let max_displacement = params.max_displacement;

    // Rows are independent; each one only reads the geometry and profile.
    buffer.rgba_mut().par_chunks_mut(width * 4).enumerate().for_each(|(y, row)| {
        let y1 = y as isize - top;
        if y1 < 0 || y1 >= rows {
            return;
        }
        for x in x_start..x_end {
            let x1 = (x as isize - left) as usize;
            if let Some(sample) = geometry.classify(x1, y1 as usize) {
                let px = encode_sample(&sample, profile, bezel, max_displacement);
                row[x * 4..x * 4 + 4].copy_from_slice(&px);
            }
        }
    });

    debug!("rendered {width}x{height} displacement map in {:?}", started.elapsed());
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{BevelPreset, ProfileParams};
    use crate::types::NEUTRAL;

    fn profile() -> RefractionProfile {
        let p = ProfileParams { bezel_width: 8.0, glass_thickness: 40.0, sample_count: 32, ..Default::default() };
        RefractionProfile::compute(&p, &BevelPreset::ConvexCircle)
    }

    #[test]
    fn buffer_scales_with_device_pixel_ratio() {
        let params = MapParams::filled(40.0, 30.0, 5.0, 10.0).with_device_pixel_ratio(2.0);
        let b = generate_with_shape(&params, &ShapeDescriptor::circle(), &profile());
        assert_eq!((b.width(), b.height()), (80, 60));

        let params = MapParams::filled(40.0, 30.0, 5.0, 10.0);
        let b = generate_with_shape(&params, &ShapeDescriptor::circle(), &profile());
        assert_eq!((b.width(), b.height()), (40, 30));
    }

    #[test]
    fn interior_and_outside_stay_neutral() {
        let params = MapParams {
            canvas_width: 80.0,
            canvas_height: 80.0,
            object_width: 40.0,
            object_height: 40.0,
            bezel_width: 6.0,
            max_displacement: 10.0,
            device_pixel_ratio: None,
        };
        let b = generate_with_shape(&params, &ShapeDescriptor::circle(), &profile());
        // Canvas corner is outside the object; the centre is interior.
        assert_eq!(b.pixel(0, 0), Some(NEUTRAL));
        assert_eq!(b.pixel(40, 40), Some(NEUTRAL));
        // Object spans 20..60; its left rim is displaced.
        assert_ne!(b.pixel(21, 40), Some(NEUTRAL));
        assert_eq!(b.pixel(19, 40), Some(NEUTRAL));
    }

    #[test]
    fn empty_profile_is_flat() {
        let params = MapParams::filled(50.0, 30.0, 8.0, 10.0);
        for shape in [ShapeDescriptor::pill(), ShapeDescriptor::squircle(0.8, 5.0), ShapeDescriptor::rectangle(0.3)] {
            let b = generate_with_shape(&params, &shape, &RefractionProfile::empty());
            assert!(b.pixels().all(|p| p == NEUTRAL), "{:?}", shape.kind);
        }
        let b = generate_circular(&params, 10.0, &RefractionProfile::empty());
        assert!(b.pixels().all(|p| p == NEUTRAL));
    }

    #[test]
    fn rim_pushes_along_the_normal() {
        let profile = RefractionProfile::from_samples(vec![5.0; 4]);
        let params = MapParams::filled(60.0, 30.0, 6.0, 10.0);
        let b = generate_with_shape(&params, &ShapeDescriptor::rectangle(0.5), &profile);
        // Left edge: normal (-1, 0), displacement +0.5 in x.
        let [r, g, ..] = b.pixel(1, 15).unwrap();
        assert_eq!(g, 128);
        assert_eq!(r, 128 + 64); // 128 + 0.5 * 127 = 191.5 -> 192
        // Top edge: normal (0, -1).
        let [r, g, ..] = b.pixel(30, 1).unwrap();
        assert_eq!(r, 128);
        assert_eq!(g, 192);
    }

    #[test]
    fn blue_is_zero_and_alpha_full_everywhere() {
        let params = MapParams::filled(48.0, 32.0, 8.0, 20.0);
        let b = generate_with_shape(&params, &ShapeDescriptor::squircle(1.0, 4.0), &profile());
        assert!(b.pixels().all(|p| p[2] == 0 && p[3] == 255));
    }

    #[test]
    fn circular_matches_shape_path_for_circles() {
        let params = MapParams::filled(64.0, 64.0, 8.0, 20.0);
        let p = profile();
        let shaped = generate_with_shape(&params, &ShapeDescriptor::circle(), &p);
        let legacy = generate_circular(&params, 32.0, &p);
        assert_eq!(shaped, legacy);
    }

    #[test]
    fn object_larger_than_canvas_is_cropped() {
        let params = MapParams {
            canvas_width: 20.0,
            canvas_height: 20.0,
            object_width: 40.0,
            object_height: 40.0,
            bezel_width: 4.0,
            max_displacement: 10.0,
            device_pixel_ratio: None,
        };
        let b = generate_with_shape(&params, &ShapeDescriptor::rectangle(0.5), &profile());
        assert_eq!((b.width(), b.height()), (20, 20));
    }

    #[test]
    fn zero_sized_canvas_is_empty() {
        let params = MapParams::filled(0.4, 10.0, 4.0, 10.0);
        let b = generate_with_shape(&params, &ShapeDescriptor::circle(), &profile());
        assert!(b.is_empty());
    }

    #[test]
    fn validate_rejects_bad_params() {
        assert!(MapParams::filled(10.0, 10.0, 2.0, 1.0).validate().is_ok());
        assert!(MapParams::filled(10.0, 10.0, 0.0, 1.0).validate().is_err());
        assert!(MapParams::filled(10.0, 10.0, 2.0, 0.0).validate().is_err());
        assert!(MapParams::filled(-1.0, 10.0, 2.0, 1.0).validate().is_err());
        assert!(MapParams::filled(10.0, 10.0, 2.0, 1.0).with_device_pixel_ratio(0.0).validate().is_err());
    }
}
