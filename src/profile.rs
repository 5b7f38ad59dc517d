// Refraction profile: how far a vertical ray is pushed sideways depending on
// where it enters the bevel.
// Visual: sample 0 is the outer rim (strongest bend for convex bevels), the
// last sample sits next to the flat interior of the glass.

use crate::error::{Error, ensure_positive};
use log::{trace, warn};
use serde::{Deserialize, Serialize};

/// Step used for the one-sided finite difference of the height function.
const DERIVATIVE_STEP: f64 = 1e-4;

/// Cross-section of the bevel: normalised depth in [0, 1] -> surface height.
/// Any `Fn(f64) -> f64` works, plus the named [`BevelPreset`]s.
pub trait BezelHeight {
    fn height(&self, x: f64) -> f64;
}

impl<F: Fn(f64) -> f64> BezelHeight for F {
    #[inline]
    fn height(&self, x: f64) -> f64 {
        self(x)
    }
}

/// Named bevel shapes, so a config file can pick one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BevelPreset {
    /// No slope at all; no refraction.
    Flat,
    /// Straight ramp, h(x) = x.
    #[default]
    Linear,
    /// Quarter circle, bulging outward.
    ConvexCircle,
    /// Flatter quarter superellipse (n = 4).
    ConvexSquircle,
    /// Quarter circle, hollowed inward.
    Concave,
    /// Convex rim that dips back down toward the interior.
    Lip,
}

impl BevelPreset {
    pub const ALL: [BevelPreset; 6] = [
        BevelPreset::Flat,
        BevelPreset::Linear,
        BevelPreset::ConvexCircle,
        BevelPreset::ConvexSquircle,
        BevelPreset::Concave,
        BevelPreset::Lip,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BevelPreset::Flat => "flat",
            BevelPreset::Linear => "linear",
            BevelPreset::ConvexCircle => "convex-circle",
            BevelPreset::ConvexSquircle => "convex-squircle",
            BevelPreset::Concave => "concave",
            BevelPreset::Lip => "lip",
        }
    }
}

fn convex_circle(x: f64) -> f64 {
    let t = 1.0 - x;
    (1.0 - t * t).max(0.0).sqrt()
}

fn convex_squircle(x: f64) -> f64 {
    let t = 1.0 - x;
    (1.0 - t.powi(4)).max(0.0).powf(0.25)
}

fn concave(x: f64) -> f64 {
    1.0 - convex_circle(x)
}

impl BezelHeight for BevelPreset {
    fn height(&self, x: f64) -> f64 {
        match self {
            BevelPreset::Flat => 0.0,
            BevelPreset::Linear => x,
            BevelPreset::ConvexCircle => convex_circle(x),
            BevelPreset::ConvexSquircle => convex_squircle(x),
            BevelPreset::Concave => concave(x),
            BevelPreset::Lip => {
                // Smoothstep from convex rim into a concave dip.
                let s = x * x * (3.0 - 2.0 * x);
                convex_squircle(x) * (1.0 - s) + concave(x) * s
            }
        }
    }
}

/// Physical inputs of the sampler. All lengths are in the same unit as the
/// displacement it returns (usually logical pixels).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileParams {
    pub glass_thickness: f64,
    pub bezel_width: f64,
    pub refractive_index: f64,
    pub sample_count: usize,
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self { glass_thickness: 200.0, bezel_width: 50.0, refractive_index: 1.5, sample_count: 128 }
    }
}

impl ProfileParams {
    pub fn validate(&self) -> Result<(), Error> {
        ensure_positive("glass_thickness", self.glass_thickness)?;
        ensure_positive("bezel_width", self.bezel_width)?;
        if !self.refractive_index.is_finite() || self.refractive_index <= 1.0 {
            return Err(Error::invalid(
                "refractive_index",
                format!("must be finite and > 1, got {}", self.refractive_index),
            ));
        }
        if self.sample_count == 0 {
            return Err(Error::invalid("sample_count", "must be at least 1"));
        }
        Ok(())
    }
}

/// Refract a straight-down ray through a surface with unit `normal`.
/// `eta` is n_outside / n_inside. Returns None on total internal reflection.
pub(crate) fn refract(normal: (f64, f64), eta: f64) -> Option<(f64, f64)> {
    let (nx, ny) = normal;
    let dot = ny;
    let k = 1.0 - eta * eta * (1.0 - dot * dot);
    if k < 0.0 {
        return None;
    }
    let k_sqrt = k.sqrt();
    Some((-(eta * dot + k_sqrt) * nx, eta - (eta * dot + k_sqrt) * ny))
}

/// Precomputed horizontal displacement per normalised bevel depth.
/// Cheap to clone; compute once per glass setup and reuse across redraws.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RefractionProfile {
    samples: Vec<f64>,
}

impl RefractionProfile {
    /// Sample the bevel `height` at `params.sample_count` evenly spaced depths.
    /// Does not validate `params`; see [`ProfileParams::validate`].
    pub fn compute<H: BezelHeight + ?Sized>(params: &ProfileParams, height: &H) -> Self {
        let n = params.sample_count;
        let eta = 1.0 / params.refractive_index;
        let mut reflected = 0usize;

        let samples = (0..n)
            .map(|i| {
                let x = i as f64 / n as f64;
                let y = height.height(x);

                // Forward difference inside the range, backward at the far end.
                let dx = if x < 1.0 { DERIVATIVE_STEP } else { -DERIVATIVE_STEP };
                let derivative = (height.height(x + dx) - y) / dx;
                let magnitude = (derivative * derivative + 1.0).sqrt();
                let normal = (-derivative / magnitude, -1.0 / magnitude);

                match refract(normal, eta) {
                    None => {
                        reflected += 1;
                        0.0
                    }
                    Some((rx, ry)) => {
                        // Rest of the trip down to the bottom of the glass.
                        let remaining = y * params.bezel_width + params.glass_thickness;
                        rx * (remaining / ry)
                    }
                }
            })
            .collect::<Vec<_>>();

        trace!(
            "refraction profile: {n} samples, eta={eta:.4}, {reflected} totally reflected, range [{:.3}, {:.3}]",
            samples.iter().copied().fold(f64::INFINITY, f64::min),
            samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        );
        Self { samples }
    }

    /// Validate then compute.
    pub fn try_compute<H: BezelHeight + ?Sized>(params: &ProfileParams, height: &H) -> Result<Self, Error> {
        params.validate()?;
        Ok(Self::compute(params, height))
    }

    /// Wrap samples produced elsewhere (e.g. loaded from disk).
    pub fn from_samples(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    /// A profile with no samples: every lookup yields 0.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Displacement for a pixel `distance_to_edge` deep into a bezel
    /// `bezel_width` wide. Index is clamped; an empty profile yields 0.
    #[inline]
    pub fn lookup(&self, distance_to_edge: f64, bezel_width: f64) -> f64 {
        let len = self.samples.len();
        if len == 0 {
            return 0.0;
        }
        // `as usize` saturates: negatives and NaN land on 0.
        let index = ((distance_to_edge / bezel_width) * len as f64).floor() as usize;
        self.samples[index.min(len - 1)]
    }

    /// Largest |sample|; a natural `max_displacement` normaliser.
    pub fn max_abs(&self) -> f64 {
        let m = self.samples.iter().fold(0.0_f64, |m, s| m.max(s.abs()));
        if self.samples.is_empty() {
            warn!("max_abs of an empty refraction profile is 0");
        }
        m
    }
}

/// Convenience form taking the scalars directly.
pub fn calculate_displacement_map<H: BezelHeight + ?Sized>(
    glass_thickness: f64,
    bezel_width: f64,
    height: &H,
    refractive_index: f64,
    samples: usize,
) -> Vec<f64> {
    let params = ProfileParams { glass_thickness, bezel_width, refractive_index, sample_count: samples };
    RefractionProfile::compute(&params, height).samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_call_gives_four_finite_samples() {
        let s = calculate_displacement_map(200.0, 50.0, &|x: f64| x, 1.5, 4);
        assert_eq!(s.len(), 4);
        assert!(s.iter().all(|v| v.is_finite()));
        // A constant slope pushes every sample the same way.
        assert!(s.iter().all(|v| *v > 0.0));
    }

    #[test]
    fn flat_bevel_has_no_displacement() {
        for n in [1.01, 1.33, 1.5, 2.4, 3.0] {
            let p = ProfileParams { refractive_index: n, ..Default::default() };
            let profile = RefractionProfile::compute(&p, &BevelPreset::Flat);
            assert!(profile.samples().iter().all(|v| *v == 0.0), "n = {n}");
        }
    }

    #[test]
    fn linear_ramp_is_constant_slope() {
        // Same normal everywhere, so displacement only grows with the remaining height.
        let p = ProfileParams { sample_count: 8, ..Default::default() };
        let profile = RefractionProfile::compute(&p, &BevelPreset::Linear);
        let s = profile.samples();
        for w in s.windows(2) {
            assert!(w[1].abs() > w[0].abs());
        }
    }

    #[test]
    fn refract_straight_through_flat_surface() {
        let (rx, ry) = refract((0.0, -1.0), 1.0 / 1.5).unwrap();
        assert!(rx.abs() < 1e-12);
        assert!((ry - 1.0).abs() < 1e-12);
    }

    #[test]
    fn refract_reports_total_internal_reflection() {
        // Leaving a dense medium at a grazing angle.
        let n = (-0.99_f64, -(1.0 - 0.99 * 0.99_f64).sqrt());
        assert!(refract(n, 1.5).is_none());
    }

    #[test]
    fn tir_samples_are_zero() {
        // refractive_index < 1 is out of contract but must not fault.
        let p = ProfileParams { refractive_index: 0.5, sample_count: 16, ..Default::default() };
        let profile = RefractionProfile::compute(&p, &|x: f64| 40.0 * x);
        assert!(profile.samples().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn lookup_clamps_and_handles_empty() {
        let p = RefractionProfile::from_samples(vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(p.lookup(0.0, 10.0), 1.0);
        assert_eq!(p.lookup(2.6, 10.0), 2.0);
        assert_eq!(p.lookup(9.99, 10.0), 4.0);
        assert_eq!(p.lookup(10.0, 10.0), 4.0);
        assert_eq!(p.lookup(-0.5, 10.0), 1.0);
        assert_eq!(p.lookup(f64::NAN, 10.0), 1.0);
        assert_eq!(RefractionProfile::empty().lookup(3.0, 10.0), 0.0);
    }

    #[test]
    fn validate_rejects_bad_inputs() {
        assert!(ProfileParams::default().validate().is_ok());
        assert!(ProfileParams { refractive_index: 1.0, ..Default::default() }.validate().is_err());
        assert!(ProfileParams { sample_count: 0, ..Default::default() }.validate().is_err());
        assert!(ProfileParams { bezel_width: 0.0, ..Default::default() }.validate().is_err());
        assert!(ProfileParams { glass_thickness: -1.0, ..Default::default() }.validate().is_err());
    }

    #[test]
    fn presets_stay_in_unit_range() {
        for preset in BevelPreset::ALL {
            for i in 0..=100 {
                let h = preset.height(i as f64 / 100.0);
                assert!((-1e-9..=1.0 + 1e-9).contains(&h), "{} at {i}: {h}", preset.name());
            }
        }
    }

    #[test]
    fn max_abs_picks_largest_magnitude() {
        let p = RefractionProfile::from_samples(vec![1.0, -7.5, 3.0]);
        assert_eq!(p.max_abs(), 7.5);
        assert_eq!(RefractionProfile::empty().max_abs(), 0.0);
    }
}
