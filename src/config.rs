//! Configuration for one displacement-map job.
//!
//! A `MapConfig` can be deserialized from JSON; every section has defaults,
//! so `{}` is a valid config describing a 300x200 circle of glass.
//!
//! ```json
//! {
//!   "canvas": { "width": 320, "height": 120, "device_pixel_ratio": 2 },
//!   "shape": { "kind": "squircle", "corner_radius": 0.8, "squircle_exponent": 5 },
//!   "glass": { "bezel_width": 30, "bevel": "convex-squircle" },
//!   "mode": { "kind": "refraction" }
//! }
//! ```

use crate::encode::{MapParams, generate_circular, generate_with_shape};
use crate::error::{Error, ensure_positive};
use crate::magnify::generate_magnifying;
use crate::profile::{BevelPreset, ProfileParams, RefractionProfile};
use crate::shape::ShapeDescriptor;
use crate::types::DisplacementBuffer;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root of the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MapConfig {
    /// Output area and device scale.
    pub canvas: CanvasConfig,
    /// Size of the glass object; defaults to the canvas size.
    pub object: ObjectConfig,
    /// Outline of the glass (refraction mode only).
    pub shape: ShapeDescriptor,
    /// Physical glass parameters feeding the refraction profile.
    pub glass: GlassConfig,
    /// Which generator to run.
    pub mode: Mode,
    /// Normaliser for the encoded displacement. Defaults to the largest
    /// |profile sample|, so the strongest bend uses the full channel range.
    pub max_displacement: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: Option<f64>,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self { width: 300.0, height: 200.0, device_pixel_ratio: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ObjectConfig {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlassConfig {
    pub thickness: f64,
    pub bezel_width: f64,
    pub refractive_index: f64,
    pub samples: usize,
    pub bevel: BevelPreset,
}

impl Default for GlassConfig {
    fn default() -> Self {
        let p = ProfileParams::default();
        Self {
            thickness: p.glass_thickness,
            bezel_width: p.bezel_width,
            refractive_index: p.refractive_index,
            samples: p.sample_count,
            bevel: BevelPreset::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Mode {
    /// Shape-aware bezel refraction.
    #[default]
    Refraction,
    /// Rounded-corner refraction with an explicit logical radius.
    LegacyCircle { radius: f64 },
    /// Radial magnifier over the whole canvas.
    Magnify,
}

impl Mode {
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Refraction => "refraction",
            Mode::LegacyCircle { .. } => "legacy-circle",
            Mode::Magnify => "magnify",
        }
    }
}

impl MapConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate a JSON string.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.profile_params().validate()?;
        // The normaliser is only known after sampling; 1 is a stand-in here.
        self.map_params(self.max_displacement.unwrap_or(1.0)).validate()?;
        self.shape.validate()?;
        if let Mode::LegacyCircle { radius } = self.mode {
            if !radius.is_finite() || radius < 0.0 {
                return Err(Error::invalid("radius", format!("must be finite and >= 0, got {radius}")));
            }
        }
        Ok(())
    }

    pub fn profile_params(&self) -> ProfileParams {
        ProfileParams {
            glass_thickness: self.glass.thickness,
            bezel_width: self.glass.bezel_width,
            refractive_index: self.glass.refractive_index,
            sample_count: self.glass.samples,
        }
    }

    /// Sample the configured bevel.
    pub fn profile(&self) -> Result<RefractionProfile, Error> {
        RefractionProfile::try_compute(&self.profile_params(), &self.glass.bevel)
    }

    fn map_params(&self, max_displacement: f64) -> MapParams {
        MapParams {
            canvas_width: self.canvas.width,
            canvas_height: self.canvas.height,
            object_width: self.object.width.unwrap_or(self.canvas.width),
            object_height: self.object.height.unwrap_or(self.canvas.height),
            bezel_width: self.glass.bezel_width,
            max_displacement,
            device_pixel_ratio: self.canvas.device_pixel_ratio,
        }
    }

    /// Map parameters with the normaliser resolved against `profile`.
    pub fn map_params_for(&self, profile: &RefractionProfile) -> Result<MapParams, Error> {
        let max_displacement = match self.max_displacement {
            Some(m) => {
                ensure_positive("max_displacement", m)?;
                m
            }
            None => {
                let m = profile.max_abs();
                if m > 0.0 {
                    m
                } else {
                    warn!("profile has no displacement; using max_displacement = 1");
                    1.0
                }
            }
        };
        let params = self.map_params(max_displacement);
        params.validate()?;
        Ok(params)
    }

    /// Run the configured generator with a profile computed by the caller
    /// (lets a preview loop reuse one profile across redraws).
    pub fn render_with(&self, profile: &RefractionProfile) -> Result<DisplacementBuffer, Error> {
        let buffer = match self.mode {
            Mode::Magnify => generate_magnifying(self.canvas.width, self.canvas.height, self.canvas.device_pixel_ratio),
            Mode::Refraction => generate_with_shape(&self.map_params_for(profile)?, &self.shape, profile),
            Mode::LegacyCircle { radius } => generate_circular(&self.map_params_for(profile)?, radius, profile),
        };
        Ok(buffer)
    }

    /// Sample the profile and run the configured generator.
    pub fn render(&self) -> Result<DisplacementBuffer, Error> {
        let profile = match self.mode {
            Mode::Magnify => RefractionProfile::empty(),
            _ => self.profile()?,
        };
        self.render_with(&profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::ShapeKind;

    #[test]
    fn empty_json_uses_defaults() {
        let c = MapConfig::from_json("{}").unwrap();
        assert_eq!(c, MapConfig::default());
        assert_eq!(c.glass.samples, 128);
        assert_eq!(c.glass.thickness, 200.0);
        assert_eq!(c.shape.kind, ShapeKind::Circle);
        assert_eq!(c.mode, Mode::Refraction);
    }

    #[test]
    fn parses_every_section() {
        let c = MapConfig::from_json(
            r#"{
                "canvas": { "width": 320, "height": 120, "device_pixel_ratio": 2 },
                "object": { "width": 300 },
                "shape": { "kind": "squircle", "corner_radius": 0.8, "squircle_exponent": 5 },
                "glass": { "bezel_width": 30, "bevel": "convex-squircle" },
                "mode": { "kind": "legacy-circle", "radius": 40 },
                "max_displacement": 12.5
            }"#,
        )
        .unwrap();
        assert_eq!(c.canvas.device_pixel_ratio, Some(2.0));
        assert_eq!(c.object.width, Some(300.0));
        assert_eq!(c.object.height, None);
        assert_eq!(c.shape.kind, ShapeKind::Squircle);
        assert_eq!(c.glass.bevel, BevelPreset::ConvexSquircle);
        assert_eq!(c.glass.refractive_index, 1.5);
        assert_eq!(c.mode, Mode::LegacyCircle { radius: 40.0 });
        assert_eq!(c.max_displacement, Some(12.5));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(MapConfig::from_json(r#"{ "glass": { "refractive_index": 0.9 } }"#).is_err());
        assert!(MapConfig::from_json(r#"{ "glass": { "samples": 0 } }"#).is_err());
        assert!(MapConfig::from_json(r#"{ "shape": { "corner_radius": 2 } }"#).is_err());
        assert!(MapConfig::from_json(r#"{ "mode": { "kind": "legacy-circle", "radius": -4 } }"#).is_err());
        assert!(MapConfig::from_json(r#"{ "max_displacement": 0 }"#).is_err());
        assert!(matches!(MapConfig::from_json("{ not json"), Err(Error::Config(_))));
    }

    #[test]
    fn json_round_trips() {
        let mut c = MapConfig::default();
        c.mode = Mode::Magnify;
        c.glass.bevel = BevelPreset::Lip;
        let back = MapConfig::from_json(&c.to_json().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn render_respects_canvas_and_mode() {
        let mut c = MapConfig::default();
        c.canvas = CanvasConfig { width: 60.0, height: 40.0, device_pixel_ratio: Some(1.5) };
        c.glass.bezel_width = 10.0;
        let b = c.render().unwrap();
        assert_eq!((b.width(), b.height()), (90, 60));

        c.mode = Mode::Magnify;
        let b = c.render().unwrap();
        assert_eq!(b.pixel(0, 0), Some([1, 1, 0, 255]));
    }

    #[test]
    fn default_normaliser_is_profile_peak() {
        let c = MapConfig::default();
        let profile = RefractionProfile::from_samples(vec![2.0, -8.0]);
        assert_eq!(c.map_params_for(&profile).unwrap().max_displacement, 8.0);
        assert_eq!(c.map_params_for(&RefractionProfile::empty()).unwrap().max_displacement, 1.0);
    }
}
