//! Displacement maps for "liquid glass" panels.
//!
//! The red and green channels of each RGBA pixel hold a signed 2D offset
//! around a neutral 128; a downstream distortion filter reads them as UV
//! offsets. Pipeline:
//!
//! 1. [`RefractionProfile`] samples how far a vertical ray is pushed sideways
//!    at each depth of the bevel (compute it once, reuse it).
//! 2. [`BezelGeometry`] classifies each pixel of the object as rim or not,
//!    with distance to the edge and an outward normal.
//! 3. [`generate_with_shape`] / [`generate_circular`] combine the two into a
//!    [`DisplacementBuffer`].
//! 4. [`generate_magnifying`] is a standalone radial magnifier map.
//!
//! ```
//! use liquid_glass_map::{MapParams, ProfileParams, RefractionProfile, ShapeDescriptor, generate_with_shape};
//!
//! let profile = RefractionProfile::compute(&ProfileParams::default(), &|x: f64| x);
//! let params = MapParams::filled(200.0, 120.0, 50.0, profile.max_abs());
//! let map = generate_with_shape(&params, &ShapeDescriptor::squircle(1.0, 4.0), &profile);
//! assert_eq!((map.width(), map.height()), (200, 120));
//! ```

pub mod config;
pub mod draw;
pub mod encode;
pub mod error;
pub mod magnify;
pub mod profile;
pub mod shape;
pub mod types;

pub use config::{MapConfig, Mode};
pub use encode::{MapParams, encode_sample, generate_circular, generate_with_shape};
pub use error::Error;
pub use magnify::generate_magnifying;
pub use profile::{BevelPreset, BezelHeight, ProfileParams, RefractionProfile, calculate_displacement_map};
pub use shape::{BezelGeometry, BezelSample, DistanceMetric, ShapeDescriptor, ShapeKind, squircle_distance};
pub use types::{DisplacementBuffer, NEUTRAL, decode_channel, encode_channel};
