// Core types shared by every generator.

use crate::error::Error;
use image::{ImageBuffer, Rgba, RgbaImage};

/// Zero displacement: R = G = 128, no blue, fully opaque.
pub const NEUTRAL: [u8; 4] = [128, 128, 0, 255];

/// Channel midpoint and half-range used by the downstream filter:
/// offset = (channel - 128) / 127.
const MID: f64 = 128.0;
const SPAN: f64 = 127.0;

/// Encode one signed displacement component (nominally in [-1, 1]) into a
/// channel byte. Rounds half-to-even and clamps to 0..=255 like a
/// clamped byte array would.
#[inline]
pub fn encode_channel(d: f64, opacity: f64) -> u8 {
    let v = MID + d * SPAN * opacity;
    if v.is_nan() {
        return MID as u8;
    }
    v.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Inverse of [`encode_channel`] with opacity 1.
#[inline]
pub fn decode_channel(c: u8) -> f64 {
    (c as f64 - MID) / SPAN
}

/// Buffer size in device pixels: floor(logical * ratio), ratio defaults to 1.
pub fn device_size(logical_width: f64, logical_height: f64, device_pixel_ratio: Option<f64>) -> (usize, usize) {
    let dpr = device_pixel_ratio.unwrap_or(1.0);
    let w = (logical_width * dpr).floor().max(0.0) as usize;
    let h = (logical_height * dpr).floor().max(0.0) as usize;
    (w, h)
}

/// A width x height grid of RGBA pixels, row-major, 4 bytes per pixel.
/// Visual: red encodes horizontal push, green vertical push; flat
/// olive-ish (128,128,0) means "leave the backdrop alone".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplacementBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>, // length = width * height * 4
}

impl DisplacementBuffer {
    /// Allocate a buffer filled with the neutral pixel.
    pub fn neutral(width: usize, height: usize) -> Self {
        let mut data = Vec::with_capacity(width * height * 4);
        for _ in 0..width * height {
            data.extend_from_slice(&NEUTRAL);
        }
        Self { width, height, data }
    }

    /// Wrap raw RGBA bytes. Fails when the length does not match the size.
    pub fn from_rgba(width: usize, height: usize, data: Vec<u8>) -> Result<Self, Error> {
        if data.len() != width * height * 4 {
            return Err(Error::invalid(
                "data",
                format!("expected {} bytes for {width}x{height}, got {}", width * height * 4, data.len()),
            ));
        }
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw RGBA bytes, ready to upload as a texture.
    pub fn as_rgba(&self) -> &[u8] {
        &self.data
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.data
    }

    pub(crate) fn rgba_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Pixel at (x, y), or None when out of bounds.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Decoded (dx, dy) at (x, y) in [-1, 1] units.
    pub fn displacement(&self, x: usize, y: usize) -> Option<(f64, f64)> {
        self.pixel(x, y).map(|p| (decode_channel(p[0]), decode_channel(p[1])))
    }

    /// Iterate over all pixels as [R, G, B, A].
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 4]> + '_ {
        self.data.chunks_exact(4).map(|p| [p[0], p[1], p[2], p[3]])
    }

    /// Pack into 0x00RRGGBB words for a minifb window.
    pub fn to_rgb_words(&self) -> Vec<u32> {
        self.data
            .chunks_exact(4)
            .map(|p| ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | p[2] as u32)
            .collect()
    }

    /// Copy into an `image` RGBA buffer (for PNG export or further processing).
    pub fn to_image(&self) -> Result<RgbaImage, Error> {
        let (w, h) = (self.width as u32, self.height as u32);
        ImageBuffer::<Rgba<u8>, _>::from_raw(w, h, self.data.clone())
            .ok_or_else(|| Error::invalid("buffer", "size does not fit an RGBA image"))
    }

    /// Write the map as a PNG file.
    pub fn save_png(&self, path: &std::path::Path) -> Result<(), Error> {
        self.to_image()?.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_buffer_is_all_neutral() {
        let b = DisplacementBuffer::neutral(3, 2);
        assert_eq!(b.as_rgba().len(), 24);
        assert!(b.pixels().all(|p| p == NEUTRAL));
    }

    #[test]
    fn encode_hits_the_ends_of_the_range() {
        assert_eq!(encode_channel(0.0, 1.0), 128);
        assert_eq!(encode_channel(1.0, 1.0), 255);
        assert_eq!(encode_channel(-1.0, 1.0), 1);
        // Opacity scales toward neutral.
        assert_eq!(encode_channel(1.0, 0.0), 128);
        // Out-of-range input clamps instead of wrapping.
        assert_eq!(encode_channel(5.0, 1.0), 255);
        assert_eq!(encode_channel(-5.0, 1.0), 0);
        assert_eq!(encode_channel(f64::NAN, 1.0), 128);
    }

    #[test]
    fn encode_is_antisymmetric_around_neutral() {
        for i in -200..=200 {
            let d = i as f64 / 200.0;
            let a = encode_channel(d, 1.0) as i32;
            let b = encode_channel(-d, 1.0) as i32;
            assert_eq!(a + b, 256, "d = {d}");
        }
    }

    #[test]
    fn device_size_floors_and_defaults() {
        assert_eq!(device_size(100.0, 50.0, None), (100, 50));
        assert_eq!(device_size(100.0, 50.0, Some(1.5)), (150, 75));
        assert_eq!(device_size(33.0, 33.0, Some(1.5)), (49, 49));
    }

    #[test]
    fn from_rgba_checks_length() {
        assert!(DisplacementBuffer::from_rgba(2, 2, vec![0; 16]).is_ok());
        assert!(DisplacementBuffer::from_rgba(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn rgb_words_drop_alpha() {
        let b = DisplacementBuffer::from_rgba(1, 1, vec![0x12, 0x34, 0x56, 0xFF]).unwrap();
        assert_eq!(b.to_rgb_words(), vec![0x0012_3456]);
    }

    #[test]
    fn pixel_out_of_bounds_is_none() {
        let b = DisplacementBuffer::neutral(2, 2);
        assert_eq!(b.pixel(1, 1), Some(NEUTRAL));
        assert_eq!(b.pixel(2, 0), None);
        assert_eq!(b.displacement(0, 0), Some((0.0, 0.0)));
    }

    #[test]
    fn image_conversion_keeps_dimensions() {
        let img = DisplacementBuffer::neutral(4, 3).to_image().unwrap();
        assert_eq!(img.dimensions(), (4, 3));
        assert_eq!(img.get_pixel(3, 2).0, NEUTRAL);
    }
}
