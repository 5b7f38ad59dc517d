// Magnifying map: every pixel is pushed away from the centre in proportion
// to its distance, so the filter samples closer to the middle and the
// backdrop looks enlarged.
// Visual: a smooth red-green gradient, neutral in the middle.

use crate::types::{DisplacementBuffer, device_size, encode_channel};
use log::debug;
use rayon::prelude::*;

/// Radial full-buffer map for a `width` x `height` logical area.
pub fn generate_magnifying(width: f64, height: f64, device_pixel_ratio: Option<f64>) -> DisplacementBuffer {
    let (w, h) = device_size(width, height, device_pixel_ratio);
    let mut buffer = DisplacementBuffer::neutral(w, h);
    if buffer.is_empty() {
        return buffer;
    }

    let cx = w as f64 / 2.0;
    let cy = h as f64 / 2.0;

    buffer.rgba_mut().par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
        let dy = (y as f64 - cy) / cy;
        let g = encode_channel(dy, 1.0);
        for (x, px) in row.chunks_exact_mut(4).enumerate() {
            let dx = (x as f64 - cx) / cx;
            px.copy_from_slice(&[encode_channel(dx, 1.0), g, 0, 255]);
        }
    });

    debug!("rendered {w}x{h} magnifying map");
    buffer
}
