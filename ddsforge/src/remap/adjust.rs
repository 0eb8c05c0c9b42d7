//! Host-side pixel adjustments applied around import and export.

use image::Rgba32FImage;

/// Inverts the green channel, converting between +Y and -Y normal maps.
pub fn flip_green(image: &mut Rgba32FImage) {
    for pixel in image.pixels_mut() {
        pixel.0[1] = 1.0 - pixel.0[1];
    }
}

/// Divides color by alpha wherever alpha is non-zero.
pub fn unpremultiply(image: &mut Rgba32FImage) {
    for pixel in image.pixels_mut() {
        let alpha = pixel.0[3];
        if alpha > 0.0 {
            for channel in &mut pixel.0[..3] {
                *channel /= alpha;
            }
        }
    }
}
