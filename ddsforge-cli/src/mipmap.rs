//! Box-filter mip generation for exported images.

use ddsforge::MipGenerator;
use image::{Rgba, Rgba32FImage};

/// Averages 2x2 blocks per level; odd edges reuse the last row or column.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxFilter;

impl BoxFilter {
    fn downsample(source: &Rgba32FImage) -> Rgba32FImage {
        let (width, height) = source.dimensions();
        let (w, h) = ((width / 2).max(1), (height / 2).max(1));

        Rgba32FImage::from_fn(w, h, |x, y| {
            let x0 = (x * 2).min(width - 1);
            let y0 = (y * 2).min(height - 1);
            let x1 = (x0 + 1).min(width - 1);
            let y1 = (y0 + 1).min(height - 1);

            let mut sum = [0.0f32; 4];
            for (sx, sy) in [(x0, y0), (x1, y0), (x0, y1), (x1, y1)] {
                for (acc, value) in sum.iter_mut().zip(source.get_pixel(sx, sy).0) {
                    *acc += value;
                }
            }
            Rgba(sum.map(|v| v / 4.0))
        })
    }
}

impl MipGenerator for BoxFilter {
    fn generate(&self, base: &Rgba32FImage, levels: u32) -> Vec<Rgba32FImage> {
        let mut chain: Vec<Rgba32FImage> = Vec::with_capacity(levels.saturating_sub(1) as usize);
        for _ in 1..levels {
            let next = Self::downsample(chain.last().unwrap_or(base));
            chain.push(next);
        }
        chain
    }
}
