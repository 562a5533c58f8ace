//! Grayscale enhancement transforms used to build variants.

use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::median_filter;
use imageproc::integral_image::{integral_image, sum_image_pixels};

/// Default neighbourhood for adaptive thresholding.
pub const ADAPTIVE_BLOCK_SIZE: u32 = 11;
/// Constant subtracted from the local mean.
pub const ADAPTIVE_OFFSET: i32 = 2;
/// CLAHE tile grid (per axis).
pub const CLAHE_TILES: u32 = 8;
/// CLAHE clip limit, relative to a flat histogram.
pub const CLAHE_CLIP_LIMIT: f32 = 2.0;

/// 3x3 median filter.
pub fn denoise(image: &GrayImage) -> GrayImage {
    median_filter(image, 1, 1)
}

/// Binarize with the Otsu level of the whole image.
pub fn otsu_threshold(image: &GrayImage) -> GrayImage {
    let level = otsu_level(image);
    binarize(image, |_, _, value| value > level)
}

/// Binarize against the mean of a `block_size` square around each pixel,
/// minus `offset`.
pub fn adaptive_threshold(image: &GrayImage, block_size: u32, offset: i32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let integral = integral_image::<_, u64>(image);
    let half = block_size / 2;

    binarize(image, |x, y, value| {
        let x0 = x.saturating_sub(half);
        let y0 = y.saturating_sub(half);
        let x1 = (x + half).min(width - 1);
        let y1 = (y + half).min(height - 1);

        let count = u64::from((x1 - x0 + 1) * (y1 - y0 + 1));
        let mean = (sum_image_pixels(&integral, x0, y0, x1, y1)[0] / count) as i32;
        i32::from(value) > mean - offset
    })
}

/// Contrast-limited adaptive histogram equalization.
///
/// The image is split into a `tiles` x `tiles` grid. Each tile's histogram is
/// clipped at `clip_limit` times the flat bin height, the excess spread over
/// all bins, and the resulting mappings are bilinearly blended between tile
/// centres.
pub fn clahe(image: &GrayImage, tiles: u32, clip_limit: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let tile_w = width.div_ceil(tiles.clamp(1, width));
    let tile_h = height.div_ceil(tiles.clamp(1, height));
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[image.get_pixel(x, y)[0] as usize] += 1;
                }
            }
            luts.push(tile_mapping(&mut hist, (x1 - x0) * (y1 - y0), clip_limit));
        }
    }

    let lut_at = |tx: u32, ty: u32| &luts[(ty * tiles_x + tx) as usize];

    let mut output = GrayImage::new(width, height);
    for y in 0..height {
        let (ty0, ty1, ay) = neighbours(y, tile_h, tiles_y);
        for x in 0..width {
            let (tx0, tx1, ax) = neighbours(x, tile_w, tiles_x);
            let value = image.get_pixel(x, y)[0] as usize;

            let top = lut_at(tx0, ty0)[value] as f32 * (1.0 - ax) + lut_at(tx1, ty0)[value] as f32 * ax;
            let bottom =
                lut_at(tx0, ty1)[value] as f32 * (1.0 - ax) + lut_at(tx1, ty1)[value] as f32 * ax;
            let blended = top * (1.0 - ay) + bottom * ay;

            output.put_pixel(x, y, Luma([blended.round().clamp(0.0, 255.0) as u8]));
        }
    }

    output
}

fn binarize(image: &GrayImage, foreground_white: impl Fn(u32, u32, u8) -> bool) -> GrayImage {
    let (width, height) = image.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let value = image.get_pixel(x, y)[0];
        if foreground_white(x, y, value) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Equalization mapping for one tile with a clipped histogram.
fn tile_mapping(hist: &mut [u32; 256], pixels: u32, clip_limit: f32) -> [u8; 256] {
    let limit = ((clip_limit * pixels as f32 / 256.0) as u32).max(1);

    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > limit {
            excess += *bin - limit;
            *bin = limit;
        }
    }

    let share = excess / 256;
    let remainder = (excess % 256) as usize;
    for (i, bin) in hist.iter_mut().enumerate() {
        *bin += share + u32::from(i < remainder);
    }

    let mut lut = [0u8; 256];
    let mut cdf = 0u32;
    for (i, bin) in hist.iter().enumerate() {
        cdf += bin;
        lut[i] = ((cdf as f32 * 255.0 / pixels.max(1) as f32).round()).min(255.0) as u8;
    }
    lut
}

/// Neighbouring tile indices and blend weight for one coordinate.
fn neighbours(pos: u32, tile: u32, count: u32) -> (u32, u32, f32) {
    let f = (pos as f32 + 0.5) / tile as f32 - 0.5;
    if f <= 0.0 {
        return (0, 0, 0.0);
    }
    let low = (f.floor() as u32).min(count - 1);
    let high = (low + 1).min(count - 1);
    let weight = if high == low { 0.0 } else { f - low as f32 };
    (low, high, weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| Luma([(x * 255 / (width - 1)) as u8]))
    }

    fn is_binary(image: &GrayImage) -> bool {
        image.pixels().all(|p| p[0] == 0 || p[0] == 255)
    }

    #[test]
    fn test_otsu_splits_bimodal_image() {
        let image = GrayImage::from_fn(20, 10, |x, _| if x < 10 { Luma([30]) } else { Luma([220]) });
        let binary = otsu_threshold(&image);

        assert!(is_binary(&binary));
        assert_eq!(binary.get_pixel(2, 5)[0], 0);
        assert_eq!(binary.get_pixel(17, 5)[0], 255);
    }

    #[test]
    fn test_adaptive_threshold_keeps_dark_strokes() {
        // Light page with a one-pixel dark line.
        let mut image = GrayImage::from_pixel(30, 30, Luma([200]));
        for x in 0..30 {
            image.put_pixel(x, 15, Luma([40]));
        }

        let binary = adaptive_threshold(&image, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET);
        assert!(is_binary(&binary));
        assert_eq!(binary.get_pixel(10, 15)[0], 0);
        assert_eq!(binary.get_pixel(10, 5)[0], 255);
    }

    #[test]
    fn test_adaptive_offset_keeps_flat_regions_white() {
        let flat = GrayImage::from_pixel(12, 12, Luma([128]));
        let binary = adaptive_threshold(&flat, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET);
        assert!(binary.pixels().all(|p| p[0] == 255));

        // Without the offset a pixel equal to its local mean is background.
        let strict = adaptive_threshold(&flat, ADAPTIVE_BLOCK_SIZE, 0);
        assert!(strict.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_adaptive_threshold_window_clipped_at_corners() {
        let image = gradient(16, 9);
        let binary = adaptive_threshold(&image, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET);
        assert_eq!(binary.dimensions(), (16, 9));
        assert!(is_binary(&binary));
        // Brightest column sits above the mean of its clipped window.
        assert_eq!(binary.get_pixel(15, 0)[0], 255);
        assert_eq!(binary.get_pixel(0, 8)[0], 0);
    }

    #[test]
    fn test_clahe_preserves_dimensions_and_stretches_flat_contrast() {
        let image = GrayImage::from_fn(64, 64, |x, _| Luma([100 + (x % 8) as u8]));
        let equalized = clahe(&image, CLAHE_TILES, CLAHE_CLIP_LIMIT);

        assert_eq!(equalized.dimensions(), (64, 64));
        let min = equalized.pixels().map(|p| p[0]).min().unwrap();
        let max = equalized.pixels().map(|p| p[0]).max().unwrap();
        assert!(max - min > 7, "range {}..{} was not stretched", min, max);
    }

    #[test]
    fn test_clahe_handles_images_smaller_than_grid() {
        let image = gradient(5, 3);
        assert_eq!(clahe(&image, CLAHE_TILES, CLAHE_CLIP_LIMIT).dimensions(), (5, 3));
    }

    #[test]
    fn test_denoise_removes_salt() {
        let mut image = GrayImage::from_pixel(9, 9, Luma([255]));
        image.put_pixel(4, 4, Luma([0]));
        assert_eq!(denoise(&image).get_pixel(4, 4)[0], 255);
    }
}
