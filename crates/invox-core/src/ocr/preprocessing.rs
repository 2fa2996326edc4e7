//! Image preprocessing for OCR.
//!
//! Grayscale conversion, non-local-means denoising, Gaussian adaptive
//! thresholding and a morphological close, in that order.

use std::time::Instant;

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::distance_transform::Norm;
use imageproc::{filter, morphology};
use tracing::{debug, trace};

use crate::models::config::PreprocessConfig;

/// Image preprocessor for the Tesseract path.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Filter strength; larger values smooth more.
    denoise_strength: f32,
    template_window: u32,
    search_window: u32,
    threshold_block_size: u32,
    threshold_offset: i32,
    morph_kernel_size: u32,
}

impl ImagePreprocessor {
    /// Create a preprocessor from configuration.
    pub fn new(config: &PreprocessConfig) -> Self {
        Self {
            denoise_strength: config.denoise_strength,
            template_window: odd(config.template_window),
            search_window: odd(config.search_window),
            threshold_block_size: odd(config.threshold_block_size.max(3)),
            threshold_offset: config.threshold_offset,
            morph_kernel_size: config.morph_kernel_size.max(1),
        }
    }

    /// Run the full preprocessing chain.
    ///
    /// The result is a binary image (0 or 255) with the input's dimensions.
    pub fn process(&self, image: &DynamicImage) -> GrayImage {
        let gray = image.to_luma8();
        debug!("Preprocessing {}x{} image", gray.width(), gray.height());

        let start = Instant::now();
        let denoised = self.denoise(&gray);
        trace!("denoise: {}ms", start.elapsed().as_millis());

        let start = Instant::now();
        let binary = self.adaptive_threshold(&denoised);
        trace!("adaptive threshold: {}ms", start.elapsed().as_millis());

        // Square kernel of side k is an L-infinity ball of radius k / 2
        let radius = (self.morph_kernel_size / 2).min(u8::MAX as u32) as u8;
        morphology::close(&binary, Norm::LInf, radius)
    }

    /// Non-local-means denoising.
    ///
    /// Each output pixel is the average of the pixels in its search window,
    /// weighted by `exp(-d / h^2)` where `d` is the mean squared difference
    /// between the template patches around the two pixels. Borders replicate.
    pub fn denoise(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 || self.denoise_strength <= 0.0 {
            return image.clone();
        }

        let tr = (self.template_window / 2) as i64;
        let sr = (self.search_window / 2) as i64;
        let pad = tr + sr;
        let padded = Padded::new(image, pad);

        // Difference images cover every template position: (w + 2tr) x (h + 2tr)
        let dw = width as i64 + 2 * tr;
        let dh = height as i64 + 2 * tr;
        let stride = (dw + 1) as usize;
        let mut integral = vec![0u64; stride * (dh + 1) as usize];

        let pixels = (width * height) as usize;
        let mut weighted = vec![0f32; pixels];
        let mut weights = vec![0f32; pixels];

        let h2 = self.denoise_strength * self.denoise_strength;
        let patch_area = (self.template_window * self.template_window) as f32;

        for dy in -sr..=sr {
            for dx in -sr..=sr {
                // Integral image of squared differences for this offset
                for v in 0..dh {
                    let mut row_sum = 0u64;
                    for u in 0..dw {
                        let a = padded.get(u + sr, v + sr) as i64;
                        let b = padded.get(u + sr + dx, v + sr + dy) as i64;
                        row_sum += ((a - b) * (a - b)) as u64;
                        let idx = (v as usize + 1) * stride + u as usize + 1;
                        integral[idx] = integral[idx - stride] + row_sum;
                    }
                }

                for y in 0..height as i64 {
                    for x in 0..width as i64 {
                        // Patch around (x, y) spans [x, x + 2tr] in difference coordinates
                        let (x0, y0) = (x as usize, y as usize);
                        let (x1, y1) = ((x + 2 * tr + 1) as usize, (y + 2 * tr + 1) as usize);
                        let ssd = integral[y1 * stride + x1] + integral[y0 * stride + x0]
                            - integral[y0 * stride + x1]
                            - integral[y1 * stride + x0];

                        let distance = ssd as f32 / patch_area;
                        let weight = (-distance / h2).exp();
                        let neighbour = padded.get(x + pad + dx, y + pad + dy) as f32;

                        let i = y as usize * width as usize + x as usize;
                        weighted[i] += weight * neighbour;
                        weights[i] += weight;
                    }
                }
            }
        }

        let mut out = GrayImage::new(width, height);
        for (i, pixel) in out.pixels_mut().enumerate() {
            // The zero offset always contributes weight 1
            let value = weighted[i] / weights[i];
            *pixel = Luma([value.round().clamp(0.0, 255.0) as u8]);
        }
        out
    }

    /// Gaussian adaptive threshold.
    ///
    /// A pixel becomes white when it is brighter than the Gaussian-weighted
    /// mean of its neighbourhood minus the configured offset.
    pub fn adaptive_threshold(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let mean = gaussian_blur(image, self.threshold_block_size);

        let mut out = GrayImage::new(width, height);
        for (x, y, pixel) in out.enumerate_pixels_mut() {
            let threshold = mean.get_pixel(x, y)[0] as i32 - self.threshold_offset;
            let value = image.get_pixel(x, y)[0] as i32;
            *pixel = Luma([if value > threshold { 255 } else { 0 }]);
        }
        out
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::new(&PreprocessConfig::default())
    }
}

fn odd(n: u32) -> u32 {
    if n % 2 == 0 { n + 1 } else { n }
}

/// Read-only view of an image extended by replicated borders.
struct Padded<'a> {
    image: &'a GrayImage,
    pad: i64,
}

impl<'a> Padded<'a> {
    fn new(image: &'a GrayImage, pad: i64) -> Self {
        Self { image, pad }
    }

    /// Pixel at padded coordinates, clamped to the source image.
    fn get(&self, u: i64, v: i64) -> u8 {
        let x = (u - self.pad).clamp(0, self.image.width() as i64 - 1);
        let y = (v - self.pad).clamp(0, self.image.height() as i64 - 1);
        self.image.get_pixel(x as u32, y as u32)[0]
    }
}

/// Gaussian blur with a `size` x `size` kernel and replicated borders.
/// Sigma follows the usual derivation from the kernel size.
fn gaussian_blur(image: &GrayImage, size: u32) -> GrayImage {
    let radius = (size / 2) as i64;
    let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;

    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);

    // Filter in f32 so the intermediate pass is not truncated to u8
    let (width, height) = image.dimensions();
    let float: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(width, height, |x, y| Luma([image.get_pixel(x, y)[0] as f32]));
    let blurred = filter::separable_filter_equal(&float, &kernel);

    GrayImage::from_fn(width, height, |x, y| {
        Luma([blurred.get_pixel(x, y)[0].round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// White page with a one-pixel black vertical stroke at `column`.
    fn stroke_image(width: u32, height: u32, column: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| {
            if x == column { Luma([0]) } else { Luma([255]) }
        })
    }

    #[test]
    fn test_output_is_binary_and_same_size() {
        let img = GrayImage::from_fn(40, 30, |x, y| Luma([((x * 7 + y * 13) % 256) as u8]));
        let out = ImagePreprocessor::default().process(&DynamicImage::ImageLuma8(img));

        assert_eq!(out.dimensions(), (40, 30));
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_uniform_page_becomes_white() {
        let img = GrayImage::from_pixel(25, 25, Luma([180]));
        let out = ImagePreprocessor::default().process(&DynamicImage::ImageLuma8(img));
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_thin_stroke_survives() {
        let img = stroke_image(32, 32, 16);
        let out = ImagePreprocessor::default().process(&DynamicImage::ImageLuma8(img));

        assert_eq!(out.get_pixel(16, 10)[0], 0);
        assert_eq!(out.get_pixel(4, 10)[0], 255);
        assert_eq!(out.get_pixel(28, 20)[0], 255);
    }

    #[test]
    fn test_denoise_keeps_uniform_image() {
        let img = GrayImage::from_pixel(12, 9, Luma([77]));
        let out = ImagePreprocessor::default().denoise(&img);
        assert_eq!(out, img);
    }

    #[test]
    fn test_denoise_preserves_repeated_structure() {
        let img = stroke_image(24, 24, 12);
        let out = ImagePreprocessor::default().denoise(&img);
        assert_eq!(out.get_pixel(12, 12)[0], 0);
        assert_eq!(out.get_pixel(3, 12)[0], 255);
    }

    #[test]
    fn test_gaussian_blur_smooths_step_symmetrically() {
        let img = GrayImage::from_fn(12, 3, |x, _| if x < 6 { Luma([0]) } else { Luma([200]) });
        let out = gaussian_blur(&img, 11);
        assert_eq!(out.get_pixel(0, 1)[0], 0);
        assert_eq!(out.get_pixel(11, 1)[0], 200);
        assert!(out.get_pixel(5, 1)[0] > 0 && out.get_pixel(5, 1)[0] < 100);
        assert_eq!(out.get_pixel(5, 1)[0] as u32 + out.get_pixel(6, 1)[0] as u32, 200);
    }

    #[test]
    fn test_gaussian_blur_of_constant_is_constant() {
        let img = GrayImage::from_pixel(8, 8, Luma([200]));
        assert_eq!(gaussian_blur(&img, 11), img);
    }

    #[test]
    fn test_color_input_is_accepted() {
        let rgb = image::RgbImage::from_pixel(10, 10, image::Rgb([250, 250, 250]));
        let out = ImagePreprocessor::default().process(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(out.dimensions(), (10, 10));
    }
}
