//! Edge-density scoring of single frames.

use image::{DynamicImage, GrayImage};

/// Tuning for edge detection and rain classification.
///
/// Smoothing is not configurable: Canny applies one Gaussian blur with
/// sigma 1.4 before taking gradients, and no other blur is added.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectConfig {
    /// Canny hysteresis low threshold.
    pub canny_low: f32,
    /// Canny hysteresis high threshold.
    pub canny_high: f32,
    /// Densities strictly above this are rain-positive.
    pub rain_threshold: f64,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            rain_threshold: 0.01,
        }
    }
}

impl DetectConfig {
    /// Whether a density counts as rain.
    #[must_use]
    pub fn is_rain_positive(&self, density: f64) -> bool {
        density > self.rain_threshold
    }
}

/// Turns a decoded frame into a non-negative rain score.
pub trait DensityEstimator: Send + Sync {
    /// Scores one frame.
    fn score(&self, image: &DynamicImage) -> f64;

    /// The tuning scores are judged against.
    fn config(&self) -> &DetectConfig;
}

/// Scores a frame by the mean value of its Canny edge map.
///
/// Edge pixels are 255 and the rest 0, so the score is 255 times the
/// fraction of pixels on an edge.
#[derive(Debug, Clone, Default)]
pub struct EdgeDensityEstimator {
    config: DetectConfig,
}

impl EdgeDensityEstimator {
    /// Creates an estimator with the given tuning.
    #[must_use]
    pub const fn new(config: DetectConfig) -> Self {
        Self { config }
    }

    fn edges(&self, gray: &GrayImage) -> GrayImage {
        imageproc::edges::canny(gray, self.config.canny_low, self.config.canny_high)
    }
}

impl DensityEstimator for EdgeDensityEstimator {
    fn score(&self, image: &DynamicImage) -> f64 {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return 0.0;
        }

        let edges = self.edges(&image.to_luma8());
        let total: u64 = edges.pixels().map(|p| u64::from(p.0[0])).sum();

        #[allow(clippy::cast_precision_loss)]
        let density = total as f64 / (f64::from(width) * f64::from(height));
        log::trace!("{width}x{height} frame: edge density {density:.5}");
        density
    }

    fn config(&self) -> &DetectConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    /// Vertical black and white bands, each `band` pixels wide.
    fn stripes(size: u32, band: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(size, size, |x, _| {
            if (x / band) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        }))
    }

    #[test]
    fn flat_frame_has_no_edges() {
        let estimator = EdgeDensityEstimator::default();
        let flat = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 24, Rgb([90, 120, 200])));
        assert!(estimator.score(&flat).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_frame_scores_zero() {
        let estimator = EdgeDensityEstimator::default();
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(estimator.score(&empty).abs() < f64::EPSILON);
    }

    /// Dark frame crossed by bright vertical streaks given as `(x, width)`.
    fn streaks(size: u32, bands: &[(u32, u32)]) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(size, size, |x, _| {
            if bands.iter().any(|&(start, width)| (start..start + width).contains(&x)) {
                Luma([255])
            } else {
                Luma([0])
            }
        }))
    }

    #[test]
    fn one_pixel_streak_is_detected() {
        let estimator = EdgeDensityEstimator::default();
        let score = estimator.score(&streaks(64, &[(32, 1)]));
        assert!(score > 0.0, "score {score}");
    }

    #[test]
    fn each_added_streak_raises_score() {
        let estimator = EdgeDensityEstimator::default();
        let all = [(6, 1), (18, 2), (30, 3), (42, 1), (54, 2)];

        let scores: Vec<f64> = (0..=all.len())
            .map(|n| estimator.score(&streaks(64, &all[..n])))
            .collect();

        assert!(scores[0].abs() < f64::EPSILON, "scores {scores:?}");
        for pair in scores.windows(2) {
            assert!(pair[1] > pair[0], "scores {scores:?}");
        }
    }

    #[test]
    fn score_is_bounded_by_edge_value() {
        let estimator = EdgeDensityEstimator::default();
        let score = estimator.score(&stripes(64, 4));
        assert!((0.0..=255.0).contains(&score));
    }

    #[test]
    fn threshold_is_strict() {
        let config = DetectConfig::default();
        assert!(!config.is_rain_positive(0.01));
        assert!(config.is_rain_positive(0.010_001));
        assert!(!config.is_rain_positive(0.0));
    }
}
