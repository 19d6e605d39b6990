//! Per-camera processing and the sequential batch loop.

use chrono::Utc;
use rain_map_camera::progress::ProgressCallback;
use rain_map_camera::{CameraCatalog, ImageSource, image_source, street};
use rain_map_camera_models::{
    BatchReport, CameraOutcome, CameraRecord, RainObservation, SkipReason,
};
use rain_map_detect::{DensityEstimator, RainAggregator};
use rain_map_spatial::NeighborhoodIndex;

/// Everything a batch needs besides the cameras themselves.
pub struct BatchContext<'a> {
    /// Neighborhood resolver built from the boundary dataset.
    pub index: &'a NeighborhoodIndex,
    /// Where frames come from.
    pub images: &'a dyn ImageSource,
    /// Frame scorer. Its config also decides which scores are rain.
    pub estimator: &'a dyn DensityEstimator,
}

/// Resolves, fetches, decodes, and scores one camera.
///
/// Never fails: any problem becomes [`CameraOutcome::Skipped`] and is
/// logged with whatever context was already known.
pub async fn process_camera(ctx: &BatchContext<'_>, camera: &CameraRecord) -> CameraOutcome {
    let label = street::extract(&camera.url);
    if label.is_unknown() {
        log::debug!("{}: no street pair in identifier", camera.url);
    }
    let street_label = label.to_string();

    let neighborhood = match ctx.index.resolve(camera.x, camera.y) {
        Ok(name) => name.to_string(),
        Err(e) => {
            log::warn!("Skipping {} ({street_label}): {e}", camera.url);
            return CameraOutcome::Skipped {
                url: camera.url.clone(),
                neighborhood: None,
                street_label,
                reason: SkipReason::Transform(e.to_string()),
            };
        }
    };

    let skip = |reason: SkipReason| {
        log::warn!(
            "Skipping {} in {neighborhood} at {street_label}: {reason}",
            camera.url
        );
        CameraOutcome::Skipped {
            url: camera.url.clone(),
            neighborhood: Some(neighborhood.clone()),
            street_label: street_label.clone(),
            reason,
        }
    };

    let bytes = match ctx.images.fetch(&camera.url).await {
        Ok(bytes) => bytes,
        Err(e) => return skip(SkipReason::Fetch(e.to_string())),
    };

    let frame = match image_source::decode(&bytes) {
        Ok(frame) => frame,
        Err(e) => return skip(SkipReason::Decode(e.to_string())),
    };

    let edge_density = ctx.estimator.score(&frame);
    log::debug!(
        "{} in {neighborhood} at {street_label}: density {edge_density:.5}",
        camera.url
    );

    CameraOutcome::Observed(RainObservation {
        neighborhood,
        street_label,
        edge_density,
    })
}

/// Processes every camera in dataset order, one at a time, and aggregates
/// the observations.
///
/// All records of the batch share the timestamp taken when the last camera
/// finishes.
pub async fn run_batch(
    ctx: &BatchContext<'_>,
    catalog: CameraCatalog,
    progress: &dyn ProgressCallback,
) -> BatchReport {
    let total = catalog.cameras.len();
    progress.set_total(u64::try_from(total).unwrap_or(u64::MAX));
    progress.set_message("Scoring cameras".to_string());

    let mut aggregator = RainAggregator::new(*ctx.estimator.config());
    let mut outcomes = Vec::with_capacity(total);

    for camera in &catalog.cameras {
        let outcome = process_camera(ctx, camera).await;
        if let CameraOutcome::Observed(observation) = &outcome {
            aggregator.add(observation.clone());
        }
        outcomes.push(outcome);
        progress.inc(1);
    }

    let records = aggregator.finalize(Utc::now());
    let report = BatchReport {
        outcomes,
        records,
        excluded: catalog.excluded,
    };

    log::info!(
        "Scored {}/{total} cameras into {} records ({} excluded up front)",
        report.observed_count(),
        report.records.len(),
        report.excluded
    );
    progress.finish(format!("{} records", report.records.len()));

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use image::{DynamicImage, Rgb, RgbImage};
    use rain_map_camera::CameraError;
    use rain_map_camera::progress::NullProgress;
    use rain_map_detect::DetectConfig;
    use rain_map_neighborhood_models::BoundaryRegion;
    use rain_map_spatial::StatePlaneProjection;
    use std::collections::HashMap;
    use std::io::Cursor;

    const BALLARD_CAM: &str = "https://host/images/15th_Market_N.jpg";

    /// Serves canned responses keyed by URL. Unknown URLs are 404s.
    struct FakeImages(HashMap<String, Vec<u8>>);

    #[async_trait]
    impl ImageSource for FakeImages {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, CameraError> {
            self.0.get(url).cloned().ok_or_else(|| CameraError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    /// Scores every frame the same.
    struct FixedDensity(f64, DetectConfig);

    impl FixedDensity {
        fn new(density: f64) -> Self {
            Self(density, DetectConfig::default())
        }
    }

    impl DensityEstimator for FixedDensity {
        fn score(&self, _image: &DynamicImage) -> f64 {
            self.0
        }

        fn config(&self) -> &DetectConfig {
            &self.1
        }
    }

    fn png() -> Vec<u8> {
        let mut encoded = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([128, 128, 128])))
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
            .unwrap();
        encoded
    }

    fn ballard_index() -> NeighborhoodIndex {
        let ballard = vec![
            [-122.40, 47.66],
            [-122.36, 47.66],
            [-122.36, 47.69],
            [-122.40, 47.69],
            [-122.40, 47.66],
        ];
        NeighborhoodIndex::new(
            &[BoundaryRegion::polygon("Ballard", ballard)],
            StatePlaneProjection::washington_north().unwrap(),
        )
    }

    fn camera_at(url: &str, lng: f64, lat: f64) -> CameraRecord {
        let p = StatePlaneProjection::washington_north()
            .unwrap()
            .forward(lng, lat)
            .unwrap();
        CameraRecord {
            url: url.to_string(),
            x: p.x,
            y: p.y,
        }
    }

    #[tokio::test]
    async fn single_camera_produces_one_record() {
        let index = ballard_index();
        let images = FakeImages(HashMap::from([(BALLARD_CAM.to_string(), png())]));
        let estimator = FixedDensity::new(0.05);
        let ctx = BatchContext {
            index: &index,
            images: &images,
            estimator: &estimator,
        };
        let catalog = CameraCatalog {
            cameras: vec![camera_at(BALLARD_CAM, -122.38, 47.67)],
            excluded: 2,
        };

        let report = run_batch(&ctx, catalog, &NullProgress).await;

        assert_eq!(report.excluded, 2);
        assert_eq!(report.records.len(), 1);
        let record = &report.records[0];
        assert_eq!(record.neighborhood, "Ballard");
        assert_eq!(record.street_label, "15th and Market");
        assert!((record.average_density - 0.05).abs() < f64::EPSILON);
        assert!(record.rain_detected);
    }

    #[tokio::test]
    async fn bad_cameras_are_skipped_without_stopping_batch() {
        let broken = "https://host/images/Leary_Market_S.jpg";
        let missing = "https://host/images/24th_Market_E.jpg";
        let nowhere = "https://host/images/Rainier_Henderson_N.jpg";

        let index = ballard_index();
        let images = FakeImages(HashMap::from([
            (BALLARD_CAM.to_string(), png()),
            (broken.to_string(), b"<html>camera offline</html>".to_vec()),
            (nowhere.to_string(), png()),
        ]));
        let estimator = FixedDensity::new(0.005);
        let ctx = BatchContext {
            index: &index,
            images: &images,
            estimator: &estimator,
        };
        let catalog = CameraCatalog {
            cameras: vec![
                camera_at(broken, -122.385, 47.668),
                CameraRecord {
                    url: "https://host/images/a_b_N.jpg".to_string(),
                    x: f64::NAN,
                    y: 0.0,
                },
                camera_at(missing, -122.39, 47.669),
                camera_at(BALLARD_CAM, -122.38, 47.67),
                camera_at(nowhere, -122.28, 47.52),
            ],
            excluded: 0,
        };

        let report = run_batch(&ctx, catalog, &NullProgress).await;

        assert_eq!(report.outcomes.len(), 5);
        assert_eq!(report.observed_count(), 2);
        let kinds: Vec<_> = report.skipped().map(|(_, r)| r.kind()).collect();
        assert_eq!(kinds, vec!["decode", "transform", "fetch"]);

        assert!(matches!(
            &report.outcomes[0],
            CameraOutcome::Skipped { neighborhood: Some(n), street_label, .. }
                if n == "Ballard" && street_label == "Leary and Market"
        ));

        let keys: Vec<_> = report
            .records
            .iter()
            .map(|r| (r.neighborhood.as_str(), r.street_label.as_str(), r.rain_detected))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Ballard", "15th and Market", false),
                ("Unknown", "Rainier and Henderson", false),
            ]
        );
    }

    #[tokio::test]
    async fn estimator_threshold_decides_rain() {
        let index = ballard_index();
        let images = FakeImages(HashMap::from([(BALLARD_CAM.to_string(), png())]));
        let strict = DetectConfig {
            rain_threshold: 0.1,
            ..DetectConfig::default()
        };
        let estimator = FixedDensity(0.05, strict);
        let ctx = BatchContext {
            index: &index,
            images: &images,
            estimator: &estimator,
        };
        let catalog = CameraCatalog {
            cameras: vec![camera_at(BALLARD_CAM, -122.38, 47.67)],
            excluded: 0,
        };

        let report = run_batch(&ctx, catalog, &NullProgress).await;

        assert_eq!(report.records.len(), 1);
        assert!(!report.records[0].rain_detected);
        assert!(report.records[0].average_density.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unlabeled_camera_uses_unknown_street() {
        let url = "https://host/cams/ballard-01.jpg";
        let index = ballard_index();
        let images = FakeImages(HashMap::from([(url.to_string(), png())]));
        let estimator = FixedDensity::new(0.2);
        let ctx = BatchContext {
            index: &index,
            images: &images,
            estimator: &estimator,
        };

        let outcome = process_camera(&ctx, &camera_at(url, -122.38, 47.67)).await;
        assert_eq!(
            outcome,
            CameraOutcome::Observed(RainObservation {
                neighborhood: "Ballard".to_string(),
                street_label: "Unknown and Unknown".to_string(),
                edge_density: 0.2,
            })
        );
    }
}
