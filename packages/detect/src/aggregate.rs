//! Per-intersection aggregation of frame scores.
//!
//! Every scored frame registers its (neighborhood, street label) key. Only
//! rain-positive frames contribute to the key's average, so a key whose
//! frames were all dry is still reported, with an average of zero.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rain_map_camera_models::{AggregateRainRecord, RainObservation};

use crate::DetectConfig;

type Key = (String, String);

/// Accumulates observations for one batch.
#[derive(Debug, Clone)]
pub struct RainAggregator {
    config: DetectConfig,
    groups: BTreeMap<Key, Vec<f64>>,
}

impl RainAggregator {
    /// Creates an empty aggregator that classifies frames with `config`.
    #[must_use]
    pub const fn new(config: DetectConfig) -> Self {
        Self {
            config,
            groups: BTreeMap::new(),
        }
    }

    /// Records one scored frame.
    pub fn add(&mut self, observation: RainObservation) {
        let positive = self.config.is_rain_positive(observation.edge_density);
        let densities = self
            .groups
            .entry((observation.neighborhood, observation.street_label))
            .or_default();
        if positive {
            densities.push(observation.edge_density);
        }
    }

    /// Folds another aggregator's observations into this one.
    ///
    /// `other` is assumed to have been built with the same config.
    pub fn merge(&mut self, other: Self) {
        for (key, densities) in other.groups {
            self.groups.entry(key).or_default().extend(densities);
        }
    }

    /// Number of distinct keys seen so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no observation has been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Emits one record per key, ordered by key, all stamped with `now`.
    #[must_use]
    pub fn finalize(self, now: DateTime<Utc>) -> Vec<AggregateRainRecord> {
        self.groups
            .into_iter()
            .map(|((neighborhood, street_label), densities)| {
                let average_density = mean(&densities);
                AggregateRainRecord {
                    neighborhood,
                    street_label,
                    average_density,
                    rain_detected: !densities.is_empty(),
                    timestamp: now,
                }
            })
            .collect()
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn obs(neighborhood: &str, street: &str, density: f64) -> RainObservation {
        RainObservation {
            neighborhood: neighborhood.to_string(),
            street_label: street.to_string(),
            edge_density: density,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 11, 19, 8, 30, 0).unwrap()
    }

    #[test]
    fn averages_only_rain_positive_frames() {
        let mut agg = RainAggregator::new(DetectConfig::default());
        agg.add(obs("Ballard", "15th and Market", 0.03));
        agg.add(obs("Ballard", "15th and Market", 0.005));
        agg.add(obs("Ballard", "15th and Market", 0.05));

        let records = agg.finalize(now());
        assert_eq!(records.len(), 1);
        assert!((records[0].average_density - 0.04).abs() < 1e-12);
        assert!(records[0].rain_detected);
    }

    #[test]
    fn dry_key_is_still_emitted() {
        let mut agg = RainAggregator::new(DetectConfig::default());
        agg.add(obs("Fremont", "Fremont and 34th", 0.002));
        agg.add(obs("Fremont", "Fremont and 34th", 0.01));

        let records = agg.finalize(now());
        assert_eq!(records.len(), 1);
        assert!(records[0].average_density.abs() < f64::EPSILON);
        assert!(!records[0].rain_detected);
    }

    #[test]
    fn records_share_timestamp_and_sort_by_key() {
        let mut agg = RainAggregator::new(DetectConfig::default());
        agg.add(obs("Wallingford", "45th and Meridian", 0.2));
        agg.add(obs("Ballard", "Leary and Market", 0.0));
        agg.add(obs("Ballard", "15th and Market", 0.3));

        let records = agg.finalize(now());
        let keys: Vec<_> = records
            .iter()
            .map(|r| (r.neighborhood.as_str(), r.street_label.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Ballard", "15th and Market"),
                ("Ballard", "Leary and Market"),
                ("Wallingford", "45th and Meridian"),
            ]
        );
        assert!(records.iter().all(|r| r.timestamp == now()));
    }

    #[test]
    fn result_does_not_depend_on_order() {
        let observations = vec![
            obs("Ballard", "15th and Market", 0.02),
            obs("Unknown", "Unknown and Unknown", 0.5),
            obs("Ballard", "15th and Market", 0.06),
            obs("Ballard", "Leary and Market", 0.001),
        ];

        let mut forward = RainAggregator::new(DetectConfig::default());
        observations.iter().cloned().for_each(|o| forward.add(o));
        let mut backward = RainAggregator::new(DetectConfig::default());
        observations.iter().rev().cloned().for_each(|o| backward.add(o));

        assert_eq!(forward.finalize(now()), backward.finalize(now()));
    }

    #[test]
    fn merged_shards_match_single_pass() {
        let mut whole = RainAggregator::new(DetectConfig::default());
        let mut left = RainAggregator::new(DetectConfig::default());
        let mut right = RainAggregator::new(DetectConfig::default());
        for (i, density) in [0.02, 0.0, 0.08, 0.04].into_iter().enumerate() {
            let o = obs("Ballard", "15th and Market", density);
            whole.add(o.clone());
            if i % 2 == 0 {
                left.add(o);
            } else {
                right.add(o);
            }
        }
        right.add(obs("Fremont", "Fremont and 34th", 0.0));
        whole.add(obs("Fremont", "Fremont and 34th", 0.0));

        left.merge(right);
        assert_eq!(left.len(), 2);
        assert_eq!(left.finalize(now()), whole.finalize(now()));
    }

    #[test]
    fn classifies_with_configured_threshold() {
        let config = DetectConfig {
            rain_threshold: 0.1,
            ..DetectConfig::default()
        };
        let mut agg = RainAggregator::new(config);
        agg.add(obs("Ballard", "15th and Market", 0.05));
        agg.add(obs("Fremont", "Fremont and 34th", 0.15));

        let records = agg.finalize(now());
        assert!(!records[0].rain_detected);
        assert!(records[1].rain_detected);
        assert!((records[1].average_density - 0.15).abs() < 1e-12);
    }

    #[test]
    fn empty_aggregator_emits_nothing() {
        let agg = RainAggregator::new(DetectConfig::default());
        assert!(agg.is_empty());
        assert!(agg.finalize(now()).is_empty());
    }
}
