#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal plumbing for the rain map binaries.
//!
//! A run spends a few seconds loading the boundary and camera datasets and
//! then scores cameras one at a time, logging every skip. [`init_logger`]
//! routes those log lines through `indicatif-log-bridge` so they print
//! above the progress bar instead of tearing it, and
//! [`IndicatifProgress::cameras_bar`] renders the batch itself.
//!
//! Call [`init_logger()`] once at startup, before any bar is created.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;
use rain_map_camera::progress::ProgressCallback;

pub use indicatif::MultiProgress;

/// Shown while datasets load and the camera count is unknown.
const LOADING_TEMPLATE: &str = "{spinner:.cyan} {msg} [{elapsed}]";

/// Shown once the camera count is known.
const CAMERAS_TEMPLATE: &str =
    "  {msg} {wide_bar:.cyan/dim} {pos}/{len} cameras ({per_sec}, {eta} left)";

/// Log level used when `RUST_LOG` is unset.
const DEFAULT_LEVEL: LevelFilter = LevelFilter::Info;

/// Camera batch progress on an `indicatif` [`ProgressBar`].
pub struct IndicatifProgress {
    bar: ProgressBar,
    /// Style to switch to once `set_total()` provides the camera count.
    cameras_style: ProgressStyle,
}

impl IndicatifProgress {
    /// Creates the bar for one camera batch.
    ///
    /// The bar spins with `message` while the neighborhood and camera
    /// datasets load. When the batch calls
    /// [`ProgressCallback::set_total()`] with the camera count it turns into
    /// a counted bar with throughput and ETA.
    #[must_use]
    pub fn cameras_bar(multi: &MultiProgress, message: &str) -> Arc<dyn ProgressCallback> {
        Arc::new(Self::new(multi.add(ProgressBar::new_spinner()), message))
    }

    fn new(bar: ProgressBar, message: &str) -> Self {
        bar.enable_steady_tick(Duration::from_millis(100));
        bar.set_style(loading_style());
        bar.set_message(message.to_string());

        Self {
            bar,
            cameras_style: cameras_style(),
        }
    }
}

fn loading_style() -> ProgressStyle {
    ProgressStyle::with_template(LOADING_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn cameras_style() -> ProgressStyle {
    ProgressStyle::with_template(CAMERAS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

impl ProgressCallback for IndicatifProgress {
    fn set_total(&self, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_style(self.cameras_style.clone());
    }

    fn inc(&self, delta: u64) {
        self.bar.inc(delta);
    }

    fn set_message(&self, msg: String) {
        self.bar.set_message(msg);
    }

    fn finish(&self, msg: String) {
        self.bar.finish_with_message(msg);
    }
}

/// Installs `pretty_env_logger` as the global logger, wrapped so that log
/// output is suspended while progress bars redraw.
///
/// The level comes from `RUST_LOG` and defaults to `info`, which shows one
/// line per skipped camera and the batch summary. `RUST_LOG=debug` adds the
/// density of every scored frame.
///
/// Returns the [`MultiProgress`] that every progress bar must be added to.
/// Bars created outside it would be overwritten by log lines.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .filter_level(DEFAULT_LEVEL)
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    // Fails if a logger is already installed, which is harmless.
    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok();

    log::set_max_level(level);

    multi
}
