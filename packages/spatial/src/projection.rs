//! State-plane to geographic reprojection.
//!
//! Camera datasets publish positions in EPSG:2285 (NAD83 / Washington
//! North, US survey feet). Boundary datasets are requested as WGS84
//! `GeoJSON`, so only camera positions need converting. Both coordinate
//! systems are parsed once into `proj4rs` projections and reused for every
//! conversion of a run.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;
use thiserror::Error;

/// EPSG:2285, NAD83 / Washington North (ftUS).
pub const WASHINGTON_NORTH_FTUS: &str = "+proj=lcc +lat_0=47 +lon_0=-120.833333333333 \
     +lat_1=48.7333333333333 +lat_2=47.5 +x_0=500000.0001016 +y_0=0 +ellps=GRS80 \
     +towgs84=0,0,0,0,0,0,0 +units=us-ft +no_defs";

/// EPSG:4326, WGS84 longitude/latitude.
pub const WGS84: &str = "+proj=longlat +datum=WGS84 +no_defs";

/// Errors raised by coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    /// An input ordinate was NaN or infinite.
    #[error("Non-finite coordinate ({x}, {y})")]
    NonFinite {
        /// Input x (easting or longitude).
        x: f64,
        /// Input y (northing or latitude).
        y: f64,
    },

    /// A projection definition could not be parsed or a point could not
    /// be converted.
    #[error("Projection error: {message}")]
    Projection {
        /// Description of what went wrong.
        message: String,
    },
}

/// A projected coordinate system paired with WGS84.
pub struct StatePlaneProjection {
    projected: Proj,
    geographic: Proj,
}

impl std::fmt::Debug for StatePlaneProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatePlaneProjection").finish_non_exhaustive()
    }
}

impl StatePlaneProjection {
    /// Builds a projection from a PROJ.4 definition string.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Projection`] if either definition fails
    /// to parse.
    pub fn from_proj_string(definition: &str) -> Result<Self, TransformError> {
        Ok(Self {
            projected: parse(definition)?,
            geographic: parse(WGS84)?,
        })
    }

    /// The projection used by the Seattle camera dataset (EPSG:2285).
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Projection`] if the embedded definition
    /// fails to parse.
    pub fn washington_north() -> Result<Self, TransformError> {
        Self::from_proj_string(WASHINGTON_NORTH_FTUS)
    }

    /// Converts projected `(x, y)` to geographic `(longitude, latitude)` in
    /// degrees.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] if either input is NaN or infinite, or
    /// the conversion fails.
    pub fn inverse(&self, x: f64, y: f64) -> Result<geo::Coord<f64>, TransformError> {
        check_finite(x, y)?;

        let mut point = (x, y, 0.0);
        convert(&self.projected, &self.geographic, &mut point)?;

        Ok(geo::Coord {
            x: point.0.to_degrees(),
            y: point.1.to_degrees(),
        })
    }

    /// Converts geographic `(longitude, latitude)` in degrees to projected
    /// `(x, y)`.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] if either input is NaN or infinite, or
    /// the conversion fails.
    pub fn forward(&self, longitude: f64, latitude: f64) -> Result<geo::Coord<f64>, TransformError> {
        check_finite(longitude, latitude)?;

        let mut point = (longitude.to_radians(), latitude.to_radians(), 0.0);
        convert(&self.geographic, &self.projected, &mut point)?;

        Ok(geo::Coord {
            x: point.0,
            y: point.1,
        })
    }
}

fn parse(definition: &str) -> Result<Proj, TransformError> {
    Proj::from_proj_string(definition).map_err(|e| TransformError::Projection {
        message: format!("Invalid projection {definition:?}: {e:?}"),
    })
}

const fn check_finite(x: f64, y: f64) -> Result<(), TransformError> {
    if x.is_finite() && y.is_finite() {
        Ok(())
    } else {
        Err(TransformError::NonFinite { x, y })
    }
}

fn convert(from: &Proj, to: &Proj, point: &mut (f64, f64, f64)) -> Result<(), TransformError> {
    let (x, y) = (point.0, point.1);
    transform(from, to, point).map_err(|e| TransformError::Projection {
        message: format!("Cannot convert ({x}, {y}): {e:?}"),
    })?;

    if point.0.is_finite() && point.1.is_finite() {
        Ok(())
    } else {
        Err(TransformError::Projection {
            message: format!("({x}, {y}) is outside the projection's domain"),
        })
    }
}
