//! Georeferenced footprint computation
//!
//! Footprints are evaluated in a metric working CRS and mapped back to the
//! station's coordinate system afterwards. Configuration has two phases:
//! a [`FootprintConfig`] as supplied by the user, and the [`ResolvedConfig`]
//! produced by [`FootprintConfig::resolve`], in which the working CRS is always
//! known. A [`GeoreferencedProcessor`] is only ever built from the latter.

use crate::climatology::aggregate;
use crate::core_types::{ClimatologyResult, FootprintField, FootprintInput};
use crate::error::{CrsError, FootprintError, FootprintResult};
use crate::geo::crs::CoordinateSystem;
use crate::geo::transform::{CoordinateTransform, CrsTransformer, TransformDirection};
use crate::grid::{smooth, Domain, GridDomain};
use crate::physics::compute_field;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Georeferencing configuration of a measurement station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintConfig {
    /// Half-width of the station-centred view extent (input CRS units)
    pub origin_distance: f64,
    /// Sensor height above displacement height (m)
    pub measurement_height: f64,
    /// Aerodynamic roughness length (m)
    pub roughness_length: f64,
    /// Analysis domain in the input CRS, `[xmin, xmax, ymin, ymax]`
    pub domain_size: Domain,
    /// Receptor spacing in working CRS units
    pub grid_resolution: f64,
    /// Station position in the input CRS
    pub station_coords: (f64, f64),
    /// CRS of `domain_size`, `station_coords` and the output coordinates
    pub coordinate_system: CoordinateSystem,
    /// CRS for internal calculations; derived when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_crs: Option<CoordinateSystem>,
}

impl FootprintConfig {
    /// Fix the working CRS and check the numeric parameters.
    ///
    /// Without an explicit working CRS, a geographic input CRS resolves to the
    /// UTM zone of the station and a projected one is used as is.
    ///
    /// # Errors
    /// Returns [`FootprintError::InvalidConfig`] for non-positive heights,
    /// lengths or resolution, or [`FootprintError::InvalidGrid`] for a
    /// degenerate domain.
    pub fn resolve(&self) -> FootprintResult<ResolvedConfig> {
        for (name, value) in [
            ("origin_distance", self.origin_distance),
            ("measurement_height", self.measurement_height),
            ("roughness_length", self.roughness_length),
            ("grid_resolution", self.grid_resolution),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(FootprintError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        self.domain_size.validate()?;

        let (sx, sy) = self.station_coords;
        let working_crs = match &self.working_crs {
            Some(crs) => crs.clone(),
            None if self.coordinate_system.is_geographic() => CoordinateSystem::utm_for(sx, sy),
            None => self.coordinate_system.clone(),
        };
        debug!(input = %self.coordinate_system, working = %working_crs, "Resolved working CRS");

        Ok(ResolvedConfig {
            config: Self {
                working_crs: Some(working_crs.clone()),
                ..self.clone()
            },
            working_crs,
        })
    }

    /// Roughness-based observation at this station.
    pub fn observation(
        &self,
        h: f64,
        ol: f64,
        sigmav: f64,
        ustar: f64,
        wind_dir: Option<f64>,
    ) -> FootprintInput {
        FootprintInput::roughness_based(
            self.measurement_height,
            self.roughness_length,
            h,
            ol,
            sigmav,
            ustar,
            wind_dir,
        )
    }

    /// Square of half-width `origin_distance` around the station.
    pub fn view_extent(&self) -> Domain {
        let (sx, sy) = self.station_coords;
        Domain::around(sx, sy, self.origin_distance)
    }
}

/// A [`FootprintConfig`] whose working CRS has been fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    config: FootprintConfig,
    working_crs: CoordinateSystem,
}

impl ResolvedConfig {
    /// The configuration, with `working_crs` populated.
    pub fn config(&self) -> &FootprintConfig {
        &self.config
    }

    pub fn coordinate_system(&self) -> &CoordinateSystem {
        &self.config.coordinate_system
    }

    pub fn working_crs(&self) -> &CoordinateSystem {
        &self.working_crs
    }
}

/// Computes footprints for one station in its own coordinate system.
///
/// Holds the transform pair for its whole lifetime.
#[derive(Debug, Clone)]
pub struct GeoreferencedProcessor {
    config: ResolvedConfig,
    to_working: CrsTransformer,
    from_working: CrsTransformer,
}

impl GeoreferencedProcessor {
    /// # Errors
    /// Returns [`FootprintError::Crs`] if no transform exists between the
    /// input and working systems.
    pub fn new(config: ResolvedConfig) -> FootprintResult<Self> {
        let to_working = CrsTransformer::new(config.coordinate_system(), config.working_crs())?;
        let from_working = CrsTransformer::new(config.working_crs(), config.coordinate_system())?;
        Ok(Self {
            config,
            to_working,
            from_working,
        })
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// # Errors
    /// Returns [`CrsError`] if the point cannot be transformed.
    pub fn transform_to_working(&self, x: f64, y: f64) -> Result<(f64, f64), CrsError> {
        self.to_working.forward(x, y)
    }

    /// # Errors
    /// Returns [`CrsError`] if the point cannot be transformed.
    pub fn transform_from_working(&self, x: f64, y: f64) -> Result<(f64, f64), CrsError> {
        self.from_working.forward(x, y)
    }

    /// Receptor grid in the working CRS, centred on the station.
    ///
    /// The four domain corners are transformed and their bounding box is
    /// sampled with `floor(width / grid_resolution)` points per side.
    ///
    /// # Errors
    /// Returns a CRS error if the domain or station cannot be transformed, or
    /// [`FootprintError::InvalidGrid`] if fewer than 2 points fit per side.
    pub fn working_grid(&self) -> FootprintResult<GridDomain> {
        let cfg = self.config.config();
        let bounds = self.to_working.forward_bounds(cfg.domain_size)?;
        let cells = (bounds.width() / cfg.grid_resolution).floor();
        if !(cells.is_finite() && cells >= 2.0) {
            return Err(FootprintError::InvalidGrid(format!(
                "working domain width {} with resolution {} gives {cells} points per side",
                bounds.width(),
                cfg.grid_resolution
            )));
        }
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "finite and at least 2"
        )]
        let nx = cells as usize;

        let (sx, sy) = cfg.station_coords;
        let (ox, oy) = self.transform_to_working(sx, sy)?;
        debug!(nx, ?bounds, station = ?(ox, oy), "Working grid");
        Ok(GridDomain::new(bounds, nx)?.with_origin(ox, oy))
    }

    /// Smoothed footprint with coordinates in the input CRS.
    ///
    /// # Errors
    /// See [`compute_georeferenced_field_with`](Self::compute_georeferenced_field_with).
    pub fn compute_georeferenced_field(&self, input: &FootprintInput) -> FootprintResult<FootprintField> {
        self.compute_georeferenced_field_with(input, true)
    }

    /// Footprint with coordinates in the input CRS.
    ///
    /// Densities are those of the working grid; only `x` and `y` are
    /// transformed back.
    ///
    /// # Errors
    /// Returns validation, grid or CRS errors.
    pub fn compute_georeferenced_field_with(
        &self,
        input: &FootprintInput,
        smooth_result: bool,
    ) -> FootprintResult<FootprintField> {
        input.validate()?;
        let grid = self.working_grid()?;
        let mut field = compute_field(input, &grid)?;
        if smooth_result {
            field.f = smooth(&field.f);
        }
        self.to_input_crs(field)
    }

    /// Climatology over a series with coordinates in the input CRS.
    ///
    /// # Errors
    /// Returns [`FootprintError::NoValidFootprints`], grid or CRS errors.
    pub fn compute_georeferenced_climatology(
        &self,
        inputs: &[FootprintInput],
        smooth_result: bool,
    ) -> FootprintResult<ClimatologyResult> {
        let grid = self.working_grid()?;
        let mut result = aggregate(inputs, &grid, smooth_result)?;
        result.field = self.to_input_crs(result.field)?;
        Ok(result)
    }

    fn to_input_crs(&self, field: FootprintField) -> FootprintResult<FootprintField> {
        let (x, y) = self
            .from_working
            .transform_matrices(&field.x, &field.y, TransformDirection::Forward)?;
        FootprintField::new(x, y, field.f)
    }
}

/// Resolve `config`, build a processor and compute one smoothed footprint.
///
/// # Errors
/// Returns configuration, validation, grid or CRS errors.
pub fn compute_georeferenced_footprint(
    input: &FootprintInput,
    config: &FootprintConfig,
) -> FootprintResult<FootprintField> {
    GeoreferencedProcessor::new(config.resolve()?)?.compute_georeferenced_field(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn geographic_config() -> FootprintConfig {
        FootprintConfig {
            origin_distance: 0.01,
            measurement_height: 3.0,
            roughness_length: 0.05,
            domain_size: Domain::new(-111.003, -110.997, 39.997, 40.003),
            grid_resolution: 10.0,
            station_coords: (-111.0, 40.0),
            coordinate_system: CoordinateSystem::wgs84(),
            working_crs: None,
        }
    }

    fn projected_config() -> FootprintConfig {
        FootprintConfig {
            origin_distance: 500.0,
            measurement_height: 3.0,
            roughness_length: 0.05,
            domain_size: Domain::around(450_000.0, 4_400_000.0, 300.0),
            grid_resolution: 10.0,
            station_coords: (450_000.0, 4_400_000.0),
            coordinate_system: CoordinateSystem::from_epsg(32612).unwrap(),
            working_crs: None,
        }
    }

    #[test]
    fn geographic_input_resolves_to_station_utm_zone() {
        let resolved = geographic_config().resolve().unwrap();
        assert_eq!(resolved.working_crs(), &CoordinateSystem::from_epsg(32612).unwrap());
        assert!(resolved.config().working_crs.is_some());
    }

    #[test]
    fn projected_input_is_its_own_working_crs() {
        let resolved = projected_config().resolve().unwrap();
        assert_eq!(resolved.working_crs(), resolved.coordinate_system());
    }

    #[test]
    fn explicit_working_crs_wins() {
        let mut config = geographic_config();
        config.working_crs = Some(CoordinateSystem::from_epsg(32613).unwrap());
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.working_crs().definition(), "EPSG:32613");
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut config = projected_config();
        config.grid_resolution = 0.0;
        assert!(matches!(config.resolve(), Err(FootprintError::InvalidConfig(_))));
    }

    #[test]
    fn station_round_trips_through_working_crs() {
        let processor = GeoreferencedProcessor::new(geographic_config().resolve().unwrap()).unwrap();
        let (x, y) = processor.transform_to_working(-111.0, 40.0).unwrap();
        let (lon, lat) = processor.transform_from_working(x, y).unwrap();
        assert_relative_eq!(lon, -111.0, epsilon = 1e-7);
        assert_relative_eq!(lat, 40.0, epsilon = 1e-7);
    }

    #[test]
    fn projected_grid_is_sized_by_resolution() {
        let processor = GeoreferencedProcessor::new(projected_config().resolve().unwrap()).unwrap();
        let grid = processor.working_grid().unwrap();
        assert_eq!(grid.nx(), 60);
        assert_eq!(grid.origin(), (450_000.0, 4_400_000.0));
    }

    #[test]
    fn georeferenced_field_is_in_input_crs() {
        let config = geographic_config();
        let input = config.observation(800.0, -100.0, 0.6, 0.4, Some(200.0));
        let field = compute_georeferenced_footprint(&input, &config).unwrap();
        let (rows, cols) = field.shape();
        assert_eq!(rows, cols);
        assert!(field.x.iter().all(|lon| (-111.01..-110.99).contains(lon)));
        assert!(field.y.iter().all(|lat| (39.99..40.01).contains(lat)));
        assert!(field.f.iter().all(|v| v.is_finite() && *v >= 0.0));
        assert!(field.total_weight() > 0.0);
    }

    #[test]
    fn too_coarse_resolution_is_rejected() {
        let mut config = projected_config();
        config.grid_resolution = 400.0;
        let processor = GeoreferencedProcessor::new(config.resolve().unwrap()).unwrap();
        assert!(matches!(processor.working_grid(), Err(FootprintError::InvalidGrid(_))));
    }

    #[test]
    fn view_extent_is_centred_on_station() {
        let extent = projected_config().view_extent();
        assert_eq!(extent, Domain::new(449_500.0, 450_500.0, 4_399_500.0, 4_400_500.0));
    }

    #[test]
    fn config_deserialises_with_epsg_code() {
        let config: FootprintConfig = serde_json::from_str(
            r#"{
                "origin_distance": 500.0,
                "measurement_height": 3.0,
                "roughness_length": 0.05,
                "domain_size": [449700.0, 450300.0, 4399700.0, 4400300.0],
                "grid_resolution": 10.0,
                "station_coords": [450000.0, 4400000.0],
                "coordinate_system": "EPSG:32612"
            }"#,
        )
        .unwrap();
        assert_eq!(config, projected_config());
    }
}
