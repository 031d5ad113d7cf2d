//! Georeferenced footprints and raster weighting

mod common;

use approx::assert_relative_eq;
use common::unstable_grass;
use ffp_core::geo::CrsKind;
use ffp_core::{
    compute_georeferenced_footprint, utm_epsg_for, weight_field, weight_raster_by_footprint,
    weight_raster_source, AffineTransform, CoordinateSystem, CoordinateTransform, CrsError,
    CrsTransformer, Domain, FootprintConfig, FootprintError, FootprintInput,
    GeoreferencedProcessor, RasterError, RasterGrid, RasterSource,
};
use nalgebra::DMatrix;
use std::path::Path;

fn station_config() -> FootprintConfig {
    FootprintConfig {
        origin_distance: 0.005,
        measurement_height: 2.0,
        roughness_length: 0.02,
        domain_size: Domain::new(-111.002, -110.998, 39.998, 40.002),
        grid_resolution: 4.0,
        station_coords: (-111.0, 40.0),
        coordinate_system: CoordinateSystem::wgs84(),
        working_crs: None,
    }
}

#[test]
fn utm_zone_from_station_location() {
    assert_eq!(utm_epsg_for(-111.0, 40.0), 32612);
    assert_eq!(utm_epsg_for(-111.0, -10.0), 32712);

    let north = CoordinateSystem::from_epsg(utm_epsg_for(-111.0, 40.0)).unwrap();
    assert_eq!(north.kind(), CrsKind::Utm { zone: 12, north: true });
    let south = CoordinateSystem::from_epsg(utm_epsg_for(-111.0, -10.0)).unwrap();
    assert_eq!(south.kind(), CrsKind::Utm { zone: 12, north: false });
}

#[test]
fn working_crs_round_trip() {
    let processor = GeoreferencedProcessor::new(station_config().resolve().unwrap()).unwrap();
    for (lon, lat) in [(-111.0, 40.0), (-110.9981, 39.9987), (-111.0019, 40.0016)] {
        let (x, y) = processor.transform_to_working(lon, lat).unwrap();
        let (lon2, lat2) = processor.transform_from_working(x, y).unwrap();
        assert_relative_eq!(lon, lon2, epsilon = 1e-7);
        assert_relative_eq!(lat, lat2, epsilon = 1e-7);
    }
}

#[test]
fn southern_hemisphere_northings_are_offset() {
    let t = CrsTransformer::new(
        &CoordinateSystem::wgs84(),
        &CoordinateSystem::from_epsg(32712).unwrap(),
    )
    .unwrap();
    let (e, n) = t.forward(-111.0, -10.0).unwrap();
    assert_relative_eq!(e, 500_000.0, epsilon = 1e-6);
    assert!(n < 10_000_000.0 && n > 8_800_000.0);
}

#[test]
fn georeferenced_footprint_keeps_densities() {
    let config = station_config();
    let input = unstable_grass();
    let processor = GeoreferencedProcessor::new(config.resolve().unwrap()).unwrap();
    let field = processor.compute_georeferenced_field_with(&input, false).unwrap();

    // Same grid evaluated directly in the working CRS
    let grid = processor.working_grid().unwrap();
    let direct = ffp_core::physics::compute_field(&input, &grid).unwrap();
    assert_eq!(field.f, direct.f);

    // Coordinates are back in degrees around the station
    let peak = field.peak().unwrap();
    assert!(peak.y > 40.0, "wind from north puts the footprint north of the station");
    assert_relative_eq!(peak.x, -111.0, epsilon = 1e-4);

    let smoothed = compute_georeferenced_footprint(&input, &config).unwrap();
    assert_eq!(smoothed.shape(), field.shape());
}

#[test]
fn georeferenced_climatology_skips_invalid_members() {
    let processor = GeoreferencedProcessor::new(station_config().resolve().unwrap()).unwrap();
    let a = unstable_grass();
    let bad = FootprintInput { ustar: 0.01, ..a };

    let result = processor
        .compute_georeferenced_climatology(&[a, bad, a], false)
        .unwrap();
    assert_eq!(result.n, 2);
    let skipped: Vec<usize> = result.skipped.iter().map(|s| s.index).collect();
    assert_eq!(skipped, vec![1]);

    // Coordinates come back in degrees around the station
    assert!(result.field.x.iter().all(|x| (-111.01..-110.99).contains(x)));
    assert!(result.field.y.iter().all(|y| (39.99..40.01).contains(y)));

    let single = processor.compute_georeferenced_field_with(&a, false).unwrap();
    assert_eq!(result.field.shape(), single.shape());
    for (c, s) in result.field.f.iter().zip(single.f.iter()) {
        assert_relative_eq!(c, s, max_relative = 1e-12, epsilon = 1e-300);
    }
}

#[test]
fn unsupported_working_crs_fails_at_construction() {
    let mut config = station_config();
    config.working_crs = Some(
        serde_json::from_str(r#"{"definition": "+proj=aea +lat_1=29.5", "units": "metre"}"#).unwrap(),
    );
    let err = GeoreferencedProcessor::new(config.resolve().unwrap()).unwrap_err();
    assert!(matches!(err, FootprintError::Crs(CrsError::UnsupportedCrs { .. })));
}

#[test]
fn raster_weighting_over_a_footprint() {
    let config = station_config();
    let processor = GeoreferencedProcessor::new(config.resolve().unwrap()).unwrap();
    let field = processor.compute_georeferenced_field(&unstable_grass()).unwrap();

    // Two land-cover classes split at the station latitude: 1 south, 2 north
    let raster = RasterGrid::from_row_slice(
        2,
        1,
        &[2.0, 1.0],
        AffineTransform::from_origin(-111.01, 40.01, 0.02, 0.01),
    )
    .unwrap()
    .with_crs(CoordinateSystem::wgs84());
    let mean = weight_field(&field, &raster).unwrap();
    assert!(
        mean > 1.9 && mean <= 2.0,
        "footprint lies downwind (north), got {mean}"
    );
}

#[test]
fn zero_footprint_weights_to_zero() {
    let raster = RasterGrid::from_row_slice(1, 1, &[7.0], AffineTransform::identity()).unwrap();
    let x = DMatrix::from_element(4, 4, 0.5);
    let f = DMatrix::zeros(4, 4);
    assert_eq!(weight_raster_by_footprint(&x, &x, &f, &raster).unwrap(), 0.0);
}

/// Hands out one in-memory raster regardless of path.
struct InMemory(RasterGrid);

impl RasterSource for InMemory {
    fn load(&self, _path: &Path) -> Result<RasterGrid, RasterError> {
        Ok(self.0.clone())
    }
}

#[test]
fn projected_raster_is_reprojected_under_a_geographic_field() {
    let config = station_config();
    let processor = GeoreferencedProcessor::new(config.resolve().unwrap()).unwrap();
    let field = processor.compute_georeferenced_field(&unstable_grass()).unwrap();

    // UTM raster split at the station northing: 2 to the north, 1 to the south
    let (e, n) = processor.transform_to_working(-111.0, 40.0).unwrap();
    let raster = RasterGrid::from_row_slice(
        2,
        1,
        &[2.0, 1.0],
        AffineTransform::from_origin(e - 1000.0, n + 1000.0, 2000.0, 1000.0),
    )
    .unwrap()
    .with_crs(CoordinateSystem::from_epsg(32612).unwrap());

    let mean = weight_raster_source(
        &field,
        Some(&config.coordinate_system),
        &InMemory(raster),
        Path::new("landcover.json"),
    )
    .unwrap();
    assert!(
        mean > 1.9 && mean <= 2.0,
        "footprint lies over the northern class, got {mean}"
    );
}
