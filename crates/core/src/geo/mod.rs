//! Coordinate reference systems and georeferenced footprints

pub mod crs;
pub mod processor;
pub mod transform;
pub mod transverse_mercator;

pub use crs::{
    utm_epsg_for, utm_zone, CoordinateSystem, CoordinateSystemRecord, CrsKind, CrsSpec,
};
pub use processor::{
    compute_georeferenced_footprint, FootprintConfig, GeoreferencedProcessor, ResolvedConfig,
};
pub use transform::{CoordinateTransform, CrsTransformer, TransformDirection};
pub use transverse_mercator::TransverseMercator;
