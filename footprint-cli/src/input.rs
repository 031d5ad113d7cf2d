//! Observation files and JSON rasters

use crate::time::parse_timestamp;
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use ffp_core::{FootprintInput, RasterError, RasterGrid, RasterSource, RawObservation};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// One row of an observation file.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservationRecord {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub observation: RawObservation,
}

/// An observation ready for the model.
#[derive(Debug, Clone, Copy)]
pub struct Observation {
    pub time: Option<NaiveDateTime>,
    pub input: FootprintInput,
}

impl TryFrom<ObservationRecord> for Observation {
    type Error = anyhow::Error;

    fn try_from(record: ObservationRecord) -> Result<Self> {
        let time = record.timestamp.as_deref().map(parse_timestamp).transpose()?;
        let input = FootprintInput::try_from(record.observation)?;
        Ok(Self { time, input })
    }
}

/// Read a JSON array of observation records.
///
/// Records that cannot be turned into an observation at all (bad timestamp,
/// missing or doubled wind profile) fail the whole file; physical validation
/// happens later, per record.
pub fn load_observations(path: &Path) -> Result<Vec<Observation>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading observations from {}", path.display()))?;
    parse_observations(&text).with_context(|| format!("parsing {}", path.display()))
}

pub fn parse_observations(text: &str) -> Result<Vec<Observation>> {
    let records: Vec<ObservationRecord> = serde_json::from_str(text)?;
    records
        .into_iter()
        .enumerate()
        .map(|(i, record)| {
            Observation::try_from(record).with_context(|| format!("observation {i}"))
        })
        .collect()
}

/// Rasters stored as serialised [`RasterGrid`] JSON.
pub struct JsonRasterSource;

impl RasterSource for JsonRasterSource {
    fn load(&self, path: &Path) -> Result<RasterGrid, RasterError> {
        let source = |message: String| RasterError::Source {
            path: path.display().to_string(),
            message,
        };
        let text = fs::read_to_string(path).map_err(|e| source(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| source(e.to_string()))
    }
}
