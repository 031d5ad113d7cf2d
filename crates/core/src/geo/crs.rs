//! Coordinate reference system descriptions
//!
//! A [`CoordinateSystem`] can be built from an EPSG code, an `"EPSG:<n>"`
//! string, a proj string, or a structured record. The built-in provider
//! understands WGS84 geographic coordinates and the WGS84 UTM zones; any
//! other definition can still be carried as a record, but only identity
//! transforms are available for it.
//!
//! ```text
//! EPSG:4326                      → geographic, degrees
//! EPSG:326zz / EPSG:327zz        → UTM zone zz north / south, metres
//! +proj=longlat +datum=WGS84     → geographic
//! +proj=utm +zone=12 [+south]    → UTM
//! ```

use crate::error::CrsError;
use serde::{Deserialize, Serialize};

/// EPSG code of WGS84 geographic coordinates.
pub const EPSG_WGS84: u32 = 4326;
/// Base EPSG code of the northern WGS84 UTM zones.
pub const EPSG_UTM_NORTH_BASE: u32 = 32600;
/// Base EPSG code of the southern WGS84 UTM zones.
pub const EPSG_UTM_SOUTH_BASE: u32 = 32700;

const DATUM_WGS84: &str = "WGS84";
const UNITS_DEGREE: &str = "degree";
const UNITS_METRE: &str = "metre";

/// UTM zone number (1..=60) containing longitude `lon` (degrees).
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "value is clamped to 1..=60 before the cast"
)]
pub fn utm_zone(lon: f64) -> u8 {
    (((lon + 180.0) / 6.0).floor() + 1.0).clamp(1.0, 60.0) as u8
}

/// EPSG code of the WGS84 UTM zone containing `(lon, lat)`.
///
/// Latitudes `≥ 0` map to the northern series (326zz), negative latitudes to
/// the southern series (327zz).
pub fn utm_epsg_for(lon: f64, lat: f64) -> u32 {
    let base = if lat >= 0.0 {
        EPSG_UTM_NORTH_BASE
    } else {
        EPSG_UTM_SOUTH_BASE
    };
    base + u32::from(utm_zone(lon))
}

/// What the built-in provider knows about a coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrsKind {
    /// WGS84 longitude/latitude in degrees (x = lon, y = lat)
    Geographic,
    /// WGS84 UTM easting/northing in metres
    Utm { zone: u8, north: bool },
    /// Carried through unchanged; only identity transforms are possible
    Unsupported,
}

/// A coordinate reference system.
///
/// Immutable once built. Deserialises from any [`CrsSpec`] form and
/// serialises as a [`CoordinateSystemRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CrsSpec", into = "CrsSpec")]
pub struct CoordinateSystem {
    definition: String,
    units: String,
    is_geographic: bool,
    datum: String,
    kind: CrsKind,
}

impl CoordinateSystem {
    /// WGS84 geographic coordinates (EPSG:4326).
    pub fn wgs84() -> Self {
        Self {
            definition: format!("EPSG:{EPSG_WGS84}"),
            units: UNITS_DEGREE.to_string(),
            is_geographic: true,
            datum: DATUM_WGS84.to_string(),
            kind: CrsKind::Geographic,
        }
    }

    /// WGS84 UTM zone `zone` (1..=60).
    ///
    /// # Errors
    /// Returns [`CrsError::OutOfRange`] for a zone outside 1..=60.
    pub fn utm(zone: u8, north: bool) -> Result<Self, CrsError> {
        if !(1..=60).contains(&zone) {
            return Err(CrsError::OutOfRange {
                what: "UTM zone",
                value: f64::from(zone),
                min: 1.0,
                max: 60.0,
            });
        }
        let base = if north {
            EPSG_UTM_NORTH_BASE
        } else {
            EPSG_UTM_SOUTH_BASE
        };
        Ok(Self {
            definition: format!("EPSG:{}", base + u32::from(zone)),
            units: UNITS_METRE.to_string(),
            is_geographic: false,
            datum: DATUM_WGS84.to_string(),
            kind: CrsKind::Utm { zone, north },
        })
    }

    /// UTM system for the zone containing `(lon, lat)`.
    pub fn utm_for(lon: f64, lat: f64) -> Self {
        let zone = utm_zone(lon);
        let north = lat >= 0.0;
        Self {
            definition: format!("EPSG:{}", utm_epsg_for(lon, lat)),
            units: UNITS_METRE.to_string(),
            is_geographic: false,
            datum: DATUM_WGS84.to_string(),
            kind: CrsKind::Utm { zone, north },
        }
    }

    /// Build from an EPSG code.
    ///
    /// # Errors
    /// Returns [`CrsError::UnsupportedEpsg`] for codes other than 4326 and the
    /// WGS84 UTM zones.
    pub fn from_epsg(code: u32) -> Result<Self, CrsError> {
        let zone_in = |base: u32| {
            code.checked_sub(base)
                .filter(|z| (1..=60).contains(z))
                .and_then(|z| u8::try_from(z).ok())
        };
        if code == EPSG_WGS84 {
            Ok(Self::wgs84())
        } else if let Some(zone) = zone_in(EPSG_UTM_NORTH_BASE) {
            Self::utm(zone, true)
        } else if let Some(zone) = zone_in(EPSG_UTM_SOUTH_BASE) {
            Self::utm(zone, false)
        } else {
            Err(CrsError::UnsupportedEpsg { code })
        }
    }

    /// Build from an `"EPSG:<n>"` string or a proj string.
    ///
    /// # Errors
    /// Returns [`CrsError::Parse`] for malformed or unsupported definitions.
    pub fn from_proj(definition: &str) -> Result<Self, CrsError> {
        let trimmed = definition.trim();
        let parse_err = |reason: String| CrsError::Parse {
            definition: trimmed.to_string(),
            reason,
        };

        if let Some(code) = trimmed
            .strip_prefix("EPSG:")
            .or_else(|| trimmed.strip_prefix("epsg:"))
        {
            let code: u32 = code
                .trim()
                .parse()
                .map_err(|e| parse_err(format!("invalid EPSG code: {e}")))?;
            return Self::from_epsg(code);
        }

        let mut proj = None;
        let mut zone = None;
        let mut south = false;
        for token in trimmed.split_whitespace() {
            let token = token.trim_start_matches('+');
            let (key, value) = token.split_once('=').unwrap_or((token, ""));
            match key {
                "proj" => proj = Some(value),
                "zone" => {
                    zone = Some(
                        value
                            .parse::<u8>()
                            .map_err(|e| parse_err(format!("invalid zone '{value}': {e}")))?,
                    );
                }
                "south" => south = true,
                "datum" | "ellps" if !value.eq_ignore_ascii_case(DATUM_WGS84) => {
                    return Err(parse_err(format!("unsupported {key} '{value}'")));
                }
                _ => {}
            }
        }

        match proj {
            Some("longlat" | "latlong" | "lonlat") => Ok(Self {
                definition: trimmed.to_string(),
                ..Self::wgs84()
            }),
            Some("utm") => {
                let zone = zone.ok_or_else(|| parse_err("+proj=utm requires +zone".to_string()))?;
                let utm = Self::utm(zone, !south).map_err(|e| parse_err(e.to_string()))?;
                Ok(Self {
                    definition: trimmed.to_string(),
                    ..utm
                })
            }
            Some(other) => Err(parse_err(format!("unsupported projection '{other}'"))),
            None => Err(parse_err("missing +proj or EPSG prefix".to_string())),
        }
    }

    /// Build from any accepted specification form.
    ///
    /// # Errors
    /// Propagates [`from_epsg`](Self::from_epsg) and
    /// [`from_proj`](Self::from_proj) failures. A record whose definition the
    /// built-in provider does not understand is accepted as
    /// [`CrsKind::Unsupported`].
    pub fn from_spec(spec: CrsSpec) -> Result<Self, CrsError> {
        match spec {
            CrsSpec::Epsg(code) => Self::from_epsg(code),
            CrsSpec::Definition(definition) => Self::from_proj(&definition),
            CrsSpec::Record(record) => Ok(Self::from_record(record)),
        }
    }

    fn from_record(record: CoordinateSystemRecord) -> Self {
        match Self::from_proj(&record.definition) {
            Ok(known) => known,
            Err(_) => Self {
                definition: record.definition,
                units: record.units.unwrap_or_else(|| "unknown".to_string()),
                is_geographic: record.is_geographic.unwrap_or(false),
                datum: record.datum.unwrap_or_else(|| "Unknown".to_string()),
                kind: CrsKind::Unsupported,
            },
        }
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    /// Linear (or angular) unit name of the axes.
    pub fn units(&self) -> &str {
        &self.units
    }

    pub fn is_geographic(&self) -> bool {
        self.is_geographic
    }

    pub fn datum(&self) -> &str {
        &self.datum
    }

    pub fn kind(&self) -> CrsKind {
        self.kind
    }

    /// True when both systems describe the same coordinates.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        match (self.kind, other.kind) {
            (CrsKind::Unsupported, _) | (_, CrsKind::Unsupported) => {
                self.definition == other.definition
            }
            (a, b) => a == b,
        }
    }
}

impl std::fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.definition)
    }
}

/// Structured CRS description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateSystemRecord {
    /// EPSG or proj definition
    #[serde(alias = "crs")]
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_geographic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<String>,
}

/// Accepted serialised forms of a coordinate system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CrsSpec {
    /// `4326`
    Epsg(u32),
    /// `"EPSG:4326"` or `"+proj=utm +zone=12"`
    Definition(String),
    /// `{"definition": "...", "units": "...", ...}`
    Record(CoordinateSystemRecord),
}

impl TryFrom<CrsSpec> for CoordinateSystem {
    type Error = CrsError;

    fn try_from(spec: CrsSpec) -> Result<Self, Self::Error> {
        Self::from_spec(spec)
    }
}

impl From<CoordinateSystem> for CrsSpec {
    fn from(crs: CoordinateSystem) -> Self {
        CrsSpec::Record(CoordinateSystemRecord {
            definition: crs.definition,
            units: Some(crs.units),
            is_geographic: Some(crs.is_geographic),
            datum: Some(crs.datum),
        })
    }
}
