//! Zone descriptor parsing.
//!
//! A descriptor is one or more lines shaped `CODE - Area One, Area Two`.
//! Lines starting with `===` are section headers and are skipped, so the
//! full zone list can be pasted into the config unchanged:
//!
//! ```text
//! === Johor ===
//! JHR04 - Batu Pahat, Muar, Segamat, Gemas Johor, Tangkak
//! ```

use thiserror::Error;

const CODE_SEPARATOR: &str = " - ";
const AREA_SEPARATOR: &str = ", ";
const HEADER_PREFIX: &str = "===";

/// Errors from [`ZoneDescriptor::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    /// No data lines at all.
    #[error("zone descriptor is empty")]
    Empty,
    /// A data line without `CODE - areas` shape.
    #[error("zone descriptor line {line} is malformed: {content:?} (expected `CODE - Area, Area`)")]
    MalformedLine { line: usize, content: String },
}

/// The parsed form of a zone descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneDescriptor {
    /// Code of the last data line seen.
    pub code: String,
    /// Area lists, one per data line, in descriptor order.
    pub areas: Vec<Vec<String>>,
    codes: Vec<String>,
}

/// The zone used to query the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Provider zone code, e.g. `JHR04`.
    pub code: String,
    /// First area of the zone, used as its display name.
    pub area: String,
}

impl ZoneDescriptor {
    /// Parse a descriptor. Groups keep their line order.
    pub fn parse(descriptor: &str) -> Result<Self, ZoneError> {
        let mut code = String::new();
        let mut codes = Vec::new();
        let mut areas: Vec<Vec<String>> = Vec::new();

        for (idx, line) in descriptor.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with(HEADER_PREFIX) {
                continue;
            }

            let malformed = || ZoneError::MalformedLine {
                line: idx + 1,
                content: trimmed.to_owned(),
            };

            let (line_code, area_list) = trimmed.split_once(CODE_SEPARATOR).ok_or_else(malformed)?;
            let line_code = line_code.trim();
            let group: Vec<String> = area_list
                .split(AREA_SEPARATOR)
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_owned)
                .collect();

            if line_code.is_empty() || group.is_empty() {
                return Err(malformed());
            }

            code = line_code.to_owned();
            codes.push(line_code.to_owned());
            areas.push(group);
        }

        if areas.is_empty() {
            return Err(ZoneError::Empty);
        }

        Ok(Self { code, areas, codes })
    }

    /// First area of the first group.
    pub fn area(&self) -> &str {
        // parse() never yields an empty group
        &self.areas[0][0]
    }

    /// The first group as a provider zone.
    pub fn primary(&self) -> Zone {
        Zone {
            code: self.codes[0].clone(),
            area: self.area().to_owned(),
        }
    }
}

/// Resolve a descriptor to the area name of its first group.
pub fn resolve(descriptor: &str) -> Result<String, ZoneError> {
    ZoneDescriptor::parse(descriptor).map(|d| d.area().to_owned())
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code, self.area)
    }
}
