//! Edge-record ingestion from delimited files.
//!
//! Column positions are derived from the header row, so files can order
//! their columns freely as long as the names are recognizable. The loader
//! only produces raw [`EdgeRecord`]s; all validation happens in the
//! builder.

use std::fmt::{Display, Formatter};
use std::fs::File;

use anyhow::{anyhow, Result};
use csv::{ReaderBuilder, StringRecord};
use regex::Regex;
use tracing::{debug, warn};

use crate::builder::EdgeRecord;
use crate::geometry::parse_linestring;

const GEOMETRY_NAMES: [&str; 4] = ["geometry", "geom", "wkt", "shape"];
const WEIGHT_NAMES: [&str; 4] = ["weight", "cost", "length", "duration"];
const DIRECTION_NAMES: [&str; 4] = ["two_way", "twoway", "bidirectional", "both_ways"];

pub struct EdgeLoadProfile {
    pub geometry_column: usize,
    pub weight_column: usize,
    /// Missing direction column means every record is one-way.
    pub direction_column: Option<usize>,
}

impl Default for EdgeLoadProfile {
    fn default() -> Self {
        Self {
            geometry_column: 0,
            weight_column: 1,
            direction_column: None,
        }
    }
}

impl Display for EdgeLoadProfile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Edge column offsets: geometry:{}, weight:{}, direction:{}",
            self.geometry_column,
            self.weight_column,
            self.direction_column
                .map(|c| c.to_string())
                .unwrap_or_else(|| "none".to_string()),
        )
    }
}

/// Builds a load profile by scanning the header row for known column
/// names, falling back to positional defaults.
pub fn create_edge_load_profile(headers: &[String]) -> EdgeLoadProfile {
    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
    };

    let mut profile = EdgeLoadProfile::default();
    match find(&GEOMETRY_NAMES) {
        Some(idx) => profile.geometry_column = idx,
        None => warn!("No geometry column recognized, assuming column 0"),
    }
    match find(&WEIGHT_NAMES) {
        Some(idx) => profile.weight_column = idx,
        None => warn!("No weight column recognized, assuming column 1"),
    }
    profile.direction_column = find(&DIRECTION_NAMES);
    if profile.direction_column.is_none() {
        debug!("No direction column recognized, treating all records as one-way");
    }
    profile
}

pub fn verify_edges_headers(headers: &[String]) -> Result<()> {
    if headers.len() < 2 {
        return Err(anyhow!(
            "Expected a minimum of 2 columns (geometry, weight), found {}",
            headers.len()
        ));
    }
    Ok(())
}

pub fn get_headers_from_file(filename: &str, separator: u8) -> Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(separator)
        .from_reader(File::open(filename)?);
    Ok(reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect())
}

pub fn load_csv(filename: &str) -> Result<Vec<StringRecord>> {
    load_records(filename, b',')
}

pub fn load_tsv(filename: &str) -> Result<Vec<StringRecord>> {
    load_records(filename, b'\t')
}

fn load_records(filename: &str, separator: u8) -> Result<Vec<StringRecord>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(separator)
        .from_reader(File::open(filename)?);
    let records = reader.records().collect::<Result<Vec<_>, _>>()?;
    debug!("Loaded {} records from {}", records.len(), filename);
    Ok(records)
}

pub fn is_truthy(s: &str) -> bool {
    let trimmed_lowercase = s.trim().to_lowercase();
    let re = Regex::new(r"(true|y|yes|1)").unwrap();
    re.is_match(&trimmed_lowercase)
}

fn strip_quotes_and_whitespace(s: &str) -> &str {
    let trimmed = s.trim();
    if (trimmed.starts_with('"') && trimmed.ends_with('"'))
        || (trimmed.starts_with('\'') && trimmed.ends_with('\''))
    {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

/// Converts one delimited record into a raw edge record.
pub fn edge_from_record(
    record: &StringRecord,
    profile: &EdgeLoadProfile,
    index: usize,
) -> Result<EdgeRecord> {
    let geometry_text = record
        .get(profile.geometry_column)
        .ok_or_else(|| anyhow!("record {}: missing geometry column", index))?;
    let geometry = parse_linestring(strip_quotes_and_whitespace(geometry_text))?;

    let weight_text = record
        .get(profile.weight_column)
        .ok_or_else(|| anyhow!("record {}: missing weight column", index))?;
    let weight = strip_quotes_and_whitespace(weight_text)
        .parse::<f64>()
        .map_err(|e| anyhow!("record {}: bad weight '{}': {}", index, weight_text, e))?;

    let two_way = profile
        .direction_column
        .and_then(|c| record.get(c))
        .map(is_truthy)
        .unwrap_or(false);

    Ok(EdgeRecord {
        geometry,
        two_way,
        weight,
    })
}
