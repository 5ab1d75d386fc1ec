//! CSV loading of the raw inspection, violation and venue tables
//!
//! Inspections and violations deserialize straight into the feature crate's
//! record types. Venue files keep every column other than `camis` as a
//! string attribute, so metadata columns can be chosen in configuration.

use anyhow::{bail, Context, Result};
use inspecta_features::{InspectionRecord, VenueId, VenueIndex, VenueRecord, ViolationRecord};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;

use crate::config::DataConfig;

fn read_records<T, P>(path: P, what: &str) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {what} file {}", path.display()))?;

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize().enumerate() {
        // header is line 1
        let record: T = row.with_context(|| {
            format!("{}: invalid {what} row at line {}", path.display(), idx + 2)
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Load inspections; `passed` may be absent (test data).
pub fn load_inspections<P: AsRef<Path>>(path: P) -> Result<Vec<InspectionRecord>> {
    let records: Vec<InspectionRecord> = read_records(path.as_ref(), "inspection")?;
    if records.is_empty() {
        bail!("Inspection file {} is empty", path.as_ref().display());
    }
    Ok(records)
}

pub fn load_violations<P: AsRef<Path>>(path: P) -> Result<Vec<ViolationRecord>> {
    read_records(path, "violation")
}

/// Load venue metadata keyed by the required `camis` column.
pub fn load_venues<P: AsRef<Path>>(path: P) -> Result<Vec<VenueRecord>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open venue file {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("{}: unreadable header", path.display()))?
        .clone();
    let Some(camis_col) = headers.iter().position(|h| h.trim() == "camis") else {
        bail!("{}: venue file has no `camis` column", path.display());
    };

    let mut venues = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let line = idx + 2;
        let row = row.with_context(|| format!("{}: invalid venue row at line {line}", path.display()))?;
        let raw = row.get(camis_col).unwrap_or("").trim();
        let camis = raw.parse::<VenueId>().with_context(|| {
            format!("{}: line {line}: invalid camis '{raw}'", path.display())
        })?;

        let attributes = headers
            .iter()
            .zip(row.iter())
            .enumerate()
            .filter(|(col, _)| *col != camis_col)
            .map(|(_, (name, value))| (name.trim().to_string(), value.to_string()))
            .collect();

        venues.push(VenueRecord { camis, attributes });
    }
    Ok(venues)
}

/// The four input tables of one run
#[derive(Debug, Clone)]
pub struct RawTables {
    pub train: Vec<InspectionRecord>,
    pub test: Vec<InspectionRecord>,
    pub violations: Vec<ViolationRecord>,
    pub venues: VenueIndex,
}

impl RawTables {
    pub fn load(data: &DataConfig) -> Result<Self> {
        let train = load_inspections(&data.train).context("Failed to load training inspections")?;
        let test = load_inspections(&data.test).context("Failed to load test inspections")?;
        let violations = load_violations(&data.violations).context("Failed to load violations")?;
        let venues = load_venues(&data.venues).context("Failed to load venues")?;
        let venues = VenueIndex::new(venues).context("Invalid venue table")?;

        info!(
            train = train.len(),
            test = test.len(),
            violations = violations.len(),
            venues = venues.len(),
            "Loaded input tables"
        );

        Ok(Self {
            train,
            test,
            violations,
            venues,
        })
    }
}
