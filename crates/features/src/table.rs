//! Feature schema, feature matrix and the table builder
//!
//! Every matrix built from the same [`FittedEncoders`] shares one schema, so
//! training, validation and test matrices line up column for column.

use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, instrument};

use crate::aggregate::ViolationSummaries;
use crate::encoders::{encode_month, is_initial_inspection, is_reinspection, one_hot};
use crate::errors::{FeatureError, Result};
use crate::fitted::FittedEncoders;
use crate::join::{ensure_row_count, resolve_borough, resolve_cuisine, VenueIndex};
use crate::records::{InspectionRecord, VenueRecord};

/// Fixed leading columns, in matrix order
pub const BASE_FEATURES: &[&str] = &[
    "n_violations",
    "inspection_month",
    "cuisine_hr",
    "boro_idx",
    "re_inspect",
    "initial_inspect",
    "violation_score",
];

/// Ordered feature column names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Base features, then venue columns, then one column per keyword.
    pub fn new(venue_columns: &[String], keywords: &[String]) -> Self {
        let columns = BASE_FEATURES
            .iter()
            .map(|c| c.to_string())
            .chain(venue_columns.iter().cloned())
            .chain(keywords.iter().cloned())
            .collect();
        Self { columns }
    }

    pub fn from_columns(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Error unless `other` has exactly the same columns in the same order.
    pub fn ensure_matches(&self, other: &FeatureSchema) -> Result<()> {
        if self.columns != other.columns {
            return Err(FeatureError::SchemaMismatch {
                expected: self.columns.clone(),
                actual: other.columns.clone(),
            });
        }
        Ok(())
    }
}

/// One row per inspection, one column per schema entry; `NaN` marks missing.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    schema: FeatureSchema,
    ids: Vec<String>,
    rows: Vec<Vec<f64>>,
    labels: Option<Vec<bool>>,
}

impl FeatureMatrix {
    pub fn new(
        schema: FeatureSchema,
        ids: Vec<String>,
        rows: Vec<Vec<f64>>,
        labels: Option<Vec<bool>>,
    ) -> Result<Self> {
        ensure_row_count("ids", rows.len(), ids.len())?;
        if let Some(labels) = &labels {
            ensure_row_count("labels", rows.len(), labels.len())?;
        }
        if let Some(bad) = rows.iter().find(|r| r.len() != schema.len()) {
            return Err(FeatureError::SchemaMismatch {
                expected: schema.columns.clone(),
                actual: vec![format!("<row with {} values>", bad.len())],
            });
        }
        Ok(Self {
            schema,
            ids,
            rows,
            labels,
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Outcome labels when every inspection carried one
    pub fn labels(&self) -> Option<&[bool]> {
        self.labels.as_deref()
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.schema.len()
    }

    /// Values of a named column
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.schema.index_of(name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Value at (`row`, named column)
    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        let idx = self.schema.index_of(name)?;
        self.rows.get(row).map(|r| r[idx])
    }

    /// Error unless this matrix follows `expected` exactly.
    pub fn ensure_schema(&self, expected: &FeatureSchema) -> Result<()> {
        expected.ensure_matches(&self.schema)
    }

    /// Write as CSV: `id`, the feature columns, then `passed` when labelled.
    /// Missing values are written as empty fields.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);

        let mut header: Vec<&str> = Vec::with_capacity(self.n_cols() + 2);
        header.push("id");
        header.extend(self.schema.columns.iter().map(String::as_str));
        if self.labels.is_some() {
            header.push("passed");
        }
        out.write_record(&header)?;

        for (i, row) in self.rows.iter().enumerate() {
            let mut record: Vec<String> = Vec::with_capacity(header.len());
            record.push(self.ids[i].clone());
            record.extend(row.iter().map(|v| format_value(*v)));
            if let Some(labels) = &self.labels {
                record.push(u8::from(labels[i]).to_string());
            }
            out.write_record(&record)?;
        }
        out.flush()?;
        Ok(())
    }

    /// BLAKE3 digest over schema, ids, exact value bits and labels.
    pub fn fingerprint(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for column in &self.schema.columns {
            hasher.update(column.as_bytes());
            hasher.update(&[0]);
        }
        for (id, row) in self.ids.iter().zip(&self.rows) {
            hasher.update(id.as_bytes());
            hasher.update(&[0]);
            for value in row {
                hasher.update(&value.to_bits().to_le_bytes());
            }
        }
        if let Some(labels) = &self.labels {
            for &label in labels {
                hasher.update(&[u8::from(label)]);
            }
        }
        hex::encode(hasher.finalize().as_bytes())
    }
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Joins venue metadata and violation summaries onto inspections and encodes
/// every feature with training-fitted statistics.
pub struct FeatureTableBuilder<'a> {
    encoders: &'a FittedEncoders,
    summaries: &'a ViolationSummaries,
    venues: &'a VenueIndex,
}

impl<'a> FeatureTableBuilder<'a> {
    pub fn new(
        encoders: &'a FittedEncoders,
        summaries: &'a ViolationSummaries,
        venues: &'a VenueIndex,
    ) -> Self {
        Self {
            encoders,
            summaries,
            venues,
        }
    }

    #[instrument(skip_all, fields(inspections = inspections.len()))]
    pub fn build(&self, inspections: &[InspectionRecord]) -> Result<FeatureMatrix> {
        let n = inspections.len();

        // Both joins are keyed lookups on unique keys, one per inspection row
        let venues: Vec<Option<&VenueRecord>> = inspections
            .iter()
            .map(|r| self.venues.get(r.camis))
            .collect();
        let summaries: Vec<_> = inspections
            .iter()
            .map(|r| self.summaries.get(&r.key()))
            .collect();

        let schema = self.encoders.schema().clone();
        let keywords = self.encoders.keywords().keywords();
        let mut rows = Vec::with_capacity(n);
        let mut without_violations = 0usize;

        for ((record, venue), summary) in inspections.iter().zip(&venues).zip(&summaries) {
            let venue = *venue;
            let mut row = Vec::with_capacity(schema.len());

            let (n_violations, violation_score, hits) = match summary {
                Some(s) => (s.n_violations as f64, s.violation_score, s.keywords.as_slice()),
                None => {
                    without_violations += 1;
                    (0.0, 0.0, &[][..])
                }
            };

            let boro = resolve_borough(record, venue).unwrap_or("");
            let boro_idx = self.encoders.boroughs().encode(boro)?;

            row.push(n_violations);
            row.push(f64::from(encode_month(record.inspection_date)));
            row.push(self.encoders.cuisine_rates().rate(resolve_cuisine(record, venue)));
            row.push(f64::from(boro_idx));
            row.push(f64::from(u8::from(is_reinspection(&record.inspection_type))));
            row.push(f64::from(u8::from(is_initial_inspection(&record.inspection_type))));
            row.push(violation_score);

            for column in self.encoders.venue_columns() {
                row.push(venue.map_or(f64::NAN, |v| v.numeric_attribute(column)));
            }

            row.extend(one_hot(keywords, hits));
            rows.push(row);
        }

        debug!(
            rows = rows.len(),
            without_violations, "feature table assembled"
        );

        let ids = inspections.iter().map(|r| r.id.clone()).collect();
        let labels = inspections.iter().map(|r| r.passed).collect::<Option<Vec<bool>>>();
        FeatureMatrix::new(schema, ids, rows, labels)
    }
}
