//! Keyed lookups and left-join helpers

use std::collections::BTreeMap;

use crate::errors::{FeatureError, Result};
use crate::records::{InspectionRecord, VenueId, VenueRecord};

/// Venue metadata indexed by `camis`
#[derive(Debug, Clone, Default)]
pub struct VenueIndex {
    by_camis: BTreeMap<VenueId, VenueRecord>,
}

impl VenueIndex {
    /// Index venues; a repeated `camis` would multiply joined rows, so it is
    /// rejected.
    pub fn new<I>(venues: I) -> Result<Self>
    where
        I: IntoIterator<Item = VenueRecord>,
    {
        let mut by_camis = BTreeMap::new();
        for venue in venues {
            let camis = venue.camis;
            if by_camis.insert(camis, venue).is_some() {
                return Err(FeatureError::DuplicateKey {
                    table: "venues",
                    key: camis.to_string(),
                });
            }
        }
        Ok(Self { by_camis })
    }

    pub fn get(&self, camis: VenueId) -> Option<&VenueRecord> {
        self.by_camis.get(&camis)
    }

    pub fn len(&self) -> usize {
        self.by_camis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_camis.is_empty()
    }
}

/// Fail when a left join did not preserve the row count.
pub fn ensure_row_count(table: &'static str, before: usize, after: usize) -> Result<()> {
    if before != after {
        return Err(FeatureError::JoinCardinality {
            table,
            before,
            after,
        });
    }
    Ok(())
}

/// Borough of an inspection, falling back to its venue row.
pub fn resolve_borough<'a>(
    record: &'a InspectionRecord,
    venue: Option<&'a VenueRecord>,
) -> Option<&'a str> {
    non_empty(record.boro.as_deref()).or_else(|| venue.and_then(|v| v.attribute("boro")))
}

/// Cuisine of an inspection, falling back to its venue row.
pub fn resolve_cuisine<'a>(
    record: &'a InspectionRecord,
    venue: Option<&'a VenueRecord>,
) -> Option<&'a str> {
    non_empty(record.cuisine_description.as_deref())
        .or_else(|| venue.and_then(|v| v.attribute("cuisine_description")))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
