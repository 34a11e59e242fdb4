// Value curve resolver: pick number -> value, and draft year -> number of
// picks that count as "drafted".

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::ReferenceDataError;
use crate::table::{cell, RawTable};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One row of the value curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickValue {
    pub pick: u32,
    pub value: f64,
}

/// One row of the capacity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCapacity {
    pub year: i32,
    pub total_picks: u32,
}

// ---------------------------------------------------------------------------
// Lookup seam
// ---------------------------------------------------------------------------

/// The reference lookups the aggregator depends on. Implemented by
/// [`ReferenceTables`]; callers with another backing store can supply their
/// own.
pub trait ReferenceData {
    /// Value of a pick. A pick absent from the curve is an error, never zero.
    fn value_of(&self, pick: u32) -> Result<f64, ReferenceDataError>;

    /// Number of ranked board entries that count as drafted in `year`.
    fn capacity_of(&self, year: i32) -> Result<usize, ReferenceDataError>;
}

// ---------------------------------------------------------------------------
// Value curve
// ---------------------------------------------------------------------------

/// Pick -> value table, validated on construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueCurve {
    values: BTreeMap<u32, f64>,
}

impl ValueCurve {
    /// Build from typed rows. Rejects duplicate picks, pick 0, and values
    /// that are negative or non-finite.
    pub fn from_rows<I>(rows: I) -> Result<Self, ReferenceDataError>
    where
        I: IntoIterator<Item = PickValue>,
    {
        let mut values = BTreeMap::new();
        for PickValue { pick, value } in rows {
            if pick == 0 {
                return Err(ReferenceDataError::InvalidPick { pick });
            }
            if !value.is_finite() || value < 0.0 {
                return Err(ReferenceDataError::InvalidValue { pick, value });
            }
            if values.insert(pick, value).is_some() {
                return Err(ReferenceDataError::DuplicatePick { pick });
            }
        }
        debug!("value curve loaded with {} picks", values.len());
        Ok(Self { values })
    }

    /// Build from a raw `pick,value` table. Header names are matched after
    /// normalization; every cell must be numeric.
    pub fn from_table(table: &RawTable) -> Result<Self, ReferenceDataError> {
        const TABLE: &str = "value curve";
        let idx = table
            .require_columns(&["pick", "value"])
            .map_err(|missing| ReferenceDataError::MissingColumns {
                table: TABLE,
                missing,
            })?;
        let (pick_idx, value_idx) = (idx[0], idx[1]);

        let mut rows = Vec::with_capacity(table.len());
        for (i, record) in table.records.iter().enumerate() {
            let row = i + 1;
            let pick = parse_whole(cell(record, pick_idx)).ok_or_else(|| {
                ReferenceDataError::NonNumeric {
                    table: TABLE,
                    row,
                    field: "pick",
                    raw: cell(record, pick_idx).to_string(),
                }
            })?;
            let raw_value = cell(record, value_idx).trim();
            let value: f64 = raw_value.parse().map_err(|_| ReferenceDataError::NonNumeric {
                table: TABLE,
                row,
                field: "value",
                raw: raw_value.to_string(),
            })?;
            rows.push(PickValue { pick, value });
        }
        Self::from_rows(rows)
    }

    pub fn get(&self, pick: u32) -> Option<f64> {
        self.values.get(&pick).copied()
    }

    pub fn value_of(&self, pick: u32) -> Result<f64, ReferenceDataError> {
        self.get(pick)
            .ok_or(ReferenceDataError::MissingPick { pick })
    }

    /// Highest pick with a value, if any.
    pub fn max_pick(&self) -> Option<u32> {
        self.values.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Capacity table
// ---------------------------------------------------------------------------

/// Year -> total picks table, validated on construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapacityTable {
    capacities: BTreeMap<i32, u32>,
}

impl CapacityTable {
    /// Build from typed rows. Rejects duplicate years and zero capacities.
    pub fn from_rows<I>(rows: I) -> Result<Self, ReferenceDataError>
    where
        I: IntoIterator<Item = YearCapacity>,
    {
        let mut capacities = BTreeMap::new();
        for YearCapacity { year, total_picks } in rows {
            if total_picks == 0 {
                return Err(ReferenceDataError::InvalidCapacity { year });
            }
            if capacities.insert(year, total_picks).is_some() {
                return Err(ReferenceDataError::DuplicateYear { year });
            }
        }
        debug!("capacity table loaded with {} years", capacities.len());
        Ok(Self { capacities })
    }

    /// Build from a raw `year,total_picks` table.
    pub fn from_table(table: &RawTable) -> Result<Self, ReferenceDataError> {
        const TABLE: &str = "capacity";
        let idx = table
            .require_columns(&["year", "total_picks"])
            .map_err(|missing| ReferenceDataError::MissingColumns {
                table: TABLE,
                missing,
            })?;
        let (year_idx, picks_idx) = (idx[0], idx[1]);

        let mut rows = Vec::with_capacity(table.len());
        for (i, record) in table.records.iter().enumerate() {
            let row = i + 1;
            let raw_year = cell(record, year_idx).trim();
            let year: i32 = raw_year.parse().map_err(|_| ReferenceDataError::NonNumeric {
                table: TABLE,
                row,
                field: "year",
                raw: raw_year.to_string(),
            })?;
            let total_picks = parse_whole(cell(record, picks_idx)).ok_or_else(|| {
                ReferenceDataError::NonNumeric {
                    table: TABLE,
                    row,
                    field: "total_picks",
                    raw: cell(record, picks_idx).to_string(),
                }
            })?;
            rows.push(YearCapacity { year, total_picks });
        }
        Self::from_rows(rows)
    }

    pub fn get(&self, year: i32) -> Option<u32> {
        self.capacities.get(&year).copied()
    }

    pub fn capacity_of(&self, year: i32) -> Result<usize, ReferenceDataError> {
        self.get(year)
            .map(|n| n as usize)
            .ok_or(ReferenceDataError::MissingYear { year })
    }

    /// Configured years, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.capacities.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.capacities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capacities.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Combined reference tables
// ---------------------------------------------------------------------------

/// Both reference tables together; the usual [`ReferenceData`] implementation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTables {
    pub curve: ValueCurve,
    pub capacity: CapacityTable,
}

impl ReferenceTables {
    pub fn new(curve: ValueCurve, capacity: CapacityTable) -> Self {
        Self { curve, capacity }
    }
}

impl ReferenceData for ReferenceTables {
    fn value_of(&self, pick: u32) -> Result<f64, ReferenceDataError> {
        self.curve.value_of(pick)
    }

    fn capacity_of(&self, year: i32) -> Result<usize, ReferenceDataError> {
        self.capacity.capacity_of(year)
    }
}

/// Parse a non-negative whole number for reference tables, accepting `"12"`
/// and `"12.0"`. Fractional values are rejected; board ranks are coerced more
/// leniently by `board::parse_rank`.
pub(crate) fn parse_whole(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return Some(n);
    }
    let f: f64 = raw.parse().ok()?;
    if f.is_finite() && f.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&f) {
        Some(f as u32)
    } else {
        None
    }
}
