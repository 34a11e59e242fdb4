// Loosely-typed tabular input: named columns over string cells.
//
// This is the only place rows are addressed by column name. Boards and
// reference tables are converted into typed records once, at the boundary.

/// Header names plus string cells, as read from whatever storage format the
/// surrounding I/O layer uses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub records: Vec<Vec<String>>,
}

/// Normalize a column header: trim, lowercase, spaces to underscores.
///
/// `" Player Name "` becomes `"player_name"`.
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

impl RawTable {
    pub fn new(columns: Vec<String>, records: Vec<Vec<String>>) -> Self {
        Self { columns, records }
    }

    /// Convenience constructor used heavily by tests and fixtures.
    pub fn from_rows(columns: &[&str], rows: &[&[&str]]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            records: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    /// Column names after normalization, in header order.
    pub fn normalized_columns(&self) -> Vec<String> {
        self.columns.iter().map(|c| normalize_column_name(c)).collect()
    }

    /// Index of the first column whose normalized name equals `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| normalize_column_name(c) == name)
    }

    /// Resolve every name in `required`, returning the missing ones (sorted)
    /// on failure.
    pub fn require_columns(&self, required: &[&str]) -> Result<Vec<usize>, Vec<String>> {
        let mut indices = Vec::with_capacity(required.len());
        let mut missing = Vec::new();
        for name in required {
            match self.column_index(name) {
                Some(idx) => indices.push(idx),
                None => missing.push(name.to_string()),
            }
        }
        if missing.is_empty() {
            Ok(indices)
        } else {
            missing.sort();
            Err(missing)
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Cell lookup that treats short records as having empty trailing cells.
pub fn cell(record: &[String], idx: usize) -> &str {
    record.get(idx).map(String::as_str).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_are_trimmed_lowercased_and_underscored() {
        assert_eq!(normalize_column_name(" Player Name "), "player_name");
        assert_eq!(normalize_column_name("Position"), "position");
        assert_eq!(normalize_column_name("RANK"), "rank");
    }

    #[test]
    fn column_index_matches_normalized_header() {
        let table = RawTable::from_rows(&["Rank", "Player Name", "Position"], &[]);
        assert_eq!(table.column_index("player_name"), Some(1));
        assert_eq!(table.column_index("college"), None);
    }

    #[test]
    fn first_duplicate_column_wins() {
        let table = RawTable::from_rows(&["rank", "Rank"], &[]);
        assert_eq!(table.column_index("rank"), Some(0));
    }

    #[test]
    fn require_columns_reports_sorted_missing() {
        let table = RawTable::from_rows(&["position"], &[]);
        let missing = table.require_columns(&["rank", "position", "college"]).unwrap_err();
        assert_eq!(missing, vec!["college".to_string(), "rank".to_string()]);
    }

    #[test]
    fn short_records_read_as_empty_cells() {
        let record = vec!["1".to_string()];
        assert_eq!(cell(&record, 0), "1");
        assert_eq!(cell(&record, 3), "");
    }
}
