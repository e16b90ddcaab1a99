//! Range Audit
//! Non-failing checks over a loaded table. Findings are reported, never applied.

use super::model::{
    CollegeRecord, Table, ADMISSION_RATE, APPLICATION_VOLUME, GRADUATE_RATE_4YR,
    GRADUATE_RATE_6YR, NAME_COLUMN, TUITION_COST,
};
use std::collections::HashSet;
use std::fmt;

/// Something suspicious about a single cell or row.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeIssue {
    /// A rate outside [0, 1].
    RateOutOfRange {
        row: usize,
        column: &'static str,
        value: f64,
    },
    /// Admission rate of zero or below; selectivity is undefined.
    NonPositiveAdmissionRate { row: usize, value: f64 },
    /// Negative tuition.
    NegativeTuition { row: usize, value: f64 },
    /// An empty cell in a required column.
    MissingValue { row: usize, column: &'static str },
    /// An institution name seen earlier in the same table.
    DuplicateName { row: usize, name: String },
}

impl fmt::Display for RangeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeIssue::RateOutOfRange { row, column, value } => {
                write!(f, "row {row}: {column} = {value} is outside [0, 1]")
            }
            RangeIssue::NonPositiveAdmissionRate { row, value } => {
                write!(f, "row {row}: {ADMISSION_RATE} = {value} is not positive")
            }
            RangeIssue::NegativeTuition { row, value } => {
                write!(f, "row {row}: {TUITION_COST} = {value} is negative")
            }
            RangeIssue::MissingValue { row, column } => write!(f, "row {row}: {column} is empty"),
            RangeIssue::DuplicateName { row, name } => {
                write!(f, "row {row}: institution '{name}' appears more than once")
            }
        }
    }
}

/// Audit every row of `table`.
pub fn audit(table: &Table) -> Vec<RangeIssue> {
    let mut issues = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (row, record) in table.records().iter().enumerate() {
        audit_record(row, record, &mut issues);

        if record.name.is_empty() {
            issues.push(RangeIssue::MissingValue {
                row,
                column: NAME_COLUMN,
            });
        } else if !seen.insert(record.name.as_str()) {
            issues.push(RangeIssue::DuplicateName {
                row,
                name: record.name.clone(),
            });
        }
    }

    issues
}

fn audit_record(row: usize, record: &CollegeRecord, issues: &mut Vec<RangeIssue>) {
    if record.application_volume.is_none() {
        issues.push(RangeIssue::MissingValue {
            row,
            column: APPLICATION_VOLUME,
        });
    }

    match record.admission_rate {
        None => issues.push(RangeIssue::MissingValue {
            row,
            column: ADMISSION_RATE,
        }),
        Some(value) if value <= 0.0 => {
            issues.push(RangeIssue::NonPositiveAdmissionRate { row, value })
        }
        Some(value) if value > 1.0 => issues.push(RangeIssue::RateOutOfRange {
            row,
            column: ADMISSION_RATE,
            value,
        }),
        Some(_) => {}
    }

    for (column, rate) in [
        (GRADUATE_RATE_4YR, record.graduate_rate_4yr),
        (GRADUATE_RATE_6YR, record.graduate_rate_6yr),
    ] {
        match rate {
            None => issues.push(RangeIssue::MissingValue { row, column }),
            Some(value) if !(0.0..=1.0).contains(&value) => {
                issues.push(RangeIssue::RateOutOfRange { row, column, value })
            }
            Some(_) => {}
        }
    }

    match record.tuition_cost {
        None => issues.push(RangeIssue::MissingValue {
            row,
            column: TUITION_COST,
        }),
        Some(value) if value < 0.0 => issues.push(RangeIssue::NegativeTuition { row, value }),
        Some(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Field;

    #[test]
    fn test_clean_table_has_no_issues() {
        let table = Table::from_records(vec![
            CollegeRecord::new("Harvard", 50000, 0.04, 0.88, 0.97, 57000.0),
            CollegeRecord::new("MIT", 33240, 1.0, 0.0, 1.0, 0.0),
        ]);
        assert!(audit(&table).is_empty());
    }

    #[test]
    fn test_flags_suspicious_values() {
        let mut missing = CollegeRecord::new("Gap", 10, 0.5, 0.5, 0.5, 1.0);
        missing.graduate_rate_6yr = None;

        let table = Table::from_records(vec![
            CollegeRecord::new("Zero", 100, 0.0, 0.5, 1.2, -5.0),
            missing,
            CollegeRecord::new("Zero", 100, 0.5, 0.5, 0.5, 5.0),
        ]);
        let issues = audit(&table);

        assert!(issues.contains(&RangeIssue::NonPositiveAdmissionRate { row: 0, value: 0.0 }));
        assert!(issues.contains(&RangeIssue::RateOutOfRange {
            row: 0,
            column: "graduate_rate_6yr",
            value: 1.2
        }));
        assert!(issues.contains(&RangeIssue::NegativeTuition { row: 0, value: -5.0 }));
        assert!(issues.contains(&RangeIssue::MissingValue {
            row: 1,
            column: "graduate_rate_6yr"
        }));
        assert!(issues.contains(&RangeIssue::DuplicateName {
            row: 2,
            name: "Zero".into()
        }));
        assert_eq!(issues.len(), 5);
    }

    #[test]
    fn test_missing_cells_named_by_schema_column() {
        let empty = CollegeRecord {
            name: String::new(),
            application_volume: None,
            admission_rate: None,
            graduate_rate_4yr: None,
            graduate_rate_6yr: None,
            tuition_cost: None,
            extra: Vec::new(),
        };
        let table = Table::from_records(vec![empty]);

        let mut flagged: Vec<&str> = audit(&table)
            .iter()
            .map(|issue| match issue {
                RangeIssue::MissingValue { column, .. } => *column,
                other => panic!("unexpected issue {other:?}"),
            })
            .collect();
        flagged.sort_unstable();
        let mut expected: Vec<&str> = Field::ALL.iter().map(|f| f.column_name()).collect();
        expected.sort_unstable();
        assert_eq!(flagged, expected);
    }

    #[test]
    fn test_audit_does_not_modify_table() {
        let table = Table::from_records(vec![CollegeRecord::new("Odd", 1, 2.0, -1.0, 3.0, -1.0)]);
        let before = table.clone();
        assert!(!audit(&table).is_empty());
        assert_eq!(table, before);
    }
}
