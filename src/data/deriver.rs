//! Feature Deriver Module
//! Computes the engineered college features row by row.

use super::error::DataError;
use super::model::{CollegeRecord, DerivedRecord, DerivedTable, Table, DERIVED_COLUMNS};
use log::info;

/// Decimal places kept for each engineered feature.
pub const RATE_DECIMALS: i32 = 3;
pub const SCORE_DECIMALS: i32 = 2;

/// Round to `decimals` places, ties to even on the scaled value.
///
/// `round_half_even(0.125, 2) == 0.12`, `round_half_even(0.135, 2) == 0.14`.
pub fn round_half_even(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round_ties_even() / factor
}

/// Derives average graduation rate, graduation improvement, selectivity and
/// cohort size for every row of a table.
pub struct FeatureDeriver;

impl FeatureDeriver {
    /// Derive all features. Aborts on the first row with a zero admission
    /// rate; no partial table is returned.
    pub fn derive(table: &Table) -> Result<DerivedTable, DataError> {
        if let Some(column) = table
            .passthrough_names()
            .find(|name| DERIVED_COLUMNS.iter().any(|d| d.eq_ignore_ascii_case(name)))
        {
            return Err(DataError::DuplicateColumn {
                column: column.to_string(),
            });
        }

        let records = table
            .records()
            .iter()
            .enumerate()
            .map(|(row, record)| Self::derive_record(row, record))
            .collect::<Result<Vec<_>, _>>()?;

        info!("Derived {} features for {} rows", DERIVED_COLUMNS.len(), records.len());
        Ok(DerivedTable::new(table.columns().to_vec(), records))
    }

    /// Derive the features of a single row. `row` is only used for error reporting.
    pub fn derive_record(row: usize, record: &CollegeRecord) -> Result<DerivedRecord, DataError> {
        Ok(DerivedRecord {
            avg_graduation_rate: Self::avg_graduation_rate(record),
            graduation_rate_improvement: Self::graduation_rate_improvement(record),
            selectivity_score: Self::selectivity_score(row, record)?,
            cohort_size: Self::cohort_size(record),
            record: record.clone(),
        })
    }

    pub fn avg_graduation_rate(record: &CollegeRecord) -> Option<f64> {
        let (g4, g6) = (record.graduate_rate_4yr?, record.graduate_rate_6yr?);
        Some(round_half_even((g4 + g6) / 2.0, RATE_DECIMALS))
    }

    pub fn graduation_rate_improvement(record: &CollegeRecord) -> Option<f64> {
        let (g4, g6) = (record.graduate_rate_4yr?, record.graduate_rate_6yr?);
        Some(round_half_even(g6 - g4, RATE_DECIMALS))
    }

    pub fn selectivity_score(row: usize, record: &CollegeRecord) -> Result<Option<f64>, DataError> {
        match record.admission_rate {
            None => Ok(None),
            Some(rate) if rate == 0.0 => Err(DataError::ZeroAdmissionRate {
                row,
                name: record.name.clone(),
            }),
            Some(rate) => Ok(Some(round_half_even(1.0 / rate, SCORE_DECIMALS))),
        }
    }

    pub fn cohort_size(record: &CollegeRecord) -> Option<f64> {
        let volume = record.application_volume? as f64;
        let rate = record.admission_rate?;
        Some(round_half_even(volume * rate, SCORE_DECIMALS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::error::ErrorKind;
    use crate::data::model::{ColumnSlot, Field};
    use proptest::prelude::*;

    fn harvard() -> CollegeRecord {
        CollegeRecord::new("Harvard", 50000, 0.04, 0.88, 0.97, 57000.0)
    }

    fn sample_table() -> Table {
        Table::from_records(vec![
            harvard(),
            CollegeRecord::new("Stanford", 55471, 0.04, 0.75, 0.94, 58416.0),
            CollegeRecord::new("MIT", 33240, 0.05, 0.85, 0.95, 57590.0),
            CollegeRecord::new("Yale", 46905, 0.05, 0.87, 0.97, 62250.0),
            CollegeRecord::new("Princeton", 38019, 0.04, 0.9, 0.97, 57410.0),
            CollegeRecord::new("Columbia", 60377, 0.04, 0.87, 0.95, 65524.0),
            CollegeRecord::new("University of Chicago", 37974, 0.05, 0.88, 0.95, 64260.0),
            CollegeRecord::new("Duke", 49523, 0.06, 0.88, 0.95, 63054.0),
            CollegeRecord::new("UC Berkeley", 125910, 0.11, 0.76, 0.93, 44115.0),
            CollegeRecord::new("University of Michigan", 87632, 0.18, 0.81, 0.93, 55334.0),
            CollegeRecord::new("NYU", 120000, 0.12, 0.76, 0.87, 58168.0),
            CollegeRecord::new("Boston University", 80495, 0.14, 0.8, 0.89, 62360.0),
        ])
    }

    #[test]
    fn test_harvard_example() {
        let derived = FeatureDeriver::derive_record(0, &harvard()).unwrap();
        assert_eq!(derived.avg_graduation_rate, Some(0.925));
        assert_eq!(derived.graduation_rate_improvement, Some(0.09));
        assert_eq!(derived.selectivity_score, Some(25.0));
        assert_eq!(derived.cohort_size, Some(2000.0));
        assert_eq!(derived.record, harvard());
    }

    #[test]
    fn test_round_half_even() {
        assert_eq!(round_half_even(0.125, 2), 0.12);
        assert_eq!(round_half_even(0.375, 2), 0.38);
        assert_eq!(round_half_even(2.5, 0), 2.0);
        assert_eq!(round_half_even(3.5, 0), 4.0);
        assert_eq!(round_half_even(-0.0625, 3), -0.062);
        assert_eq!(round_half_even(1.0 / 3.0, 3), 0.333);
        assert!(round_half_even(f64::NAN, 2).is_nan());
    }

    #[test]
    fn test_zero_admission_rate_aborts_batch() {
        let mut rows = sample_table().records().to_vec();
        rows[4].admission_rate = Some(0.0);
        let err = FeatureDeriver::derive(&Table::from_records(rows)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Domain);
        assert!(matches!(
            err,
            DataError::ZeroAdmissionRate { row: 4, ref name } if name == "Princeton"
        ));
    }

    #[test]
    fn test_nulls_propagate() {
        let mut record = harvard();
        record.graduate_rate_4yr = None;
        record.admission_rate = None;
        let derived = FeatureDeriver::derive_record(0, &record).unwrap();
        assert_eq!(derived.avg_graduation_rate, None);
        assert_eq!(derived.graduation_rate_improvement, None);
        assert_eq!(derived.selectivity_score, None);
        assert_eq!(derived.cohort_size, None);
    }

    #[test]
    fn test_out_of_range_rates_accepted() {
        let record = CollegeRecord::new("Odd", 100, 1.5, -0.2, 1.2, 0.0);
        let derived = FeatureDeriver::derive_record(0, &record).unwrap();
        assert_eq!(derived.selectivity_score, Some(0.67));
        assert_eq!(derived.cohort_size, Some(150.0));
        assert_eq!(derived.graduation_rate_improvement, Some(1.4));
    }

    #[test]
    fn test_duplicate_derived_column_rejected() {
        let mut record = harvard();
        record.extra = vec![Some("25.0".into())];
        let mut columns: Vec<ColumnSlot> = Field::ALL.into_iter().map(ColumnSlot::Required).collect();
        columns.push(ColumnSlot::Passthrough {
            name: "selectivity_score".into(),
            index: 0,
        });
        let err = FeatureDeriver::derive(&Table::new(columns, vec![record])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_twelve_rows_derived_twice_identical() {
        let table = sample_table();
        let first = FeatureDeriver::derive(&table).unwrap();
        let second = FeatureDeriver::derive(&table).unwrap();
        assert_eq!(first.len(), 12);
        assert_eq!(first, second);
        assert_eq!(first.names(), second.names());
    }

    #[test]
    fn test_column_set_after_derivation() {
        let derived = FeatureDeriver::derive(&sample_table()).unwrap();
        let names = derived.column_names();
        assert_eq!(names.len(), 10);
        assert_eq!(&names[6..], &DERIVED_COLUMNS);
    }

    fn record_strategy() -> impl Strategy<Value = CollegeRecord> {
        (
            "[A-Za-z ]{1,20}",
            0u64..500_000,
            0.001f64..=1.0,
            0.0f64..=1.0,
            0.0f64..=1.0,
            0.0f64..100_000.0,
        )
            .prop_map(|(name, volume, rate, g4, g6, tuition)| {
                CollegeRecord::new(name, volume, rate, g4, g6, tuition)
            })
    }

    proptest! {
        #[test]
        fn prop_derivation_preserves_order_and_formulas(
            records in prop::collection::vec(record_strategy(), 0..40)
        ) {
            let table = Table::from_records(records.clone());
            let derived = FeatureDeriver::derive(&table).unwrap();

            prop_assert_eq!(derived.len(), table.len());
            for (source, row) in records.iter().zip(derived.records()) {
                prop_assert_eq!(row.name(), source.name.as_str());

                let g4 = source.graduate_rate_4yr.unwrap();
                let g6 = source.graduate_rate_6yr.unwrap();
                let rate = source.admission_rate.unwrap();
                let volume = source.application_volume.unwrap() as f64;

                prop_assert_eq!(row.avg_graduation_rate, Some(round_half_even((g4 + g6) / 2.0, 3)));
                prop_assert_eq!(row.graduation_rate_improvement, Some(round_half_even(g6 - g4, 3)));
                prop_assert_eq!(row.selectivity_score, Some(round_half_even(1.0 / rate, 2)));
                prop_assert_eq!(row.cohort_size, Some(round_half_even(volume * rate, 2)));

                let cohort = row.cohort_size.unwrap();
                prop_assert!(cohort <= volume);
                prop_assert!(row.selectivity_score.unwrap().is_finite());
            }
        }

        #[test]
        fn prop_derivation_is_pure(records in prop::collection::vec(record_strategy(), 0..20)) {
            let table = Table::from_records(records);
            let first = FeatureDeriver::derive(&table).unwrap();
            let second = FeatureDeriver::derive(&table).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
