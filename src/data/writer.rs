//! Engineered Dataset Writer
//! Serializes a `DerivedTable` back to CSV through a Polars DataFrame.

use super::error::DataError;
use super::model::{
    ColumnSlot, DerivedRecord, DerivedTable, Field, AVG_GRADUATION_RATE, COHORT_SIZE,
    GRADUATION_RATE_IMPROVEMENT, SELECTIVITY_SCORE,
};
use log::info;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;

/// Convert a derived table to a DataFrame: source columns in source order,
/// then the four derived columns.
pub fn to_dataframe(table: &DerivedTable) -> Result<DataFrame, DataError> {
    let rows = table.records();
    let mut columns: Vec<Column> = table
        .source_columns()
        .iter()
        .map(|slot| source_column(slot, rows))
        .collect();

    let derived: [(&str, fn(&DerivedRecord) -> Option<f64>); 4] = [
        (AVG_GRADUATION_RATE, |r| r.avg_graduation_rate),
        (GRADUATION_RATE_IMPROVEMENT, |r| r.graduation_rate_improvement),
        (SELECTIVITY_SCORE, |r| r.selectivity_score),
        (COHORT_SIZE, |r| r.cohort_size),
    ];
    for (name, get) in derived {
        let values: Vec<Option<f64>> = rows.iter().map(get).collect();
        columns.push(Column::new(name.into(), values));
    }

    Ok(DataFrame::new(columns)?)
}

fn source_column(slot: &ColumnSlot, rows: &[DerivedRecord]) -> Column {
    let name: PlSmallStr = slot.name().into();
    match slot {
        ColumnSlot::Required(Field::Name) => {
            let values: Vec<&str> = rows.iter().map(|r| r.record.name.as_str()).collect();
            Column::new(name, values)
        }
        ColumnSlot::Required(Field::ApplicationVolume) => {
            let values: Vec<Option<u64>> =
                rows.iter().map(|r| r.record.application_volume).collect();
            Column::new(name, values)
        }
        ColumnSlot::Required(field) => {
            let field = *field;
            let values: Vec<Option<f64>> = rows
                .iter()
                .map(|r| match field {
                    Field::AdmissionRate => r.record.admission_rate,
                    Field::GraduateRate4yr => r.record.graduate_rate_4yr,
                    Field::GraduateRate6yr => r.record.graduate_rate_6yr,
                    _ => r.record.tuition_cost,
                })
                .collect();
            Column::new(name, values)
        }
        ColumnSlot::Passthrough { index, .. } => {
            let values: Vec<Option<&str>> = rows
                .iter()
                .map(|r| r.record.extra.get(*index).and_then(|v| v.as_deref()))
                .collect();
            Column::new(name, values)
        }
    }
}

/// Write the engineered dataset, creating the parent directory if needed.
pub fn write_csv(table: &DerivedTable, path: impl AsRef<Path>) -> Result<(), DataError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| DataError::io(parent, e))?;
    }

    let mut df = to_dataframe(table)?;
    let mut file = File::create(path).map_err(|e| DataError::io(path, e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;

    info!("Engineered dataset saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::deriver::FeatureDeriver;
    use crate::data::error::ErrorKind;
    use crate::data::loader;
    use crate::data::model::{CollegeRecord, Table};

    fn derived() -> DerivedTable {
        let table = Table::from_records(vec![
            CollegeRecord::new("Harvard", 50000, 0.04, 0.88, 0.97, 57000.0),
            CollegeRecord::new("MIT", 33240, 0.05, 0.85, 0.95, 57590.0),
        ]);
        FeatureDeriver::derive(&table).unwrap()
    }

    #[test]
    fn test_dataframe_layout() {
        let df = to_dataframe(&derived()).unwrap();
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "colleges",
                "application_volume",
                "admission_rate",
                "graduate_rate_4yr",
                "graduate_rate_6yr",
                "tuition_cost",
                "avg_graduation_rate",
                "graduation_rate_improvement",
                "selectivity_score",
                "cohort_size",
            ]
        );
        assert_eq!(df.height(), 2);
        let scores = df.column("selectivity_score").unwrap().f64().unwrap();
        assert_eq!(scores.get(0), Some(25.0));
        assert_eq!(scores.get(1), Some(20.0));
    }

    #[test]
    fn test_written_file_reloads_and_guards_rederive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("engineered.csv");
        write_csv(&derived(), &path).unwrap();

        let reloaded = loader::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.records()[0].name, "Harvard");
        assert_eq!(reloaded.passthrough_names().count(), 4);

        let err = FeatureDeriver::derive(&reloaded).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn test_unwritable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let err = write_csv(&derived(), blocker.join("engineered.csv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
