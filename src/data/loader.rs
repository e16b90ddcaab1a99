//! CSV Data Loader Module
//! Reads the college statistics CSV with Polars and validates it into a typed `Table`.

use super::error::DataError;
use super::model::{CollegeRecord, ColumnSlot, Field, Table, NAME_COLUMN};
use log::{debug, info};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;

/// Cell contents read as missing, matching common CSV exports.
const NULL_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Load a college statistics CSV file.
///
/// Fails if the file cannot be opened, if a required column is missing, or if
/// a non-empty numeric cell does not parse. Empty cells and null markers such
/// as `NA` or `NaN` become `None`.
pub fn load(path: impl AsRef<Path>) -> Result<Table, DataError> {
    let path = path.as_ref();

    // Surface unreadable files as I/O errors before Polars wraps them.
    std::fs::File::open(path).map_err(|e| DataError::io(path, e))?;

    // Every column is read as text so numbers go through `parse_number`
    // wherever they appear in the file.
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|err| match err {
            PolarsError::NoData(_) => DataError::MissingColumn {
                column: NAME_COLUMN,
            },
            other => DataError::Polars(other),
        })?;

    let table = table_from_frame(&df)?;
    info!(
        "Loaded {} rows, {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

/// Validate a DataFrame into a `Table`, resolving header aliases.
pub fn table_from_frame(df: &DataFrame) -> Result<Table, DataError> {
    let headers: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut located: HashMap<Field, String> = HashMap::new();
    let mut columns = Vec::with_capacity(headers.len());
    let mut passthrough = Vec::new();

    for header in &headers {
        match Field::from_header(header) {
            Some(field) if !located.contains_key(&field) => {
                debug!("Column '{}' mapped to {}", header, field.column_name());
                located.insert(field, header.clone());
                columns.push(ColumnSlot::Required(field));
            }
            _ => {
                columns.push(ColumnSlot::Passthrough {
                    name: header.clone(),
                    index: passthrough.len(),
                });
                passthrough.push(header.clone());
            }
        }
    }

    let header_of = |field: Field| -> Result<&str, DataError> {
        located
            .get(&field)
            .map(String::as_str)
            .ok_or(DataError::MissingColumn {
                column: field.column_name(),
            })
    };

    // Check every required column before reading any of them.
    for field in Field::ALL {
        header_of(field)?;
    }

    let names = text_cells(df, header_of(Field::Name)?)?;
    let volumes = volume_cells(df, header_of(Field::ApplicationVolume)?)?;
    let admission = float_cells(df, header_of(Field::AdmissionRate)?, Field::AdmissionRate)?;
    let grad_4yr = float_cells(df, header_of(Field::GraduateRate4yr)?, Field::GraduateRate4yr)?;
    let grad_6yr = float_cells(df, header_of(Field::GraduateRate6yr)?, Field::GraduateRate6yr)?;
    let tuition = float_cells(df, header_of(Field::TuitionCost)?, Field::TuitionCost)?;

    let extras: Vec<Vec<Option<String>>> = passthrough
        .iter()
        .map(|name| text_cells(df, name))
        .collect::<Result<_, _>>()?;

    let records = (0..df.height())
        .map(|i| CollegeRecord {
            name: names[i].clone().unwrap_or_default(),
            application_volume: volumes[i],
            admission_rate: admission[i],
            graduate_rate_4yr: grad_4yr[i],
            graduate_rate_6yr: grad_6yr[i],
            tuition_cost: tuition[i],
            extra: extras.iter().map(|col| col[i].clone()).collect(),
        })
        .collect();

    Ok(Table::new(columns, records))
}

fn is_null_marker(text: &str) -> bool {
    NULL_MARKERS.contains(&text.trim())
}

/// Read a column as text, whatever dtype Polars inferred.
fn text_cells(df: &DataFrame, column: &str) -> Result<Vec<Option<String>>, DataError> {
    let as_text = df.column(column)?.cast(&DataType::String)?;
    let values = as_text
        .str()?
        .into_iter()
        .map(|v| v.filter(|text| !is_null_marker(text)).map(str::to_string))
        .collect();
    Ok(values)
}

/// Read a numeric column. Text columns (e.g. `"43,330"`) are parsed after
/// stripping thousands separators.
fn float_cells(
    df: &DataFrame,
    column: &str,
    field: Field,
) -> Result<Vec<Option<f64>>, DataError> {
    let col = df.column(column)?;

    if matches!(col.dtype(), DataType::String) {
        return col
            .str()?
            .into_iter()
            .enumerate()
            .map(|(row, cell)| match cell {
                Some(text) => parse_number(text, row, field),
                None => Ok(None),
            })
            .collect();
    }

    let values = col.cast(&DataType::Float64)?;
    values
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            Some(v) if v.is_nan() => Ok(None),
            Some(v) if v.is_infinite() => Err(DataError::InvalidValue {
                row,
                column: field.column_name(),
                value: v.to_string(),
            }),
            other => Ok(other),
        })
        .collect()
}

fn volume_cells(df: &DataFrame, column: &str) -> Result<Vec<Option<u64>>, DataError> {
    float_cells(df, column, Field::ApplicationVolume)?
        .into_iter()
        .enumerate()
        .map(|(row, cell)| match cell {
            None => Ok(None),
            Some(v) if v.is_finite() && v >= 0.0 && v.fract() == 0.0 => Ok(Some(v as u64)),
            Some(v) => Err(DataError::InvalidValue {
                row,
                column: Field::ApplicationVolume.column_name(),
                value: v.to_string(),
            }),
        })
        .collect()
}

fn parse_number(text: &str, row: usize, field: Field) -> Result<Option<f64>, DataError> {
    if is_null_marker(text) {
        return Ok(None);
    }
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(DataError::InvalidValue {
            row,
            column: field.column_name(),
            value: text.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::error::ErrorKind;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_basic_file() {
        let file = write_csv(
            "colleges,application_volume,admission_rate,graduate_rate_4yr,graduate_rate_6yr,tuition_cost\n\
             Harvard,50000,0.04,0.88,0.97,57000\n\
             MIT,33240,0.05,0.85,0.95,57590\n",
        );
        let table = load(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.records()[0],
            CollegeRecord::new("Harvard", 50000, 0.04, 0.88, 0.97, 57000.0)
        );
        assert_eq!(table.records()[1].name, "MIT");
    }

    #[test]
    fn test_thousands_separators_and_aliases() {
        let file = write_csv(
            "college,application_volume,admission_rate,graduate_rate_4yr,graduate_rate_6yr,tuition_rate\n\
             Stanford,\"55,471\",0.04,0.75,0.94,58416\n\
             Duke,\"49,523\",0.06,0.88,0.95,63054\n",
        );
        let table = load(file.path()).unwrap();
        assert_eq!(table.records()[0].application_volume, Some(55471));
        assert_eq!(table.records()[1].application_volume, Some(49523));
        assert_eq!(table.records()[1].tuition_cost, Some(63054.0));
        assert_eq!(table.columns()[0], ColumnSlot::Required(Field::Name));
    }

    #[test]
    fn test_missing_cells_become_none() {
        let file = write_csv(
            "colleges,application_volume,admission_rate,graduate_rate_4yr,graduate_rate_6yr,tuition_cost\n\
             Harvard,50000,0.04,0.88,0.97,57000\n\
             Unknown,,0.5,,0.6,\n",
        );
        let table = load(file.path()).unwrap();
        let row = &table.records()[1];
        assert_eq!(row.application_volume, None);
        assert_eq!(row.graduate_rate_4yr, None);
        assert_eq!(row.tuition_cost, None);
        assert_eq!(row.admission_rate, Some(0.5));
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let file = write_csv(
            "colleges,application_volume,graduate_rate_4yr,graduate_rate_6yr,tuition_cost\n\
             Harvard,50000,0.88,0.97,57000\n",
        );
        let err = load(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(err.to_string().contains("admission_rate"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path().join("nope.csv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_passthrough_columns_kept_in_order() {
        let file = write_csv(
            "state,colleges,application_volume,admission_rate,graduate_rate_4yr,graduate_rate_6yr,tuition_cost,public\n\
             MA,Harvard,50000,0.04,0.88,0.97,57000,no\n",
        );
        let table = load(file.path()).unwrap();
        assert_eq!(table.passthrough_names().collect::<Vec<_>>(), vec!["state", "public"]);
        assert_eq!(table.columns()[0].name(), "state");
        assert_eq!(
            table.records()[0].extra,
            vec![Some("MA".to_string()), Some("no".to_string())]
        );
    }

    #[test]
    fn test_unparsable_number_is_parse_error() {
        let file = write_csv(
            "colleges,application_volume,admission_rate,graduate_rate_4yr,graduate_rate_6yr,tuition_cost\n\
             Harvard,50000,abc,0.88,0.97,57000\n",
        );
        let err = load(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(matches!(
            err,
            DataError::InvalidValue { row: 0, column: "admission_rate", .. }
        ));
    }

    #[test]
    fn test_null_markers_become_none() {
        let file = write_csv(
            "colleges,application_volume,admission_rate,graduate_rate_4yr,graduate_rate_6yr,tuition_cost\n\
             Harvard,NA,NaN,n/a,N/A,null\n\
             MIT,33240,0.05,0.85,0.95,57590\n",
        );
        let table = load(file.path()).unwrap();
        let row = &table.records()[0];
        assert_eq!(row.application_volume, None);
        assert_eq!(row.admission_rate, None);
        assert_eq!(row.graduate_rate_4yr, None);
        assert_eq!(row.graduate_rate_6yr, None);
        assert_eq!(row.tuition_cost, None);
        assert_eq!(table.records()[1].admission_rate, Some(0.05));

        // A NaN admission rate must never reach the deriver as a number.
        let derived = crate::data::FeatureDeriver::derive(&table).unwrap();
        assert_eq!(derived.records()[0].selectivity_score, None);
    }

    #[test]
    fn test_infinite_value_is_parse_error() {
        let file = write_csv(
            "colleges,application_volume,admission_rate,graduate_rate_4yr,graduate_rate_6yr,tuition_cost\n\
             Harvard,50000,0.04,0.88,0.97,inf\n",
        );
        let err = load(file.path()).unwrap_err();
        assert!(matches!(
            err,
            DataError::InvalidValue { row: 0, column: "tuition_cost", .. }
        ));
    }

    #[test]
    fn test_empty_file_is_schema_error() {
        let file = write_csv("");
        let err = load(file.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert!(matches!(err, DataError::MissingColumn { column: "colleges" }));
    }

    #[test]
    fn test_thousands_separator_late_in_file() {
        let mut contents = String::from(
            "colleges,application_volume,admission_rate,graduate_rate_4yr,graduate_rate_6yr,tuition_cost\n",
        );
        for i in 0..10_001 {
            contents.push_str(&format!("College {i},1000,0.5,0.6,0.7,20000\n"));
        }
        contents.push_str("Late College,\"12,345\",0.5,0.6,0.7,\"21,000\"\n");
        let file = write_csv(&contents);

        let table = load(file.path()).unwrap();
        assert_eq!(table.len(), 10_002);
        let last = &table.records()[10_001];
        assert_eq!(last.application_volume, Some(12345));
        assert_eq!(last.tuition_cost, Some(21000.0));
    }

    #[test]
    fn test_fractional_volume_rejected() {
        let df = df!(
            "colleges" => ["Harvard"],
            "application_volume" => [500.5],
            "admission_rate" => [0.04],
            "graduate_rate_4yr" => [0.88],
            "graduate_rate_6yr" => [0.97],
            "tuition_cost" => [57000.0],
        )
        .unwrap();
        let err = table_from_frame(&df).unwrap_err();
        assert!(matches!(
            err,
            DataError::InvalidValue { row: 0, column: "application_volume", .. }
        ));
    }
}
