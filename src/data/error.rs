//! Data Error Types
//! Errors raised while loading, deriving and writing college tables.

use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification used by callers to decide how to report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// File could not be read or written.
    Io,
    /// Required column missing or derived column already present.
    Schema,
    /// Value makes a formula undefined (zero admission rate).
    Domain,
    /// Cell content is not a valid number for its column.
    Parse,
}

#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing required column '{column}'")]
    MissingColumn { column: &'static str },

    #[error("Column '{column}' already exists; refusing to derive it again")]
    DuplicateColumn { column: String },

    #[error("Row {row} ({name}): admission_rate is 0, selectivity_score is undefined")]
    ZeroAdmissionRate { row: usize, name: String },

    #[error("Row {row}, column '{column}': cannot parse '{value}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

impl DataError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DataError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DataError::Io { .. } => ErrorKind::Io,
            DataError::MissingColumn { .. } | DataError::DuplicateColumn { .. } => {
                ErrorKind::Schema
            }
            DataError::ZeroAdmissionRate { .. } => ErrorKind::Domain,
            DataError::InvalidValue { .. } => ErrorKind::Parse,
            DataError::Polars(PolarsError::IO { .. }) => ErrorKind::Io,
            DataError::Polars(PolarsError::ColumnNotFound(_) | PolarsError::NoData(_)) => {
                ErrorKind::Schema
            }
            DataError::Polars(_) => ErrorKind::Parse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let missing = DataError::MissingColumn {
            column: "admission_rate",
        };
        assert_eq!(missing.kind(), ErrorKind::Schema);

        let zero = DataError::ZeroAdmissionRate {
            row: 3,
            name: "Nowhere College".into(),
        };
        assert_eq!(zero.kind(), ErrorKind::Domain);
        assert!(zero.to_string().contains("Row 3 (Nowhere College)"));

        let io = DataError::io(
            "missing.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(io.kind(), ErrorKind::Io);
        assert!(io.to_string().contains("missing.csv"));
    }

    #[test]
    fn test_empty_input_is_schema_kind() {
        let empty = DataError::Polars(PolarsError::NoData("empty CSV".into()));
        assert_eq!(empty.kind(), ErrorKind::Schema);
    }
}
