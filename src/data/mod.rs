//! Data module - CSV loading, feature derivation and persistence
//!
//! ```text
//!  dataset.csv ──► loader ──► Table ──► deriver ──► DerivedTable ──► writer ──► engineered_data.csv
//!                              │
//!                              └──► validator (audit, warnings only)
//! ```

pub mod deriver;
pub mod error;
pub mod loader;
pub mod model;
pub mod validator;
pub mod writer;

pub use deriver::{round_half_even, FeatureDeriver};
pub use error::{DataError, ErrorKind};
pub use loader::load;
pub use model::{CollegeRecord, ColumnSlot, DerivedRecord, DerivedTable, Field, Metric, Table};
pub use validator::{audit, RangeIssue};
pub use writer::write_csv;
