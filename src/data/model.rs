use std::fmt;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const NAME_COLUMN: &str = "colleges";
pub const APPLICATION_VOLUME: &str = "application_volume";
pub const ADMISSION_RATE: &str = "admission_rate";
pub const GRADUATE_RATE_4YR: &str = "graduate_rate_4yr";
pub const GRADUATE_RATE_6YR: &str = "graduate_rate_6yr";
pub const TUITION_COST: &str = "tuition_cost";

pub const AVG_GRADUATION_RATE: &str = "avg_graduation_rate";
pub const GRADUATION_RATE_IMPROVEMENT: &str = "graduation_rate_improvement";
pub const SELECTIVITY_SCORE: &str = "selectivity_score";
pub const COHORT_SIZE: &str = "cohort_size";

/// Columns appended by the deriver, in output order.
pub const DERIVED_COLUMNS: [&str; 4] = [
    AVG_GRADUATION_RATE,
    GRADUATION_RATE_IMPROVEMENT,
    SELECTIVITY_SCORE,
    COHORT_SIZE,
];

// ---------------------------------------------------------------------------
// Field: one of the required source columns
// ---------------------------------------------------------------------------

/// A required input column. The loader maps header aliases onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    ApplicationVolume,
    AdmissionRate,
    GraduateRate4yr,
    GraduateRate6yr,
    TuitionCost,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Name,
        Field::ApplicationVolume,
        Field::AdmissionRate,
        Field::GraduateRate4yr,
        Field::GraduateRate6yr,
        Field::TuitionCost,
    ];

    /// Canonical column name, used when writing.
    pub fn column_name(self) -> &'static str {
        match self {
            Field::Name => NAME_COLUMN,
            Field::ApplicationVolume => APPLICATION_VOLUME,
            Field::AdmissionRate => ADMISSION_RATE,
            Field::GraduateRate4yr => GRADUATE_RATE_4YR,
            Field::GraduateRate6yr => GRADUATE_RATE_6YR,
            Field::TuitionCost => TUITION_COST,
        }
    }

    /// Header spellings accepted for this column (compared case-insensitively).
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::Name => &["colleges", "college", "name", "institution"],
            Field::ApplicationVolume => &["application_volume", "applications"],
            Field::AdmissionRate => &["admission_rate"],
            Field::GraduateRate4yr => &["graduate_rate_4yr", "graduation_rate_4yr"],
            Field::GraduateRate6yr => &["graduate_rate_6yr", "graduation_rate_6yr"],
            Field::TuitionCost => &["tuition_cost", "tuition_rate", "tuition"],
        }
    }

    /// Resolve a raw header to a required field, if it is one.
    pub fn from_header(header: &str) -> Option<Field> {
        let header = header.trim();
        Field::ALL.into_iter().find(|field| {
            field
                .aliases()
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(header))
        })
    }
}

/// Position of a column in the source header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSlot {
    Required(Field),
    /// Extra column carried through untouched; index into `CollegeRecord::extra`.
    Passthrough { name: String, index: usize },
}

impl ColumnSlot {
    pub fn name(&self) -> &str {
        match self {
            ColumnSlot::Required(field) => field.column_name(),
            ColumnSlot::Passthrough { name, .. } => name,
        }
    }
}

// ---------------------------------------------------------------------------
// CollegeRecord: one row of the source file
// ---------------------------------------------------------------------------

/// One institution as read from the source file. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CollegeRecord {
    pub name: String,
    pub application_volume: Option<u64>,
    pub admission_rate: Option<f64>,
    pub graduate_rate_4yr: Option<f64>,
    pub graduate_rate_6yr: Option<f64>,
    pub tuition_cost: Option<f64>,
    /// Pass-through cells, aligned with the table's passthrough slots.
    pub extra: Vec<Option<String>>,
}

impl CollegeRecord {
    /// Build a fully populated record with no pass-through cells.
    pub fn new(
        name: impl Into<String>,
        application_volume: u64,
        admission_rate: f64,
        graduate_rate_4yr: f64,
        graduate_rate_6yr: f64,
        tuition_cost: f64,
    ) -> Self {
        Self {
            name: name.into(),
            application_volume: Some(application_volume),
            admission_rate: Some(admission_rate),
            graduate_rate_4yr: Some(graduate_rate_4yr),
            graduate_rate_6yr: Some(graduate_rate_6yr),
            tuition_cost: Some(tuition_cost),
            extra: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Table: the loaded dataset
// ---------------------------------------------------------------------------

/// Records in source order plus the source column layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<ColumnSlot>,
    records: Vec<CollegeRecord>,
}

impl Table {
    pub fn new(columns: Vec<ColumnSlot>, records: Vec<CollegeRecord>) -> Self {
        Self { columns, records }
    }

    /// Table with the canonical six-column layout and no pass-through columns.
    pub fn from_records(records: Vec<CollegeRecord>) -> Self {
        let columns = Field::ALL.into_iter().map(ColumnSlot::Required).collect();
        Self { columns, records }
    }

    pub fn columns(&self) -> &[ColumnSlot] {
        &self.columns
    }

    pub fn records(&self) -> &[CollegeRecord] {
        &self.records
    }

    pub fn passthrough_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(|slot| match slot {
            ColumnSlot::Passthrough { name, .. } => Some(name.as_str()),
            ColumnSlot::Required(_) => None,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// DerivedRecord / DerivedTable: output of the feature deriver
// ---------------------------------------------------------------------------

/// A source record plus the four engineered features.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRecord {
    pub record: CollegeRecord,
    pub avg_graduation_rate: Option<f64>,
    pub graduation_rate_improvement: Option<f64>,
    pub selectivity_score: Option<f64>,
    pub cohort_size: Option<f64>,
}

impl DerivedRecord {
    pub fn name(&self) -> &str {
        &self.record.name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DerivedTable {
    columns: Vec<ColumnSlot>,
    records: Vec<DerivedRecord>,
}

impl DerivedTable {
    pub(crate) fn new(columns: Vec<ColumnSlot>, records: Vec<DerivedRecord>) -> Self {
        Self { columns, records }
    }

    /// Source column layout; derived columns follow it on output.
    pub fn source_columns(&self) -> &[ColumnSlot] {
        &self.columns
    }

    /// Every output column name in write order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(ColumnSlot::name)
            .chain(DERIVED_COLUMNS)
            .collect()
    }

    pub fn records(&self) -> &[DerivedRecord] {
        &self.records
    }

    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(DerivedRecord::name).collect()
    }

    /// Column of a numeric metric, nulls preserved.
    pub fn values(&self, metric: Metric) -> Vec<Option<f64>> {
        self.records.iter().map(|r| metric.value(r)).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Metric: numeric columns of a derived table
// ---------------------------------------------------------------------------

/// Numeric column of a derived table, addressable by charts and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    ApplicationVolume,
    AdmissionRate,
    #[serde(rename = "graduate_rate_4yr")]
    GraduateRate4yr,
    #[serde(rename = "graduate_rate_6yr")]
    GraduateRate6yr,
    TuitionCost,
    AvgGraduationRate,
    GraduationRateImprovement,
    SelectivityScore,
    CohortSize,
}

impl Metric {
    pub const ALL: [Metric; 9] = [
        Metric::ApplicationVolume,
        Metric::AdmissionRate,
        Metric::GraduateRate4yr,
        Metric::GraduateRate6yr,
        Metric::TuitionCost,
        Metric::AvgGraduationRate,
        Metric::GraduationRateImprovement,
        Metric::SelectivityScore,
        Metric::CohortSize,
    ];

    pub const ENGINEERED: [Metric; 4] = [
        Metric::AvgGraduationRate,
        Metric::GraduationRateImprovement,
        Metric::SelectivityScore,
        Metric::CohortSize,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            Metric::ApplicationVolume => APPLICATION_VOLUME,
            Metric::AdmissionRate => ADMISSION_RATE,
            Metric::GraduateRate4yr => GRADUATE_RATE_4YR,
            Metric::GraduateRate6yr => GRADUATE_RATE_6YR,
            Metric::TuitionCost => TUITION_COST,
            Metric::AvgGraduationRate => AVG_GRADUATION_RATE,
            Metric::GraduationRateImprovement => GRADUATION_RATE_IMPROVEMENT,
            Metric::SelectivityScore => SELECTIVITY_SCORE,
            Metric::CohortSize => COHORT_SIZE,
        }
    }

    /// Human readable axis label.
    pub fn label(self) -> &'static str {
        match self {
            Metric::ApplicationVolume => "Application Volume",
            Metric::AdmissionRate => "Admission Rate",
            Metric::GraduateRate4yr => "4-Year Graduation Rate",
            Metric::GraduateRate6yr => "6-Year Graduation Rate",
            Metric::TuitionCost => "Tuition Cost",
            Metric::AvgGraduationRate => "Average Graduation Rate",
            Metric::GraduationRateImprovement => "Graduation Rate Improvement",
            Metric::SelectivityScore => "Selectivity Score",
            Metric::CohortSize => "Cohort Size",
        }
    }

    pub fn value(self, row: &DerivedRecord) -> Option<f64> {
        let record = &row.record;
        match self {
            Metric::ApplicationVolume => record.application_volume.map(|v| v as f64),
            Metric::AdmissionRate => record.admission_rate,
            Metric::GraduateRate4yr => record.graduate_rate_4yr,
            Metric::GraduateRate6yr => record.graduate_rate_6yr,
            Metric::TuitionCost => record.tuition_cost,
            Metric::AvgGraduationRate => row.avg_graduation_rate,
            Metric::GraduationRateImprovement => row.graduation_rate_improvement,
            Metric::SelectivityScore => row.selectivity_score,
            Metric::CohortSize => row.cohort_size,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}
