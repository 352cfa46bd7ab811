pub mod ion_density;
pub mod threshold;

pub use ion_density::{effective_abar, ion_densities};
pub use threshold::{ThresholdScan, first_positive_indices, scan_min_positive_temperature};

use crate::domain::{
    DerivedQuantities, EosType, GridField, MaterialRecord, SesameError, ValueGrid,
};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// What a requested EoS type is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingData {
    Table,
    Field(GridField),
}

/// Recoverable indicator that a table or one of its fields is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IncompleteData {
    pub eos_type: EosType,
    pub missing: MissingData,
}

impl Display for IncompleteData {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.missing {
            MissingData::Table => write!(f, "No {} density/temperature data found", self.eos_type),
            MissingData::Field(field) => write!(f, "Incomplete {} {} data", self.eos_type, field),
        }
    }
}

impl std::error::Error for IncompleteData {}

impl From<IncompleteData> for SesameError {
    fn from(incomplete: IncompleteData) -> Self {
        SesameError::input_validation("INPUT.INCOMPLETE_DATA", incomplete.to_string())
    }
}

/// A field restricted to valid densities (rows) and temperatures (columns).
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredGrid {
    pub eos_type: EosType,
    pub field: GridField,
    pub densities: Vec<f64>,
    pub temperatures: Vec<f64>,
    pub values: ValueGrid,
}

pub fn filtered_grid(
    record: &MaterialRecord,
    eos_type: EosType,
    field: GridField,
) -> Result<FilteredGrid, IncompleteData> {
    let table = record.table(eos_type).ok_or(IncompleteData {
        eos_type,
        missing: MissingData::Table,
    })?;
    let values = table.field(field).ok_or(IncompleteData {
        eos_type,
        missing: MissingData::Field(field),
    })?;

    let row_indices = table.valid_density_indices();
    let col_indices = table.valid_temperature_indices();
    Ok(FilteredGrid {
        eos_type,
        field,
        densities: table.valid_densities(),
        temperatures: table.valid_temperatures(),
        values: values.select(&row_indices, &col_indices),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantityScan {
    pub eos_type: EosType,
    pub field: GridField,
    pub scan: Option<ThresholdScan>,
}

impl QuantityScan {
    pub fn temperature(&self) -> Option<f64> {
        self.scan.map(|scan| scan.temperature)
    }
}

pub fn scan_field(
    record: &MaterialRecord,
    eos_type: EosType,
    field: GridField,
) -> Result<QuantityScan, IncompleteData> {
    let filtered = filtered_grid(record, eos_type, field)?;
    let scan = scan_min_positive_temperature(&filtered.temperatures, &filtered.values);
    tracing::debug!(
        eos_type = %eos_type,
        field = %field,
        rows = filtered.values.rows(),
        cols = filtered.values.cols(),
        threshold = ?scan.map(|scan| scan.temperature),
        "threshold scan completed"
    );
    if let Some(scan) = scan.filter(ThresholdScan::is_clamp_dominated) {
        tracing::warn!(
            eos_type = %eos_type,
            field = %field,
            clamped_rows = scan.clamped_rows,
            "threshold pinned to the last temperature by rows that are never positive"
        );
    }
    Ok(QuantityScan {
        eos_type,
        field,
        scan,
    })
}

pub fn scan_pressure(
    record: &MaterialRecord,
    eos_type: EosType,
) -> Result<QuantityScan, IncompleteData> {
    scan_field(record, eos_type, GridField::Pressure)
}

pub fn scan_internal_energy(
    record: &MaterialRecord,
    eos_type: EosType,
) -> Result<QuantityScan, IncompleteData> {
    scan_field(record, eos_type, GridField::InternalEnergy)
}

/// Ion densities aligned with the table's full density axis plus both
/// thresholds. A missing pressure or energy field leaves its threshold unset.
pub fn derive_quantities(
    record: &MaterialRecord,
    eos_type: EosType,
) -> Result<DerivedQuantities, IncompleteData> {
    let table = record.table(eos_type).ok_or(IncompleteData {
        eos_type,
        missing: MissingData::Table,
    })?;

    let threshold = |field| {
        scan_field(record, eos_type, field)
            .ok()
            .and_then(|scan| scan.temperature())
    };

    Ok(DerivedQuantities {
        eos_type,
        ion_densities: ion_densities(table.densities(), record.abar()),
        min_positive_temperature_for_pressure: threshold(GridField::Pressure),
        min_positive_temperature_for_energy: threshold(GridField::InternalEnergy),
    })
}
