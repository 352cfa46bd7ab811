pub mod errors;

pub use errors::{SesameError, SesameErrorCategory, SesameResult, SourceResult};

use crate::common::constants::{MIN_USABLE_AXIS_POINTS, is_valid_grid_value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// EoS table variants carried by a SESAME material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EosType {
    Total,
    Ele,
    Ion,
    Ioncc,
    Cc,
}

impl EosType {
    pub const ALL: [EosType; 5] = [Self::Total, Self::Ele, Self::Ion, Self::Ioncc, Self::Cc];

    /// Order in which usable tables are listed; the first entry is the
    /// fallback when `total` is not usable.
    pub const USABLE_SCAN_ORDER: [EosType; 5] =
        [Self::Ioncc, Self::Ele, Self::Ion, Self::Total, Self::Cc];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Total => "total",
            Self::Ele => "ele",
            Self::Ion => "ion",
            Self::Ioncc => "ioncc",
            Self::Cc => "cc",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Total => "TOTAL",
            Self::Ele => "ELE",
            Self::Ion => "ION",
            Self::Ioncc => "IONCC",
            Self::Cc => "CC",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(normalized))
    }
}

impl Display for EosType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for EosType {
    type Err = SesameError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_name(value).ok_or_else(|| {
            SesameError::input_validation(
                "INPUT.EOS_TYPE",
                format!(
                    "unknown EoS type '{}'; expected one of total, ele, ion, ioncc, cc",
                    value
                ),
            )
        })
    }
}

/// 2-D quantity tabulated against (density, temperature).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridField {
    Pressure,
    InternalEnergy,
}

impl GridField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pressure => "pressure",
            Self::InternalEnergy => "internal energy",
        }
    }
}

impl Display for GridField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

/// Row-major grid: rows follow densities, columns follow temperatures.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueGrid {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl ValueGrid {
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> SesameResult<Self> {
        if rows.checked_mul(cols) != Some(values.len()) {
            return Err(SesameError::input_validation(
                "INPUT.GRID_SHAPE",
                format!(
                    "grid of shape {}x{} requires {} values, got {}",
                    rows,
                    cols,
                    rows.saturating_mul(cols),
                    values.len()
                ),
            ));
        }
        Ok(Self { rows, cols, values })
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> SesameResult<Self> {
        let row_count = rows.len();
        let col_count = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(row_count * col_count);
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != col_count {
                return Err(SesameError::input_validation(
                    "INPUT.GRID_SHAPE",
                    format!(
                        "grid row {} has {} values, expected {}",
                        index,
                        row.len(),
                        col_count
                    ),
                ));
            }
            values.extend(row);
        }
        Self::new(row_count, col_count, values)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        (row < self.rows && col < self.cols).then(|| self.values[row * self.cols + col])
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.values[start..start + self.cols]
    }

    pub fn row_iter(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).map(|row| self.row(row))
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Sub-grid made of the given row and column indices, in the order given.
    pub fn select(&self, row_indices: &[usize], col_indices: &[usize]) -> Self {
        let mut values = Vec::with_capacity(row_indices.len() * col_indices.len());
        for &row in row_indices {
            let source = self.row(row);
            values.extend(col_indices.iter().map(|&col| source[col]));
        }
        Self {
            rows: row_indices.len(),
            cols: col_indices.len(),
            values,
        }
    }

    pub fn map(&self, transform: impl Fn(f64) -> f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            values: self.values.iter().copied().map(transform).collect(),
        }
    }

    pub fn count_negative(&self) -> usize {
        self.values.iter().filter(|value| **value < 0.0).count()
    }
}

/// Tabulated data for one EoS type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeGrid {
    densities: Vec<f64>,
    temperatures: Vec<f64>,
    pressure: Option<ValueGrid>,
    internal_energy: Option<ValueGrid>,
}

impl TypeGrid {
    pub fn new(
        densities: Vec<f64>,
        temperatures: Vec<f64>,
        pressure: Option<ValueGrid>,
        internal_energy: Option<ValueGrid>,
    ) -> SesameResult<Self> {
        for (field, grid) in [
            (GridField::Pressure, pressure.as_ref()),
            (GridField::InternalEnergy, internal_energy.as_ref()),
        ] {
            if let Some(grid) = grid {
                if grid.rows() != densities.len() || grid.cols() != temperatures.len() {
                    return Err(SesameError::input_validation(
                        "INPUT.GRID_SHAPE",
                        format!(
                            "{} grid is {}x{} but axes are {} densities x {} temperatures",
                            field,
                            grid.rows(),
                            grid.cols(),
                            densities.len(),
                            temperatures.len()
                        ),
                    ));
                }
            }
        }

        Ok(Self {
            densities,
            temperatures,
            pressure,
            internal_energy,
        })
    }

    pub fn densities(&self) -> &[f64] {
        &self.densities
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn pressure(&self) -> Option<&ValueGrid> {
        self.pressure.as_ref()
    }

    pub fn internal_energy(&self) -> Option<&ValueGrid> {
        self.internal_energy.as_ref()
    }

    pub fn field(&self, field: GridField) -> Option<&ValueGrid> {
        match field {
            GridField::Pressure => self.pressure(),
            GridField::InternalEnergy => self.internal_energy(),
        }
    }

    pub fn valid_density_indices(&self) -> Vec<usize> {
        valid_indices(&self.densities)
    }

    pub fn valid_temperature_indices(&self) -> Vec<usize> {
        valid_indices(&self.temperatures)
    }

    pub fn valid_densities(&self) -> Vec<f64> {
        valid_values(&self.densities)
    }

    pub fn valid_temperatures(&self) -> Vec<f64> {
        valid_values(&self.temperatures)
    }

    pub fn valid_point_count(&self) -> u64 {
        self.valid_densities().len() as u64 * self.valid_temperatures().len() as u64
    }

    pub fn is_usable(&self) -> bool {
        self.valid_densities().len() > MIN_USABLE_AXIS_POINTS
            && self.valid_temperatures().len() > MIN_USABLE_AXIS_POINTS
    }
}

fn valid_indices(axis: &[f64]) -> Vec<usize> {
    axis.iter()
        .enumerate()
        .filter(|(_, value)| is_valid_grid_value(**value))
        .map(|(index, _)| index)
        .collect()
}

fn valid_values(axis: &[f64]) -> Vec<f64> {
    axis.iter()
        .copied()
        .filter(|value| is_valid_grid_value(*value))
        .collect()
}

/// One decoded material. Built once per load and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRecord {
    material_id: u32,
    abar: Option<f64>,
    zmax: Option<f64>,
    rho0: Option<f64>,
    bulkmod: Option<f64>,
    tables: BTreeMap<EosType, TypeGrid>,
}

impl MaterialRecord {
    pub fn new(material_id: u32) -> Self {
        Self {
            material_id,
            abar: None,
            zmax: None,
            rho0: None,
            bulkmod: None,
            tables: BTreeMap::new(),
        }
    }

    pub fn with_abar(mut self, abar: Option<f64>) -> Self {
        self.abar = abar;
        self
    }

    pub fn with_zmax(mut self, zmax: Option<f64>) -> Self {
        self.zmax = zmax;
        self
    }

    pub fn with_rho0(mut self, rho0: Option<f64>) -> Self {
        self.rho0 = rho0;
        self
    }

    pub fn with_bulkmod(mut self, bulkmod: Option<f64>) -> Self {
        self.bulkmod = bulkmod;
        self
    }

    pub fn with_table(mut self, eos_type: EosType, grid: TypeGrid) -> Self {
        self.tables.insert(eos_type, grid);
        self
    }

    pub fn material_id(&self) -> u32 {
        self.material_id
    }

    pub fn abar(&self) -> Option<f64> {
        self.abar
    }

    pub fn zmax(&self) -> Option<f64> {
        self.zmax
    }

    pub fn rho0(&self) -> Option<f64> {
        self.rho0
    }

    pub fn bulkmod(&self) -> Option<f64> {
        self.bulkmod
    }

    pub fn table(&self, eos_type: EosType) -> Option<&TypeGrid> {
        self.tables.get(&eos_type)
    }

    pub fn tables(&self) -> impl Iterator<Item = (EosType, &TypeGrid)> {
        self.tables.iter().map(|(eos_type, grid)| (*eos_type, grid))
    }

    pub fn usable_types(&self) -> Vec<EosType> {
        EosType::USABLE_SCAN_ORDER
            .into_iter()
            .filter(|eos_type| self.table(*eos_type).is_some_and(TypeGrid::is_usable))
            .collect()
    }

    /// `total` when usable, otherwise the first usable type.
    pub fn primary_type(&self) -> Option<EosType> {
        let usable = self.usable_types();
        if usable.contains(&EosType::Total) {
            Some(EosType::Total)
        } else {
            usable.first().copied()
        }
    }

    /// The requested type if usable, otherwise the first usable type.
    pub fn resolve_type(&self, requested: EosType) -> Option<EosType> {
        let usable = self.usable_types();
        if usable.contains(&requested) {
            Some(requested)
        } else {
            usable.first().copied()
        }
    }
}

/// Quantities derived from one EoS type. Recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedQuantities {
    pub eos_type: EosType,
    pub ion_densities: Vec<f64>,
    pub min_positive_temperature_for_pressure: Option<f64>,
    pub min_positive_temperature_for_energy: Option<f64>,
}
