//! Payloads handed to a rendering surface. No drawing happens here.

use crate::analysis::{IncompleteData, MissingData, filtered_grid, ion_densities};
use crate::analysis::scan_min_positive_temperature;
use crate::common::constants::{CGS_TO_GIGA, is_valid_grid_value};
use crate::config::PressureUnit;
use crate::domain::{EosType, GridField, MaterialRecord};
use serde::Serialize;

/// Density and temperature axes of one table, with the ion density axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridPlotData {
    pub eos_type: EosType,
    pub density_indices: Vec<usize>,
    pub densities: Vec<f64>,
    pub ion_densities: Vec<f64>,
    pub total_densities: usize,
    pub temperature_indices: Vec<usize>,
    pub temperatures: Vec<f64>,
    pub total_temperatures: usize,
}

pub fn grid_plot_data(
    record: &MaterialRecord,
    eos_type: EosType,
) -> Result<GridPlotData, IncompleteData> {
    let table = record.table(eos_type).ok_or(IncompleteData {
        eos_type,
        missing: MissingData::Table,
    })?;

    let all_ion = ion_densities(table.densities(), record.abar());
    let density_indices = table.valid_density_indices();
    let ion = density_indices.iter().map(|index| all_ion[*index]).collect();
    let temperature_indices = table.valid_temperature_indices();

    Ok(GridPlotData {
        eos_type,
        densities: table.valid_densities(),
        ion_densities: ion,
        density_indices,
        total_densities: table.densities().len(),
        temperatures: table.valid_temperatures(),
        temperature_indices,
        total_temperatures: table.temperatures().len(),
    })
}

/// Filtered field in display units (pressure GPa, energy MJ/kg), row-major by
/// density, with the uniform-positivity threshold marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionPlotData {
    pub eos_type: EosType,
    pub field: GridField,
    pub unit: &'static str,
    pub densities: Vec<f64>,
    pub temperatures: Vec<f64>,
    pub values: Vec<Vec<f64>>,
    pub has_negative: bool,
    pub threshold_temperature: Option<f64>,
}

impl DistributionPlotData {
    /// Value at the grid point nearest to (`density`, `temperature`).
    pub fn nearest_value(&self, density: f64, temperature: f64) -> Option<CursorReading> {
        let row = nearest_index(&self.densities, density)?;
        let col = nearest_index(&self.temperatures, temperature)?;
        let value = *self.values.get(row)?.get(col)?;
        Some(CursorReading {
            density: self.densities[row],
            temperature: self.temperatures[col],
            value,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CursorReading {
    pub density: f64,
    pub temperature: f64,
    pub value: f64,
}

pub fn distribution_plot_data(
    record: &MaterialRecord,
    eos_type: EosType,
    field: GridField,
    pressure_unit: PressureUnit,
) -> Result<DistributionPlotData, IncompleteData> {
    let filtered = filtered_grid(record, eos_type, field)?;
    let threshold = scan_min_positive_temperature(&filtered.temperatures, &filtered.values);

    let (scale, unit) = match field {
        GridField::Pressure => (pressure_unit.to_gigapascal_factor(), "GPa"),
        GridField::InternalEnergy => (CGS_TO_GIGA, "MJ/kg"),
    };
    let scaled = filtered.values.map(|value| value * scale);

    Ok(DistributionPlotData {
        eos_type,
        field,
        unit,
        has_negative: scaled.count_negative() > 0,
        values: scaled.row_iter().map(<[f64]>::to_vec).collect(),
        densities: filtered.densities,
        temperatures: filtered.temperatures,
        threshold_temperature: threshold.map(|scan| scan.temperature),
    })
}

fn nearest_index(axis: &[f64], target: f64) -> Option<usize> {
    axis.iter()
        .enumerate()
        .filter(|(_, value)| is_valid_grid_value(**value))
        .min_by(|(_, left), (_, right)| {
            (*left - target)
                .abs()
                .total_cmp(&(*right - target).abs())
        })
        .map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::{distribution_plot_data, grid_plot_data};
    use crate::analysis::MissingData;
    use crate::config::PressureUnit;
    use crate::domain::{EosType, GridField, MaterialRecord, TypeGrid, ValueGrid};

    fn record() -> MaterialRecord {
        let pressure = ValueGrid::from_rows(vec![
            vec![0.0, 0.0, 0.0],
            vec![0.0, -5.0e10, 3.0e10],
            vec![0.0, 1.0e10, 2.0e10],
        ])
        .expect("pressure grid");
        let energy = ValueGrid::from_rows(vec![
            vec![0.0, 0.0, 0.0],
            vec![0.0, 2.0e10, 4.0e10],
            vec![0.0, 1.0e10, 3.0e10],
        ])
        .expect("energy grid");
        let table = TypeGrid::new(
            vec![1.0e-12, 1.0, 2.0],
            vec![1.0e-12, 0.1, 1.0],
            Some(pressure),
            Some(energy),
        )
        .expect("table");
        MaterialRecord::new(7592)
            .with_abar(Some(2.0))
            .with_table(EosType::Total, table)
    }

    #[test]
    fn grid_data_keeps_original_indices_of_valid_points() {
        let data = grid_plot_data(&record(), EosType::Total).expect("grid data");
        assert_eq!(data.density_indices, vec![1, 2]);
        assert_eq!(data.densities, vec![1.0, 2.0]);
        assert_eq!(data.ion_densities.len(), 2);
        assert_eq!(data.total_densities, 3);
        assert_eq!(data.temperature_indices, vec![1, 2]);

        let missing = grid_plot_data(&record(), EosType::Cc).expect_err("no cc table");
        assert_eq!(missing.missing, MissingData::Table);
    }

    #[test]
    fn cgs_pressure_is_scaled_to_gigapascal() {
        let data = distribution_plot_data(
            &record(),
            EosType::Total,
            GridField::Pressure,
            PressureUnit::Cgs,
        )
        .expect("pressure data");
        assert_eq!(data.unit, "GPa");
        let expected = [[-5.0, 3.0], [1.0, 2.0]];
        for (row, expected_row) in data.values.iter().zip(expected) {
            for (value, expected_value) in row.iter().zip(expected_row) {
                assert_close(*value, expected_value);
            }
        }
        assert!(data.has_negative);
        assert_eq!(data.threshold_temperature, Some(1.0));
    }

    #[test]
    fn gigapascal_pressure_is_passed_through() {
        let data = distribution_plot_data(
            &record(),
            EosType::Total,
            GridField::Pressure,
            PressureUnit::Gigapascal,
        )
        .expect("pressure data");
        assert_eq!(data.values[0], vec![-5.0e10, 3.0e10]);
    }

    #[test]
    fn energy_is_reported_in_megajoule_per_kilogram() {
        let data = distribution_plot_data(
            &record(),
            EosType::Total,
            GridField::InternalEnergy,
            PressureUnit::Gigapascal,
        )
        .expect("energy data");
        assert_eq!(data.unit, "MJ/kg");
        assert!(!data.has_negative);
        assert_eq!(data.threshold_temperature, Some(0.1));

        let reading = data.nearest_value(1.9, 0.8).expect("cursor reading");
        assert_eq!(reading.density, 2.0);
        assert_eq!(reading.temperature, 1.0);
        assert_close(reading.value, 3.0);
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1.0e-12 * expected.abs().max(1.0),
            "expected {expected}, got {actual}"
        );
    }
}
