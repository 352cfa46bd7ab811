use super::parameters::ConversionParameters;
use crate::analysis::ion_densities;
use crate::domain::{EosType, GridField, MaterialRecord, SesameError, SesameResult, TypeGrid};
use serde::Serialize;
use std::collections::BTreeMap;

/// Component grids handed to the converter, keyed by their IONMIX names.
const COMPONENTS: [(&str, EosType, GridField); 4] = [
    ("pion", EosType::Ion, GridField::Pressure),
    ("pele", EosType::Ele, GridField::Pressure),
    ("eion", EosType::Ion, GridField::InternalEnergy),
    ("eele", EosType::Ele, GridField::InternalEnergy),
];

/// EoS tables prepared for an external format converter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EosTableExport {
    pub material_id: u32,
    pub table_number: i64,
    pub eos_type: EosType,
    #[serde(rename = "znum")]
    pub atomic_numbers: Vec<u32>,
    #[serde(rename = "xnum")]
    pub element_fractions: Vec<f64>,
    #[serde(rename = "idens")]
    pub ion_number_densities: Vec<f64>,
    #[serde(rename = "temps")]
    pub temperatures: Vec<f64>,
    /// Row-major per density, only components sharing the primary axes.
    #[serde(flatten)]
    pub components: BTreeMap<String, Vec<Vec<f64>>>,
}

struct ExportAxes {
    rows: Vec<usize>,
    cols: Vec<usize>,
    densities: Vec<f64>,
    temperatures: Vec<f64>,
}

impl ExportAxes {
    fn of(table: &TypeGrid, min_temperature: Option<f64>) -> Self {
        let rows = table.valid_density_indices();
        let cols: Vec<usize> = table
            .valid_temperature_indices()
            .into_iter()
            .filter(|index| {
                table
                    .temperatures()
                    .get(*index)
                    .is_some_and(|temperature| min_temperature.is_none_or(|min| *temperature >= min))
            })
            .collect();
        let densities = rows
            .iter()
            .filter_map(|index| table.densities().get(*index).copied())
            .collect();
        let temperatures = cols
            .iter()
            .filter_map(|index| table.temperatures().get(*index).copied())
            .collect();
        Self {
            rows,
            cols,
            densities,
            temperatures,
        }
    }

    fn matches(&self, other: &Self) -> bool {
        self.densities == other.densities && self.temperatures == other.temperatures
    }
}

/// Builds the converter input from the primary EoS type of `record`.
///
/// Temperatures below the minimum temperature filter are dropped from every
/// grid. Component tables whose axes differ from the primary table are left
/// out.
pub fn build_table_export(
    record: &MaterialRecord,
    parameters: &ConversionParameters,
) -> SesameResult<EosTableExport> {
    let eos_type = record.primary_type().ok_or_else(|| {
        SesameError::computation(
            "CONVERSION.NO_USABLE_TABLE",
            "No usable EoS table available for conversion",
        )
    })?;
    let primary = record.table(eos_type).ok_or_else(|| {
        SesameError::internal(
            "CONVERSION.PRIMARY_TABLE",
            format!("primary EoS type {eos_type} has no table"),
        )
    })?;

    let axes = ExportAxes::of(primary, parameters.min_temperature_filter);
    if axes.temperatures.is_empty() {
        return Err(SesameError::computation(
            "CONVERSION.EMPTY_TEMPERATURES",
            "No temperatures remain above the minimum temperature filter",
        ));
    }

    let mut components = BTreeMap::new();
    for (name, component_type, field) in COMPONENTS {
        let Some(table) = record.table(component_type) else {
            continue;
        };
        let Some(grid) = table.field(field) else {
            continue;
        };
        let component_axes = ExportAxes::of(table, parameters.min_temperature_filter);
        if !component_axes.matches(&axes) {
            tracing::debug!(
                component = name,
                eos_type = %component_type,
                "component axes differ from the primary table; skipped"
            );
            continue;
        }
        let selected = grid.select(&component_axes.rows, &component_axes.cols);
        components.insert(
            name.to_string(),
            selected.row_iter().map(<[f64]>::to_vec).collect(),
        );
    }

    Ok(EosTableExport {
        material_id: record.material_id(),
        table_number: parameters.table_number,
        eos_type,
        atomic_numbers: parameters.atomic_numbers.clone(),
        element_fractions: parameters.element_fractions.clone(),
        ion_number_densities: ion_densities(&axes.densities, record.abar()),
        temperatures: axes.temperatures,
        components,
    })
}

#[cfg(test)]
mod tests {
    use super::build_table_export;
    use crate::conversion::{ConversionParameters, RawConversionParameters};
    use crate::domain::{EosType, MaterialRecord, SesameErrorCategory, TypeGrid, ValueGrid};

    fn axis(count: usize) -> Vec<f64> {
        (1..=count).map(|value| value as f64).collect()
    }

    fn table(fill: f64) -> TypeGrid {
        let grid = ValueGrid::new(6, 6, vec![fill; 36]).expect("grid should build");
        TypeGrid::new(axis(6), axis(6), Some(grid.clone()), Some(grid))
            .expect("table should build")
    }

    fn parameters(min_temperature: Option<&str>) -> ConversionParameters {
        let raw = RawConversionParameters {
            min_temperature_filter: min_temperature.map(str::to_string),
            ..RawConversionParameters::new("1,6", "0.5,0.5")
        };
        ConversionParameters::from_raw(&raw, 3720).expect("parameters are valid")
    }

    #[test]
    fn export_filters_temperatures_and_collects_components() {
        let record = MaterialRecord::new(3720)
            .with_abar(Some(6.51))
            .with_table(EosType::Total, table(1.0))
            .with_table(EosType::Ion, table(2.0))
            .with_table(EosType::Ele, table(3.0));

        let export =
            build_table_export(&record, &parameters(Some("3.5"))).expect("export should build");
        assert_eq!(export.eos_type, EosType::Total);
        assert_eq!(export.table_number, 3720);
        assert_eq!(export.temperatures, vec![4.0, 5.0, 6.0]);
        assert_eq!(export.ion_number_densities.len(), 6);
        assert_eq!(
            export.components.keys().collect::<Vec<_>>(),
            vec!["eele", "eion", "pele", "pion"]
        );
        assert_eq!(export.components["pion"][0], vec![2.0, 2.0, 2.0]);
        assert_eq!(export.components["eele"].len(), 6);
    }

    #[test]
    fn mismatched_component_axes_are_skipped() {
        let ion_grid = ValueGrid::new(6, 6, vec![2.0; 36]).expect("grid should build");
        let shifted = TypeGrid::new(
            axis(6).into_iter().map(|value| value * 10.0).collect(),
            axis(6),
            Some(ion_grid),
            None,
        )
        .expect("table should build");
        let record = MaterialRecord::new(1)
            .with_table(EosType::Total, table(1.0))
            .with_table(EosType::Ion, shifted);

        let export = build_table_export(&record, &parameters(None)).expect("export should build");
        assert!(export.components.is_empty());
    }

    #[test]
    fn filter_above_every_temperature_is_a_computation_error() {
        let record = MaterialRecord::new(1).with_table(EosType::Total, table(1.0));
        let error = build_table_export(&record, &parameters(Some("100")))
            .expect_err("nothing remains");
        assert_eq!(error.category(), SesameErrorCategory::ComputationError);
        assert_eq!(error.placeholder(), "CONVERSION.EMPTY_TEMPERATURES");
    }

    #[test]
    fn material_without_usable_table_cannot_be_exported() {
        let error = build_table_export(&MaterialRecord::new(1), &parameters(None))
            .expect_err("no tables");
        assert_eq!(error.placeholder(), "CONVERSION.NO_USABLE_TABLE");
    }

    #[test]
    fn export_serializes_with_converter_keys() {
        let record = MaterialRecord::new(3720).with_table(EosType::Total, table(1.0));
        let export = build_table_export(&record, &parameters(None)).expect("export should build");
        let json = serde_json::to_value(&export).expect("export should serialize");
        assert_eq!(json["znum"], serde_json::json!([1, 6]));
        assert_eq!(json["xnum"], serde_json::json!([0.5, 0.5]));
        assert_eq!(json["eos_type"], "total");
        assert_eq!(json["temps"].as_array().map(Vec::len), Some(6));
    }
}
