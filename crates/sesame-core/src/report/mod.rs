//! Human-readable material summary.
//!
//! The report depends only on the record contents, so identical records render
//! byte-identical text.

use crate::analysis::ion_densities;
use crate::common::constants::is_valid_grid_value;
use crate::common::format::{
    format_fixed, format_scientific, group_thousands, percentage,
};
use crate::domain::{EosType, MaterialRecord, TypeGrid, ValueGrid};

const RULE_WIDTH: usize = 60;

pub fn build_material_report(record: &MaterialRecord) -> String {
    let usable = record.usable_types();
    let mut lines = Vec::new();
    let rule = "=".repeat(RULE_WIDTH);

    lines.push(rule.clone());
    lines.push("SESAME EoS Data Analysis Report".to_string());
    lines.push(rule);

    push_material_properties(&mut lines, record);
    push_data_coverage(&mut lines, record, &usable);
    push_ion_density_analysis(&mut lines, record);
    push_data_quality(&mut lines, record, &usable);

    lines.join("\n")
}

fn push_material_properties(lines: &mut Vec<String>, record: &MaterialRecord) {
    lines.push("\nMaterial Properties:".to_string());
    lines.push(format!("  Material ID: {}", record.material_id()));
    lines.push(property_line("Average atomic mass", record.abar(), 3, " amu"));
    lines.push(property_line("Average atomic number", record.zmax(), 1, ""));
    lines.push(property_line("Standard density", record.rho0(), 3, " g/cm³"));
}

/// `N/A` stands in for unknown scalars and carries no unit.
fn property_line(label: &str, value: Option<f64>, precision: usize, unit: &str) -> String {
    match value {
        Some(value) => format!("  {label}: {}{unit}", format_fixed(value, precision)),
        None => format!("  {label}: N/A"),
    }
}

fn push_data_coverage(lines: &mut Vec<String>, record: &MaterialRecord, usable: &[EosType]) {
    lines.push("\nData Coverage:".to_string());
    let mut total_points = 0_u64;

    for (eos_type, table) in usable_tables(record, usable) {
        let densities = table.valid_densities();
        let temperatures = table.valid_temperatures();
        total_points += table.valid_point_count();

        let ion = valid_ion_densities(record, table);

        lines.push(format!("  {} EoS:", eos_type.label()));
        lines.push(format!(
            "    Grid: {} x {} points",
            densities.len(),
            temperatures.len()
        ));
        if let Some((min, max)) = value_range(&densities) {
            lines.push(format!(
                "    Mass density range: {} - {} g/cm³",
                format_scientific(min, 2),
                format_scientific(max, 2)
            ));
        }
        if let Some((min, max)) = value_range(&ion) {
            lines.push(format!(
                "    Ion density range: {} - {} atoms/cm³",
                format_scientific(min, 2),
                format_scientific(max, 2)
            ));
        }
        if let Some((min, max)) = value_range(&temperatures) {
            lines.push(format!(
                "    Temperature range: {} - {} eV",
                format_scientific(min, 2),
                format_scientific(max, 2)
            ));
        }
    }

    lines.push(format!(
        "\nTotal effective data points: {}",
        group_thousands(total_points)
    ));
}

fn push_ion_density_analysis(lines: &mut Vec<String>, record: &MaterialRecord) {
    lines.push("\nIon Density Analysis:".to_string());

    let Some(abar) = record.abar().filter(|abar| *abar > 0.0) else {
        lines.push("  Average atomic mass: Not available".to_string());
        lines.push("  Ion density calculation: Using default abar = 10.0 amu".to_string());
        return;
    };

    lines.push(format!("  Average atomic mass (abar): {abar:.3} amu"));
    lines.push(
        "  Ion density calculation: ρ_ion = ρ_mass / (abar × 1.66054×10⁻²⁴)".to_string(),
    );

    let Some(table) = record.primary_type().and_then(|eos_type| record.table(eos_type)) else {
        return;
    };
    let ratios: Vec<f64> = table
        .valid_densities()
        .iter()
        .zip(valid_ion_densities(record, table))
        .map(|(mass, ion)| ion / mass)
        .collect();
    if let Some((min, max)) = value_range(&ratios) {
        lines.push(format!(
            "  Ion-to-mass density ratio range: {} - {}",
            format_scientific(min, 2),
            format_scientific(max, 2)
        ));
    }
}

fn push_data_quality(lines: &mut Vec<String>, record: &MaterialRecord, usable: &[EosType]) {
    lines.push("\nData Quality Assessment:".to_string());

    for (eos_type, table) in usable_tables(record, usable) {
        if let Some(pressure) = table.pressure() {
            lines.push(negative_share_line(eos_type, "pressure", pressure));
        }
        if let Some(energy) = table.internal_energy() {
            lines.push(negative_share_line(eos_type, "internal energy", energy));
        }
    }
}

fn negative_share_line(eos_type: EosType, name: &str, grid: &ValueGrid) -> String {
    let negative = grid.count_negative();
    let total = grid.len();
    format!(
        "  {} {}: {}/{} negative ({:.1}%)",
        eos_type.label(),
        name,
        negative,
        total,
        percentage(negative, total)
    )
}

fn usable_tables<'a>(
    record: &'a MaterialRecord,
    usable: &'a [EosType],
) -> impl Iterator<Item = (EosType, &'a TypeGrid)> {
    usable
        .iter()
        .filter_map(|eos_type| record.table(*eos_type).map(|table| (*eos_type, table)))
}

/// Ion densities at the valid density indices of `table`.
fn valid_ion_densities(record: &MaterialRecord, table: &TypeGrid) -> Vec<f64> {
    let all = ion_densities(table.densities(), record.abar());
    table
        .densities()
        .iter()
        .zip(all)
        .filter(|(mass, _)| is_valid_grid_value(**mass))
        .map(|(_, ion)| ion)
        .collect()
}

fn value_range(values: &[f64]) -> Option<(f64, f64)> {
    let first = *values.first()?;
    Some(
        values
            .iter()
            .fold((first, first), |(min, max), value| {
                (min.min(*value), max.max(*value))
            }),
    )
}
