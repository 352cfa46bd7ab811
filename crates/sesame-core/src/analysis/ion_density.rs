use crate::common::constants::{ATOMIC_MASS_UNIT_G, FALLBACK_ABAR};

/// `abar` when it is a usable positive mass, the fallback mass otherwise.
pub fn effective_abar(abar: Option<f64>) -> f64 {
    match abar {
        Some(value) if value.is_finite() && value > 0.0 => value,
        _ => FALLBACK_ABAR,
    }
}

/// Converts mass densities (g/cm³) to ion number densities (atoms/cm³).
///
/// Placeholder and non-physical entries are converted like any other value;
/// callers filter them with the grid placeholder convention. If any result is
/// not finite the whole array degrades to zeros, so a zero here can mean
/// "not computable" rather than "physically zero".
pub fn ion_densities(mass_densities: &[f64], abar: Option<f64>) -> Vec<f64> {
    let divisor = effective_abar(abar) * ATOMIC_MASS_UNIT_G;
    let converted: Vec<f64> = mass_densities
        .iter()
        .map(|density| density / divisor)
        .collect();

    if let Some(index) = converted.iter().position(|value| !value.is_finite()) {
        tracing::warn!(
            index,
            mass_density = mass_densities[index],
            "ion density calculation failed; returning zeros"
        );
        return vec![0.0; mass_densities.len()];
    }

    converted
}
