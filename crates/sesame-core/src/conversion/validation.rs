use crate::common::constants::FRACTION_SUM_TOLERANCE;
use crate::domain::SesameError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Conversion parameters exactly as the user typed them.
///
/// Blank strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConversionParameters {
    /// Comma-separated atomic numbers (`Znum`).
    pub atomic_numbers: Option<String>,
    /// Comma-separated element fractions (`Xfracs`).
    pub element_fractions: Option<String>,
    /// SESAME table number (`tabnum`).
    pub table_number: Option<String>,
    /// Minimum temperature filter in eV (`Tmin`).
    pub min_temperature_filter: Option<String>,
    /// Output file name without extension (`outname`).
    pub output_name: Option<String>,
}

impl RawConversionParameters {
    pub fn new(atomic_numbers: &str, element_fractions: &str) -> Self {
        Self {
            atomic_numbers: Some(atomic_numbers.to_string()),
            element_fractions: Some(element_fractions.to_string()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(pub Vec<String>);

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parameter validation failed: {}", self.0.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationErrors> for SesameError {
    fn from(errors: ValidationErrors) -> Self {
        SesameError::input_validation("INPUT.CONVERSION_PARAMETERS", errors.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ListIssue {
    Format,
    NonPositive,
}

pub(super) fn present(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub(super) fn parse_atomic_numbers(raw: &str) -> Result<Vec<u32>, ListIssue> {
    let parsed = raw
        .split(',')
        .map(|token| token.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ListIssue::Format)?;
    if parsed.iter().any(|value| *value <= 0) {
        return Err(ListIssue::NonPositive);
    }
    parsed
        .into_iter()
        .map(|value| u32::try_from(value).map_err(|_| ListIssue::Format))
        .collect()
}

fn parse_fraction_values(raw: &str) -> Option<Vec<f64>> {
    raw.split(',').map(parse_finite).collect()
}

pub(super) fn parse_fractions(raw: &str) -> Result<Vec<f64>, ListIssue> {
    let parsed = parse_fraction_values(raw).ok_or(ListIssue::Format)?;
    if parsed.iter().any(|value| *value <= 0.0) {
        return Err(ListIssue::NonPositive);
    }
    Ok(parsed)
}

pub(super) fn parse_finite(token: &str) -> Option<f64> {
    token
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Checks every rule independently and returns all violations in a fixed
/// order. An empty list means the parameters are usable.
pub fn validate_conversion_parameters(raw: &RawConversionParameters) -> Vec<String> {
    let mut errors = Vec::new();
    let atomic_numbers = present(&raw.atomic_numbers);
    let fractions = present(&raw.element_fractions);

    match atomic_numbers.map(parse_atomic_numbers) {
        None => errors.push("Atomic numbers (Znum) are required".to_string()),
        Some(Err(ListIssue::Format)) => errors.push("Invalid atomic numbers format".to_string()),
        Some(Err(ListIssue::NonPositive)) => {
            errors.push("All atomic numbers must be positive".to_string())
        }
        Some(Ok(_)) => {}
    }

    match fractions.map(parse_fractions) {
        None => errors.push("Element fractions (Xfracs) are required".to_string()),
        Some(Err(ListIssue::Format)) => errors.push("Invalid element fractions format".to_string()),
        Some(Err(ListIssue::NonPositive)) => {
            errors.push("All element fractions must be positive".to_string())
        }
        Some(Ok(_)) => {}
    }
    if let Some(values) = fractions.and_then(parse_fraction_values) {
        if (values.iter().sum::<f64>() - 1.0).abs() > FRACTION_SUM_TOLERANCE {
            errors.push("Element fractions should sum to 1.0".to_string());
        }
    }

    if let (Some(atomic_numbers), Some(fractions)) = (atomic_numbers, fractions) {
        if atomic_numbers.split(',').count() != fractions.split(',').count() {
            errors.push("Number of atomic numbers must match number of fractions".to_string());
        }
    }

    if let Some(table_number) = present(&raw.table_number) {
        if table_number.parse::<i64>().is_err() {
            errors.push("Table number must be an integer".to_string());
        }
    }

    if let Some(min_temperature) = present(&raw.min_temperature_filter) {
        match parse_finite(min_temperature) {
            None => errors.push("Minimum temperature must be a number".to_string()),
            Some(value) if value <= 0.0 => {
                errors.push("Minimum temperature must be positive".to_string())
            }
            Some(_) => {}
        }
    }

    errors
}
