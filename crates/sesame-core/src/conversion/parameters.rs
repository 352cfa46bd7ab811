use super::validation::{
    RawConversionParameters, ValidationErrors, parse_atomic_numbers, parse_finite,
    parse_fractions, present, validate_conversion_parameters,
};
use crate::domain::MaterialRecord;
use serde::Serialize;

/// Conversion parameters after validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionParameters {
    pub atomic_numbers: Vec<u32>,
    pub element_fractions: Vec<f64>,
    pub table_number: i64,
    pub min_temperature_filter: Option<f64>,
    pub output_name: Option<String>,
}

impl ConversionParameters {
    /// Validates `raw` and parses it. The table number defaults to the
    /// material ID when left blank.
    pub fn from_raw(
        raw: &RawConversionParameters,
        material_id: u32,
    ) -> Result<Self, ValidationErrors> {
        let errors = validate_conversion_parameters(raw);
        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        let invalid = |message: &str| ValidationErrors(vec![message.to_string()]);
        let atomic_numbers = present(&raw.atomic_numbers)
            .and_then(|value| parse_atomic_numbers(value).ok())
            .ok_or_else(|| invalid("Invalid atomic numbers format"))?;
        let element_fractions = present(&raw.element_fractions)
            .and_then(|value| parse_fractions(value).ok())
            .ok_or_else(|| invalid("Invalid element fractions format"))?;
        let table_number = match present(&raw.table_number) {
            Some(value) => value
                .parse::<i64>()
                .map_err(|_| invalid("Table number must be an integer"))?,
            None => i64::from(material_id),
        };

        Ok(Self {
            atomic_numbers,
            element_fractions,
            table_number,
            min_temperature_filter: present(&raw.min_temperature_filter).and_then(parse_finite),
            output_name: present(&raw.output_name).map(str::to_string),
        })
    }
}

/// Pre-filled parameters derived from the material's maximum atomic number.
pub fn suggested_parameters(record: &MaterialRecord) -> RawConversionParameters {
    let (atomic_numbers, element_fractions) = match record.zmax() {
        Some(zmax) if zmax < 2.0 => ("1", "1.0"),
        Some(zmax) if zmax < 4.0 => ("1,6", "0.5,0.5"),
        Some(zmax) if zmax < 10.0 => ("6", "1.0"),
        _ => ("1,6", "0.5,0.5"),
    };
    let material_id = record.material_id();

    RawConversionParameters {
        atomic_numbers: Some(atomic_numbers.to_string()),
        element_fractions: Some(element_fractions.to_string()),
        table_number: Some(material_id.to_string()),
        min_temperature_filter: None,
        output_name: Some(format!("material_{material_id}")),
    }
}
