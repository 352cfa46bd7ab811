use super::EosSource;
use crate::domain::{
    EosType, MaterialRecord, SesameError, SourceResult, TypeGrid, ValueGrid,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Reads material dumps exported from an external SESAME decoder as JSON.
///
/// ```json
/// { "materials": [ { "material_id": 7592, "abar": 6.51,
///   "tables": { "total": { "dens": [..], "temps": [..], "pres": [[..]], "eint": [[..]] } } } ] }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEosSource;

#[derive(Debug, Deserialize)]
struct SourceDump {
    #[serde(default)]
    materials: Vec<MaterialDump>,
}

#[derive(Debug, Deserialize)]
struct MaterialDump {
    material_id: u32,
    #[serde(default)]
    abar: Option<f64>,
    #[serde(default)]
    zmax: Option<f64>,
    #[serde(default)]
    rho0: Option<f64>,
    #[serde(default)]
    bulkmod: Option<f64>,
    #[serde(default)]
    tables: BTreeMap<String, TableDump>,
}

#[derive(Debug, Deserialize)]
struct TableDump {
    dens: Option<Vec<f64>>,
    temps: Option<Vec<f64>>,
    #[serde(default)]
    pres: Option<Vec<Vec<f64>>>,
    #[serde(default)]
    eint: Option<Vec<Vec<f64>>>,
}

impl JsonEosSource {
    pub fn parse_str(&self, content: &str) -> SourceResult<MaterialRecord> {
        let dump: SourceDump = serde_json::from_str(content).map_err(|source| {
            SesameError::input_validation(
                "INPUT.SOURCE_FORMAT",
                format!("Error loading file: {}", source),
            )
        })?;

        let material = dump.materials.into_iter().next().ok_or_else(|| {
            SesameError::input_validation("INPUT.SOURCE_EMPTY", "No material data found in file")
        })?;

        material.into_record()
    }
}

impl EosSource for JsonEosSource {
    fn load(&self, path: &Path) -> SourceResult<MaterialRecord> {
        if !path.is_file() {
            return Err(SesameError::io_system(
                "IO.SOURCE_READ",
                format!("File not found: {}", path.display()),
            ));
        }
        let content = fs::read_to_string(path).map_err(|source| {
            SesameError::io_system(
                "IO.SOURCE_READ",
                format!("failed to read '{}': {}", path.display(), source),
            )
        })?;
        self.parse_str(&content)
    }
}

impl MaterialDump {
    fn into_record(self) -> SourceResult<MaterialRecord> {
        let mut record = MaterialRecord::new(self.material_id)
            .with_abar(self.abar)
            .with_zmax(self.zmax)
            .with_rho0(self.rho0)
            .with_bulkmod(self.bulkmod);

        for (name, table) in self.tables {
            let eos_type = EosType::from_name(&name).ok_or_else(|| {
                SesameError::input_validation(
                    "INPUT.SOURCE_TABLE",
                    format!("material {} has unknown EoS table '{}'", self.material_id, name),
                )
            })?;
            // Tables without both axes are not representable; they are dropped
            // and later reported as missing.
            let (Some(densities), Some(temperatures)) = (table.dens, table.temps) else {
                tracing::debug!(eos_type = %eos_type, "skipping table without density/temperature axes");
                continue;
            };
            let pressure = table.pres.map(ValueGrid::from_rows).transpose()?;
            let energy = table.eint.map(ValueGrid::from_rows).transpose()?;
            let grid = TypeGrid::new(densities, temperatures, pressure, energy).map_err(|error| {
                SesameError::input_validation(
                    "INPUT.SOURCE_TABLE",
                    format!("{} table: {}", eos_type, error.message()),
                )
            })?;
            record = record.with_table(eos_type, grid);
        }

        Ok(record)
    }
}
