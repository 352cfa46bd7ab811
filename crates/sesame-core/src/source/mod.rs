mod json;

pub use json::JsonEosSource;

use crate::domain::{EosType, MaterialRecord, SesameError, SourceResult};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Decoder capability that turns a file into a [`MaterialRecord`].
pub trait EosSource {
    fn load(&self, path: &Path) -> SourceResult<MaterialRecord>;
}

impl<T> EosSource for &T
where
    T: EosSource + ?Sized,
{
    fn load(&self, path: &Path) -> SourceResult<MaterialRecord> {
        (**self).load(path)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialInfo {
    pub material_id: u32,
    pub abar: Option<f64>,
    pub zmax: Option<f64>,
    pub rho0: Option<f64>,
    pub bulkmod: Option<f64>,
    pub available_types: Vec<EosType>,
}

impl MaterialInfo {
    pub fn from_record(record: &MaterialRecord) -> Self {
        Self {
            material_id: record.material_id(),
            abar: record.abar(),
            zmax: record.zmax(),
            rho0: record.rho0(),
            bulkmod: record.bulkmod(),
            available_types: record.usable_types(),
        }
    }
}

const DEFAULT_CONVERSION_ZMAX: f64 = 3.5;
const DEFAULT_CONVERSION_ABAR: f64 = 6.51;

/// Starting values offered to the user before a conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionDefaults {
    pub material_id: u32,
    pub zmax: f64,
    pub abar: f64,
    pub available_formats: Vec<&'static str>,
    pub suggested_znum: Vec<u32>,
    pub suggested_xfracs: Vec<f64>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
}

impl ConversionDefaults {
    pub fn from_record(record: &MaterialRecord) -> Self {
        let temperatures = record
            .usable_types()
            .first()
            .and_then(|eos_type| record.table(*eos_type))
            .map(|table| table.valid_temperatures())
            .unwrap_or_default();

        Self {
            material_id: record.material_id(),
            zmax: record.zmax().unwrap_or(DEFAULT_CONVERSION_ZMAX),
            abar: record.abar().unwrap_or(DEFAULT_CONVERSION_ABAR),
            available_formats: vec!["ionmix"],
            suggested_znum: vec![1, 6],
            suggested_xfracs: vec![0.5, 0.5],
            min_temperature: temperatures.iter().copied().reduce(f64::min),
            max_temperature: temperatures.iter().copied().reduce(f64::max),
        }
    }
}

/// Holds the currently loaded material. Loading replaces the record wholesale.
pub struct MaterialSession<S> {
    source: S,
    path: Option<PathBuf>,
    record: Option<MaterialRecord>,
}

impl<S: EosSource> MaterialSession<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            path: None,
            record: None,
        }
    }

    /// Loads `path`; on failure the previous record stays in place.
    pub fn load(&mut self, path: impl Into<PathBuf>) -> SourceResult<&MaterialRecord> {
        let path = path.into();
        let record = self.source.load(&path)?;
        tracing::info!(
            path = %path.display(),
            material_id = record.material_id(),
            usable_types = record.usable_types().len(),
            "material loaded"
        );
        self.path = Some(path);
        Ok(self.record.insert(record))
    }

    pub fn reload(&mut self) -> SourceResult<&MaterialRecord> {
        let path = self.path.clone().ok_or_else(|| {
            SesameError::input_validation("INPUT.SESSION_RELOAD", "No file has been loaded")
        })?;
        self.load(path)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self) -> SourceResult<&MaterialRecord> {
        self.record
            .as_ref()
            .ok_or_else(|| SesameError::input_validation("INPUT.SESSION_EMPTY", "No data loaded"))
    }

    pub fn material_info(&self) -> SourceResult<MaterialInfo> {
        self.record().map(MaterialInfo::from_record)
    }

    pub fn conversion_defaults(&self) -> SourceResult<ConversionDefaults> {
        self.record().map(ConversionDefaults::from_record)
    }
}
