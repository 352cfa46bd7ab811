//! Inspection and conversion support for SESAME equation-of-state tables.
//!
//! The analytical kernels in [`analysis`] are pure functions over a
//! [`domain::MaterialRecord`]; decoding is injected through
//! [`source::EosSource`] and file conversion through
//! [`conversion::FormatConverter`].

pub mod analysis;
pub mod common;
pub mod config;
pub mod conversion;
pub mod domain;
pub mod plot;
pub mod report;
pub mod source;
