//! Readable text from gNMI subscribe captures
//!
//! Converts NDJSON captures of gNMI subscribe notifications into one
//! `[timestamp] path = value` line per value.

pub mod config;
pub mod converter;
pub mod error;
pub mod timestamp;

pub use config::{FormatterConfig, OutputSettings, TimeZoneMode};
pub use converter::{Converter, Summary, format_record};
pub use error::ConvertError;
pub use timestamp::format_timestamp;
