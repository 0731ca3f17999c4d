//! nanval Inspect: look at value words from the outside
//!
//! Library half of the `nanval` CLI. `report` turns words into structured
//! reports (text or JSON), `config` loads the optional TOML defaults.

pub mod config;
pub mod report;

pub use config::{InspectConfig, OutputFormat};
pub use report::{DecodeReport, EncodeReport, InspectError, LayoutRow, LayoutTable, parse_word, render};
