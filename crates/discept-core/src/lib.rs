//! DiScEPT Core: error taxonomy and configuration.

pub mod config;
pub mod error;

pub use config::{DataPaths, DisceptConfig};
pub use error::{Error, Result};
