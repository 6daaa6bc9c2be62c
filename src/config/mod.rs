//! Configuration loading, shorthand parsing, and option normalization.

mod loader;
mod types;
mod validation;

pub use loader::{load_config, ConfigError};
pub use types::*;
pub use validation::{
    normalize_options, HttpLaunch, HttpsLaunch, LaunchPlan, OptionsError, TlsFiles,
};
