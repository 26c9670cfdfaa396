//! gnmifmt Common Library
//!
//! This crate provides the pieces shared by the gnmifmt tools:
//!
//! - [`record`] - Captured gNMI notification model (`Record`, `Update`)
//! - [`value`] - Dynamically-typed values and their text rendering
//! - [`path`] - Prefix/path composition
//! - [`config`] - Configuration loading (JSON5 format) and logging settings
//! - [`error`] - Error types

pub mod config;
pub mod error;
pub mod path;
pub mod record;
pub mod value;

// Re-export commonly used types at the crate root
pub use config::{LogFormat, LoggingConfig, load_config, parse_config};
pub use error::{Error, Result};
pub use path::compose;
pub use record::{Record, Update};
pub use value::{Value, render_leaflist};

/// Tracing target for per-line input diagnostics.
///
/// [`init_tracing`] always enables `error` events on this target, whatever
/// the configured level or `RUST_LOG` says.
pub const DIAGNOSTICS_TARGET: &str = "gnmifmt::diagnostics";

/// Initialize tracing with the given configuration.
///
/// Events are written to standard error. `RUST_LOG` takes precedence over
/// the configured level.
///
/// # Example
///
/// ```ignore
/// use gnmifmt_common::{LoggingConfig, LogFormat, init_tracing};
///
/// let config = LoggingConfig {
///     level: "debug".to_string(),
///     format: LogFormat::Json,
/// };
/// init_tracing(&config)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = with_diagnostics(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level)),
    )?;

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}

/// Extend `filter` so that input diagnostics are never filtered out.
///
/// The directive names [`DIAGNOSTICS_TARGET`] exactly, so it is more
/// specific than any `gnmifmt=...` directive and leaves other targets alone.
pub fn with_diagnostics(
    filter: tracing_subscriber::EnvFilter,
) -> Result<tracing_subscriber::EnvFilter> {
    let directive = format!("{}=error", DIAGNOSTICS_TARGET)
        .parse()
        .map_err(|e| Error::Config(format!("Invalid diagnostics directive: {}", e)))?;
    Ok(filter.add_directive(directive))
}
