//! Logger initialization.
//!
//! Everything in the crate logs through the `log` facade; this only installs
//! the backend (`env_logger` natively, `console_log` in the browser).

use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "scene_ngin=debug,wgpu=warn"). When unset, `RUST_LOG` is honoured, and
/// failing that the level defaults to `info`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

static INIT: Once = Once::new();

/// Installs the global logger once; later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let mut builder = env_logger::Builder::new();
            if let Some(filter) = config.env_filter {
                builder.parse_filters(&filter);
            } else if let Ok(filter) = std::env::var("RUST_LOG") {
                builder.parse_filters(&filter);
            } else {
                builder.filter_level(log::LevelFilter::Info);
            }
            builder.write_style(config.write_style);
            if let Err(e) = builder.try_init() {
                println!("Warning: Could not initialize logger: {}", e);
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let level = config
                .env_filter
                .as_deref()
                .and_then(|f| f.parse::<log::Level>().ok())
                .unwrap_or(log::Level::Info);
            // fails only if another logger was installed first
            console_log::init_with_level(level).ok();
        }

        log::debug!("logging initialized");
    });
}
