//! Utility Module
//!
//! - [`PassTimer`]: CPU-side pass timing for profiling results
//! - [`init_logging`]: installs the `log` backend for the target

pub mod time;

pub use time::PassTimer;

/// Installs a `log` backend: `env_logger` natively (still honouring
/// `RUST_LOG`), the browser console on wasm.
///
/// Returns `false` when a logger was already installed.
pub fn init_logging(level: log::Level) -> bool {
    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(level).is_ok()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        env_logger::Builder::new()
            .filter_level(level.to_level_filter())
            .parse_default_env()
            .try_init()
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_logger() {
        let _ = init_logging(log::Level::Debug);
        assert!(!init_logging(log::Level::Info));
        log::debug!("logger installed");
    }
}
