//! Logging bootstrap for the binary.
//!
//! The library only talks to the `log` facade. The binary installs
//! `env_logger` once, at `warn` by default or `debug` with `-v`; `RUST_LOG`
//! overrides both.

use env_logger::{Builder, Env};
use once_cell::sync::OnceCell;

static INITIALIZED: OnceCell<()> = OnceCell::new();

pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "notes=debug"
    } else {
        "warn"
    }
}

/// Installs the global logger. Later calls are no-ops and never panic.
pub fn init(verbose: bool) {
    INITIALIZED.get_or_init(|| {
        let env = Env::default().default_filter_or(default_filter(verbose));
        let _ = Builder::from_env(env)
            .format_timestamp(None)
            .format_target(verbose)
            .try_init();
    });
}
