#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms,
    rust_2024_compatibility
)]

//! Shared config/CLI/bootstrap conventions (§6, §11) for every Meridian component binary, plus
//! the binaries themselves under `src/bin/`.

/// [`config::Config`]: the JSON-file-plus-environment-overrides config every binary loads.
pub mod config;

/// [`error::BootstrapError`] and its mapping onto §6's exit codes.
pub mod error;

/// `tracing`/`tracing-subscriber` initialisation shared by every binary.
pub mod logging;
