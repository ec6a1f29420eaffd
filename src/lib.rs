#![doc(test(attr(deny(warnings))))]

//! Consign Core bundles the consignment ledger model, the analytics and
//! settlement engine, JSON persistence and a command-line front end.

pub mod cli;
pub mod errors;
pub mod utils;

pub use consign_config as config;
pub use consign_domain as domain;
pub use consign_engine as engine;
pub use consign_storage_json as storage;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Consign Core tracing initialized.");
    });
}
