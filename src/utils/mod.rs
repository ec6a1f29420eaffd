pub mod build_info;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Default directives for the workspace crates, applied on top of `RUST_LOG`.
pub const DEFAULT_LOG_DIRECTIVES: &[&str] = &[
    "consign_core=info",
    "consign_engine=info",
    "consign_storage_json=info",
];

/// Initializes the global tracing subscriber, writing to stderr so report
/// output on stdout stays machine-readable.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        for raw in DEFAULT_LOG_DIRECTIVES {
            if let Ok(directive) = raw.parse() {
                filter = filter.add_directive(directive);
            }
        }

        // A subscriber may already be installed by an embedding application.
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
