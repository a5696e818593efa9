//! Public SDK surface for Friday.
//!
//! This crate re-exports the core building blocks and provides a small
//! initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use friday_rs_config as config;
pub use friday_rs_core as core;
/// Re-export for convenience.
pub use friday_rs_memory as memory;
/// Re-export for convenience.
pub use friday_rs_protocol as protocol;

pub use friday_rs_config::FridayConfig;
pub use friday_rs_core::{ConversationSession, ReplyKind, SessionBuilder, TurnOutcome};

/// Initialize `env_logger` from `RUST_LOG`. Safe to call more than once.
///
/// Binaries are expected to call this early in startup so that log output
/// from every crate is wired up.
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}
