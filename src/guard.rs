//! Process-wide failure guard.
//!
//! Panics on any thread are routed into the log instead of raw stderr.
//! Tasks that panic are contained by their `JoinHandle`; the supervisor
//! turns a panicked session cycle into an ordinary reconnect.

use std::panic::{self, PanicHookInfo};

use tracing::error;

/// Install a panic hook that logs the panic through `tracing`.
///
/// Unwinding continues as usual afterwards, so the panicking task ends and
/// its owner observes the failure.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_owned(), ToString::to_string);
        error!(%location, message = %panic_message(info), "uncaught panic");
    }));
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_owned()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
