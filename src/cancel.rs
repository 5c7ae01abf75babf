//! Cooperative cancellation for the ingest loop
//!
//! The only place a run suspends is the blocking read in the line decoder.
//! A `CancelToken` is checked between lines and whenever a read is
//! interrupted. The binary wires SIGINT/SIGTERM to a token; the handlers are
//! installed without `SA_RESTART` so that a blocked `read(2)` returns `EINTR`
//! and the decoder gets a chance to observe the stop request.

use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared stop flag
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

static SIGNAL_TOKEN: OnceLock<CancelToken> = OnceLock::new();

extern "C" fn on_stop_signal(_signal: libc::c_int) {
    // Atomic store only: async-signal-safe.
    if let Some(token) = SIGNAL_TOKEN.get() {
        token.cancel();
    }
}

/// Install SIGINT and SIGTERM handlers that cancel the returned token.
///
/// Calling this more than once returns the same token.
pub fn install_signal_handlers() -> nix::Result<CancelToken> {
    let token = SIGNAL_TOKEN.get_or_init(CancelToken::new).clone();

    let action = SigAction::new(
        SigHandler::Handler(on_stop_signal),
        SaFlags::empty(),
        SigSet::empty(),
    );

    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only touches an already-initialized OnceLock and
        // an atomic flag.
        unsafe {
            sigaction(signal, &action)?;
        }
    }

    tracing::debug!("installed SIGINT/SIGTERM handlers");
    Ok(token)
}
