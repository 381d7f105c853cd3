// SPDX-License-Identifier: MIT
//
// Resize notifications as a queue.
//
// SIGWINCH is caught on a dedicated signal-hook thread, which only posts a
// token into a one-slot channel. The main loop drains that channel once per
// iteration and does the actual resize itself, so the canvas is never
// touched from signal context and a burst of signals during a window drag
// collapses into one resize.
//
// The token carries no size: the size is re-probed when the event is
// handled, which is the only size that matters by then.

use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::thread::JoinHandle;

use signal_hook::consts::signal::SIGWINCH;
use signal_hook::iterator::{Handle, Signals};
use tracing::{debug, trace};

use crate::error::{Error, Result};

// ─── ResizeNotifier ──────────────────────────────────────────────────────────

/// Sending side of a [`ResizeEvents`] queue.
#[derive(Debug, Clone)]
pub struct ResizeNotifier {
    tx: SyncSender<()>,
}

impl ResizeNotifier {
    /// Post a resize. Coalesces with one that is already pending.
    ///
    /// Returns `false` once the receiving side is gone.
    pub fn notify(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(mpsc::TrySendError::Full(())) => true,
            Err(mpsc::TrySendError::Disconnected(())) => false,
        }
    }
}

// ─── ResizeEvents ────────────────────────────────────────────────────────────

/// A coalescing queue of terminal resize notifications.
pub struct ResizeEvents {
    rx: Receiver<()>,
    listener: Option<SignalListener>,
}

impl ResizeEvents {
    /// A queue fed by hand, for tests and for hosts with their own signal
    /// handling.
    #[must_use]
    pub fn channel() -> (Self, ResizeNotifier) {
        let (tx, rx) = mpsc::sync_channel(1);
        (
            Self { rx, listener: None },
            ResizeNotifier { tx },
        )
    }

    /// A queue fed by SIGWINCH.
    ///
    /// # Errors
    ///
    /// [`Error::Signal`] if the handler cannot be registered.
    pub fn listen() -> Result<Self> {
        let (mut events, notifier) = Self::channel();
        events.listener = Some(SignalListener::spawn(notifier).map_err(Error::Signal)?);
        debug!("listening for SIGWINCH");
        Ok(events)
    }

    /// Whether a SIGWINCH listener feeds this queue.
    #[must_use]
    pub const fn is_listening(&self) -> bool {
        self.listener.is_some()
    }

    /// Consume a pending resize, if any. Never blocks.
    pub fn take(&self) -> bool {
        match self.rx.try_recv() {
            Ok(()) => {
                trace!("resize pending");
                true
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => false,
        }
    }
}

impl std::fmt::Debug for ResizeEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResizeEvents")
            .field("listening", &self.is_listening())
            .finish_non_exhaustive()
    }
}

// ─── SignalListener ──────────────────────────────────────────────────────────

struct SignalListener {
    handle: Handle,
    thread: Option<JoinHandle<()>>,
}

impl SignalListener {
    fn spawn(notifier: ResizeNotifier) -> std::io::Result<Self> {
        let mut signals = Signals::new([SIGWINCH]).map_err(std::io::Error::other)?;
        let handle = signals.handle();
        let thread = std::thread::Builder::new()
            .name("sigwinch".into())
            .spawn(move || {
                for _ in signals.forever() {
                    if !notifier.notify() {
                        break;
                    }
                }
            })?;
        Ok(Self {
            handle,
            thread: Some(thread),
        })
    }
}

impl Drop for SignalListener {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
