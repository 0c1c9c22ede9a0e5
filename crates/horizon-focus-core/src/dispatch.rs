//! Marshaling requests onto the UI thread.
//!
//! Worker threads never touch focus state. They post fire-and-forget
//! messages through a [`RequestSender`]; the UI thread drains the matching
//! [`RequestReceiver`] at a convenient point in its loop. Messages are
//! delivered in arrival order and never coalesced.
//!
//! ```
//! use horizon_focus_core::dispatch::request_channel;
//!
//! let (tx, rx) = request_channel::<u32>();
//! let worker = std::thread::spawn(move || {
//!     tx.post(1);
//!     tx.post(2);
//! });
//! worker.join().unwrap();
//!
//! let drained: Vec<u32> = rx.drain().collect();
//! assert_eq!(drained, vec![1, 2]);
//! ```

use crossbeam_channel::{Receiver, Sender, TryIter};

use crate::thread_check::ThreadAffinity;
use crate::{focus_debug, focus_trace};

/// Create a connected sender/receiver pair.
///
/// The receiver is bound to the calling thread.
pub fn request_channel<T: Send>() -> (RequestSender<T>, RequestReceiver<T>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (
        RequestSender { tx },
        RequestReceiver {
            rx,
            affinity: ThreadAffinity::current(),
        },
    )
}

/// Cloneable, thread-safe posting side of a request channel.
#[derive(Debug)]
pub struct RequestSender<T> {
    tx: Sender<T>,
}

impl<T> Clone for RequestSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Send> RequestSender<T> {
    /// Post a message without waiting.
    ///
    /// Returns `false` if the receiving side is gone; the message is dropped.
    pub fn post(&self, message: T) -> bool {
        match self.tx.send(message) {
            Ok(()) => {
                focus_trace!(pending = self.tx.len(), "request posted");
                true
            }
            Err(_) => {
                focus_debug!("request dropped: receiver closed");
                false
            }
        }
    }
}

/// UI-thread side of a request channel.
#[derive(Debug)]
pub struct RequestReceiver<T> {
    rx: Receiver<T>,
    affinity: ThreadAffinity,
}

impl<T> RequestReceiver<T> {
    /// Take every message posted so far, oldest first.
    ///
    /// Messages posted while draining are picked up by the same iterator.
    pub fn drain(&self) -> TryIter<'_, T> {
        self.affinity.debug_assert_same_thread();
        self.rx.try_iter()
    }

    /// Take the oldest pending message, if any.
    pub fn try_next(&self) -> Option<T> {
        self.affinity.debug_assert_same_thread();
        self.rx.try_recv().ok()
    }

    /// Number of messages waiting.
    pub fn pending_count(&self) -> usize {
        self.rx.len()
    }
}

static_assertions::assert_impl_all!(RequestSender<u64>: Send, Sync, Clone);
