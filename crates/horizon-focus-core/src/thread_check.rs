//! UI-thread affinity checks.
//!
//! All focus state is mutated on a single UI thread per display connection.
//! Nothing in the focus subsystem locks; correctness relies on that
//! confinement, so mutating entry points assert it in debug builds.
//!
//! Work originating on other threads goes through
//! [`request_channel`](crate::dispatch::request_channel) instead.
//!
//! ```
//! use horizon_focus_core::thread_check::ThreadAffinity;
//!
//! let affinity = ThreadAffinity::current();
//! affinity.debug_assert_same_thread();
//! assert!(affinity.is_same_thread());
//! ```

use std::thread::ThreadId;

#[cold]
#[inline(never)]
fn panic_wrong_thread(msg: &str) -> ! {
    let current = std::thread::current();
    panic!(
        "{msg}\n  current thread: \"{}\" ({:?})\n  \
         post the request through a FocusHandle instead",
        current.name().unwrap_or("<unnamed>"),
        current.id(),
    )
}

/// Records the thread an owner was created on.
///
/// The focus manager holds one and checks it on every mutating call.
#[derive(Debug, Clone, Copy)]
pub struct ThreadAffinity {
    thread_id: ThreadId,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    /// Bind to the calling thread.
    #[inline]
    pub fn current() -> Self {
        Self {
            thread_id: std::thread::current().id(),
        }
    }

    /// The bound thread.
    #[inline]
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Whether the calling thread is the bound thread.
    #[inline]
    pub fn is_same_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    /// Panic if called from a different thread.
    pub fn assert_same_thread(&self) {
        if !self.is_same_thread() {
            panic_wrong_thread(&format!(
                "focus state bound to {:?} accessed from another thread",
                self.thread_id
            ));
        }
    }

    /// Debug-only variant of [`assert_same_thread`](Self::assert_same_thread).
    #[inline]
    pub fn debug_assert_same_thread(&self) {
        #[cfg(debug_assertions)]
        self.assert_same_thread();
    }
}
