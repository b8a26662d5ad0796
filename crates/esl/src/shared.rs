//! A `Handle` shared across threads, for the one scenario §5 of the
//! concurrency model actually calls out: an async consumer polling
//! `race_event` from a thread other than the one driving `send_recv`.
//!
//! The original guards this with a recursive mutex, so re-entrant
//! access from the thread that already holds the lock is permitted;
//! a second thread blocks until the holder releases it. `listen`/
//! `listen_threaded`'s per-connection handles don't need this --
//! each one is a single-thread resource and should stay a plain
//! `Handle`.

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::handle::Handle;

#[derive(Clone)]
pub struct SharedHandle(Arc<ReentrantMutex<RefCell<Handle>>>);

impl SharedHandle {
    pub fn new(handle: Handle) -> Self {
        Self(Arc::new(ReentrantMutex::new(RefCell::new(handle))))
    }

    /// Runs `f` with access to the guarded handle. Re-entering `with`
    /// from the same thread (e.g. a callback invoked while already
    /// inside one) is fine; nesting two live `f` calls that both hold
    /// a borrow at once is a `RefCell` panic, same as misusing any
    /// other interior-mutability wrapper.
    pub fn with<R>(&self, f: impl FnOnce(&mut Handle) -> R) -> R {
        let guard = self.0.lock();
        let mut handle = guard.borrow_mut();
        f(&mut handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    fn accepted_handle() -> Handle {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"Content-Type: command/reply\nReply-Text: +OK\n\n").unwrap();
        });
        let stream = std::net::TcpStream::connect(addr).unwrap();
        let peer = stream.peer_addr().unwrap();
        let handle = Handle::attach_handle(stream, peer).unwrap();
        server.join().unwrap();
        handle
    }

    #[test]
    fn reentrant_access_from_the_same_thread_does_not_deadlock() {
        let shared = SharedHandle::new(accepted_handle());
        shared.with(|outer| {
            assert!(outer.is_connected());
            shared.with(|inner| assert!(inner.is_connected()));
        });
    }

    #[test]
    fn a_second_thread_blocks_until_the_first_releases() {
        let shared = SharedHandle::new(accepted_handle());
        let other = shared.clone();
        let joined = thread::spawn(move || other.with(|h| h.is_connected()));
        assert!(joined.join().unwrap());
    }
}
