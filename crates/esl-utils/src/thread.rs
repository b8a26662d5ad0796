use std::sync::atomic::{AtomicUsize, Ordering};

/// Process-wide default stack size for detached worker threads, in bytes.
///
/// `0` keeps the platform default. Writes are relaxed-ordered (advisory,
/// not synchronised against in-flight thread spawns) and read once at
/// thread-creation time.
static DEFAULT_STACK_SIZE: AtomicUsize = AtomicUsize::new(0);

/// Overrides the stack size used by [`spawn_detached`] for threads created
/// after this call returns.
pub fn set_default_stack_size(bytes: usize) {
    DEFAULT_STACK_SIZE.store(bytes, Ordering::Relaxed);
}

pub fn default_stack_size() -> usize {
    DEFAULT_STACK_SIZE.load(Ordering::Relaxed)
}

/// Spawns a detached OS thread, honouring the process-wide stack size
/// override if one has been set.
pub fn spawn_detached<F>(name: &str, f: F)
where
    F: FnOnce() + Send + 'static,
{
    let mut builder = std::thread::Builder::new().name(name.to_owned());
    let stack_size = default_stack_size();
    if stack_size > 0 {
        builder = builder.stack_size(stack_size);
    }
    match builder.spawn(f) {
        Ok(handle) => drop(handle),
        Err(err) => tracing::error!(%err, "failed to spawn detached thread"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stack_size_round_trips() {
        set_default_stack_size(1 << 20);
        assert_eq!(default_stack_size(), 1 << 20);
        set_default_stack_size(0);
    }
}
