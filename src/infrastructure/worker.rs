//! Joining the adapters' dedicated threads
//!
//! Capture, processing and encoding each run on a plain OS thread. Joining
//! one can wait on an audio callback or a final encode, so it never happens
//! on an async worker thread.

use std::thread::JoinHandle;

use tracing::{debug, warn};

/// Join `worker` on the blocking pool, waiting for it to finish
pub async fn join(worker: JoinHandle<()>, name: &'static str) -> Result<(), String> {
    match tokio::task::spawn_blocking(move || worker.join()).await {
        Ok(Ok(())) => {
            debug!(worker = name, "Worker thread finished");
            Ok(())
        }
        Ok(Err(_)) => {
            warn!(worker = name, "Worker thread panicked");
            Err(format!("{} thread panicked", name))
        }
        Err(e) => Err(format!("failed to join {} thread: {}", name, e)),
    }
}

/// Join `worker` without waiting for it.
///
/// Inside a runtime the join is handed to the blocking pool. Outside one
/// nothing async can be stalled, so it joins inline.
pub fn reap(worker: JoinHandle<()>, name: &'static str) {
    let finish = move || {
        if worker.join().is_err() {
            warn!(worker = name, "Worker thread panicked");
        } else {
            debug!(worker = name, "Worker thread finished");
        }
    };

    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn_blocking(finish);
        }
        Err(_) => finish(),
    }
}
