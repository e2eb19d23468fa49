//! Ctrl+C handling and runtime teardown.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Longest the process waits at exit for blocking work left behind by a
/// timed-out cycle.
pub const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Global flag for handling Ctrl+C across the application
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Check if Ctrl+C has been received.
pub fn ctrlc_received() -> bool {
    CTRLC_RECEIVED.load(Ordering::SeqCst)
}

/// Set up the Ctrl+C handler.
///
/// This should be called once at program startup.
pub fn setup_ctrlc_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        CTRLC_RECEIVED.store(true, Ordering::SeqCst);
        eprintln!("\nReceived Ctrl+C, shutting down...");
    })
}

/// Run `future` to completion on a fresh multi-threaded runtime.
///
/// A stuck capture or classify call keeps its blocking-pool thread busy, and
/// dropping a runtime waits for those threads. Shutting down with a bound
/// instead lets the process exit after at most `grace`.
pub fn block_on_with_grace<F: Future>(future: F, grace: Duration) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let output = runtime.block_on(future);
    runtime.shutdown_timeout(grace);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_block_on_returns_output() {
        let value = block_on_with_grace(async { 40 + 2 }, Duration::from_millis(10)).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_leftover_blocking_job_does_not_hold_exit() {
        let started = Instant::now();
        block_on_with_grace(
            async {
                let _detached =
                    tokio::task::spawn_blocking(|| std::thread::sleep(Duration::from_secs(30)));
            },
            Duration::from_millis(50),
        )
        .unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
