//! Elapsed-time/RSS-delta wrapper shared by the demo binaries.
//!
//! Grounded on `original_source/benchmark.py`'s `measure_performance`
//! decorator: wraps a callable, reports wall-clock elapsed time and
//! process RSS delta around it. Rust has no decorator syntax, so this
//! is a plain higher-order function instead.

use std::time::Instant;

/// Current process RSS in megabytes, best-effort (reads
/// `/proc/self/status` on Linux; `0.0` elsewhere or on any read
/// failure — this is a diagnostic, not load-bearing).
fn rss_mb() -> f64 {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if let Some(rest) = line.strip_prefix("VmRSS:") {
                    if let Some(kb) = rest.trim().split_whitespace().next() {
                        if let Ok(kb) = kb.parse::<f64>() {
                            return kb / 1024.0;
                        }
                    }
                }
            }
        }
        0.0
    }
    #[cfg(not(target_os = "linux"))]
    {
        0.0
    }
}

/// Run `f`, logging elapsed time and RSS delta under `label`.
pub fn measure<F, R>(label: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let mem_before = rss_mb();
    let start = Instant::now();

    let result = f();

    let elapsed = start.elapsed();
    let mem_after = rss_mb();

    tracing::info!(
        label,
        elapsed_secs = elapsed.as_secs_f64(),
        mem_used_mb = mem_after - mem_before,
        "measured run"
    );

    result
}
