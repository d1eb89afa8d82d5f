//! Best-effort real-time scheduling elevation for the audio thread (§5,
//! §9 "Global RT priority / mlock").
//!
//! The host's audio callback runs on whatever thread the platform audio API
//! drives it from; this module is meant to be called once, from inside the
//! first period callback, to ask the kernel for `SCHED_FIFO` at priority 90
//! and to lock the process's pages into memory so the RT thread never pages
//! fault on its own stack or the engine's pre-sized buffers. Both requests
//! require `CAP_SYS_NICE`/`CAP_IPC_LOCK` or root on most distributions;
//! neither failure is fatal — per §9, an unprivileged build logs and
//! continues at the default scheduling class rather than refusing to run.

use std::sync::atomic::{AtomicBool, Ordering};

/// The priority the scheduling model targets (§5: "priority ≈ 90").
const SCHED_FIFO_PRIORITY: i32 = 90;

static ATTEMPTED: AtomicBool = AtomicBool::new(false);

/// Outcome of a single elevation attempt, for logging/diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationResult {
    /// `SCHED_FIFO` and `mlockall` both succeeded.
    Full,
    /// `SCHED_FIFO` succeeded but `mlockall` did not (or vice versa).
    Partial,
    /// Neither succeeded; running at default scheduling with pageable memory.
    None,
    /// Not attempted because this isn't Linux, or already attempted once.
    Skipped,
}

/// Attempts to elevate the calling thread to `SCHED_FIFO` priority 90 and
/// lock the process's memory. Idempotent: only the first call per process
/// does anything; later calls return [`ElevationResult::Skipped`]. Intended
/// to be called once from inside the real-time audio callback itself (the
/// thread the platform audio backend drives it from), not from the thread
/// that merely constructs the stream.
pub fn elevate_current_thread() -> ElevationResult {
    if ATTEMPTED.swap(true, Ordering::SeqCst) {
        return ElevationResult::Skipped;
    }
    platform::elevate()
}

#[cfg(target_os = "linux")]
mod platform {
    use super::{ElevationResult, SCHED_FIFO_PRIORITY};

    #[allow(unsafe_code)]
    pub(super) fn elevate() -> ElevationResult {
        let sched_ok = set_sched_fifo();
        let lock_ok = lock_memory();
        match (sched_ok, lock_ok) {
            (true, true) => ElevationResult::Full,
            (false, false) => ElevationResult::None,
            _ => ElevationResult::Partial,
        }
    }

    #[allow(unsafe_code)]
    fn set_sched_fifo() -> bool {
        let param = libc::sched_param { sched_priority: SCHED_FIFO_PRIORITY };
        // SAFETY: `sched_setscheduler(0, ..)` targets the calling thread
        // (pid 0 means "self" to this syscall) and `param` is a valid,
        // fully-initialised `sched_param` living on this stack frame for
        // the duration of the call.
        let result = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
        if result == 0 {
            tracing::info!(priority = SCHED_FIFO_PRIORITY, "audio thread elevated to SCHED_FIFO");
            true
        } else {
            tracing::debug!("SCHED_FIFO elevation failed (needs CAP_SYS_NICE or root); continuing at default priority");
            false
        }
    }

    #[allow(unsafe_code)]
    fn lock_memory() -> bool {
        // SAFETY: `mlockall` takes no pointers; the flags are plain bitmasks.
        let result = unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) };
        if result == 0 {
            tracing::info!("process memory locked (mlockall)");
            true
        } else {
            tracing::debug!("mlockall failed (needs CAP_IPC_LOCK or root); continuing with pageable memory");
            false
        }
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    use super::ElevationResult;

    pub(super) fn elevate() -> ElevationResult {
        tracing::debug!("real-time scheduling elevation is only implemented on Linux");
        ElevationResult::Skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_call_in_process_is_skipped() {
        // The very first call in the process may or may not succeed
        // depending on test-runner privileges; either way the *second*
        // call in this process must report `Skipped`.
        let _ = elevate_current_thread();
        assert_eq!(elevate_current_thread(), ElevationResult::Skipped);
    }
}
