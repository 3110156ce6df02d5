//! Debugger detection for the build guard.
//!
//! Rebuilding unloads the game-code module, which must not happen while a
//! debugger may be stepping through it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Answers whether a debug session is attached to the editor process.
pub trait DebugProbe {
    fn is_attached(&self) -> bool;
}

/// Never reports a debugger.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDebugger;

impl DebugProbe for NoDebugger {
    fn is_attached(&self) -> bool {
        false
    }
}

/// A flag flipped by whatever launches or attaches the debugger.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct DebuggerFlag {
    attached: Arc<AtomicBool>,
}

impl DebuggerFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self) {
        self.attached.store(true, Ordering::SeqCst);
    }

    pub fn detach(&self) {
        self.attached.store(false, Ordering::SeqCst);
    }
}

impl DebugProbe for DebuggerFlag {
    fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }
}

/// Detects a tracer attached to the current process.
///
/// On Linux this reads `TracerPid` from `/proc/self/status`. Elsewhere it
/// always reports `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracerProbe;

impl DebugProbe for TracerProbe {
    fn is_attached(&self) -> bool {
        #[cfg(target_os = "linux")]
        {
            match std::fs::read_to_string("/proc/self/status") {
                Ok(status) => tracer_pid(&status).is_some_and(|pid| pid != 0),
                Err(e) => {
                    tracing::debug!(error = %e, "cannot read /proc/self/status");
                    false
                }
            }
        }
        #[cfg(not(target_os = "linux"))]
        {
            false
        }
    }
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn tracer_pid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("TracerPid:"))
        .and_then(|pid| pid.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_clones_share_state() {
        let flag = DebuggerFlag::new();
        let probe = flag.clone();
        assert!(!probe.is_attached());

        flag.attach();
        assert!(probe.is_attached());

        flag.detach();
        assert!(!probe.is_attached());
    }

    #[test]
    fn tracer_pid_parses_status_lines() {
        let status = "Name:\tzone-editor\nState:\tR (running)\nTracerPid:\t4242\nUid:\t0\n";
        assert_eq!(tracer_pid(status), Some(4242));
        assert_eq!(tracer_pid("TracerPid:\t0\n"), Some(0));
        assert_eq!(tracer_pid("Name:\tx\n"), None);
    }
}
