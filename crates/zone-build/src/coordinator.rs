//! Build/reload state machine for the game-code module.
//!
//! ```text
//! Idle ------request build-----> Building
//! Building --tool fails---------> LoadFailed
//! Building --tool ok, load ok---> Loaded { scripts }
//! Building --tool ok, load fails> LoadFailed
//! Loaded | LoadFailed | Idle --request build--> Building   (no debugger attached)
//! any --shutdown, module unloaded--> Idle
//! ```
//!
//! # Threading
//!
//! [`BuildCoordinator::request_build`] unloads the current module on the
//! calling thread, then runs the [`BuildTool`] on a worker thread. The worker
//! never touches the module host or the script list; it sends exactly one
//! completion message over a channel. The owning thread picks the message up
//! with [`poll`](BuildCoordinator::poll) (non-blocking, for a UI loop) or
//! [`wait`](BuildCoordinator::wait) (blocking) and performs the load there.
//!
//! All state transitions happen on the owning thread, so the `Building`
//! check in `request_build` is race-free without locks.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::debug::DebugProbe;
use crate::diagnostics::{DiagnosticSink, Severity};
use crate::host::ModuleHost;
use crate::tool::{BuildReport, BuildRequest, BuildTool};
use crate::{BuildError, BuildToolError};

// ---------------------------------------------------------------------------
// BuildState
// ---------------------------------------------------------------------------

/// Where the coordinator is in the build/reload cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BuildState {
    /// No module loaded and no build attempted since the last reset.
    #[default]
    Idle,
    /// A build is in flight; no module is loaded.
    Building,
    /// The last build failed or its module could not be loaded.
    LoadFailed,
    /// A module is loaded and exports `scripts`.
    Loaded { scripts: Vec<String> },
}

impl BuildState {
    /// Script identifiers available in this state. Empty unless loaded.
    pub fn scripts(&self) -> &[String] {
        match self {
            Self::Loaded { scripts } => scripts,
            _ => &[],
        }
    }

    pub fn is_building(&self) -> bool {
        matches!(self, Self::Building)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Building => f.write_str("building"),
            Self::LoadFailed => f.write_str("load failed"),
            Self::Loaded { scripts } => write!(f, "loaded ({} scripts)", scripts.len()),
        }
    }
}

// ---------------------------------------------------------------------------
// BuildSummary
// ---------------------------------------------------------------------------

/// Outcome of the most recent completed build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub configuration: String,
    /// The build tool reported success.
    pub tool_succeeded: bool,
    /// The produced module was loaded.
    pub loaded: bool,
    /// Wall-clock time from request to completion handling.
    pub duration: Duration,
    /// Captured build tool output.
    pub output: String,
}

// ---------------------------------------------------------------------------
// Worker protocol
// ---------------------------------------------------------------------------

enum WorkerMessage {
    Finished(Result<BuildReport, BuildToolError>),
    Panicked(String),
}

struct PendingBuild {
    request: BuildRequest,
    started: Instant,
    receiver: Receiver<WorkerMessage>,
    worker: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// BuildCoordinator
// ---------------------------------------------------------------------------

/// Sequences unload -> build -> reload for one project's game-code module.
pub struct BuildCoordinator {
    host: Box<dyn ModuleHost>,
    tool: Arc<dyn BuildTool>,
    debugger: Box<dyn DebugProbe>,
    sink: Arc<dyn DiagnosticSink>,
    state: BuildState,
    pending: Option<PendingBuild>,
    last_build: Option<BuildSummary>,
}

impl BuildCoordinator {
    pub fn new(
        host: Box<dyn ModuleHost>,
        tool: Arc<dyn BuildTool>,
        debugger: Box<dyn DebugProbe>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            host,
            tool,
            debugger,
            sink,
            state: BuildState::Idle,
            pending: None,
            last_build: None,
        }
    }

    pub fn state(&self) -> &BuildState {
        &self.state
    }

    pub fn is_building(&self) -> bool {
        self.state.is_building()
    }

    /// Script identifiers of the loaded module. Empty unless `Loaded`.
    pub fn available_scripts(&self) -> &[String] {
        self.state.scripts()
    }

    pub fn last_build(&self) -> Option<&BuildSummary> {
        self.last_build.as_ref()
    }

    pub fn host(&self) -> &dyn ModuleHost {
        self.host.as_ref()
    }

    /// Whether [`request_build`](Self::request_build) would currently be
    /// accepted. Drives the enabled state of build controls.
    pub fn can_build(&self) -> bool {
        !self.is_building() && !self.debugger.is_attached()
    }

    /// Start a build.
    ///
    /// Unloads the current module, enters [`BuildState::Building`] and runs
    /// the build tool on a worker thread. Returns without waiting for it.
    ///
    /// # Errors
    ///
    /// Rejections leave the state and script list untouched:
    /// - [`BuildError::AlreadyBuilding`] while a build is in flight.
    /// - [`BuildError::DebuggerAttached`] while a debugger is attached.
    /// - [`BuildError::Unload`] if the current module refuses to unload.
    ///
    /// [`BuildError::Spawn`] if the worker cannot start; the state becomes
    /// [`BuildState::LoadFailed`].
    pub fn request_build(&mut self, request: BuildRequest) -> Result<(), BuildError> {
        if self.is_building() {
            info!(project = %request.project_name, "build request ignored: build already in progress");
            return Err(BuildError::AlreadyBuilding);
        }
        if self.debugger.is_attached() {
            warn!(project = %request.project_name, "build request ignored: debugger attached");
            self.sink.report(
                Severity::Warning,
                "Cannot build the game code module while a debugger is attached.",
            );
            return Err(BuildError::DebuggerAttached);
        }

        self.unload_module()?;

        let (sender, receiver) = mpsc::channel();
        let tool = Arc::clone(&self.tool);
        let worker_request = request.clone();
        let spawned = thread::Builder::new()
            .name("zone-build".to_owned())
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| tool.build(&worker_request)));
                let message = match outcome {
                    Ok(result) => WorkerMessage::Finished(result),
                    Err(payload) => WorkerMessage::Panicked(panic_message(payload.as_ref())),
                };
                // The coordinator may be gone; then nobody needs the result.
                let _ = sender.send(message);
            });

        let worker = match spawned {
            Ok(worker) => worker,
            Err(e) => {
                error!(error = %e, "failed to spawn build worker");
                self.sink
                    .report(Severity::Error, &format!("Failed to start the build: {e}"));
                self.state = BuildState::LoadFailed;
                return Err(BuildError::Spawn(e));
            }
        };

        info!(
            project = %request.project_name,
            configuration = %request.configuration,
            "build started"
        );
        self.state = BuildState::Building;
        self.pending = Some(PendingBuild {
            request,
            started: Instant::now(),
            receiver,
            worker,
        });
        Ok(())
    }

    /// Finish the in-flight build if its worker has reported.
    ///
    /// Returns `None` when no build is pending or it is still running.
    /// Otherwise returns the terminal state, or
    /// [`BuildError::WorkerPanicked`] if the worker failed unexpectedly (the
    /// state is then [`BuildState::LoadFailed`]).
    pub fn poll(&mut self) -> Option<Result<BuildState, BuildError>> {
        let message = match self.pending.as_ref()?.receiver.try_recv() {
            Ok(message) => Some(message),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => None,
        };
        let pending = self.pending.take()?;
        Some(self.complete(pending, message))
    }

    /// Block until the in-flight build completes, then finish it.
    ///
    /// # Errors
    ///
    /// - [`BuildError::NoBuildPending`] if nothing is in flight.
    /// - [`BuildError::WorkerPanicked`] as for [`poll`](Self::poll).
    pub fn wait(&mut self) -> Result<BuildState, BuildError> {
        let pending = self.pending.take().ok_or(BuildError::NoBuildPending)?;
        let message = pending.receiver.recv().ok();
        self.complete(pending, message)
    }

    /// Release the loaded module, if any, and clear the script list.
    ///
    /// Idempotent. A `Loaded` coordinator becomes `Idle`; other states are
    /// kept.
    pub fn unload_module(&mut self) -> Result<(), BuildError> {
        match self.host.unload() {
            Ok(true) => {
                self.sink
                    .report(Severity::Info, "Game code module unloaded successfully");
            }
            Ok(false) => debug!("no game code module loaded"),
            Err(e) => {
                self.sink.report(
                    Severity::Warning,
                    &format!("Failed to unload the game code module: {e}"),
                );
                return Err(BuildError::Unload(e));
            }
        }

        if self.state.is_loaded() {
            self.state = BuildState::Idle;
        }
        Ok(())
    }

    /// Wait out any in-flight build, unload the module and return to `Idle`.
    /// Used when the project closes.
    ///
    /// # Errors
    ///
    /// [`BuildError::Unload`] if the module refuses to unload. The state is
    /// then left as it was, so a loaded module is still reported as loaded.
    pub fn shutdown(&mut self) -> Result<(), BuildError> {
        if self.pending.is_some() {
            info!("waiting for in-flight build before shutdown");
            if let Err(e) = self.wait() {
                warn!(error = %e, "in-flight build ended with an error during shutdown");
            }
        }
        if let Err(e) = self.unload_module() {
            warn!(error = %e, state = %self.state, "module unload failed during shutdown");
            return Err(e);
        }
        self.state = BuildState::Idle;
        self.last_build = None;
        Ok(())
    }

    // -- Internal helpers ---------------------------------------------------

    fn complete(
        &mut self,
        pending: PendingBuild,
        message: Option<WorkerMessage>,
    ) -> Result<BuildState, BuildError> {
        let PendingBuild {
            request,
            started,
            worker,
            ..
        } = pending;

        // The worker has already sent its message or died, so this is quick.
        if worker.join().is_err() {
            debug!("build worker thread panicked after reporting");
        }

        let mut summary = BuildSummary {
            configuration: request.configuration.clone(),
            tool_succeeded: false,
            loaded: false,
            duration: Duration::ZERO,
            output: String::new(),
        };

        let result = match message {
            Some(WorkerMessage::Finished(Ok(report))) => {
                summary.tool_succeeded = report.succeeded;
                summary.output = report.output;
                if report.succeeded {
                    self.load_module(&request.artifact);
                } else {
                    self.sink.report(
                        Severity::Warning,
                        &format!(
                            "Build of {} ({}) failed.",
                            request.project_name, request.configuration
                        ),
                    );
                    self.state = BuildState::LoadFailed;
                }
                Ok(self.state.clone())
            }
            Some(WorkerMessage::Finished(Err(e))) => {
                self.sink
                    .report(Severity::Warning, &format!("Build tool could not run: {e}"));
                self.state = BuildState::LoadFailed;
                Ok(self.state.clone())
            }
            Some(WorkerMessage::Panicked(reason)) => Err(self.fail_unexpectedly(reason)),
            None => Err(self.fail_unexpectedly(
                "build worker exited without reporting a result".to_owned(),
            )),
        };

        summary.loaded = self.state.is_loaded();
        summary.duration = started.elapsed();
        info!(
            configuration = %summary.configuration,
            tool_succeeded = summary.tool_succeeded,
            loaded = summary.loaded,
            duration_ms = summary.duration.as_millis() as u64,
            "build finished"
        );
        self.last_build = Some(summary);
        result
    }

    fn load_module(&mut self, artifact: &Path) {
        match self.host.load(artifact) {
            Ok(()) => {
                let scripts = self.host.script_names();
                info!(path = %artifact.display(), scripts = ?scripts, "game code module loaded");
                self.sink
                    .report(Severity::Info, "Game code module loaded successfully");
                self.state = BuildState::Loaded { scripts };
            }
            Err(e) => {
                self.sink.report(
                    Severity::Warning,
                    &format!("Failed to load the game code module ({e}). Try to build the project first."),
                );
                self.state = BuildState::LoadFailed;
            }
        }
    }

    fn fail_unexpectedly(&mut self, reason: String) -> BuildError {
        error!(reason = %reason, "build worker failed unexpectedly");
        self.sink
            .report(Severity::Error, &format!("Build failed unexpectedly: {reason}"));
        self.state = BuildState::LoadFailed;
        BuildError::WorkerPanicked(reason)
    }
}

impl fmt::Debug for BuildCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildCoordinator")
            .field("state", &self.state)
            .field("pending", &self.pending.as_ref().map(|p| &p.request))
            .field("last_build", &self.last_build)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_loaded_state_has_scripts() {
        let loaded = BuildState::Loaded {
            scripts: vec!["Jump".to_owned()],
        };
        assert_eq!(loaded.scripts(), ["Jump".to_owned()]);
        assert!(BuildState::Idle.scripts().is_empty());
        assert!(BuildState::Building.scripts().is_empty());
        assert!(BuildState::LoadFailed.scripts().is_empty());
    }

    #[test]
    fn state_display() {
        assert_eq!(BuildState::LoadFailed.to_string(), "load failed");
        assert_eq!(
            BuildState::Loaded {
                scripts: vec!["A".to_owned(), "B".to_owned()]
            }
            .to_string(),
            "loaded (2 scripts)"
        );
    }

    #[test]
    fn panic_payloads_become_messages() {
        let payload = panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "static message");

        let payload = panic::catch_unwind(|| panic!("formatted {}", 42)).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 42");
    }
}
