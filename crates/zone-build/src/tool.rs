//! The external build tool interface.

use std::path::PathBuf;

use crate::BuildToolError;

/// Everything the build tool needs for one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub project_name: String,
    pub project_dir: PathBuf,
    /// Build configuration name, e.g. `"DebugEditor"`.
    pub configuration: String,
    /// Where the build is expected to place the module.
    pub artifact: PathBuf,
    /// Show the tool's own output/window instead of capturing it.
    pub show_output: bool,
}

/// What the build tool reported.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildReport {
    pub succeeded: bool,
    /// Captured tool output. Empty when output was shown directly.
    pub output: String,
}

impl BuildReport {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            output: output.into(),
        }
    }

    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            output: output.into(),
        }
    }
}

/// Runs a build. Called on the coordinator's worker thread, never on the
/// thread that owns the loaded module.
///
/// `Ok` with `succeeded == false` is an ordinary failed build; `Err` means the
/// tool could not be run at all. Both end the build without a load attempt.
pub trait BuildTool: Send + Sync {
    fn build(&self, request: &BuildRequest) -> Result<BuildReport, BuildToolError>;
}

impl<F> BuildTool for F
where
    F: Fn(&BuildRequest) -> Result<BuildReport, BuildToolError> + Send + Sync,
{
    fn build(&self, request: &BuildRequest) -> Result<BuildReport, BuildToolError> {
        self(request)
    }
}
