//! Build tool that runs an external command line.
//!
//! The command is configured once ([`BuildToolConfig`]) and expanded per
//! request. Placeholders in arguments:
//!
//! | placeholder  | value                               |
//! |--------------|-------------------------------------|
//! | `{name}`     | project name                        |
//! | `{dir}`      | project directory                   |
//! | `{config}`   | build configuration name            |
//! | `{artifact}` | expected module path                |
//!
//! The command runs with the project directory as its working directory.
//! Its exit status decides success.

use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::tool::{BuildReport, BuildRequest, BuildTool};
use crate::BuildToolError;

// ---------------------------------------------------------------------------
// BuildToolConfig
// ---------------------------------------------------------------------------

/// External build command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildToolConfig {
    pub program: String,
    pub args: Vec<String>,
    /// Whether builds started from the UI show tool output by default.
    pub show_output_by_default: bool,
}

impl Default for BuildToolConfig {
    /// `sh build.sh {config} {artifact}` in the project directory.
    fn default() -> Self {
        Self {
            program: "sh".to_owned(),
            args: vec![
                "build.sh".to_owned(),
                "{config}".to_owned(),
                "{artifact}".to_owned(),
            ],
            show_output_by_default: true,
        }
    }
}

// ---------------------------------------------------------------------------
// ProcessBuildTool
// ---------------------------------------------------------------------------

/// Runs the configured command for each build request.
#[derive(Debug, Clone)]
pub struct ProcessBuildTool {
    config: BuildToolConfig,
}

impl ProcessBuildTool {
    pub fn new(config: BuildToolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BuildToolConfig {
        &self.config
    }

    /// Arguments with placeholders replaced for `request`.
    pub fn expand_args(&self, request: &BuildRequest) -> Vec<String> {
        let dir = request.project_dir.display().to_string();
        let artifact = request.artifact.display().to_string();
        self.config
            .args
            .iter()
            .map(|arg| {
                arg.replace("{name}", &request.project_name)
                    .replace("{dir}", &dir)
                    .replace("{config}", &request.configuration)
                    .replace("{artifact}", &artifact)
            })
            .collect()
    }
}

impl BuildTool for ProcessBuildTool {
    fn build(&self, request: &BuildRequest) -> Result<BuildReport, BuildToolError> {
        let args = self.expand_args(request);
        info!(
            program = %self.config.program,
            args = ?args,
            configuration = %request.configuration,
            "running build tool"
        );

        let mut command = Command::new(&self.config.program);
        command.args(&args).current_dir(&request.project_dir);

        let spawn_error = |source: std::io::Error| BuildToolError::Spawn {
            program: self.config.program.clone(),
            source,
        };

        if request.show_output {
            let status = command
                .stdin(Stdio::null())
                .status()
                .map_err(spawn_error)?;
            debug!(%status, "build tool exited");
            return Ok(BuildReport {
                succeeded: status.success(),
                output: String::new(),
            });
        }

        let output = command
            .stdin(Stdio::null())
            .output()
            .map_err(spawn_error)?;
        debug!(status = %output.status, "build tool exited");

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(BuildReport {
            succeeded: output.status.success(),
            output: text,
        })
    }
}
