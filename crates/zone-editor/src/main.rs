//! `zone-editor` command line entry point.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use zone_build::BuildState;
use zone_editor::{EditorConfig, EditorSession};
use zone_project::{Project, Scene};

/// Zone - game project editor tooling
#[derive(Parser, Debug)]
#[command(name = "zone-editor")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Editor configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a project with one default scene
    New {
        /// Project name
        name: String,

        /// Directory that will hold the project file
        dir: PathBuf,
    },

    /// Open a project, build its game-code module and load it
    Build {
        /// Path to the .zone project file
        project: PathBuf,

        /// Let the build tool print directly instead of capturing its output
        #[arg(long)]
        show_output: bool,
    },

    /// Print the scenes and module path of a project
    Info {
        /// Path to the .zone project file
        project: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match EditorConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    fmt().with_env_filter(filter).with_target(false).init();

    match run(cli.command, &config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands, config: &EditorConfig) -> anyhow::Result<ExitCode> {
    match command {
        Commands::New { name, dir } => {
            let project = Project::new(name, dir).context("cannot create project")?;
            let file = project.save().context("cannot save project")?;
            println!("Created {}", file.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Build {
            project,
            show_output,
        } => build(&project, show_output, config),
        Commands::Info { project } => {
            let project = Project::load(&project)
                .with_context(|| format!("cannot open {}", project.display()))?;
            print_info(&project);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build(file: &Path, show_output: bool, config: &EditorConfig) -> anyhow::Result<ExitCode> {
    let mut session = EditorSession::open(file, config)
        .with_context(|| format!("cannot open {}", file.display()))?;

    let started = if show_output {
        session.build(true)
    } else {
        session.build_on_open()
    };
    started.context("build was not started")?;
    let state = session.wait_for_build().context("build did not complete")?;

    if let Some(summary) = session.coordinator().last_build() {
        if !summary.output.is_empty() {
            print!("{}", summary.output);
        }
        println!(
            "{} build finished in {:.2?}: {state}",
            summary.configuration, summary.duration
        );
    }
    for script in session.available_scripts() {
        println!("  script {script}");
    }

    session.close().context("cannot close project")?;
    Ok(match state {
        BuildState::LoadFailed => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

fn print_info(project: &Project) {
    println!("{} ({})", project.name(), project.file_path().display());
    println!(
        "build configuration: {} / {}",
        project.standalone_configuration(),
        project.module_configuration()
    );
    println!("module: {}", project.module_path().display());
    for scene in project.scenes() {
        print_scene(scene);
    }
}

fn print_scene(scene: &Scene) {
    let active = if scene.is_active { " (active)" } else { "" };
    println!("{} {}{active}", scene.id, scene.name);
    for entity in &scene.entities {
        let kinds: Vec<String> = entity
            .components
            .iter()
            .map(|c| c.kind().to_string())
            .collect();
        let disabled = if entity.is_enabled { "" } else { " [disabled]" };
        println!(
            "  {} {}{disabled}: {}",
            entity.id,
            entity.name,
            kinds.join(", ")
        );
    }
}
