use std::path::{Path, PathBuf};
use std::process;

use clap::{CommandFactory, Parser};

use face_tagger_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use face_tagger_core::pipeline::process_directory_use_case::ProcessDirectoryUseCase;
use face_tagger_core::pipeline::tag_image_use_case::TagImageUseCase;
use face_tagger_core::pipeline::train_model_use_case::TrainModelUseCase;
use face_tagger_core::process::infrastructure::system_command_runner::SystemCommandRunner;
use face_tagger_core::recognition::infrastructure::script_face_recognizer::ScriptFaceRecognizer;
use face_tagger_core::shared::config::PipelineConfig;
use face_tagger_core::tagging::infrastructure::exiftool_writer::ExiftoolWriter;
use face_tagger_core::tagging::infrastructure::tool_installer::{InstallOutcome, ToolInstaller};

/// Train a face model from labeled folders and tag photos with the names
/// it recognizes.
#[derive(Parser, Debug)]
#[command(name = "face-tagger")]
struct Cli {
    /// Train the model from --training-dir before processing.
    #[arg(long)]
    train: bool,

    /// Directory with one sub-directory of photos per person
    /// [default: ./training_images].
    #[arg(long)]
    training_dir: Option<PathBuf>,

    /// Directory of photos to recognize and tag. Tagging rewrites files in
    /// place without a backup.
    #[arg(long)]
    process_dir: Option<PathBuf>,

    /// Model file written by training and read by processing
    /// [default: ./face_model.pkl].
    #[arg(long)]
    model_path: Option<PathBuf>,

    /// Recognition tolerance (0.0-1.0, lower is stricter) [default: 0.6].
    #[arg(long)]
    tolerance: Option<f64>,

    /// Install exiftool with the system package manager.
    #[arg(long)]
    install_tool: bool,

    /// JSON config file with tool paths and defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds to wait for each external tool before killing it.
    #[arg(long)]
    timeout: Option<u64>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    if !cli.train && !cli.install_tool && cli.process_dir.is_none() {
        Cli::command().print_help()?;
        return Err("nothing to do: pass --train, --process-dir or --install-tool".into());
    }

    let config = build_config(&cli, PipelineConfig::load(cli.config.as_deref())?);
    validate(&config)?;

    if cli.install_tool {
        run_install(&config)?;
    }
    if cli.train {
        run_train(&config)?;
    }
    if let Some(process_dir) = &cli.process_dir {
        run_process(&config, process_dir)?;
    }

    Ok(())
}

fn run_install(config: &PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let writer = ExiftoolWriter::from_config(Box::new(SystemCommandRunner::new()), config);
    let installer = ToolInstaller::new(Box::new(SystemCommandRunner::new()));
    match installer.install(&writer)? {
        InstallOutcome::AlreadyInstalled => {}
        InstallOutcome::Installed(manager) => {
            log::info!("Installed {} via {manager}", config.writer_program)
        }
    }
    Ok(())
}

fn run_train(config: &PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    let recognizer =
        ScriptFaceRecognizer::from_config(Box::new(SystemCommandRunner::new()), config);
    let mut use_case =
        TrainModelUseCase::new(Box::new(recognizer), Box::new(StdoutPipelineLogger::default()));
    let report = use_case.execute(&config.training_dir, &config.model_path)?;
    log::info!("Model saved to {}", report.model_path.display());
    Ok(())
}

fn run_process(config: &PipelineConfig, process_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let recognizer =
        ScriptFaceRecognizer::from_config(Box::new(SystemCommandRunner::new()), config);
    let writer = ExiftoolWriter::from_config(Box::new(SystemCommandRunner::new()), config);
    let mut use_case = ProcessDirectoryUseCase::new(
        Box::new(recognizer),
        TagImageUseCase::new(Box::new(writer)),
        Box::new(StdoutPipelineLogger::default()),
    );
    let summary = use_case.execute(process_dir, &config.model_path, config.tolerance)?;
    if summary.has_failures() {
        log::warn!("Finished with problems: {summary}");
    }
    Ok(())
}

/// Command-line values take precedence over the config file.
fn build_config(cli: &Cli, mut config: PipelineConfig) -> PipelineConfig {
    if let Some(dir) = &cli.training_dir {
        config.training_dir = dir.clone();
    }
    if let Some(path) = &cli.model_path {
        config.model_path = path.clone();
    }
    if let Some(tolerance) = cli.tolerance {
        config.tolerance = tolerance;
    }
    if let Some(secs) = cli.timeout {
        config.timeout_secs = Some(secs);
    }
    config
}

fn validate(config: &PipelineConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&config.tolerance) {
        return Err(format!(
            "Tolerance must be between 0.0 and 1.0, got {}",
            config.tolerance
        )
        .into());
    }
    if config.timeout_secs == Some(0) {
        return Err("Timeout must be at least 1 second".into());
    }
    Ok(())
}
