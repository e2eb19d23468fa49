//! Subcommand handlers.

use std::path::PathBuf;
use std::time::Duration;

use super::args::{Args, Command, ConfigAction, RunArgs};
use crate::capture::{load_frame, CaptureError, FrameSource, ImageSequenceSource};
use crate::classifier::{Classifier, ClassifierError, ReplayClassifier};
use crate::config::{default_path, Config, ConfigError};
use crate::display::{spawn_display, TerminalDisplay};
use crate::gesture::Gesture;
use crate::recognizer::{GestureRecognizer, RecognizerError};
use crate::shutdown::{ctrlc_received, setup_ctrlc_handler};

/// How often the run loop checks for Ctrl+C.
const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Errors surfaced to the user by the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Recognizer(#[from] RecognizerError),

    #[error("Failed to install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error(
        "No frame source configured. Pass --camera <index> or --images <file|dir>, or set [capture] camera/images"
    )]
    NoImages,

    #[error("No classifier configured. Pass --model/--labels or --replay")]
    NoClassifier,

    #[error("--labels is required with --model")]
    MissingLabels,

    #[error("This build has no ONNX support. Rebuild with --features onnx or use --replay")]
    OnnxDisabled,

    #[error("This build has no camera support. Rebuild with --features camera or use --images")]
    CameraDisabled,

    #[error("Config file already exists: {}", .0.display())]
    ConfigExists(PathBuf),

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Route parsed arguments to the matching handler.
pub async fn dispatch(args: Args) -> Result<(), AppError> {
    let config_path = args.config.clone();
    let mut config = Config::load(config_path.as_deref())?;

    match args.command {
        Command::Run(run_args) => {
            run_args.apply(&mut config);
            run(&run_args, config).await
        }
        Command::Classify {
            image,
            model,
            filter,
        } => {
            model.apply(&mut config);
            if let Some(filter) = filter {
                config.capture.filter = filter;
            }
            classify(&image, &config)
        }
        Command::Labels => list_labels(&config),
        Command::Config { action } => handle_config_action(action, &config, config_path),
    }
}

/// Pick the classifier backend from the configuration.
pub fn build_classifier(config: &Config) -> Result<Box<dyn Classifier>, AppError> {
    let classifier = &config.classifier;
    if let Some(replay) = &classifier.replay {
        log::info!("Replaying classifier results from {}", replay.display());
        return Ok(Box::new(ReplayClassifier::load(replay)?));
    }
    match &classifier.model {
        Some(model) => {
            let labels = classifier.labels.as_ref().ok_or(AppError::MissingLabels)?;
            load_onnx(model, labels, config.input_size()?)
        }
        None => Err(AppError::NoClassifier),
    }
}

/// Pick the frame source: a camera if one is configured, otherwise images.
pub fn build_source(config: &Config) -> Result<Box<dyn FrameSource>, AppError> {
    if let Some(index) = config.capture.camera {
        return open_camera(index, config.capture.mirror_camera);
    }
    let images = config.capture.images.as_ref().ok_or(AppError::NoImages)?;
    Ok(Box::new(ImageSequenceSource::open(images)?))
}

#[cfg(feature = "camera")]
fn open_camera(index: u32, mirror: bool) -> Result<Box<dyn FrameSource>, AppError> {
    use crate::capture::{CameraSettings, CameraSource};

    let settings = CameraSettings {
        index,
        mirror,
        ..CameraSettings::default()
    };
    Ok(Box::new(CameraSource::open(settings)?))
}

#[cfg(not(feature = "camera"))]
fn open_camera(_index: u32, _mirror: bool) -> Result<Box<dyn FrameSource>, AppError> {
    Err(AppError::CameraDisabled)
}

#[cfg(feature = "onnx")]
fn load_onnx(
    model: &std::path::Path,
    labels: &std::path::Path,
    input_size: u32,
) -> Result<Box<dyn Classifier>, AppError> {
    let classifier = crate::classifier::OnnxClassifier::load(model, labels, input_size)?;
    Ok(Box::new(classifier))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(
    _model: &std::path::Path,
    _labels: &std::path::Path,
    _input_size: u32,
) -> Result<Box<dyn Classifier>, AppError> {
    Err(AppError::OnnxDisabled)
}

/// Run the recognition loop until Ctrl+C or `--cycles` runs out.
pub async fn run(args: &RunArgs, config: Config) -> Result<(), AppError> {
    let settings = config.recognizer_settings()?;
    let classifier = build_classifier(&config)?;
    let source = build_source(&config)?;
    setup_ctrlc_handler()?;

    let delay = settings.delay;
    let (results, display) = spawn_display(TerminalDisplay::stdout(config.display.show_label));
    let mut recognizer = GestureRecognizer::new(source, classifier, settings, results);

    match args.cycles {
        Some(cycles) => {
            for i in 0..cycles {
                if ctrlc_received() {
                    break;
                }
                recognizer.run_cycle().await;
                if i + 1 < cycles {
                    tokio::time::sleep(delay).await;
                }
            }
        }
        None => {
            recognizer.start()?;
            while !ctrlc_received() {
                tokio::time::sleep(SHUTDOWN_POLL_INTERVAL).await;
            }
            recognizer.stop();
            recognizer.join().await;
        }
    }

    let stats = recognizer.stats();
    // Dropping the recognizer closes the display channel.
    drop(recognizer);
    if let Err(e) = display.await {
        log::error!("Display task failed: {}", e);
    }
    eprintln!("{}", stats);
    Ok(())
}

/// Classify one image and print the ranked labels plus the mapped gesture.
pub fn classify(image: &std::path::Path, config: &Config) -> Result<(), AppError> {
    let table = config.label_table()?;
    let filter = config.filter()?;
    let mut classifier = build_classifier(config)?;

    let mut frame = load_frame(image)?;
    if let Some(filter) = filter {
        filter.apply(&mut frame);
    }
    let ranked = classifier.classify(&frame)?;

    for entry in &ranked {
        println!("{}", entry);
    }
    match table.decide(&ranked) {
        Some(gesture) => println!("=> {} {}", gesture.glyph(), gesture),
        None => println!("=> no result"),
    }
    Ok(())
}

/// Print the label → gesture table.
pub fn list_labels(config: &Config) -> Result<(), AppError> {
    let table = config.label_table()?;
    println!("Label → gesture (confidence > {}):", table.threshold());
    for (label, gesture) in table.entries() {
        println!("  {:<20} {} {}", label, gesture.glyph(), gesture);
    }
    println!(
        "  {:<20} {} {}",
        "(anything else)",
        Gesture::Empty.glyph(),
        Gesture::Empty
    );
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(
    action: ConfigAction,
    config: &Config,
    path: Option<PathBuf>,
) -> Result<(), AppError> {
    let config_path = path.unwrap_or_else(default_path);
    match action {
        ConfigAction::Show => {
            if config_path.exists() {
                println!("# Config file: {} (exists)", config_path.display());
            } else {
                println!("# Config file: {} (not found, showing defaults)", config_path.display());
            }
            println!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigAction::Init => {
            if config_path.exists() {
                return Err(AppError::ConfigExists(config_path));
            }
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| AppError::Write {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
            let content = format!("# gesture-loop configuration\n\n{}", Config::default().to_toml()?);
            std::fs::write(&config_path, content).map_err(|e| AppError::Write {
                path: config_path.clone(),
                source: e,
            })?;
            println!("Created config file: {}", config_path.display());
            Ok(())
        }
    }
}
