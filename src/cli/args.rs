//! CLI argument parsing with clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// Recognize hand gestures from a frame source and show them as emoji
#[derive(Parser, Debug)]
#[command(name = "gesture-loop")]
#[command(version, about = "Hand gesture recognition loop", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Replay recorded classifier output over a folder of frames
    gesture-loop run --images frames/ --replay replay.toml

    # Run an ONNX model (build with --features onnx)
    gesture-loop run --images frames/ --model hand.onnx --labels labels.txt

    # Live front camera (build with --features camera,onnx)
    gesture-loop run --camera 0 --model hand.onnx --labels labels.txt

    # Classify a single image
    gesture-loop classify hand.jpg --model hand.onnx --labels labels.txt")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the capture → classify → display loop until Ctrl+C
    Run(RunArgs),
    /// Classify one image and print the ranked labels
    Classify {
        /// Image file (PNG or JPEG)
        image: PathBuf,

        #[command(flatten)]
        model: ModelArgs,

        /// Pre-filter applied before classification (e.g. saturation=1.2, mirror, none)
        #[arg(long)]
        filter: Option<String>,
    },
    /// Print the label → gesture table
    Labels,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

/// Classifier selection, shared by `run` and `classify`.
#[derive(ClapArgs, Debug, Default)]
pub struct ModelArgs {
    /// ONNX model file
    #[arg(long, conflicts_with = "replay")]
    pub model: Option<PathBuf>,

    /// Labels file (one label per line, model output order)
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Square model input size in pixels
    #[arg(long)]
    pub input_size: Option<u32>,

    /// Replay recorded classifier results from a TOML file instead of a model
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Minimum top-label confidence (exclusive)
    #[arg(long, value_parser = parse_threshold)]
    pub threshold: Option<f32>,
}

#[derive(ClapArgs, Debug, Default)]
pub struct RunArgs {
    /// Camera device index used as the frame source (build with --features camera)
    #[arg(long, conflicts_with = "images")]
    pub camera: Option<u32>,

    /// Image file or directory used as the frame source
    #[arg(long, short)]
    pub images: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Pause between cycles in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Capture + classify timeout in milliseconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Pre-filter applied before classification (e.g. saturation=1.2, mirror, none)
    #[arg(long)]
    pub filter: Option<String>,

    /// Stop after this many cycles
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Print the gesture name next to the glyph
    #[arg(long)]
    pub show_label: bool,
}

/// Parse and validate a confidence threshold (0.0-1.0)
fn parse_threshold(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("Threshold must be between 0.0 and 1.0, got {}", value));
    }
    Ok(value)
}

impl ModelArgs {
    /// Overlay flags on top of the file configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.classifier.model = Some(model.clone());
            config.classifier.replay = None;
        }
        if let Some(labels) = &self.labels {
            config.classifier.labels = Some(labels.clone());
        }
        if let Some(size) = self.input_size {
            config.classifier.input_size = size;
        }
        if let Some(replay) = &self.replay {
            config.classifier.replay = Some(replay.clone());
        }
        if let Some(threshold) = self.threshold {
            config.classifier.threshold = threshold;
        }
    }
}

impl RunArgs {
    pub fn apply(&self, config: &mut Config) {
        self.model.apply(config);
        if let Some(index) = self.camera {
            config.capture.camera = Some(index);
        }
        if let Some(images) = &self.images {
            config.capture.images = Some(images.clone());
            config.capture.camera = None;
        }
        if let Some(delay) = self.delay_ms {
            config.cycle.delay_ms = delay;
        }
        if let Some(timeout) = self.timeout_ms {
            config.cycle.timeout_ms = timeout;
        }
        if let Some(filter) = &self.filter {
            config.capture.filter = filter.clone();
        }
        if self.show_label {
            config.display.show_label = true;
        }
    }
}
