//! Command-line interface definitions and handlers.

mod args;
mod commands;

pub use args::{Args, Command, ConfigAction, ModelArgs, RunArgs};
pub use commands::{
    build_classifier, build_source, classify, dispatch, handle_config_action, list_labels, run,
    AppError,
};
