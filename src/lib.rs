//! gesture-loop library crate.
//!
//! Captures a frame, classifies it with a hand-gesture model, maps the top
//! label to a [`Gesture`](gesture::Gesture) and hands it to a display, over
//! and over. See [`recognizer::GestureRecognizer`] for the loop itself.

pub mod capture;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod display;
pub mod gesture;
pub mod recognizer;
pub mod shutdown;
