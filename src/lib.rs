#![warn(clippy::missing_docs_in_private_items)]

//! The general "library" code behind the escape room lighting server: the color model, the
//! serial led strip controller and the http surface triggering it.

/// The color model and its wire encoding.
pub mod color;

/// Screen blanking, slideshows and keystrokes.
pub mod display;

/// The hint pulse background task.
pub mod hint;

/// Exposes functionality for controlling the led strip.
pub mod lights;

/// Scoped serial device access and the device fault taxonomy.
pub mod link;

/// This module contains all of the web/http server types and logic.
pub mod server;

/// Interpolated transitions between colors.
pub mod transition;
