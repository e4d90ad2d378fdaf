//! Assembles and serves the ESP32 PhotoFrame demo.
//!
//! The [`pipeline`] builds or downloads firmware for every board, generates
//! manifests, stages assets and the demo webapp into `demo/`, and serves the
//! project directory so the deployment path `/esp32-photoframe/` works locally.

pub mod assets;
pub mod config;
pub mod error;
pub mod firmware;
pub mod manifests;
pub mod models;
pub mod pipeline;
pub mod release;
pub mod server;
pub mod toolchain;
pub mod webapp;

pub use error::{LaunchError, Result};
