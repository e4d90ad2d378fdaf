//! Domain models for the demo launcher.
//!
//! # Core Concepts
//!
//! - [`Board`]: A hardware variant of the photo frame. Each board gets its own
//!   firmware images and manifests under a dedicated subdirectory of the demo tree.
//! - [`Artifact`]: A firmware image for one board, identified by its [`ArtifactVariant`].
//! - [`StageOutcome`]: The structured result of one pipeline stage. The pipeline never
//!   decides on its own whether a failure is fatal; callers apply a policy to the outcome.
//! - [`ReleaseTag`]: The most recent tagged release, used to build download URLs.

mod artifact;
mod board;
mod outcome;

pub use artifact::*;
pub use board::*;
pub use outcome::*;
