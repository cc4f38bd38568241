//! Pointer-reactive displacement field simulation.
//!
//! The crate holds everything that does not need a GPU: pointer normalization
//! with the idle reset, the decaying two-channel field, the RGBA staging image
//! the renderer uploads, and the cover-fit transform for the background plate.
//! `ripple_viewer` drives a [`Simulation`] from its winit event loop.

pub mod bridge;
pub mod error;
pub mod field;
pub mod input;
pub mod simulation;
pub mod tuning;
pub mod viewport;

pub use bridge::FieldTexture;
pub use error::Error;
pub use field::{FieldBuffer, FieldParams};
pub use input::{IdleTimer, InputEvent, InputMode, InputNormalizer, PointerSample};
pub use simulation::{FrameClock, FrameState, Phase, Simulation};
pub use tuning::{FieldUpdate, MAX_GRID_SIZE, Tuning, load_tuning};
pub use viewport::{CoverFit, ViewportState};
