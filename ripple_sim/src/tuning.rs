//! Simulation constants gathered into one deserializable block. Defaults
//! reproduce the stock look: a 128-cell grid, 2% decay per frame, an
//! influence radius of one eighteenth of the grid, and a 1.5 s idle reset.

use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How the field buffer applies a simulation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldUpdate {
    /// Decay and inject directly in the single cell array.
    #[default]
    InPlace,
    /// Read from a front buffer, write a back buffer, then swap.
    DoubleBuffered,
}

/// Largest grid side accepted; the field is uploaded as one square texture and
/// 8192 is the default 2D texture limit of wgpu devices.
pub const MAX_GRID_SIZE: usize = 8192;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Side length of the square field grid, in cells.
    pub grid_size: usize,
    /// Per-frame multiplier applied to both field channels.
    pub decay: f32,
    /// Influence radius expressed as `grid_size / radius_divisor`.
    pub radius_divisor: f32,
    pub impulse_gain: f32,
    /// Per-frame multiplier applied to the pointer velocity after injection.
    pub velocity_decay: f32,
    pub idle_timeout_ms: u64,
    /// Pixel dimensions of the background image the cover-fit targets.
    pub image_width: u32,
    pub image_height: u32,
    pub distortion_strength: f32,
    /// Upper bound on the device pixel ratio used for the render surface.
    pub max_pixel_ratio: f64,
    /// Seed the grid with random intensities that fade out over the first frames.
    pub initial_noise: bool,
    pub update: FieldUpdate,
    /// Also zero the pointer velocity when the idle timer resets the position.
    pub zero_velocity_on_idle: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            grid_size: 128,
            decay: 0.98,
            radius_divisor: 18.0,
            impulse_gain: 5.0,
            velocity_decay: 0.9,
            idle_timeout_ms: 1500,
            image_width: 1920,
            image_height: 1280,
            distortion_strength: 0.02,
            max_pixel_ratio: 2.0,
            initial_noise: true,
            update: FieldUpdate::InPlace,
            zero_velocity_on_idle: false,
        }
    }
}

impl Tuning {
    pub fn influence_radius(&self) -> f32 {
        self.grid_size as f32 / self.radius_divisor
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    /// Width over height of the background image.
    pub fn image_aspect(&self) -> f32 {
        self.image_width as f32 / self.image_height as f32
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.grid_size == 0 {
            return Err(Error::tuning("grid_size", "must be positive"));
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(Error::tuning(
                "grid_size",
                format!("must be at most {MAX_GRID_SIZE} (got {})", self.grid_size),
            ));
        }
        check_unit_factor("decay", self.decay)?;
        check_unit_factor("velocity_decay", self.velocity_decay)?;
        if !(self.radius_divisor.is_finite() && self.radius_divisor > 0.0) {
            return Err(Error::tuning(
                "radius_divisor",
                format!("must be a positive number (got {})", self.radius_divisor),
            ));
        }
        if !self.impulse_gain.is_finite() {
            return Err(Error::tuning("impulse_gain", "must be finite"));
        }
        if self.idle_timeout_ms == 0 {
            return Err(Error::tuning("idle_timeout_ms", "must be positive"));
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(Error::tuning(
                "image_width/image_height",
                format!(
                    "must both be positive (got {}x{})",
                    self.image_width, self.image_height
                ),
            ));
        }
        if !self.distortion_strength.is_finite() {
            return Err(Error::tuning("distortion_strength", "must be finite"));
        }
        if !(self.max_pixel_ratio.is_finite() && self.max_pixel_ratio > 0.0) {
            return Err(Error::tuning(
                "max_pixel_ratio",
                format!("must be a positive number (got {})", self.max_pixel_ratio),
            ));
        }
        Ok(())
    }
}

fn check_unit_factor(field: &'static str, value: f32) -> Result<(), Error> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(Error::tuning(field, format!("must be in (0, 1] (got {value})")))
    }
}

/// Load a JSON tuning file. Missing fields keep their defaults.
pub fn load_tuning(path: &Path) -> Result<Tuning, Error> {
    let data = fs::read_to_string(path).map_err(|source| Error::TuningIo {
        path: path.to_path_buf(),
        source,
    })?;
    let tuning: Tuning = serde_json::from_str(&data).map_err(|source| Error::TuningParse {
        path: path.to_path_buf(),
        source,
    })?;
    tuning.validate()?;
    Ok(tuning)
}
