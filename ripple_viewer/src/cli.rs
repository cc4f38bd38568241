use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ripple_sim::{FieldUpdate, InputMode, Tuning, load_tuning};

#[derive(Parser, Debug)]
#[command(about = "Full-window image warped by a pointer-driven displacement field", version)]
pub struct Args {
    /// Background image (PNG or JPEG); a generated gradient is used when omitted
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Optional JSON tuning file; missing fields keep their defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Side length of the field grid, in cells
    #[arg(long)]
    pub grid_size: Option<usize>,

    /// Per-frame decay factor for the field channels
    #[arg(long)]
    pub decay: Option<f32>,

    /// How far field values bend the background UVs
    #[arg(long)]
    pub strength: Option<f32>,

    /// Milliseconds without input before the pointer returns to the origin
    #[arg(long)]
    pub idle_ms: Option<u64>,

    /// Input device family; fixed for the whole session
    #[arg(long, value_enum, default_value_t = InputChoice::Auto)]
    pub input: InputChoice,

    /// Compute each step into a back buffer instead of updating cells in place
    #[arg(long)]
    pub double_buffer: bool,

    /// Skip creating a winit window/event loop; runs a scripted pointer sweep instead
    #[arg(long)]
    pub headless: bool,

    /// Number of frames simulated in headless mode
    #[arg(long, default_value_t = 120)]
    pub frames: u32,

    /// When set, write the final field as a PNG visualization
    #[arg(long)]
    pub dump_field: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputChoice {
    Auto,
    Pointer,
    Touch,
}

impl InputChoice {
    pub fn resolve(self) -> InputMode {
        self.resolve_for(touch_first_platform())
    }

    /// `Auto` follows the platform's primary input device.
    fn resolve_for(self, touch_first: bool) -> InputMode {
        match self {
            InputChoice::Auto if touch_first => InputMode::Touch,
            InputChoice::Auto | InputChoice::Pointer => InputMode::Pointer,
            InputChoice::Touch => InputMode::Touch,
        }
    }
}

/// Mobile targets deliver touches as the primary input; desktop windowing
/// reports a cursor even on touchscreens.
fn touch_first_platform() -> bool {
    cfg!(any(target_os = "android", target_os = "ios"))
}

impl Args {
    /// Tuning from `--config` (or defaults) with command-line overrides on top.
    pub fn resolve_tuning(&self) -> Result<Tuning> {
        let mut tuning = match self.config.as_ref() {
            Some(path) => load_tuning(path)
                .with_context(|| format!("loading tuning {}", path.display()))?,
            None => Tuning::default(),
        };
        if let Some(grid_size) = self.grid_size {
            tuning.grid_size = grid_size;
        }
        if let Some(decay) = self.decay {
            tuning.decay = decay;
        }
        if let Some(strength) = self.strength {
            tuning.distortion_strength = strength;
        }
        if let Some(idle_ms) = self.idle_ms {
            tuning.idle_timeout_ms = idle_ms;
        }
        if self.double_buffer {
            tuning.update = FieldUpdate::DoubleBuffered;
        }
        tuning.validate().context("validating tuning overrides")?;
        Ok(tuning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn overrides_apply_on_top_of_config_file() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("tuning.json");
        fs::write(&path, r#"{ "grid_size": 96, "decay": 0.95 }"#).expect("write tuning");

        let args = Args::parse_from([
            "ripple_viewer",
            "--config",
            path.to_str().expect("utf-8 path"),
            "--decay",
            "0.9",
            "--double-buffer",
        ]);
        let tuning = args.resolve_tuning().expect("tuning");

        assert_eq!(tuning.grid_size, 96);
        assert_eq!(tuning.decay, 0.9);
        assert_eq!(tuning.update, FieldUpdate::DoubleBuffered);
        assert_eq!(tuning.idle_timeout_ms, 1500);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = Args::parse_from(["ripple_viewer", "--grid-size", "0"]);
        assert!(args.resolve_tuning().is_err());
    }

    #[test]
    fn explicit_input_choice_ignores_platform() {
        for touch_first in [false, true] {
            assert_eq!(InputChoice::Pointer.resolve_for(touch_first), InputMode::Pointer);
            assert_eq!(InputChoice::Touch.resolve_for(touch_first), InputMode::Touch);
        }

        let args = Args::parse_from(["ripple_viewer", "--input", "touch"]);
        assert_eq!(args.input.resolve(), InputMode::Touch);
    }

    #[test]
    fn auto_input_follows_platform() {
        assert_eq!(InputChoice::Auto.resolve_for(false), InputMode::Pointer);
        assert_eq!(InputChoice::Auto.resolve_for(true), InputMode::Touch);

        let expected = if touch_first_platform() {
            InputMode::Touch
        } else {
            InputMode::Pointer
        };
        let args = Args::parse_from(["ripple_viewer"]);
        assert_eq!(args.input, InputChoice::Auto);
        assert_eq!(args.input.resolve(), expected);
    }
}
