//! Simulation context shared by the input handlers and the frame loop. All
//! state lives here and is mutated from the event-loop thread only, so the
//! latest input or resize before a tick is what that tick sees.

use std::time::Instant;

use crate::bridge::FieldTexture;
use crate::error::Error;
use crate::field::FieldBuffer;
use crate::input::{InputEvent, InputMode, InputNormalizer, PointerSample};
use crate::tuning::Tuning;
use crate::viewport::{CoverFit, ViewportState};

/// Elapsed time since the loop started, in seconds.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: Instant,
}

impl FrameClock {
    pub fn new(start: Instant) -> Self {
        Self { start }
    }

    pub fn elapsed(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.start).as_secs_f32()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Running,
}

/// Values the renderer needs after a tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameState {
    pub frame: u64,
    pub elapsed: f32,
    pub resolution: [f32; 4],
    pub idle_reset: bool,
}

#[derive(Debug)]
pub struct Simulation {
    tuning: Tuning,
    viewport: ViewportState,
    cover: CoverFit,
    input: InputNormalizer,
    field: FieldBuffer,
    texture: FieldTexture,
    clock: FrameClock,
    phase: Phase,
    frame: u64,
}

impl Simulation {
    pub fn new(
        tuning: Tuning,
        mode: InputMode,
        viewport: ViewportState,
        now: Instant,
    ) -> Result<Self, Error> {
        tuning.validate()?;
        let field = FieldBuffer::from_tuning(&tuning);
        Ok(Self::with_field(tuning, mode, viewport, field, now))
    }

    /// Build around an existing field, e.g. a deterministic seed.
    pub fn with_field(
        tuning: Tuning,
        mode: InputMode,
        viewport: ViewportState,
        field: FieldBuffer,
        now: Instant,
    ) -> Self {
        let input = InputNormalizer::new(mode, tuning.idle_timeout())
            .with_zero_velocity_on_idle(tuning.zero_velocity_on_idle);
        let mut texture = FieldTexture::new(field.size());
        texture.sync(&field);
        let cover = CoverFit::resolve(viewport, tuning.image_aspect());
        Self {
            tuning,
            viewport,
            cover,
            input,
            field,
            texture,
            clock: FrameClock::new(now),
            phase: Phase::Initializing,
            frame: 0,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn viewport(&self) -> ViewportState {
        self.viewport
    }

    pub fn cover(&self) -> CoverFit {
        self.cover
    }

    pub fn resolution(&self) -> [f32; 4] {
        self.cover.resolution_vector(self.viewport)
    }

    pub fn pointer(&self) -> &PointerSample {
        self.input.sample()
    }

    pub fn input_mode(&self) -> InputMode {
        self.input.mode()
    }

    pub fn field(&self) -> &FieldBuffer {
        &self.field
    }

    pub fn texture(&self) -> &FieldTexture {
        &self.texture
    }

    pub fn texture_mut(&mut self) -> &mut FieldTexture {
        &mut self.texture
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn handle_input(&mut self, event: &InputEvent, now: Instant) -> bool {
        self.input.handle_event(
            event,
            self.viewport.width(),
            self.viewport.height(),
            now,
        )
    }

    /// Recompute the viewport and cover-fit. Zero-sized viewports (minimized
    /// windows) are rejected and leave the previous state in place.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        self.viewport = ViewportState::new(width, height)?;
        self.cover = CoverFit::resolve(self.viewport, self.tuning.image_aspect());
        log::debug!(
            "viewport {}x{} cover ({:.3}, {:.3})",
            width,
            height,
            self.cover.side_a,
            self.cover.side_b
        );
        Ok(())
    }

    /// Run one frame: fire a due idle reset, advance the field, stage the texture.
    pub fn tick(&mut self, now: Instant) -> FrameState {
        self.phase = Phase::Running;
        let elapsed = self.clock.elapsed(now);
        let idle_reset = self.input.poll_idle(now);
        self.field.step(self.input.sample_mut());
        self.texture.sync(&self.field);
        self.frame += 1;
        FrameState {
            frame: self.frame,
            elapsed,
            resolution: self.resolution(),
            idle_reset,
        }
    }
}
