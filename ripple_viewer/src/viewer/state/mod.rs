//! Central runtime state for the viewer. Owns the wgpu device/surface, the
//! simulation context, and the GPU copies of the background plate and the
//! field texture. Submodules cover lifecycle slices: `init` for setup,
//! `layout` for resize and pixel-ratio handling, `render` for the per-frame
//! tick and draw.

use std::{sync::Arc, time::Instant};

use crate::projection::Projection;
use anyhow::Result;
use ripple_sim::{InputEvent, Simulation};
use wgpu::SurfaceError;
use winit::{dpi::PhysicalSize, window::Window};

pub struct ViewerState {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    /// Physical window size reported by winit.
    size: PhysicalSize<u32>,
    /// Surface pixels per physical pixel after the pixel-ratio cap.
    render_scale: f64,
    pipeline: wgpu::RenderPipeline,
    quad_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    quad_index_count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    field_texture: wgpu::Texture,
    _background_texture: wgpu::Texture,
    projection: Projection,
    simulation: Simulation,
}

mod init;
mod layout;
mod render;

impl ViewerState {
    pub async fn new(
        window: Arc<Window>,
        background: crate::texture::BackgroundImage,
        simulation: Simulation,
    ) -> Result<Self> {
        init::new(window, background, simulation).await
    }

    pub fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        layout::resize(self, new_size);
    }

    pub fn rescale(&mut self, scale_factor: f64) {
        layout::rescale(self, scale_factor);
    }

    /// Forward a raw input event, converting physical window coordinates to
    /// surface pixels first.
    pub fn handle_input(&mut self, event: InputEvent, now: Instant) {
        let event = layout::to_surface_units(event, self.render_scale);
        self.simulation.handle_input(&event, now);
    }

    pub fn render(&mut self, now: Instant) -> Result<(), SurfaceError> {
        render::render(self, now)
    }
}
