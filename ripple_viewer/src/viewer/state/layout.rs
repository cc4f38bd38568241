use super::ViewerState;
use crate::projection::Projection;
use ripple_sim::InputEvent;
use winit::dpi::PhysicalSize;

/// Ratio between surface pixels and physical pixels once the device pixel
/// ratio is capped at `max_pixel_ratio`.
pub(super) fn render_scale(scale_factor: f64, max_pixel_ratio: f64) -> f64 {
    if scale_factor <= 0.0 {
        return 1.0;
    }
    scale_factor.min(max_pixel_ratio) / scale_factor
}

pub(super) fn surface_size(window: PhysicalSize<u32>, render_scale: f64) -> PhysicalSize<u32> {
    let scale = |value: u32| ((value as f64 * render_scale).round() as u32).max(1);
    PhysicalSize::new(scale(window.width), scale(window.height))
}

pub(super) fn to_surface_units(event: InputEvent, render_scale: f64) -> InputEvent {
    match event {
        InputEvent::Pointer { client_x, client_y } => InputEvent::Pointer {
            client_x: client_x * render_scale,
            client_y: client_y * render_scale,
        },
        InputEvent::Touch { touches } => InputEvent::Touch {
            touches: touches
                .into_iter()
                .map(|(x, y)| (x * render_scale, y * render_scale))
                .collect(),
        },
    }
}

pub(super) fn resize(state: &mut ViewerState, new_size: PhysicalSize<u32>) {
    if new_size.width == 0 || new_size.height == 0 {
        return;
    }

    state.size = new_size;
    let surface = surface_size(new_size, state.render_scale);
    state.config.width = surface.width;
    state.config.height = surface.height;
    state.surface.configure(&state.device, &state.config);

    if let Err(err) = state.simulation.resize(surface.width, surface.height) {
        log::warn!("viewport resize rejected: {err}");
        return;
    }
    state.projection = Projection::new(state.simulation.viewport().aspect());
    log::debug!(
        "surface {}x{} (window {}x{}, render scale {:.2})",
        surface.width,
        surface.height,
        new_size.width,
        new_size.height,
        state.render_scale
    );
}

pub(super) fn rescale(state: &mut ViewerState, scale_factor: f64) {
    state.render_scale = render_scale(scale_factor, state.simulation.tuning().max_pixel_ratio);
    let size = state.window.inner_size();
    resize(state, size);
}
