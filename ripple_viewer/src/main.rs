mod cli;
mod headless;
mod projection;
mod texture;
mod viewer;

use std::{sync::Arc, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use pollster::FutureExt;
use ripple_sim::{InputEvent, InputMode, Simulation, Tuning, ViewportState};
use wgpu::SurfaceError;
use winit::{
    dpi::PhysicalSize,
    event::{ElementState, Event, KeyEvent, Touch, TouchPhase, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{Key, NamedKey},
    window::WindowBuilder,
};

use cli::Args;
use texture::{dump_field_to_png, generate_placeholder_background, load_background};
use viewer::ViewerState;

/// Viewport used when no window exists to size the simulation.
const HEADLESS_VIEWPORT: (u32, u32) = (1280, 720);

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    let mut tuning = args.resolve_tuning()?;
    let background = match args.image.as_ref() {
        Some(path) => load_background(path)
            .with_context(|| format!("loading background {}", path.display()))?,
        None => {
            log::info!("no --image given; using generated placeholder");
            generate_placeholder_background(tuning.image_width, tuning.image_height)
        }
    };
    log::debug!(
        "background {}x{} (aspect {:.3})",
        background.width,
        background.height,
        background.aspect()
    );
    tuning.image_width = background.width;
    tuning.image_height = background.height;
    tuning
        .validate()
        .context("validating tuning against background")?;

    log::info!(
        "tuning {}",
        serde_json::to_string(&tuning).context("serializing tuning")?
    );

    let mode = args.input.resolve();

    if args.headless {
        return run_headless(&args, tuning, mode);
    }

    let event_loop = EventLoop::new().context("creating winit event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Ripple")
            .with_inner_size(PhysicalSize::new(1280, 720))
            .build(&event_loop)
            .context("creating viewer window")?,
    );

    let initial = window.inner_size();
    let viewport = ViewportState::new(initial.width.max(1), initial.height.max(1))?;
    let simulation = Simulation::new(tuning, mode, viewport, Instant::now())?;
    let mut state = ViewerState::new(window, background, simulation).block_on()?;
    log::info!(
        "{:?} input, window {}x{}",
        state.simulation().input_mode(),
        state.size().width,
        state.size().height
    );

    event_loop
        .run(move |event, target| {
            target.set_control_flow(ControlFlow::Poll);

            match event {
                Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                    match event {
                        WindowEvent::CloseRequested => target.exit(),
                        WindowEvent::KeyboardInput {
                            event:
                                KeyEvent {
                                    logical_key: Key::Named(NamedKey::Escape),
                                    state: ElementState::Pressed,
                                    ..
                                },
                            ..
                        } => target.exit(),
                        WindowEvent::CursorMoved { position, .. } => state.handle_input(
                            InputEvent::Pointer {
                                client_x: position.x,
                                client_y: position.y,
                            },
                            Instant::now(),
                        ),
                        WindowEvent::Touch(Touch {
                            phase: TouchPhase::Moved,
                            location,
                            ..
                        }) => state.handle_input(
                            InputEvent::Touch {
                                touches: vec![(location.x, location.y)],
                            },
                            Instant::now(),
                        ),
                        WindowEvent::Resized(new_size) => state.resize(new_size),
                        WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                            state.rescale(scale_factor)
                        }
                        WindowEvent::RedrawRequested => match state.render(Instant::now()) {
                            Ok(_) => {}
                            Err(SurfaceError::Lost) => state.resize(state.size()),
                            Err(SurfaceError::OutOfMemory) => {
                                log::error!("surface out of memory; exiting");
                                target.exit()
                            }
                            Err(err) => log::warn!("render error: {err:?}"),
                        },
                        _ => {}
                    }
                }
                Event::AboutToWait => state.window().request_redraw(),
                _ => {}
            }
        })
        .context("running viewer application")?;
    Ok(())
}

fn run_headless(args: &Args, tuning: Tuning, mode: InputMode) -> Result<()> {
    let (width, height) = HEADLESS_VIEWPORT;
    let viewport = ViewportState::new(width, height)?;
    let start = Instant::now();
    let mut simulation = Simulation::new(tuning, mode, viewport, start)?;

    let report = headless::run_headless(&mut simulation, args.frames, start);
    log::info!(
        "headless run: {} frames ({:.2}s simulated), {} input events, {} idle resets, peak |field| {:.4}",
        report.frames,
        report.elapsed,
        report.input_events,
        report.idle_resets,
        simulation.field().max_magnitude()
    );

    if let Some(path) = args.dump_field.as_ref() {
        let stats = dump_field_to_png(simulation.texture(), path)
            .with_context(|| format!("writing field PNG to {}", path.display()))?;
        log::info!(
            "field exported to {} ({} of {} cells active, max {:.4}, mean {:.5})",
            path.display(),
            stats.active_cells,
            stats.total_cells,
            stats.max_abs,
            stats.mean_abs
        );
    }
    Ok(())
}
