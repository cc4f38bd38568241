//! Windowless driver: feeds a scripted pointer sweep through the simulation on
//! a synthetic 60 Hz clock so runs are reproducible without a display.

use std::{
    f64::consts::TAU,
    time::{Duration, Instant},
};

use ripple_sim::{InputEvent, InputMode, Simulation};

pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Fraction of the run spent moving; the rest lets the field settle.
const SWEEP_SHARE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessReport {
    pub frames: u32,
    pub input_events: u32,
    pub idle_resets: u32,
    pub elapsed: f32,
}

/// Pointer position in client pixels for `frame` of a `frames`-long run, or
/// `None` once the sweep is over. The path crosses the viewport left to right
/// along one period of a sine wave.
pub fn sweep_position(frame: u32, frames: u32, width: u32, height: u32) -> Option<(f64, f64)> {
    let sweep_frames = ((frames as f64 * SWEEP_SHARE).ceil() as u32).max(1);
    if frame >= sweep_frames {
        return None;
    }
    let t = frame as f64 / sweep_frames as f64;
    let x = t * width as f64;
    let y = height as f64 * (0.5 - 0.25 * (t * TAU).sin());
    Some((x, y))
}

fn sweep_event(mode: InputMode, x: f64, y: f64) -> InputEvent {
    match mode {
        InputMode::Pointer => InputEvent::Pointer {
            client_x: x,
            client_y: y,
        },
        InputMode::Touch => InputEvent::Touch {
            touches: vec![(x, y)],
        },
    }
}

pub fn run_headless(simulation: &mut Simulation, frames: u32, start: Instant) -> HeadlessReport {
    let viewport = simulation.viewport();
    let mode = simulation.input_mode();
    let mut report = HeadlessReport {
        frames: 0,
        input_events: 0,
        idle_resets: 0,
        elapsed: 0.0,
    };

    for frame in 0..frames {
        let now = start + FRAME_INTERVAL * frame;
        if let Some((x, y)) = sweep_position(frame, frames, viewport.width(), viewport.height()) {
            if simulation.handle_input(&sweep_event(mode, x, y), now) {
                report.input_events += 1;
            }
        }
        let state = simulation.tick(now);
        if state.idle_reset {
            log::debug!("headless idle reset at frame {}", state.frame);
            report.idle_resets += 1;
        }
        report.frames += 1;
        report.elapsed = state.elapsed;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_sim::{Tuning, ViewportState};

    fn simulation(mode: InputMode, start: Instant) -> Simulation {
        let tuning = Tuning {
            initial_noise: false,
            ..Tuning::default()
        };
        let viewport = ViewportState::new(640, 480).expect("viewport");
        Simulation::new(tuning, mode, viewport, start).expect("simulation")
    }

    #[test]
    fn sweep_stays_inside_viewport_then_stops() {
        let frames = 40;
        for frame in 0..20 {
            let (x, y) = sweep_position(frame, frames, 640, 480).expect("sweeping");
            assert!((0.0..640.0).contains(&x), "x {x}");
            assert!((0.0..=480.0).contains(&y), "y {y}");
        }
        assert_eq!(sweep_position(20, frames, 640, 480), None);
        assert_eq!(sweep_position(0, 1, 640, 480), Some((0.0, 240.0)));
    }

    #[test]
    fn sweep_disturbs_the_field() {
        let start = Instant::now();
        let mut sim = simulation(InputMode::Pointer, start);
        let report = run_headless(&mut sim, 30, start);
        assert_eq!(report.frames, 30);
        assert_eq!(report.input_events, 15);
        assert!(sim.field().max_magnitude() > 0.0);
        assert!((report.elapsed - 29.0 * 0.016).abs() < 1e-4);
    }

    #[test]
    fn long_runs_fire_a_single_idle_reset() {
        let start = Instant::now();
        let mut sim = simulation(InputMode::Pointer, start);
        // 120 moving frames (~1.9 s), then ~1.9 s still: one 1.5 s idle window.
        let report = run_headless(&mut sim, 240, start);
        assert_eq!(report.idle_resets, 1);
        assert_eq!((sim.pointer().x, sim.pointer().y), (0.0, 0.0));
    }

    #[test]
    fn touch_sessions_receive_touch_events() {
        let start = Instant::now();
        let mut sim = simulation(InputMode::Touch, start);
        let report = run_headless(&mut sim, 10, start);
        assert_eq!(report.input_events, 5);
        assert!(sim.field().max_magnitude() > 0.0);
    }
}
