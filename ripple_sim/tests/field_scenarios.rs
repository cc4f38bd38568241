use std::time::{Duration, Instant};

use rand::{SeedableRng, rngs::StdRng};
use ripple_sim::{
    FieldBuffer, FieldParams, FieldUpdate, InputEvent, InputMode, PointerSample, Simulation,
    Tuning, ViewportState,
};

const GRID: usize = 128;

fn params() -> FieldParams {
    FieldParams::from_tuning(&Tuning::default())
}

fn still(x: f32, y: f32) -> PointerSample {
    PointerSample {
        x,
        y,
        vx: 0.0,
        vy: 0.0,
    }
}

#[test]
fn field_decays_geometrically_without_impulses() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let mut field = FieldBuffer::seeded(GRID, params(), FieldUpdate::InPlace, &mut rng);
    let initial: Vec<[f32; 2]> = field.cells().to_vec();
    let mut pointer = still(0.5, 0.5);

    for frame in 1..=120 {
        field.step(&mut pointer);
        let bound = 0.98f32.powi(frame) * (1.0 + 1e-4);
        for (cell, start) in field.cells().iter().zip(&initial) {
            for channel in 0..2 {
                assert!(
                    cell[channel].abs() <= start[channel].abs() * bound,
                    "frame {frame}: {} exceeds {} * {bound}",
                    cell[channel],
                    start[channel]
                );
            }
        }
    }

    for _ in 0..2000 {
        field.decay();
    }
    assert!(field.max_magnitude() < 1e-12);
}

#[test]
fn impulse_leaves_cells_outside_radius_untouched() {
    let mut rng = StdRng::seed_from_u64(42);
    let seeded = FieldBuffer::seeded(GRID, params(), FieldUpdate::InPlace, &mut rng);

    let mut decayed_only = seeded.clone();
    decayed_only.decay();

    let mut impulsed = seeded;
    let mut pointer = PointerSample {
        x: 0.3,
        y: 0.6,
        vx: 0.2,
        vy: -0.15,
    };
    let (gx, gy) = impulsed.grid_position(&pointer);
    impulsed.step(&mut pointer);

    let radius_sq = params().radius_sq;
    let mut touched = 0;
    for j in 0..GRID {
        for i in 0..GRID {
            let dx = gx - i as f32;
            let dy = gy - j as f32;
            if dx * dx + dy * dy >= radius_sq {
                assert_eq!(impulsed.cell(i, j), decayed_only.cell(i, j), "cell ({i}, {j})");
            } else if impulsed.cell(i, j) != decayed_only.cell(i, j) {
                touched += 1;
            }
        }
    }
    assert!(touched > 0, "impulse did not reach any cell");
}

#[test]
fn single_impulse_fades_by_decay_power() {
    let mut field = FieldBuffer::new(GRID, params(), FieldUpdate::InPlace);
    let mut pointer = PointerSample {
        x: 0.5,
        y: 0.5,
        vx: 0.1,
        vy: 0.0,
    };
    field.step(&mut pointer);

    let (gx, gy) = field.grid_position(&pointer);
    let (ci, cj) = (gx as usize, gy as usize);
    let injected = field.cell(ci, cj)[0];
    assert!((injected - 0.5).abs() < 1e-6, "injected {injected}");

    for _ in 0..50 {
        field.decay();
    }

    let expected = injected * 0.98f32.powi(50);
    let actual = field.cell(ci, cj)[0];
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn single_impulse_fades_through_simulation_ticks() {
    let start = Instant::now();
    let tuning = Tuning {
        initial_noise: false,
        ..Tuning::default()
    };
    let viewport = ViewportState::new(1000, 1000).expect("viewport");
    let mut sim =
        Simulation::new(tuning, InputMode::Pointer, viewport, start).expect("simulation");
    let at = |client_x: f64| InputEvent::Pointer {
        client_x,
        client_y: 500.0,
    };

    // 0.4 -> 0.5 gives vx = 0.1, vy = 0 with the pointer on the centre cell.
    sim.handle_input(&at(400.0), start);
    sim.handle_input(&at(500.0), start);
    sim.tick(start);
    let centre = GRID / 2;
    let injected = sim.field().cell(centre, centre)[0];
    assert!((injected - 0.5).abs() < 1e-6, "injected {injected}");

    // Same position again: zero velocity, so later ticks only decay.
    sim.handle_input(&at(500.0), start);
    assert_eq!((sim.pointer().vx, sim.pointer().vy), (0.0, 0.0));
    for frame in 1..=50u64 {
        let state = sim.tick(start + Duration::from_millis(16 * frame));
        assert!(!state.idle_reset);
    }

    let expected = injected * 0.98f32.powi(50);
    let actual = sim.field().cell(centre, centre)[0];
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
    let texel = sim.texture().pixels()[centre + GRID * centre];
    assert_eq!(texel[0], actual);
}

#[test]
fn simulation_follows_pointer_then_relaxes_after_idle() {
    let start = Instant::now();
    let tuning = Tuning {
        initial_noise: false,
        ..Tuning::default()
    };
    let viewport = ViewportState::new(1000, 1000).expect("viewport");
    let mut sim =
        Simulation::new(tuning, InputMode::Pointer, viewport, start).expect("simulation");

    for step in 0..10 {
        let event = InputEvent::Pointer {
            client_x: 300.0 + 40.0 * step as f64,
            client_y: 500.0,
        };
        let now = start + Duration::from_millis(16 * step);
        sim.handle_input(&event, now);
        sim.tick(now);
    }
    let peak = sim.field().max_magnitude();
    assert!(peak > 0.0);

    let mut now = start + Duration::from_millis(160);
    let mut resets = 0;
    for _ in 0..600 {
        now += Duration::from_millis(16);
        if sim.tick(now).idle_reset {
            resets += 1;
        }
    }

    assert_eq!(resets, 1);
    assert_eq!((sim.pointer().x, sim.pointer().y), (0.0, 0.0));
    assert!(sim.field().max_magnitude() < peak * 1e-3);
}
