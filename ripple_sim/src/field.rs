//! The displacement field: a square grid of two-channel intensities that fade
//! every frame and pick up impulses around the pointer.
//!
//! Cells are stored row-major with `index = i + size * j`, where `i` is the
//! column and `j` the row counted from the bottom edge (texture convention).
//! Pointer rows are flipped on the way in so screen-top maps to the last row.

use rand::Rng;

use crate::input::PointerSample;
use crate::tuning::{FieldUpdate, Tuning};

/// Constants consumed by a simulation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldParams {
    pub decay: f32,
    /// Squared influence radius in cells.
    pub radius_sq: f32,
    pub impulse_gain: f32,
    pub velocity_decay: f32,
}

impl FieldParams {
    pub fn from_tuning(tuning: &Tuning) -> Self {
        let radius = tuning.influence_radius();
        Self {
            decay: tuning.decay,
            radius_sq: radius * radius,
            impulse_gain: tuning.impulse_gain,
            velocity_decay: tuning.velocity_decay,
        }
    }

    /// Channel deltas for one cell. Channel B is subtracted so screen-down
    /// motion reads as a negative texture-space offset.
    fn impulse(&self, power: f32, sample: &PointerSample) -> [f32; 2] {
        [
            power * sample.vx * self.impulse_gain,
            -(power * sample.vy * self.impulse_gain),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct FieldBuffer {
    size: usize,
    params: FieldParams,
    update: FieldUpdate,
    cells: Vec<[f32; 2]>,
    // Only allocated for `FieldUpdate::DoubleBuffered`.
    back: Vec<[f32; 2]>,
}

impl FieldBuffer {
    /// A zeroed `size x size` grid.
    pub fn new(size: usize, params: FieldParams, update: FieldUpdate) -> Self {
        let back = match update {
            FieldUpdate::InPlace => Vec::new(),
            FieldUpdate::DoubleBuffered => vec![[0.0; 2]; size * size],
        };
        Self {
            size,
            params,
            update,
            cells: vec![[0.0; 2]; size * size],
            back,
        }
    }

    /// A grid whose cells start at a random intensity in `[0, 1)`, shared by
    /// both channels.
    pub fn seeded<R: Rng + ?Sized>(
        size: usize,
        params: FieldParams,
        update: FieldUpdate,
        rng: &mut R,
    ) -> Self {
        let mut field = Self::new(size, params, update);
        for cell in &mut field.cells {
            let value = rng.gen_range(0.0f32..1.0);
            *cell = [value, value];
        }
        field
    }

    pub fn from_tuning(tuning: &Tuning) -> Self {
        let params = FieldParams::from_tuning(tuning);
        if tuning.initial_noise {
            Self::seeded(tuning.grid_size, params, tuning.update, &mut rand::thread_rng())
        } else {
            Self::new(tuning.grid_size, params, tuning.update)
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cells(&self) -> &[[f32; 2]] {
        &self.cells
    }

    /// Channel pair at column `i`, row `j`.
    pub fn cell(&self, i: usize, j: usize) -> [f32; 2] {
        self.cells[i + self.size * j]
    }

    pub fn set_cell(&mut self, i: usize, j: usize, value: [f32; 2]) {
        self.cells[i + self.size * j] = value;
    }

    /// Largest absolute channel value in the grid.
    pub fn max_magnitude(&self) -> f32 {
        self.cells
            .iter()
            .flat_map(|cell| cell.iter())
            .fold(0.0f32, |acc, value| acc.max(value.abs()))
    }

    /// Pointer position in grid coordinates, rows flipped.
    pub fn grid_position(&self, sample: &PointerSample) -> (f32, f32) {
        let n = self.size as f32;
        (n * sample.x, n * (1.0 - sample.y))
    }

    /// Advance one frame: decay, inject around the pointer, then fade the
    /// pointer velocity so a single movement tapers off over later frames.
    pub fn step(&mut self, sample: &mut PointerSample) {
        match self.update {
            FieldUpdate::InPlace => {
                self.decay();
                self.inject(sample);
            }
            FieldUpdate::DoubleBuffered => self.step_double_buffered(sample),
        }
        sample.vx *= self.params.velocity_decay;
        sample.vy *= self.params.velocity_decay;
    }

    /// Multiply every channel by the decay factor.
    pub fn decay(&mut self) {
        let decay = self.params.decay;
        for cell in &mut self.cells {
            cell[0] *= decay;
            cell[1] *= decay;
        }
    }

    /// Add the pointer impulse to every cell inside the influence radius.
    pub fn inject(&mut self, sample: &PointerSample) {
        let (grid_x, grid_y) = self.grid_position(sample);
        let size = self.size;
        for j in 0..size {
            for i in 0..size {
                let Some(power) = self.falloff(grid_x, grid_y, i, j) else {
                    continue;
                };
                let cell = &mut self.cells[i + size * j];
                let [dx, dy] = self.params.impulse(power, sample);
                cell[0] += dx;
                cell[1] += dy;
            }
        }
    }

    fn step_double_buffered(&mut self, sample: &PointerSample) {
        let (grid_x, grid_y) = self.grid_position(sample);
        let size = self.size;
        let decay = self.params.decay;
        for j in 0..size {
            for i in 0..size {
                let index = i + size * j;
                let [a, b] = self.cells[index];
                let mut next = [a * decay, b * decay];
                if let Some(power) = self.falloff(grid_x, grid_y, i, j) {
                    let [dx, dy] = self.params.impulse(power, sample);
                    next[0] += dx;
                    next[1] += dy;
                }
                self.back[index] = next;
            }
        }
        std::mem::swap(&mut self.cells, &mut self.back);
    }

    /// Impulse weight for cell `(i, j)`, or `None` outside the radius.
    fn falloff(&self, grid_x: f32, grid_y: f32, i: usize, j: usize) -> Option<f32> {
        let dx = grid_x - i as f32;
        let dy = grid_y - j as f32;
        let dist_sq = dx * dx + dy * dy;
        if dist_sq >= self.params.radius_sq {
            return None;
        }
        if dist_sq == 0.0 {
            return Some(1.0);
        }
        let base = if self.params.radius_sq / dist_sq < 1.0 {
            1.0
        } else {
            dist_sq
        };
        Some(base.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    const EPSILON: f32 = 1e-6;

    fn params(size: usize) -> FieldParams {
        FieldParams::from_tuning(&Tuning {
            grid_size: size,
            ..Tuning::default()
        })
    }

    fn moving(x: f32, y: f32, vx: f32, vy: f32) -> PointerSample {
        PointerSample { x, y, vx, vy }
    }

    #[test]
    fn params_follow_tuning() {
        let params = params(128);
        let radius = 128.0f32 / 18.0;
        assert!((params.radius_sq - radius * radius).abs() < EPSILON);
        assert_eq!(params.decay, 0.98);
        assert_eq!(params.impulse_gain, 5.0);
        assert_eq!(params.velocity_decay, 0.9);
    }

    #[test]
    fn centre_cell_uses_unit_power() {
        let mut field = FieldBuffer::new(128, params(128), FieldUpdate::InPlace);
        let mut sample = moving(0.5, 0.5, 0.1, 0.2);
        field.step(&mut sample);

        let [a, b] = field.cell(64, 64);
        assert!((a - 0.5).abs() < EPSILON);
        assert!((b + 1.0).abs() < EPSILON);
    }

    #[test]
    fn power_grows_with_distance_inside_radius() {
        let mut field = FieldBuffer::new(128, params(128), FieldUpdate::InPlace);
        let mut sample = moving(0.5, 0.5, 0.1, 0.0);
        field.step(&mut sample);

        // Three cells to the right: d = 3, power = 3.
        let [a, _] = field.cell(67, 64);
        assert!((a - 3.0 * 0.1 * 5.0).abs() < EPSILON, "{a}");
        // (65, 65): d = sqrt(2).
        let [a, _] = field.cell(65, 65);
        assert!((a - 2.0f32.sqrt() * 0.5).abs() < EPSILON, "{a}");
    }

    #[test]
    fn vertical_flip_maps_screen_top_to_last_rows() {
        let mut field = FieldBuffer::new(64, params(64), FieldUpdate::InPlace);
        let sample = moving(0.25, 0.0, 0.0, 0.0);
        assert_eq!(field.grid_position(&sample), (16.0, 64.0));

        let mut sample = moving(0.25, 0.0, 0.0, 0.1);
        field.step(&mut sample);
        assert!(field.cell(16, 63)[1] < 0.0);
        assert_eq!(field.cell(16, 0), [0.0, 0.0]);
    }

    #[test]
    fn velocity_decays_after_each_step() {
        let mut field = FieldBuffer::new(32, params(32), FieldUpdate::InPlace);
        let mut sample = moving(0.5, 0.5, 1.0, -1.0);
        field.step(&mut sample);
        field.step(&mut sample);
        assert!((sample.vx - 0.81).abs() < EPSILON);
        assert!((sample.vy + 0.81).abs() < EPSILON);
    }

    #[test]
    fn still_pointer_only_decays() {
        let mut field = FieldBuffer::new(16, params(16), FieldUpdate::InPlace);
        field.set_cell(3, 4, [1.0, -2.0]);
        let mut sample = moving(0.2, 0.7, 0.0, 0.0);
        field.step(&mut sample);
        let [a, b] = field.cell(3, 4);
        assert!((a - 0.98).abs() < EPSILON);
        assert!((b + 1.96).abs() < EPSILON);
    }

    #[test]
    fn seeded_cells_share_one_value_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let field = FieldBuffer::seeded(8, params(8), FieldUpdate::InPlace, &mut rng);
        assert!(field.cells().iter().any(|cell| cell[0] > 0.0));
        for cell in field.cells() {
            assert_eq!(cell[0], cell[1]);
            assert!((0.0..1.0).contains(&cell[0]));
        }
    }

    #[test]
    fn double_buffered_matches_in_place() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut in_place = FieldBuffer::seeded(48, params(48), FieldUpdate::InPlace, &mut rng);
        let mut buffered = in_place.clone();
        buffered.update = FieldUpdate::DoubleBuffered;
        buffered.back = vec![[0.0; 2]; 48 * 48];

        let mut a = moving(0.3, 0.6, 0.05, -0.02);
        let mut b = a;
        for frame in 0..12 {
            if frame == 5 {
                a.x = 0.7;
                b.x = 0.7;
            }
            in_place.step(&mut a);
            buffered.step(&mut b);
        }

        assert_eq!(in_place.cells(), buffered.cells());
        assert_eq!(a, b);
    }

    #[test]
    fn max_magnitude_tracks_largest_channel() {
        let mut field = FieldBuffer::new(4, params(4), FieldUpdate::InPlace);
        assert_eq!(field.max_magnitude(), 0.0);
        field.set_cell(1, 2, [0.25, -0.75]);
        assert_eq!(field.max_magnitude(), 0.75);
    }
}
