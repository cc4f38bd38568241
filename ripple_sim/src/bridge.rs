//! CPU-side staging for the field texture. Each sync copies the two channels
//! into an RGBA float image (R = A, G = B, B unused, alpha opaque) and flags
//! it for upload. Values pass through untouched.

use crate::field::FieldBuffer;

pub const UNUSED_CHANNEL: f32 = 0.0;
pub const OPAQUE_ALPHA: f32 = 1.0;

#[derive(Debug, Clone)]
pub struct FieldTexture {
    size: usize,
    pixels: Vec<[f32; 4]>,
    dirty: bool,
}

impl FieldTexture {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            pixels: vec![[0.0, 0.0, UNUSED_CHANNEL, OPAQUE_ALPHA]; size * size],
            dirty: true,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Rows in field order (row 0 is the bottom edge).
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Copy the latest field state and mark the image for re-upload.
    pub fn sync(&mut self, field: &FieldBuffer) {
        debug_assert_eq!(field.size(), self.size, "field and texture sizes differ");
        for (pixel, cell) in self.pixels.iter_mut().zip(field.cells()) {
            pixel[0] = cell[0];
            pixel[1] = cell[1];
        }
        self.dirty = true;
    }

    /// Clear the dirty flag, returning whether an upload is due.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }
}
