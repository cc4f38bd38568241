use std::{
    borrow::Cow,
    fs::{self, File},
    path::Path,
};

use anyhow::{Context, Result, anyhow, ensure};
use image::{ColorType, ImageEncoder, codecs::png::PngEncoder};
use ripple_sim::FieldTexture;

/// Decoded background plate in RGBA8, rows top-down.
#[derive(Debug, Clone)]
pub struct BackgroundImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl BackgroundImage {
    pub fn aspect(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

pub fn load_background(path: &Path) -> Result<BackgroundImage> {
    let decoded = image::open(path).with_context(|| format!("decoding {}", path.display()))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    ensure!(width > 0 && height > 0, "{} has no pixels", path.display());
    Ok(BackgroundImage {
        data: rgba.into_raw(),
        width,
        height,
    })
}

/// Diagonal gradient with a light grid so the displacement stays visible
/// without an asset on disk.
pub fn generate_placeholder_background(width: u32, height: u32) -> BackgroundImage {
    const GRID_STEP: u32 = 64;
    let mut data = vec![0u8; width as usize * height as usize * 4];
    for (idx, pixel) in data.chunks_mut(4).enumerate() {
        let x = (idx % width as usize) as u32;
        let y = (idx / width as usize) as u32;
        let fx = x as f32 / width.max(1) as f32;
        let fy = y as f32 / height.max(1) as f32;
        let on_grid = x % GRID_STEP == 0 || y % GRID_STEP == 0;
        let lift = if on_grid { 70.0 } else { 0.0 };
        pixel[0] = (40.0 + 150.0 * fx + lift).min(255.0) as u8;
        pixel[1] = (60.0 + 120.0 * (1.0 - fy) + lift).min(255.0) as u8;
        pixel[2] = (120.0 + 100.0 * fy + lift).min(255.0) as u8;
        pixel[3] = 0xFF;
    }
    BackgroundImage {
        data,
        width,
        height,
    }
}

/// Errors when either side exceeds the device's 2D texture limit.
pub fn check_texture_extent(label: &str, width: u32, height: u32, max_dimension: u32) -> Result<()> {
    ensure!(
        width <= max_dimension && height <= max_dimension,
        "{label} is {width}x{height}, above the device texture limit of {max_dimension}"
    );
    Ok(())
}

pub struct TextureUpload<'a> {
    data: Cow<'a, [u8]>,
    bytes_per_row: u32,
}

impl<'a> TextureUpload<'a> {
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.bytes_per_row
    }
}

/// Pads rows to `COPY_BYTES_PER_ROW_ALIGNMENT` when needed; tightly packed,
/// aligned data is borrowed as-is.
pub fn prepare_upload<'a>(
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
    data: &'a [u8],
) -> Result<TextureUpload<'a>> {
    ensure!(width > 0 && height > 0, "texture has no dimensions");
    let row_bytes = bytes_per_pixel * width as usize;
    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    ensure!(
        data.len() >= row_bytes * height as usize,
        "texture buffer ({}) smaller than {}x{} at {} bytes per pixel ({})",
        data.len(),
        width,
        height,
        bytes_per_pixel,
        row_bytes * height as usize
    );

    if row_bytes % alignment == 0 && data.len() == row_bytes * height as usize {
        return Ok(TextureUpload {
            data: Cow::Borrowed(data),
            bytes_per_row: row_bytes as u32,
        });
    }

    let padded_row_bytes = row_bytes.div_ceil(alignment) * alignment;
    let mut buffer = vec![0u8; padded_row_bytes * height as usize];
    for row in 0..height as usize {
        let src_offset = row * row_bytes;
        let dst_offset = row * padded_row_bytes;
        buffer[dst_offset..dst_offset + row_bytes]
            .copy_from_slice(&data[src_offset..src_offset + row_bytes]);
    }

    Ok(TextureUpload {
        data: Cow::Owned(buffer),
        bytes_per_row: padded_row_bytes as u32,
    })
}

/// Summary of a field snapshot, logged alongside dumps.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldStats {
    pub max_abs: f32,
    pub mean_abs: f32,
    pub active_cells: usize,
    pub total_cells: usize,
}

/// Magnitudes below this count as settled.
const ACTIVE_THRESHOLD: f32 = 1e-3;

pub fn compute_field_stats(texture: &FieldTexture) -> FieldStats {
    let mut max_abs = 0.0f32;
    let mut sum_abs = 0.0f64;
    let mut active_cells = 0usize;
    for pixel in texture.pixels() {
        let magnitude = pixel[0].abs().max(pixel[1].abs());
        max_abs = max_abs.max(magnitude);
        sum_abs += magnitude as f64;
        if magnitude >= ACTIVE_THRESHOLD {
            active_cells += 1;
        }
    }
    let total_cells = texture.pixels().len();
    let mean_abs = if total_cells == 0 {
        0.0
    } else {
        (sum_abs / total_cells as f64) as f32
    };
    FieldStats {
        max_abs,
        mean_abs,
        active_cells,
        total_cells,
    }
}

/// Maps the signed channels around mid-grey (R = A, G = B) scaled by the
/// largest magnitude, flipping rows so the image reads like the screen.
pub fn field_preview_rgba(texture: &FieldTexture) -> Vec<u8> {
    let size = texture.size();
    let scale = compute_field_stats(texture).max_abs.max(f32::EPSILON);
    let to_byte = |value: f32| ((value / scale) * 127.5 + 127.5).clamp(0.0, 255.0) as u8;

    let mut rgba = vec![0u8; size * size * 4];
    for row in 0..size {
        let src_row = size - 1 - row;
        for col in 0..size {
            let pixel = texture.pixels()[col + size * src_row];
            let dst = (col + size * row) * 4;
            rgba[dst] = to_byte(pixel[0]);
            rgba[dst + 1] = to_byte(pixel[1]);
            rgba[dst + 2] = 0x80;
            rgba[dst + 3] = 0xFF;
        }
    }
    rgba
}

pub fn dump_field_to_png(texture: &FieldTexture, destination: &Path) -> Result<FieldStats> {
    if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let size = u32::try_from(texture.size()).map_err(|_| anyhow!("field too large to export"))?;
    export_rgba_to_png(destination, size, size, &field_preview_rgba(texture))?;
    Ok(compute_field_stats(texture))
}

fn export_rgba_to_png(path: &Path, width: u32, height: u32, data: &[u8]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let encoder = PngEncoder::new(file);
    encoder
        .write_image(data, width, height, ColorType::Rgba8)
        .with_context(|| format!("writing PNG to {}", path.display()))?;
    Ok(())
}
