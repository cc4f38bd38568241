use std::time::Instant;

use super::super::shaders::FrameUniforms;
use super::ViewerState;
use bytemuck::cast_slice;
use wgpu::SurfaceError;

use crate::texture::prepare_upload;

/// Bytes per RGBA32F texel.
const FIELD_TEXEL_BYTES: usize = 16;

/// One frame: advance the simulation, push the field and uniforms, draw the plate.
pub(super) fn render(state: &mut ViewerState, now: Instant) -> Result<(), SurfaceError> {
    let frame_state = state.simulation.tick(now);
    if frame_state.idle_reset {
        log::debug!("idle reset at frame {}", frame_state.frame);
    }

    upload_field(state);

    let uniforms = FrameUniforms::new(
        state.projection.to_cols_array_2d(),
        frame_state.resolution,
        frame_state.elapsed,
        state.simulation.tuning().distortion_strength,
    );
    state
        .queue
        .write_buffer(&state.uniform_buffer, 0, cast_slice(&[uniforms]));

    let frame = state.surface.get_current_texture()?;
    let view = frame
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());
    let mut encoder = state
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("ripple-viewer-encoder"),
        });

    draw_plate(state, &view, &mut encoder);

    state.queue.submit(std::iter::once(encoder.finish()));
    frame.present();
    Ok(())
}

fn upload_field(state: &mut ViewerState) {
    let texture = state.simulation.texture_mut();
    if !texture.take_dirty() {
        return;
    }
    let size = texture.size() as u32;
    let bytes: &[u8] = cast_slice(texture.pixels());
    let upload = match prepare_upload(size, size, FIELD_TEXEL_BYTES, bytes) {
        Ok(upload) => upload,
        Err(err) => {
            log::error!("field upload skipped: {err:?}");
            return;
        }
    };
    state.queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &state.field_texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        upload.pixels(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(upload.bytes_per_row()),
            rows_per_image: Some(size),
        },
        wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
    );
}

fn draw_plate(state: &ViewerState, view: &wgpu::TextureView, encoder: &mut wgpu::CommandEncoder) {
    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("ripple-viewer-pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    rpass.set_pipeline(&state.pipeline);
    rpass.set_bind_group(0, &state.bind_group, &[]);
    rpass.set_vertex_buffer(0, state.quad_vertex_buffer.slice(..));
    rpass.set_index_buffer(state.quad_index_buffer.slice(..), wgpu::IndexFormat::Uint16);
    rpass.draw_indexed(0..state.quad_index_count, 0, 0..1);
}
