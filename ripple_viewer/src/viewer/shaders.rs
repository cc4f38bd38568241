use bytemuck::{Pod, Zeroable};

/// Plate shader. UVs are bottom-up to match the field rows; the background is
/// stored top-down, so its lookup flips v after the cover-fit.
pub(super) const SHADER_SOURCE: &str = r#"
struct Frame {
    view_proj: mat4x4<f32>,
    resolution: vec4<f32>,
    time: f32,
    distortion: f32,
    _padding: vec2<f32>,
};

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> frame: Frame;
@group(0) @binding(1)
var background_texture: texture_2d<f32>;
@group(0) @binding(2)
var background_sampler: sampler;
@group(0) @binding(3)
var field_texture: texture_2d<f32>;
@group(0) @binding(4)
var field_sampler: sampler;

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.position = frame.view_proj * vec4<f32>(input.position, 0.0, 1.0);
    out.uv = input.uv;
    return out;
}

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    let offset = textureSample(field_texture, field_sampler, input.uv).xy;
    let displaced = input.uv + offset * frame.distortion;
    let cover = (displaced - vec2<f32>(0.5, 0.5)) * frame.resolution.zw + vec2<f32>(0.5, 0.5);
    return textureSample(background_texture, background_sampler, vec2<f32>(cover.x, 1.0 - cover.y));
}
"#;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

/// Unit plane centred on the origin; the projection stretches it to the window.
pub(super) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-0.5, 0.5],
        uv: [0.0, 1.0],
    },
    QuadVertex {
        position: [0.5, 0.5],
        uv: [1.0, 1.0],
    },
    QuadVertex {
        position: [-0.5, -0.5],
        uv: [0.0, 0.0],
    },
    QuadVertex {
        position: [0.5, -0.5],
        uv: [1.0, 0.0],
    },
];

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

/// Mirrors the WGSL `Frame` block, padded to a 16-byte multiple.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(super) struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub resolution: [f32; 4],
    pub time: f32,
    pub distortion: f32,
    pub _padding: [f32; 2],
}

impl FrameUniforms {
    pub fn new(view_proj: [[f32; 4]; 4], resolution: [f32; 4], time: f32, distortion: f32) -> Self {
        Self {
            view_proj,
            resolution,
            time,
            distortion,
            _padding: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_uniforms_match_wgsl_layout() {
        assert_eq!(std::mem::size_of::<FrameUniforms>(), 96);
        assert_eq!(std::mem::size_of::<FrameUniforms>() % 16, 0);
        let uniforms = FrameUniforms::new([[0.0; 4]; 4], [1.0, 2.0, 3.0, 4.0], 5.0, 6.0);
        let floats: &[f32] = bytemuck::cast_slice(std::slice::from_ref(&uniforms));
        assert_eq!(&floats[16..22], &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn quad_uvs_run_bottom_up() {
        let top_left = QUAD_VERTICES[0];
        let bottom_left = QUAD_VERTICES[2];
        assert!(top_left.position[1] > bottom_left.position[1]);
        assert_eq!(top_left.uv[1], 1.0);
        assert_eq!(bottom_left.uv[1], 0.0);
    }

    #[test]
    fn shader_declares_uniform_contract() {
        for needle in [
            "resolution: vec4<f32>",
            "time: f32",
            "var background_texture",
            "var field_texture",
            "fn vs_main",
            "fn fs_main",
        ] {
            assert!(SHADER_SOURCE.contains(needle), "missing {needle}");
        }
    }
}
