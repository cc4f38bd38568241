use std::{borrow::Cow, sync::Arc};

use super::super::shaders::{
    FrameUniforms, QUAD_INDICES, QUAD_VERTICES, QuadVertex, SHADER_SOURCE,
};
use super::layout;
use super::ViewerState;
use anyhow::{Context, Result};
use bytemuck::cast_slice;
use ripple_sim::Simulation;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::projection::Projection;
use crate::texture::{BackgroundImage, check_texture_extent, prepare_upload};

/// Bundles the wgpu objects tied to the viewer window.
struct WgpuBootstrap {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_format: wgpu::TextureFormat,
    present_mode: wgpu::PresentMode,
    alpha_mode: wgpu::CompositeAlphaMode,
}

/// Background plate, field texture, uniforms, and the bind group tying them together.
struct TextureResources {
    background: wgpu::Texture,
    field: wgpu::Texture,
    uniform_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

struct RenderResources {
    pipeline: wgpu::RenderPipeline,
    quad_vertex_buffer: wgpu::Buffer,
    quad_index_buffer: wgpu::Buffer,
    quad_index_count: u32,
}

/// Bootstraps wgpu, uploads the background plate, allocates the field texture,
/// and sizes the simulation to the configured surface before the first frame.
pub(super) async fn new(
    window: Arc<Window>,
    background: BackgroundImage,
    mut simulation: Simulation,
) -> Result<ViewerState> {
    let size = window.inner_size();
    let render_scale = layout::render_scale(
        window.scale_factor(),
        simulation.tuning().max_pixel_ratio,
    );
    let surface_size = layout::surface_size(size, render_scale);

    let wgpu = bootstrap_wgpu(window.clone()).await?;

    let max_dimension = wgpu.device.limits().max_texture_dimension_2d;
    let field_size = u32::try_from(simulation.texture().size())
        .context("field grid does not fit a texture extent")?;
    check_texture_extent("field grid", field_size, field_size, max_dimension)?;
    check_texture_extent(
        "background image",
        background.width,
        background.height,
        max_dimension,
    )?;

    simulation
        .resize(surface_size.width, surface_size.height)
        .context("sizing simulation viewport to the surface")?;
    let projection = Projection::new(simulation.viewport().aspect());

    log::info!(
        "background {}x{}, field {}x{}, surface {}x{} (scale {:.2})",
        background.width,
        background.height,
        simulation.texture().size(),
        simulation.texture().size(),
        surface_size.width,
        surface_size.height,
        render_scale
    );

    let initial_uniforms = FrameUniforms::new(
        projection.to_cols_array_2d(),
        simulation.resolution(),
        0.0,
        simulation.tuning().distortion_strength,
    );
    let textures = create_texture_resources(
        &wgpu.device,
        &wgpu.queue,
        &background,
        field_size,
        &initial_uniforms,
    )?;
    let render = create_render_resources(
        &wgpu.device,
        &textures.bind_group_layout,
        wgpu.surface_format,
    );

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format: wgpu.surface_format,
        width: surface_size.width,
        height: surface_size.height,
        present_mode: wgpu.present_mode,
        alpha_mode: wgpu.alpha_mode,
        view_formats: vec![],
        desired_maximum_frame_latency: 1,
    };

    let state = ViewerState {
        window,
        surface: wgpu.surface,
        device: wgpu.device,
        queue: wgpu.queue,
        config,
        size,
        render_scale,
        pipeline: render.pipeline,
        quad_vertex_buffer: render.quad_vertex_buffer,
        quad_index_buffer: render.quad_index_buffer,
        quad_index_count: render.quad_index_count,
        uniform_buffer: textures.uniform_buffer,
        bind_group: textures.bind_group,
        field_texture: textures.field,
        _background_texture: textures.background,
        projection,
        simulation,
    };

    state.surface.configure(&state.device, &state.config);
    Ok(state)
}

async fn bootstrap_wgpu(window: Arc<Window>) -> Result<WgpuBootstrap> {
    let instance = wgpu::Instance::default();
    let surface = instance
        .create_surface(window)
        .context("creating wgpu surface")?;

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: Some(&surface),
        })
        .await
        .context("requesting wgpu adapter")?;

    let info = adapter.get_info();
    log::info!(
        "adapter {} ({:?}, {:?})",
        info.name,
        info.backend,
        info.device_type
    );

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("ripple-viewer-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        )
        .await
        .context("requesting wgpu device")?;

    let surface_caps = surface.get_capabilities(&adapter);
    let surface_format = surface_caps
        .formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .or_else(|| surface_caps.formats.first().copied())
        .context("surface reports no texture formats")?;
    let present_mode = surface_caps
        .present_modes
        .iter()
        .copied()
        .find(|mode| *mode == wgpu::PresentMode::Mailbox)
        .unwrap_or(wgpu::PresentMode::Fifo);
    let alpha_mode = surface_caps
        .alpha_modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Opaque);
    log::info!("surface format {surface_format:?}, present mode {present_mode:?}");

    Ok(WgpuBootstrap {
        surface,
        device,
        queue,
        surface_format,
        present_mode,
        alpha_mode,
    })
}

fn create_texture_resources(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    background: &BackgroundImage,
    field_size: u32,
    initial_uniforms: &FrameUniforms,
) -> Result<TextureResources> {
    let background_extent = wgpu::Extent3d {
        width: background.width,
        height: background.height,
        depth_or_array_layers: 1,
    };
    let background_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("ripple-background-texture"),
        size: background_extent,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let background_view = background_texture.create_view(&wgpu::TextureViewDescriptor::default());
    let background_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("ripple-background-sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    let upload = prepare_upload(background.width, background.height, 4, &background.data)?;
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &background_texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        upload.pixels(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(upload.bytes_per_row()),
            rows_per_image: Some(background.height),
        },
        background_extent,
    );

    // Rgba32Float is not filterable without an extra feature; cells are read nearest.
    let field_texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("ripple-field-texture"),
        size: wgpu::Extent3d {
            width: field_size,
            height: field_size,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba32Float,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let field_view = field_texture.create_view(&wgpu::TextureViewDescriptor::default());
    let field_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("ripple-field-sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    });

    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("ripple-frame-uniforms"),
        contents: cast_slice(std::slice::from_ref(initial_uniforms)),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("ripple-bind-group-layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
                count: None,
            },
        ],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("ripple-bind-group"),
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&background_view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&background_sampler),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&field_view),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::Sampler(&field_sampler),
            },
        ],
    });

    Ok(TextureResources {
        background: background_texture,
        field: field_texture,
        uniform_buffer,
        bind_group_layout,
        bind_group,
    })
}

fn create_render_resources(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    surface_format: wgpu::TextureFormat,
) -> RenderResources {
    let quad_vertex_layout = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
    };

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("ripple-shader"),
        source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(SHADER_SOURCE)),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("ripple-pipeline-layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("ripple-pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[quad_vertex_layout],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    });

    let quad_vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("ripple-quad-vertex-buffer"),
        contents: cast_slice(&QUAD_VERTICES),
        usage: wgpu::BufferUsages::VERTEX,
    });
    let quad_index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("ripple-quad-index-buffer"),
        contents: cast_slice(&QUAD_INDICES),
        usage: wgpu::BufferUsages::INDEX,
    });

    RenderResources {
        pipeline,
        quad_vertex_buffer,
        quad_index_buffer,
        quad_index_count: QUAD_INDICES.len() as u32,
    }
}
