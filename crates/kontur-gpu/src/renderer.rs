use std::sync::Arc;

use wgpu::util::DeviceExt;

use kontur_core::{KonturError, KonturResult, PixelBuffer};

use crate::context::GpuContext;
use crate::effect::{EffectKind, PROGRAM_COUNT};

const FULLSCREEN_SHADER: &str = include_str!("shaders/fullscreen.wgsl");
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct Vertex {
    position: [f32; 2],
    uv: [f32; 2],
}

// Full-screen quad as a 4-vertex triangle strip, uv origin top-left.
const VERTICES: &[Vertex] = &[
    Vertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    Vertex { position: [1.0, -1.0], uv: [1.0, 1.0] },
    Vertex { position: [-1.0, 1.0], uv: [0.0, 0.0] },
    Vertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
];

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct EffectUniforms {
    resolution: [f32; 2],
    _pad: [f32; 2],
}

struct RendererState {
    gpu: Arc<GpuContext>,
    width: u32,
    height: u32,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    /// Fixed pipeline table indexed by [`EffectKind::slot`]. A slot stays
    /// `None` when its program failed to compile.
    pipelines: [Option<wgpu::RenderPipeline>; PROGRAM_COUNT],
    /// The "main" texture slot, bound together with the sampler and the
    /// effect uniforms. Replaced wholesale by each `load_texture` call.
    main_texture: Option<wgpu::BindGroup>,
}

/// Offscreen effect renderer.
///
/// Owns every GPU resource it creates. [`ShaderRenderer::dispose`]
/// releases them all at once; afterwards every other method fails with
/// [`KonturError::Disposed`]. Dropping the renderer disposes it too, so
/// resources are released on every exit path.
pub struct ShaderRenderer {
    state: Option<RendererState>,
}

impl ShaderRenderer {
    /// Create a renderer targeting a `width` x `height` offscreen texture.
    ///
    /// No effect programs exist yet; call [`ShaderRenderer::compile_effects`]
    /// before rendering anything other than `Original`.
    pub fn new(gpu: Arc<GpuContext>, width: u32, height: u32) -> KonturResult<Self> {
        if width == 0 || height == 0 {
            return Err(KonturError::config(format!(
                "render target dimensions must be non-zero, got {width}x{height}"
            )));
        }

        let device = &gpu.device;
        let (target, target_view) = create_target(device, width, height);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("kontur_quad_vertices"),
            contents: bytemuck::cast_slice(VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let uniforms = EffectUniforms {
            resolution: [width as f32, height as f32],
            _pad: [0.0; 2],
        };
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("kontur_effect_uniforms"),
            contents: bytemuck::cast_slice(&[uniforms]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kontur_effect_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kontur_effect_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("kontur_main_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Ok(Self {
            state: Some(RendererState {
                gpu,
                width,
                height,
                target,
                target_view,
                vertex_buffer,
                uniform_buffer,
                bind_group_layout,
                pipeline_layout,
                sampler,
                pipelines: [None, None, None],
                main_texture: None,
            }),
        })
    }

    /// Compile the shared vertex program and all fragment-effect programs.
    ///
    /// Returns the set of effects whose programs built successfully. A
    /// fragment program that fails to compile is logged and left out of
    /// the set without affecting its siblings; rendering it later is a
    /// no-op. A broken vertex program is fatal since every effect shares
    /// it.
    pub fn compile_effects(&mut self) -> KonturResult<Vec<EffectKind>> {
        let state = self.state.as_mut().ok_or(KonturError::Disposed)?;
        let device = state.gpu.device.clone();

        let vertex_module = compile_module(&device, "kontur_fullscreen_vs", FULLSCREEN_SHADER)
            .map_err(|message| KonturError::shader_compile("fullscreen", message))?;

        let mut compiled = Vec::new();
        for effect in EffectKind::ALL {
            let (Some(slot), Some(source)) = (effect.slot(), effect.fragment_source()) else {
                continue;
            };

            // One error scope per program isolates its failures from the
            // sibling programs.
            device.push_error_scope(wgpu::ErrorFilter::Validation);
            let fragment_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(effect.label()),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            });
            let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(effect.label()),
                layout: Some(&state.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex_module,
                    entry_point: "vs_main",
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &fragment_module,
                    entry_point: "fs_main",
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: TARGET_FORMAT,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            });

            match pollster::block_on(device.pop_error_scope()) {
                None => {
                    state.pipelines[slot] = Some(pipeline);
                    compiled.push(effect);
                }
                Some(err) => {
                    tracing::error!("effect '{}' failed to compile: {}", effect, err);
                    state.pipelines[slot] = None;
                }
            }
        }

        tracing::debug!("compiled {}/{} effect programs", compiled.len(), PROGRAM_COUNT);
        Ok(compiled)
    }

    /// Upload `image` into the "main" texture slot, replacing whatever
    /// was there. Clamp-to-edge wrapping, linear filtering.
    pub fn load_texture(&mut self, image: &PixelBuffer) -> KonturResult<()> {
        let state = self.state.as_mut().ok_or(KonturError::Disposed)?;

        if image.width == 0 || image.height == 0 {
            return Err(KonturError::config("cannot upload an empty texture"));
        }
        if image.data.len() != image.pixel_count() * 4 {
            return Err(KonturError::config(format!(
                "texture data is {} bytes, expected {} for {}x{}",
                image.data.len(),
                image.pixel_count() * 4,
                image.width,
                image.height
            )));
        }

        let device = &state.gpu.device;
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("kontur_main_texture"),
            size: wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        state.gpu.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &image.data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(image.width * 4),
                rows_per_image: Some(image.height),
            },
            wgpu::Extent3d {
                width: image.width,
                height: image.height,
                depth_or_array_layers: 1,
            },
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kontur_main_bind_group"),
            layout: &state.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&state.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: state.uniform_buffer.as_entire_binding(),
                },
            ],
        });

        state.main_texture = Some(bind_group);
        tracing::debug!("loaded {}x{} texture into main slot", image.width, image.height);
        Ok(())
    }

    /// Draw the selected effect over the render target.
    ///
    /// `Original` clears the target and draws nothing. An effect whose
    /// program is missing logs a diagnostic and skips the draw; a render
    /// with no texture loaded is a silent no-op. Returns once commands
    /// are submitted, not once the GPU finishes.
    pub fn render(&self, effect: EffectKind) -> KonturResult<()> {
        let state = self.state.as_ref().ok_or(KonturError::Disposed)?;

        let draw = match effect.slot() {
            None => None,
            Some(slot) => {
                let Some(pipeline) = state.pipelines[slot].as_ref() else {
                    tracing::warn!("no compiled program for effect '{}', skipping render", effect);
                    return Ok(());
                };
                let Some(bind_group) = state.main_texture.as_ref() else {
                    // Texture may legitimately not be loaded yet.
                    return Ok(());
                };
                Some((pipeline, bind_group))
            }
        };

        if effect == EffectKind::Edge {
            let uniforms = EffectUniforms {
                resolution: [state.width as f32, state.height as f32],
                _pad: [0.0; 2],
            };
            state
                .gpu
                .queue
                .write_buffer(&state.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));
        }

        let mut encoder = state
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("kontur_effect_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("kontur_effect_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &state.target_view,
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
            if let Some((pipeline, bind_group)) = draw {
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, bind_group, &[]);
                pass.set_vertex_buffer(0, state.vertex_buffer.slice(..));
                pass.draw(0..4, 0..1);
            }
        }
        state.gpu.queue.submit(Some(encoder.finish()));
        Ok(())
    }

    /// Copy the render target back to host memory. Blocking round-trip
    /// through the device queue.
    pub fn read_back(&self) -> KonturResult<PixelBuffer> {
        let state = self.state.as_ref().ok_or(KonturError::Disposed)?;
        let (width, height) = (state.width, state.height);

        let padded_bytes_per_row = padded_bytes_per_row(width);
        let readback = state.gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kontur_readback"),
            size: u64::from(padded_bytes_per_row) * u64::from(height),
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = state
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("kontur_readback_encoder"),
            });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &state.target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &readback,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        state.gpu.queue.submit(Some(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        state.gpu.device.poll(wgpu::Maintain::Wait);

        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(KonturError::DeviceUnavailable(format!(
                    "failed to map readback buffer: {e}"
                )))
            }
            Err(_) => {
                return Err(KonturError::DeviceUnavailable(
                    "readback mapping callback never fired".into(),
                ))
            }
        }

        let data = slice.get_mapped_range();
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            let row_start = (y * padded_bytes_per_row) as usize;
            pixels.extend_from_slice(&data[row_start..row_start + (width * 4) as usize]);
        }
        drop(data);
        readback.unmap();

        PixelBuffer::from_raw(width, height, pixels)
    }

    /// Resize the render target. Must be called before `render` whenever
    /// the output dimensions change.
    pub fn resize(&mut self, width: u32, height: u32) -> KonturResult<()> {
        let state = self.state.as_mut().ok_or(KonturError::Disposed)?;
        if width == 0 || height == 0 {
            return Err(KonturError::config(format!(
                "render target dimensions must be non-zero, got {width}x{height}"
            )));
        }
        if (width, height) == (state.width, state.height) {
            return Ok(());
        }

        let (target, target_view) = create_target(&state.gpu.device, width, height);
        state.target = target;
        state.target_view = target_view;
        state.width = width;
        state.height = height;
        tracing::debug!("render target resized to {}x{}", width, height);
        Ok(())
    }

    /// Release every GPU program and texture owned by this renderer.
    /// Idempotent; all other methods fail with [`KonturError::Disposed`]
    /// afterwards.
    pub fn dispose(&mut self) {
        if self.state.take().is_some() {
            tracing::debug!("released GPU programs and textures");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.state.is_none()
    }
}

impl Drop for ShaderRenderer {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn create_target(
    device: &wgpu::Device,
    width: u32,
    height: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("kontur_render_target"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TARGET_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());
    (target, view)
}

fn compile_module(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, String> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(module),
        Some(err) => Err(err.to_string()),
    }
}

/// Buffer rows for texture-to-buffer copies must be aligned to
/// `wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`.
fn padded_bytes_per_row(width: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (width * 4 + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padded_bytes_per_row() {
        assert_eq!(padded_bytes_per_row(1), 256);
        assert_eq!(padded_bytes_per_row(64), 256);
        assert_eq!(padded_bytes_per_row(100), 512);
        assert_eq!(padded_bytes_per_row(640), 2560);
    }
}
