use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use wgpu::util::DeviceExt;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use evergreen::palette::theme;
use evergreen::{BatchHandle, Clock, FrameTime, GeometryKind, InstanceBuffers, InstanceData, RenderError, Scene, SceneConfig};

use crate::camera::Camera;
use crate::shader::{Uniforms, SHADER_SOURCE, VERTICES_PER_KIND};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// The tree is modelled with its base near y = 0; lower it into frame.
const TREE_ORIGIN: [f32; 4] = [0.0, -2.0, 0.0, 0.0];
const FOG_NEAR: f32 = 8.0;
const FOG_FAR: f32 = 25.0;

/// Matches the layout of [`InstanceData`].
const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 5] = [
    wgpu::VertexAttribute {
        offset: 0,
        shader_location: 0,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: 12,
        shader_location: 1,
        format: wgpu::VertexFormat::Uint32,
    },
    wgpu::VertexAttribute {
        offset: 16,
        shader_location: 2,
        format: wgpu::VertexFormat::Float32x4,
    },
    wgpu::VertexAttribute {
        offset: 32,
        shader_location: 3,
        format: wgpu::VertexFormat::Float32x3,
    },
    wgpu::VertexAttribute {
        offset: 48,
        shader_location: 4,
        format: wgpu::VertexFormat::Float32x4,
    },
];

/// GPU copy of one instance batch.
struct GpuBatch {
    buffer: wgpu::Buffer,
    count: u32,
    kind: GeometryKind,
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    mesh_pipeline: wgpu::RenderPipeline,
    sprite_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    depth_texture: wgpu::TextureView,
    batches: BTreeMap<BatchHandle, GpuBatch>,
    clear_color: wgpu::Color,
    pub camera: Camera,
}

impl GpuState {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window).context("failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible GPU adapter")?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .context("failed to open GPU device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);

        let camera = Camera::new();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniform Buffer"),
            contents: bytemuck::cast_slice(&[build_uniforms(&camera, &config, FrameTime::default())]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout: &uniform_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Instance Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&uniform_bind_group_layout],
            push_constant_ranges: &[],
        });

        // Opaque geometry writes depth; glowing sprites blend additively on top
        let mesh_pipeline = create_pipeline(&device, &pipeline_layout, &shader, config.format, None, true);
        let additive = wgpu::BlendState {
            color: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::SrcAlpha,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
            alpha: wgpu::BlendComponent {
                src_factor: wgpu::BlendFactor::One,
                dst_factor: wgpu::BlendFactor::One,
                operation: wgpu::BlendOperation::Add,
            },
        };
        let sprite_pipeline = create_pipeline(&device, &pipeline_layout, &shader, config.format, Some(additive), false);

        let background = theme::deep_emerald();

        Ok(Self {
            surface,
            device,
            queue,
            config,
            mesh_pipeline,
            sprite_pipeline,
            uniform_buffer,
            uniform_bind_group,
            depth_texture,
            batches: BTreeMap::new(),
            clear_color: wgpu::Color {
                r: background.x as f64,
                g: background.y as f64,
                b: background.z as f64,
                a: 1.0,
            },
            camera,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
            log::debug!("surface resized to {}x{}", new_size.width, new_size.height);
        }
    }

    /// Upload every dirty batch and drop GPU copies of released ones.
    pub fn sync(&mut self, buffers: &mut InstanceBuffers) {
        self.batches.retain(|handle, _| buffers.contains(*handle));
        for handle in buffers.take_dirty() {
            if let Err(err) = self.upload(buffers, handle) {
                log::warn!("skipping upload: {}", err);
            }
        }
    }

    fn upload(&mut self, buffers: &InstanceBuffers, handle: BatchHandle) -> Result<(), RenderError> {
        let instances = buffers.instances(handle).ok_or(RenderError::UnknownBatch(handle))?;
        let kind = buffers.kind(handle).ok_or(RenderError::UnknownBatch(handle))?;

        if instances.is_empty() {
            self.batches.remove(&handle);
            return Ok(());
        }

        match self.batches.get(&handle) {
            Some(batch) if batch.count as usize == instances.len() => {
                self.queue.write_buffer(&batch.buffer, 0, bytemuck::cast_slice(instances));
            }
            _ => {
                let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Instance Buffer"),
                    contents: bytemuck::cast_slice(instances),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                });
                self.batches.insert(
                    handle,
                    GpuBatch {
                        buffer,
                        count: instances.len() as u32,
                        kind,
                    },
                );
            }
        }
        Ok(())
    }

    pub fn render(&mut self, frame: FrameTime) -> Result<(), wgpu::SurfaceError> {
        let uniforms = build_uniforms(&self.camera, &self.config, frame);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::cast_slice(&[uniforms]));

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);

            // Opaque batches first so sprites depth-test against them
            for sprites in [false, true] {
                let pipeline = if sprites { &self.sprite_pipeline } else { &self.mesh_pipeline };
                render_pass.set_pipeline(pipeline);
                for batch in self.batches.values() {
                    if (batch.kind == GeometryKind::PointSprite) != sprites {
                        continue;
                    }
                    render_pass.set_vertex_buffer(0, batch.buffer.slice(..));
                    render_pass.draw(0..VERTICES_PER_KIND[batch.kind as usize], 0..batch.count);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn build_uniforms(camera: &Camera, config: &wgpu::SurfaceConfiguration, frame: FrameTime) -> Uniforms {
    let aspect = config.width as f32 / config.height.max(1) as f32;
    let view_proj = camera.projection(aspect) * camera.view_matrix();
    let (right, up) = camera.basis();
    let eye = camera.position();
    let fog = theme::deep_emerald();

    Uniforms {
        view_proj: view_proj.to_cols_array_2d(),
        camera_right: right.extend(0.0).to_array(),
        camera_up: up.extend(0.0).to_array(),
        camera_position: eye.extend(1.0).to_array(),
        origin: TREE_ORIGIN,
        fog_color: fog.extend(1.0).to_array(),
        time: frame.elapsed,
        delta_time: frame.delta,
        fog_near: FOG_NEAR,
        fog_far: FOG_FAR,
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
    depth_write: bool,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(if depth_write { "Mesh Pipeline" } else { "Sprite Pipeline" }),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
                step_mode: wgpu::VertexStepMode::Instance,
                attributes: &INSTANCE_ATTRIBUTES,
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn title(assembled: bool) -> &'static str {
    if assembled {
        "Evergreen - assembled (Space to scatter)"
    } else {
        "Evergreen - scattered (Space to assemble)"
    }
}

pub struct App {
    /// Taken when the window is first created.
    scene_config: Option<SceneConfig>,
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    scene: Option<Scene>,
    buffers: InstanceBuffers,
    clock: Clock,
    mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
}

impl App {
    pub fn new(scene_config: SceneConfig, time_scale: f32) -> Self {
        Self {
            scene_config: Some(scene_config),
            window: None,
            gpu_state: None,
            scene: None,
            buffers: InstanceBuffers::new(),
            clock: Clock::new().with_time_scale(time_scale),
            mouse_pressed: false,
            last_mouse_pos: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let config = self.scene_config.take().context("viewer already initialized")?;
        let assembled = config.start_mode.is_assembled();

        let window_attrs = Window::default_attributes()
            .with_title(title(assembled))
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(window_attrs).context("failed to create window")?);

        let mut gpu_state = pollster::block_on(GpuState::new(window.clone()))?;
        let scene = Scene::new(config, &mut self.buffers)?;
        gpu_state.sync(&mut self.buffers);

        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        self.scene = Some(scene);
        Ok(())
    }

    fn toggle_mode(&mut self) {
        if let Some(scene) = &mut self.scene {
            let mode = scene.toggle_mode();
            if let Some(window) = &self.window {
                window.set_title(title(mode.is_assembled()));
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(gpu_state), Some(scene)) = (&mut self.gpu_state, &mut self.scene) else {
            return;
        };

        let frame = self.clock.update();
        scene.frame(frame, &mut self.buffers);
        gpu_state.camera.update(frame.elapsed, frame.delta, scene.is_assembled());
        gpu_state.sync(&mut self.buffers);

        match gpu_state.render(frame) {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu_state.resize(winit::dpi::PhysicalSize {
                width: gpu_state.config.width,
                height: gpu_state.config.height,
            }),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(e) => log::warn!("render error: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.init(event_loop) {
                log::error!("failed to start viewer: {:#}", err);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(scene) = self.scene.take() {
                    scene.release(&mut self.buffers);
                }
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match code {
                KeyCode::Space | KeyCode::Enter => self.toggle_mode(),
                KeyCode::KeyP => self.clock.toggle_pause(),
                KeyCode::Escape => event_loop.exit(),
                _ => {}
            },
            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    self.mouse_pressed = state == ElementState::Pressed;
                    if !self.mouse_pressed {
                        self.last_mouse_pos = None;
                    }
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                if self.mouse_pressed {
                    if let Some((last_x, last_y)) = self.last_mouse_pos {
                        if let Some(gpu_state) = &mut self.gpu_state {
                            gpu_state.camera.drag((position.x - last_x) as f32, (position.y - last_y) as f32);
                        }
                    }
                    self.last_mouse_pos = Some((position.x, position.y));
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.camera.zoom(scroll);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}
