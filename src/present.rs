use anyhow::{anyhow, Context, Result};

use egui::load::SizedTexture;
use egui::{Color32, ColorImage, Frame, FullOutput, ImageSource, TextureHandle, TextureOptions};
use egui_wgpu_backend::{RenderPass as EguiRenderPass, ScreenDescriptor};
use egui_winit_platform::{Platform, PlatformDescriptor};

use wgpu::{
    include_wgsl, Adapter, BindGroup, Device, Extent3d, Instance, PipelineLayout, Queue, Surface,
    SurfaceConfiguration, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
};
use winit::{dpi::PhysicalSize, event::Event, window::Window};

use cpu_ray_tracing::framebuffer::{self, FrameBuffer};
use cpu_ray_tracing::stats::StatsStrip;

/// Shows the traced BGRA frame in the window, with the stats strip drawn on top by egui.
pub struct Presenter<'window> {
    surface: Surface<'window>,
    device: Device,
    queue: Queue,
    surface_config: SurfaceConfiguration,

    frame_texture: wgpu::Texture,
    frame_size: Extent3d,
    bind_group: BindGroup,
    render_pipeline: wgpu::RenderPipeline,

    platform: Platform,
    egui_rpass: EguiRenderPass,
    screen_descriptor: ScreenDescriptor,
    strip_texture: Option<TextureHandle>,
}

impl<'window> Presenter<'window> {
    pub async fn new(
        window: &'window Window,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<Presenter<'window>> {
        let size = window.inner_size();

        let instance = Instance::default();

        let surface: Surface = instance
            .create_surface(window)
            .context("failed to make a surface")?;
        let adapter = create_adapter(&instance, &surface).await?;
        // Create the logical device and command queue
        let (device, queue) = generate_device_and_queue(&adapter).await?;

        let capabilities = surface.get_capabilities(&adapter);
        let surface_format = capabilities
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .context("surface has no supported formats")?;

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
        };
        surface.configure(&device, &surface_config);

        let frame_size = Extent3d {
            width: frame_width,
            height: frame_height,
            depth_or_array_layers: 1,
        };
        let frame_texture = create_texture(&device, frame_size);
        let sampler = generate_sampler(&device);

        let (bind_group_layout, bind_group) =
            create_device_bindgroup(&device, &frame_texture, &sampler);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: None,
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let render_pipeline = create_render_pipeline(&device, &pipeline_layout, surface_format);

        let scale_factor = window.scale_factor();

        let platform = Platform::new(PlatformDescriptor {
            physical_width: surface_config.width,
            physical_height: surface_config.height,
            scale_factor,
            font_definitions: Default::default(),
            style: Default::default(),
        });

        let screen_descriptor = ScreenDescriptor {
            physical_width: surface_config.width,
            physical_height: surface_config.height,
            scale_factor: scale_factor as f32,
        };

        let egui_rpass = EguiRenderPass::new(&device, surface_format, 1);

        Ok(Presenter {
            surface,
            device,
            queue,
            surface_config,
            frame_texture,
            frame_size,
            bind_group,
            render_pipeline,
            platform,
            egui_rpass,
            screen_descriptor,
            strip_texture: None,
        })
    }

    pub fn handle_event<T>(&mut self, event: &Event<T>) {
        self.platform.handle_event(event);
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.surface_config.width = new_size.width.max(1);
        self.surface_config.height = new_size.height.max(1);

        self.screen_descriptor.physical_width = self.surface_config.width;
        self.screen_descriptor.physical_height = self.surface_config.height;

        self.surface.configure(&self.device, &self.surface_config);
    }

    pub fn present(&mut self, frame: &FrameBuffer, strip: &StatsStrip) -> Result<()> {
        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.frame_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            frame.as_bytes(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(framebuffer::stride(frame.width()) as u32),
                rows_per_image: Some(frame.height() as u32),
            },
            self.frame_size,
        );

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                // skip this frame, the next one uses the reconfigured surface
                self.surface.configure(&self.device, &self.surface_config);
                return Ok(());
            }
            Err(error) => return Err(error).context("failed to acquire next swap chain texture"),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Encoder"),
            });

        setup_renderpass(&mut encoder, &view, &self.render_pipeline, &self.bind_group);

        let full_output = self.create_ui(strip);

        let paint_jobs = self
            .platform
            .context()
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        self.egui_rpass
            .add_textures(&self.device, &self.queue, &full_output.textures_delta)
            .map_err(|error| anyhow!("couldnt add egui textures: {error:?}"))?;

        self.egui_rpass.update_buffers(
            &self.device,
            &self.queue,
            &paint_jobs,
            &self.screen_descriptor,
        );

        self.egui_rpass
            .execute(&mut encoder, &view, &paint_jobs, &self.screen_descriptor, None)
            .map_err(|error| anyhow!("egui render pass failed: {error:?}"))?;

        self.queue.submit(Some(encoder.finish()));
        output.present();

        self.egui_rpass
            .remove_textures(full_output.textures_delta)
            .map_err(|error| anyhow!("egui textures could not be removed: {error:?}"))?;

        Ok(())
    }

    fn create_ui(&mut self, strip: &StatsStrip) -> FullOutput {
        self.platform.begin_frame();

        let egui_context = self.platform.context();

        let strip_pixels = strip.pixels();
        let strip_image = ColorImage::from_rgba_unmultiplied(
            [strip_pixels.width(), strip_pixels.height()],
            &strip_pixels.to_rgba(),
        );

        let texture = match self.strip_texture.take() {
            Some(mut texture) => {
                texture.set(strip_image, TextureOptions::NEAREST);
                texture
            }
            None => egui_context.load_texture("stats strip", strip_image, TextureOptions::NEAREST),
        };
        let sized_texture = SizedTexture::new(texture.id(), texture.size_vec2() * 2.0);
        self.strip_texture = Some(texture);

        let transparent_frame = Frame::none().fill(Color32::from_rgba_unmultiplied(0, 0, 0, 200));

        egui::TopBottomPanel::bottom("stats_panel")
            .resizable(false)
            .frame(transparent_frame)
            .show(&egui_context, |ui| {
                ui.colored_label(Color32::from_rgb(200, 200, 200), strip.last().to_string());
                ui.image(ImageSource::Texture(sized_texture));
            });

        egui_context.end_frame()
    }
}

fn create_texture(device: &wgpu::Device, size: Extent3d) -> wgpu::Texture {
    device.create_texture(&TextureDescriptor {
        label: Some("Traced Frame"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        // the framebuffer is already blue, green, red, alpha
        format: TextureFormat::Bgra8Unorm,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

fn create_device_bindgroup(
    device: &wgpu::Device,
    texture: &wgpu::Texture,
    sampler: &wgpu::Sampler,
) -> (wgpu::BindGroupLayout, BindGroup) {
    let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let texture_bind = 0;
    let sampler_bind = 1;

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Texture Bind Group Layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: texture_bind,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: sampler_bind,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    });

    let render_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: &bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: texture_bind,
                resource: wgpu::BindingResource::TextureView(&texture_view),
            },
            wgpu::BindGroupEntry {
                binding: sampler_bind,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some("Texture Bind Group"),
    });

    (bind_group_layout, render_bind_group)
}

fn setup_renderpass(
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    render_pipeline: &wgpu::RenderPipeline,
    bind_group: &BindGroup,
) {
    let mut rpass: wgpu::RenderPass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: None,
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
    rpass.set_pipeline(render_pipeline);
    rpass.set_bind_group(0, bind_group, &[]);
    // a single triangle covering the whole screen
    rpass.draw(0..3, 0..1);
}

fn create_render_pipeline(
    device: &wgpu::Device,
    pipeline_layout: &PipelineLayout,
    swapchain_format: TextureFormat,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(include_wgsl!("render_shader.wgsl"));

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: None,
        layout: Some(pipeline_layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: "vs_main",
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: "fs_main",
            compilation_options: Default::default(),
            targets: &[Some(swapchain_format.into())],
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}

async fn create_adapter(instance: &wgpu::Instance, surface: &Surface<'_>) -> Result<Adapter> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            force_fallback_adapter: false,
            // Request an adapter which can render to our surface
            compatible_surface: Some(surface),
        })
        .await
        .context("failed to find an appropriate adapter")
}

async fn generate_device_and_queue(adapter: &Adapter) -> Result<(Device, Queue)> {
    adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                // Make sure we use the texture resolution limits from the adapter, so we can support images the size of the swapchain.
                required_limits: wgpu::Limits::downlevel_defaults()
                    .using_resolution(adapter.limits()),
            },
            None,
        )
        .await
        .context("failed to create device")
}

fn generate_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        // keep the traced pixels sharp when the window scales them up
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}
