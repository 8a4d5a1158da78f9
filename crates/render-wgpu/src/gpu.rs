use crate::mesh::{self, DrawList, InstanceData, SPHERE_SEGMENTS, Vertex};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use hotspot_render::PerspectiveCamera;
use hotspot_scene::{Geometry, NodeId, Scene};
use std::collections::BTreeMap;
use std::ops::Range;
use wgpu::util::DeviceExt;

/// Maps OpenGL clip depth [-1, 1] to wgpu's [0, 1].
#[rustfmt::skip]
const GL_TO_WGPU: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Additive blending weighted by source alpha.
const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    light: [f32; 4],
    ambient: [f32; 4],
}

/// Scene lighting: one directional light plus ambient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    /// Direction from the scene towards the light.
    pub direction: Vec3,
    pub intensity: f32,
    pub ambient: f32,
}

impl Default for Lighting {
    fn default() -> Self {
        Self {
            direction: Vec3::ONE,
            intensity: 4.0,
            ambient: 0.5,
        }
    }
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn new(device: &wgpu::Device, label: &str, vertices: &[Vertex], indices: &[u32]) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    fn draw(&self, pass: &mut wgpu::RenderPass<'_>, instances: Range<u32>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, instances);
    }
}

/// wgpu renderer for the model and its hotspot markers.
///
/// Draw order: lit geometry (depth write), additive marker fills, then
/// wireframe outlines. Translucent passes test depth but do not write it, so
/// the model still hides markers behind it.
pub struct WgpuRenderer {
    lit_pipeline: wgpu::RenderPipeline,
    glow_pipeline: wgpu::RenderPipeline,
    outline_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    sphere: GpuMesh,
    sphere_lines: GpuMesh,
    meshes: BTreeMap<NodeId, GpuMesh>,
    instance_buffer: wgpu::Buffer,
    max_instances: u32,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
    pub lighting: Lighting,
}

fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 2] {
    const VERTEX_ATTRS: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
    const INSTANCE_ATTRS: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
    ];
    [
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &VERTEX_ATTRS,
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &INSTANCE_ATTRS,
        },
    ]
}

struct PipelineSpec<'a> {
    label: &'a str,
    shader: &'a wgpu::ShaderModule,
    vs: &'a str,
    fs: &'a str,
    topology: wgpu::PrimitiveTopology,
    blend: wgpu::BlendState,
    depth_write: bool,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    spec: PipelineSpec<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: spec.shader,
            entry_point: Some(spec.vs),
            compilation_options: Default::default(),
            buffers: &vertex_layouts(),
        },
        fragment: Some(wgpu::FragmentState {
            module: spec.shader,
            entry_point: Some(spec.fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(spec.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: spec.topology,
            // glTF materials may be double-sided and winding is not trusted.
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: spec.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let lighting = Lighting::default();
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&uniforms(Mat4::IDENTITY, &lighting)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let lit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lit_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::LIT_SHADER.into()),
        });
        let marker_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("marker_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::MARKER_SHADER.into()),
        });

        let lit_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            surface_format,
            PipelineSpec {
                label: "lit_pipeline",
                shader: &lit_shader,
                vs: "vs_main",
                fs: "fs_main",
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth_write: true,
            },
        );
        let glow_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            surface_format,
            PipelineSpec {
                label: "glow_pipeline",
                shader: &marker_shader,
                vs: "vs_marker",
                fs: "fs_marker",
                topology: wgpu::PrimitiveTopology::TriangleList,
                blend: ADDITIVE,
                depth_write: false,
            },
        );
        let outline_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            surface_format,
            PipelineSpec {
                label: "outline_pipeline",
                shader: &marker_shader,
                vs: "vs_marker",
                fs: "fs_marker",
                topology: wgpu::PrimitiveTopology::LineList,
                blend: wgpu::BlendState::ALPHA_BLENDING,
                depth_write: false,
            },
        );

        let (sphere_vertices, sphere_indices) =
            mesh::sphere_mesh(SPHERE_SEGMENTS, SPHERE_SEGMENTS);
        let sphere = GpuMesh::new(device, "sphere", &sphere_vertices, &sphere_indices);
        let sphere_lines = GpuMesh::new(
            device,
            "sphere_lines",
            &sphere_vertices,
            &mesh::wireframe_indices(&sphere_indices),
        );

        let max_instances = 1_024u32;
        let instance_buffer = Self::create_instance_buffer(device, max_instances);
        let depth_texture = Self::create_depth_texture(device, width, height);

        Self {
            lit_pipeline,
            glow_pipeline,
            outline_pipeline,
            uniform_buffer,
            uniform_bind_group,
            sphere,
            sphere_lines,
            meshes: BTreeMap::new(),
            instance_buffer,
            max_instances,
            depth_texture,
            surface_format,
            lighting,
        }
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    /// Upload buffers for triangle meshes not seen before.
    fn upload_meshes(&mut self, device: &wgpu::Device, scene: &Scene) {
        for (id, node) in scene.nodes() {
            if self.meshes.contains_key(id) {
                continue;
            }
            let Some(Geometry::Triangles(triangles)) = node.mesh().map(|m| &m.geometry) else {
                continue;
            };
            let vertices = mesh::mesh_vertices(triangles);
            self.meshes.insert(
                *id,
                GpuMesh::new(device, &node.name, &vertices, triangles.indices()),
            );
            tracing::debug!(
                "uploaded mesh {} ({} triangles)",
                node.name,
                triangles.triangle_count()
            );
        }
    }

    /// Render one frame onto a transparent background.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        scene: &Scene,
        camera: &PerspectiveCamera,
    ) {
        self.upload_meshes(device, scene);

        let view_proj = GL_TO_WGPU * camera.view_projection();
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&uniforms(view_proj, &self.lighting)),
        );

        let list = DrawList::build(scene);
        let mut instances: Vec<InstanceData> = Vec::with_capacity(list.instance_count());
        instances.extend(list.meshes.iter().map(|(_, i)| *i));
        let spheres = push_range(&mut instances, &list.spheres);
        let glows = push_range(&mut instances, &list.glows);
        let outlines = push_range(&mut instances, &list.outlines);

        if instances.len() > self.max_instances as usize {
            self.max_instances = (instances.len() as u32).next_power_of_two();
            self.instance_buffer = Self::create_instance_buffer(device, self.max_instances);
            tracing::debug!("grew instance buffer to {}", self.max_instances);
        }
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
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
                ..Default::default()
            });
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_vertex_buffer(1, self.instance_buffer.slice(..));

            pass.set_pipeline(&self.lit_pipeline);
            for (i, (id, _)) in list.meshes.iter().enumerate() {
                if let Some(gpu) = self.meshes.get(id) {
                    gpu.draw(&mut pass, i as u32..i as u32 + 1);
                }
            }
            if !spheres.is_empty() {
                self.sphere.draw(&mut pass, spheres);
            }

            if !glows.is_empty() {
                pass.set_pipeline(&self.glow_pipeline);
                self.sphere.draw(&mut pass, glows);
            }
            if !outlines.is_empty() {
                pass.set_pipeline(&self.outline_pipeline);
                self.sphere_lines.draw(&mut pass, outlines);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn create_instance_buffer(device: &wgpu::Device, capacity: u32) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("instance_buffer"),
            size: u64::from(capacity) * std::mem::size_of::<InstanceData>() as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

fn uniforms(view_proj: Mat4, lighting: &Lighting) -> Uniforms {
    let dir = lighting.direction.normalize_or_zero();
    Uniforms {
        view_proj: view_proj.to_cols_array_2d(),
        light: dir.extend(lighting.intensity).to_array(),
        ambient: Vec4::new(lighting.ambient, 0.0, 0.0, 0.0).to_array(),
    }
}

fn push_range(out: &mut Vec<InstanceData>, items: &[InstanceData]) -> Range<u32> {
    let start = out.len() as u32;
    out.extend_from_slice(items);
    start..out.len() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gl_depth_maps_to_unit_range() {
        let near = GL_TO_WGPU * Vec4::new(0.0, 0.0, -1.0, 1.0);
        let far = GL_TO_WGPU * Vec4::new(0.0, 0.0, 1.0, 1.0);
        assert_eq!(near.z, 0.0);
        assert_eq!(far.z, 1.0);
    }

    #[test]
    fn camera_depth_in_wgpu_range() {
        let camera = PerspectiveCamera::default();
        let clip = GL_TO_WGPU * camera.view_projection() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let depth = clip.z / clip.w;
        assert!((0.0..=1.0).contains(&depth));
    }

    #[test]
    fn push_range_tracks_offsets() {
        let mut out = Vec::new();
        let item = InstanceData::zeroed();
        assert_eq!(push_range(&mut out, &[item, item]), 0..2);
        assert_eq!(push_range(&mut out, &[]), 2..2);
        assert_eq!(push_range(&mut out, &[item]), 2..3);
    }

    #[test]
    fn default_lighting_matches_viewer() {
        let u = uniforms(Mat4::IDENTITY, &Lighting::default());
        let dir = Vec3::from_slice(&u.light[..3]);
        assert!((dir - Vec3::ONE.normalize()).length() < 1e-6);
        assert_eq!(u.light[3], 4.0);
        assert_eq!(u.ambient[0], 0.5);
    }
}
