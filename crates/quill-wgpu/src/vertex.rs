use bytemuck::{Pod, Zeroable};
use quill_render::Vertex;

/// Vertex as uploaded to the GPU.
///
/// Same layout as the painter's [`Vertex`], with the coordinate offset that
/// was active when the batch was recorded already added to the position.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub pos: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl From<Vertex> for GpuVertex {
    fn from(vertex: Vertex) -> Self {
        Self::translated(vertex, [0, 0])
    }
}

impl GpuVertex {
    #[inline]
    pub fn translated(vertex: Vertex, offset: [i32; 2]) -> Self {
        Self {
            pos: [
                vertex.pos[0] + offset[0] as f32,
                vertex.pos[1] + offset[1] as f32,
            ],
            uv: vertex.uv,
            color: vertex.color,
        }
    }

    pub const fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: &[wgpu::VertexAttribute] = &[
            // pos
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            },
            // uv
            wgpu::VertexAttribute {
                offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x2,
            },
            // color
            wgpu::VertexAttribute {
                offset: (std::mem::size_of::<[f32; 2]>() * 2) as wgpu::BufferAddress,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
        ];

        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: ATTRIBUTES,
        }
    }
}
