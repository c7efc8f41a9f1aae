use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct QuadVertex {
    position: [f32; 2],
    tex_coords: [f32; 2],
}

/// Full-screen triangle strip. Texture row 0 is at the top of the screen.
#[rustfmt::skip]
pub(crate) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { position: [-1.0,  1.0], tex_coords: [0.0, 0.0] },
    QuadVertex { position: [-1.0, -1.0], tex_coords: [0.0, 1.0] },
    QuadVertex { position: [ 1.0,  1.0], tex_coords: [1.0, 0.0] },
    QuadVertex { position: [ 1.0, -1.0], tex_coords: [1.0, 1.0] },
];

pub(crate) const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

pub(crate) fn quad_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &QUAD_ATTRIBUTES,
    }
}

pub struct ScreenQuad {
    vertex_buffer: wgpu::Buffer,
}

impl ScreenQuad {
    pub fn new(device: &wgpu::Device) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("screen_quad"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        Self { vertex_buffer }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..QUAD_VERTICES.len() as u32, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_spans_clip_space() {
        let xs: Vec<_> = QUAD_VERTICES.iter().map(|v| v.position[0]).collect();
        assert_eq!(xs, vec![-1.0, -1.0, 1.0, 1.0]);
        // uv v grows downward while clip y grows upward
        for v in QUAD_VERTICES {
            assert_eq!(v.tex_coords[1], (1.0 - v.position[1]) / 2.0);
            assert_eq!(v.tex_coords[0], (v.position[0] + 1.0) / 2.0);
        }
    }

    #[test]
    fn layout_stride_is_four_floats() {
        assert_eq!(quad_layout().array_stride, 16);
    }
}
