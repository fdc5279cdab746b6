use bytemuck::{Pod, Zeroable};

/// Position-only vertex, attribute location 0.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
}

/// Full-screen quad spanning normalized device coordinates [-1, 1]².
#[rustfmt::skip]
pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { position: [-1.0,  1.0, 0.0] }, // top left
    QuadVertex { position: [ 1.0,  1.0, 0.0] }, // top right
    QuadVertex { position: [ 1.0, -1.0, 0.0] }, // bottom right
    QuadVertex { position: [-1.0, -1.0, 0.0] }, // bottom left
];

#[rustfmt::skip]
pub const QUAD_INDICES: [u32; 6] = [
    0, 1, 3, // first triangle
    1, 2, 3, // second triangle
];

pub const QUAD_INDEX_COUNT: u32 = QUAD_INDICES.len() as u32;
