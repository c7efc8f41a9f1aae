use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Interleaved vertex as consumed by every mesh pipeline.
///
/// Attribute locations: 0 position, 1 normal, 2 uv, 3 tangent, 4 bitangent.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, tex_coords: Vec2) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            tex_coords: tex_coords.to_array(),
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
        }
    }
}

/// Role a texture plays in a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureKind {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureKind {
    pub const ALL: [TextureKind; 4] = [
        TextureKind::Diffuse,
        TextureKind::Specular,
        TextureKind::Normal,
        TextureKind::Height,
    ];

    /// Uniform-style name prefix, e.g. `texture_diffuse`.
    pub fn uniform_prefix(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "texture_diffuse",
            TextureKind::Specular => "texture_specular",
            TextureKind::Normal => "texture_normal",
            TextureKind::Height => "texture_height",
        }
    }

    /// Binding slot inside the material bind group.
    pub fn slot(self) -> u32 {
        match self {
            TextureKind::Diffuse => 0,
            TextureKind::Specular => 1,
            TextureKind::Normal => 2,
            TextureKind::Height => 3,
        }
    }

    /// Pixel used when the texture is absent or failed to load.
    pub fn fallback_rgba(self) -> [u8; 4] {
        match self {
            TextureKind::Diffuse => [255, 255, 255, 255],
            TextureKind::Specular => [0, 0, 0, 255],
            TextureKind::Normal => [128, 128, 255, 255],
            TextureKind::Height => [0, 0, 0, 255],
        }
    }

    /// Colour textures are stored sRGB-encoded; data textures are linear.
    pub fn is_color(self) -> bool {
        matches!(self, TextureKind::Diffuse)
    }
}

/// A mesh's reference into its model's loaded-texture table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureRef {
    pub kind: TextureKind,
    pub index: usize,
}

/// CPU-side mesh: indexed triangle list plus texture references.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub textures: Vec<TextureRef>,
}

impl MeshData {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// The first texture of the given kind, if any.
    pub fn texture(&self, kind: TextureKind) -> Option<TextureRef> {
        self.textures.iter().copied().find(|t| t.kind == kind)
    }

    /// Replace every normal with the area-weighted average of its adjacent faces.
    pub fn generate_smooth_normals(&mut self) {
        let mut accum = vec![Vec3::ZERO; self.vertices.len()];
        for tri in self.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let pa = Vec3::from(self.vertices[a].position);
            let pb = Vec3::from(self.vertices[b].position);
            let pc = Vec3::from(self.vertices[c].position);
            let n = (pb - pa).cross(pc - pa);
            accum[a] += n;
            accum[b] += n;
            accum[c] += n;
        }
        for (v, n) in self.vertices.iter_mut().zip(accum) {
            v.normal = n.normalize_or(Vec3::Y).to_array();
        }
    }

    /// Compute per-vertex tangents and bitangents from positions and UVs.
    ///
    /// Tangents are orthogonalised against the normal. Vertices whose
    /// triangles have degenerate UVs get an arbitrary basis around the normal.
    pub fn compute_tangents(&mut self) {
        let mut tangents = vec![Vec3::ZERO; self.vertices.len()];
        let mut bitangents = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.indices.chunks_exact(3) {
            let idx = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let p = idx.map(|i| Vec3::from(self.vertices[i].position));
            let uv = idx.map(|i| Vec2::from(self.vertices[i].tex_coords));

            let e1 = p[1] - p[0];
            let e2 = p[2] - p[0];
            let d1 = uv[1] - uv[0];
            let d2 = uv[2] - uv[0];

            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() < f32::EPSILON {
                continue;
            }
            let r = 1.0 / det;
            let t = (e1 * d2.y - e2 * d1.y) * r;
            let b = (e2 * d1.x - e1 * d2.x) * r;
            for i in idx {
                tangents[i] += t;
                bitangents[i] += b;
            }
        }

        for ((v, t), b) in self.vertices.iter_mut().zip(tangents).zip(bitangents) {
            let n = Vec3::from(v.normal);
            let t = (t - n * n.dot(t)).normalize_or_zero();
            let (t, b) = if t == Vec3::ZERO {
                n.any_orthonormal_pair()
            } else {
                let b = if b == Vec3::ZERO {
                    n.cross(t)
                } else {
                    b.normalize()
                };
                (t, b)
            };
            v.tangent = t.to_array();
            v.bitangent = b.to_array();
        }
    }
}
