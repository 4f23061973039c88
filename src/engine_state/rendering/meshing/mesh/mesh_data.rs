//! Vertex buffers produced by the mesh builder.
//!
//! Buffers are plain parallel `f32` arrays: 3 floats of position, 3 of normal and 2 of
//! texture coordinate per vertex. Meshes are immutable once built; a rebuild replaces
//! the whole `MeshPair`.

/// Floats per vertex in the position buffer.
pub const POSITION_COMPONENTS: usize = 3;
/// Floats per vertex in the normal buffer.
pub const NORMAL_COMPONENTS: usize = 3;
/// Floats per vertex in the texture coordinate buffer.
pub const UV_COMPONENTS: usize = 2;
/// Vertices in one quad, drawn as two triangles.
pub const VERTICES_PER_QUAD: usize = 6;

/// Three parallel vertex attribute buffers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub uvs: Vec<f32>,
}

impl MeshData {
    /// Creates empty buffers with room for `vertices` vertices.
    pub fn with_capacity(vertices: usize) -> Self {
        MeshData {
            positions: Vec::with_capacity(vertices * POSITION_COMPONENTS),
            normals: Vec::with_capacity(vertices * NORMAL_COMPONENTS),
            uvs: Vec::with_capacity(vertices * UV_COMPONENTS),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / POSITION_COMPONENTS
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub(crate) fn push_vertex(&mut self, position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) {
        self.positions.extend_from_slice(&position);
        self.normals.extend_from_slice(&normal);
        self.uvs.extend_from_slice(&uv);
    }

    /// Raw bytes of the position buffer, ready for upload.
    pub fn position_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Raw bytes of the normal buffer, ready for upload.
    pub fn normal_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Raw bytes of the texture coordinate buffer, ready for upload.
    pub fn uv_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.uvs)
    }

    /// Iterates quads as arrays of six `(position, normal)` pairs.
    pub fn quads(&self) -> impl Iterator<Item = [([f32; 3], [f32; 3]); VERTICES_PER_QUAD]> + '_ {
        let positions = self.positions.chunks_exact(POSITION_COMPONENTS * VERTICES_PER_QUAD);
        let normals = self.normals.chunks_exact(NORMAL_COMPONENTS * VERTICES_PER_QUAD);
        positions.zip(normals).map(|(p, n)| {
            std::array::from_fn(|i| {
                let o = i * 3;
                ([p[o], p[o + 1], p[o + 2]], [n[o], n[o + 1], n[o + 2]])
            })
        })
    }
}

/// Opaque block faces and alpha-tested vegetation, kept apart so a renderer can bind
/// different materials.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshPair {
    pub terrain: MeshData,
    pub grass: MeshData,
}

impl MeshPair {
    pub fn vertex_count(&self) -> usize {
        self.terrain.vertex_count() + self.grass.vertex_count()
    }

    pub fn is_empty(&self) -> bool {
        self.terrain.is_empty() && self.grass.is_empty()
    }
}

/// Fixed-capacity writer used during one build.
///
/// Capacity is reserved up front and never grown. A quad that would not fit is dropped
/// whole and every later quad in the same build is dropped too.
#[derive(Debug)]
pub struct MeshWriter {
    data: MeshData,
    capacity: usize,
    dropped_quads: usize,
}

impl MeshWriter {
    /// # Arguments
    /// * `capacity` - maximum number of vertices this build may hold
    pub fn new(capacity: usize) -> Self {
        MeshWriter {
            data: MeshData::with_capacity(capacity),
            capacity,
            dropped_quads: 0,
        }
    }

    /// Whether the writer has already dropped geometry.
    pub fn is_truncated(&self) -> bool {
        self.dropped_quads > 0
    }

    pub fn dropped_quads(&self) -> usize {
        self.dropped_quads
    }

    /// Writes one quad given its four corners `a, b, c, d` as triangles `a b c` and
    /// `a c d`, with one UV per corner.
    ///
    /// # Returns
    /// `false` if the quad was dropped for lack of capacity.
    pub fn push_quad(&mut self, corners: [[f32; 3]; 4], normal: [f32; 3], uvs: [[f32; 2]; 4]) -> bool {
        if self.is_truncated() || self.data.vertex_count() + VERTICES_PER_QUAD > self.capacity {
            self.dropped_quads += 1;
            return false;
        }
        for i in [0, 1, 2, 0, 2, 3] {
            self.data.push_vertex(corners[i], normal, uvs[i]);
        }
        true
    }

    pub fn finish(self) -> MeshData {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORNERS: [[f32; 3]; 4] = [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0]];
    const UVS: [[f32; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]];

    #[test]
    fn quads_are_two_triangles_sharing_a_diagonal() {
        let mut writer = MeshWriter::new(64);
        assert!(writer.push_quad(CORNERS, [0.0, 0.0, -1.0], UVS));
        let data = writer.finish();
        assert_eq!(data.vertex_count(), 6);
        assert_eq!(&data.positions[9..12], &CORNERS[0]);
        assert_eq!(&data.positions[12..15], &CORNERS[2]);
        assert_eq!(data.uvs.len(), 12);
        assert_eq!(data.position_bytes().len(), 18 * 4);
    }

    #[test]
    fn full_writer_drops_whole_quads() {
        let mut writer = MeshWriter::new(8);
        assert!(writer.push_quad(CORNERS, [0.0, 1.0, 0.0], UVS));
        assert!(!writer.push_quad(CORNERS, [0.0, 1.0, 0.0], UVS));
        assert!(writer.is_truncated());
        assert_eq!(writer.dropped_quads(), 1);
        assert_eq!(writer.finish().vertex_count(), 6);
    }

    #[test]
    fn quads_iterate_in_write_order() {
        let mut writer = MeshWriter::new(12);
        writer.push_quad(CORNERS, [1.0, 0.0, 0.0], UVS);
        writer.push_quad(CORNERS, [0.0, 0.0, 1.0], UVS);
        let data = writer.finish();
        let normals: Vec<_> = data.quads().map(|quad| quad[0].1).collect();
        assert_eq!(normals, vec![[1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
    }
}
