//! CPU-side mesh representation produced by loaders.

use corelib::{Normal, Position, TexCoord, Vec3};

/// Indexed triangle mesh stored as parallel attribute arrays.
///
/// `positions`, `texcoords` and `normals` always have the same length: entry
/// `i` of each describes emitted vertex `i`. Values in `indices` address those
/// vertices, three per triangle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Position>,
    pub texcoords: Vec<TexCoord>,
    pub normals: Vec<Normal>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one vertex to all three attribute arrays.
    pub fn push_vertex(&mut self, position: Position, texcoord: TexCoord, normal: Normal) {
        self.positions.push(position);
        self.texcoords.push(texcoord);
        self.normals.push(normal);
    }

    /// Extend the index buffer.
    pub fn add_indices(&mut self, indices: &[u32]) {
        self.indices.extend_from_slice(indices);
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() && self.indices.is_empty()
    }

    /// Returns `true` if the mesh is non-empty, its attribute arrays agree in
    /// length and every index addresses an existing vertex.
    pub fn is_valid(&self) -> bool {
        let n = self.positions.len();
        n > 0
            && !self.indices.is_empty()
            && self.texcoords.len() == n
            && self.normals.len() == n
            && self.indices.iter().all(|&i| (i as usize) < n)
    }

    /// Axis-aligned bounding box of all positions as `(min, max)`.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))),
        )
    }

    /// Iterate over triangles as position triples. Triangles with an index
    /// outside `positions` are skipped.
    pub fn triangles(&self) -> impl Iterator<Item = [Position; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            let at = |i: u32| self.positions.get(i as usize).copied();
            Some([at(tri[0])?, at(tri[1])?, at(tri[2])?])
        })
    }
}
