//! Core shared types: math re-exports and per-vertex attribute aliases.

pub use glam::{Vec2, Vec3, vec2, vec3};

/// Vertex position in object space.
pub type Position = Vec3;

/// Texture coordinate; `x` is u, `y` is v.
pub type TexCoord = Vec2;

/// Vertex normal. Not normalized by loaders.
pub type Normal = Vec3;

/// Number of scalar components per attribute kind.
pub mod components {
    pub const POSITION: usize = 3;
    pub const NORMAL: usize = 3;
    pub const TEXCOORD: usize = 2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texcoord_fields_map_to_uv() {
        let uv: TexCoord = vec2(0.25, 0.75);
        assert_eq!(uv.x, 0.25);
        assert_eq!(uv.y, 0.75);
    }

    #[test]
    fn position_is_field_assignable() {
        let mut p = Position::ZERO;
        p.x = 1.0;
        p.z = -2.0;
        assert_eq!(p, vec3(1.0, 0.0, -2.0));
    }
}
