//! Asset loading/parsers.
//! OBJ text -> indexed triangle mesh with parallel attribute arrays.

pub mod mesh;
pub mod obj;

pub use mesh::Mesh;
pub use obj::{
    IndexFlush, ObjError, ObjErrorKind, ObjOptions, ObjResult, VertexReuse, load_obj_from_path,
    load_obj_from_reader, parse_obj, parse_obj_with,
};
