//! OBJ parser supporting positions, normals, texture coordinates and
//! polygonal faces.
//!
//! Parsing is a single forward pass over the text. `v`, `vt` and `vn` records
//! are accumulated into flat pools; every `f` record is fan-triangulated and
//! each visited vertex group is resolved against the pools and appended to the
//! output [`Mesh`]. Any other record (`#`, `o`, `g`, `s`, `usemtl`, ...) is
//! ignored. Errors abort the whole document.

use std::{
    collections::HashMap,
    fmt,
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use anyhow::{Context, Result};
use corelib::{Normal, Position, TexCoord, Vec3, components, vec2, vec3};
use thiserror::Error;

use crate::mesh::Mesh;

/// Texture coordinate emitted for groups without a `vt` reference.
pub const DEFAULT_TEXCOORD: TexCoord = TexCoord::ZERO;

/// Normal emitted for groups without a `vn` reference.
pub const DEFAULT_NORMAL: Normal = Vec3::Z;

/// Whether repeated references to the same vertex share one emitted vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VertexReuse {
    /// Every visit of a vertex group emits a new vertex.
    #[default]
    Off,
    /// Each distinct `(position, texcoord, normal)` triple is emitted once.
    Triple,
}

/// When indices buffered during parsing are appended to the mesh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IndexFlush {
    /// After every input line.
    #[default]
    PerLine,
    /// Once, after the last line.
    EndOfParse,
}

/// Parser configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjOptions {
    pub vertex_reuse: VertexReuse,
    pub index_flush: IndexFlush,
}

impl ObjOptions {
    pub fn with_vertex_reuse(mut self, vertex_reuse: VertexReuse) -> Self {
        self.vertex_reuse = vertex_reuse;
        self
    }

    pub fn with_index_flush(mut self, index_flush: IndexFlush) -> Self {
        self.index_flush = index_flush;
        self
    }
}

/// Vertex attribute kinds stored in the raw pools.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    Position,
    TexCoord,
    Normal,
}

impl Attribute {
    #[inline]
    pub const fn components(self) -> usize {
        match self {
            Attribute::Position => components::POSITION,
            Attribute::TexCoord => components::TEXCOORD,
            Attribute::Normal => components::NORMAL,
        }
    }

    /// Record tag introducing this attribute in OBJ text.
    pub const fn tag(self) -> &'static str {
        match self {
            Attribute::Position => "v",
            Attribute::TexCoord => "vt",
            Attribute::Normal => "vn",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Attribute::Position => "position",
            Attribute::TexCoord => "texcoord",
            Attribute::Normal => "normal",
        };
        f.write_str(name)
    }
}

/// What went wrong on a line.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ObjErrorKind {
    #[error("'{}' record needs {} numeric components", .0.tag(), .0.components())]
    MalformedAttributeLine(Attribute),

    #[error("{attribute} index {index} is out of range (have {available})")]
    UnresolvableIndex {
        attribute: Attribute,
        index: usize,
        available: usize,
    },

    #[error("face has {0} vertex groups, at least 3 are required")]
    UnsupportedFaceArity(usize),

    #[error("malformed vertex group '{0}'")]
    MalformedVertexGroupToken(String),

    #[error("too many vertices (>{})", u32::MAX)]
    TooManyVertices,
}

/// Parse failure with the offending 1-based line number and its text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("OBJ line {line}: {kind} in '{}'", .text.trim())]
pub struct ObjError {
    pub line: usize,
    /// The line exactly as it appears in the input, without its terminator.
    pub text: String,
    pub kind: ObjErrorKind,
}

pub type ObjResult<T> = std::result::Result<T, ObjError>;

/// Load an OBJ mesh from a file path.
pub fn load_obj_from_path(path: impl AsRef<Path>, options: &ObjOptions) -> Result<Mesh> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open OBJ file: {}", path.display()))?;
    let mesh = load_obj_from_reader(BufReader::new(file), options)
        .with_context(|| format!("Failed to load OBJ file: {}", path.display()))?;
    log::info!(
        "Loaded {}: {} vertices, {} triangles",
        path.display(),
        mesh.vertex_count(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Load an OBJ mesh from any [`Read`] implementation.
pub fn load_obj_from_reader<R: Read>(mut reader: R, options: &ObjOptions) -> Result<Mesh> {
    let mut contents = String::new();
    reader
        .read_to_string(&mut contents)
        .context("Failed to read OBJ text")?;
    Ok(parse_obj_with(&contents, options)?)
}

/// Parse OBJ text with default options.
pub fn parse_obj(src: &str) -> ObjResult<Mesh> {
    parse_obj_with(src, &ObjOptions::default())
}

/// Parse OBJ text into a mesh.
pub fn parse_obj_with(src: &str, options: &ObjOptions) -> ObjResult<Mesh> {
    let mut parser = ObjParser::new(*options);

    for (line_no, line) in src.lines().enumerate() {
        parser.parse_line(line.trim()).map_err(|kind| ObjError {
            line: line_no + 1,
            text: line.to_owned(),
            kind,
        })?;
        if parser.options.index_flush == IndexFlush::PerLine {
            parser.flush_indices();
        }
    }

    Ok(parser.finish())
}

/// Flat scalar storage for one attribute kind, in file order.
#[derive(Debug)]
struct AttributePool {
    attribute: Attribute,
    data: Vec<f32>,
}

impl AttributePool {
    fn new(attribute: Attribute) -> Self {
        Self {
            attribute,
            data: Vec::new(),
        }
    }

    /// Number of complete component groups.
    fn len(&self) -> usize {
        self.data.len() / self.attribute.components()
    }

    /// Parse the first `components()` tokens and append them.
    fn push_tokens<'a>(
        &mut self,
        tokens: impl Iterator<Item = &'a str>,
    ) -> std::result::Result<(), ObjErrorKind> {
        let width = self.attribute.components();
        let mut values = [0.0f32; 3];
        let mut count = 0;
        for (slot, token) in values.iter_mut().zip(tokens).take(width) {
            *slot = token
                .parse::<f32>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or(ObjErrorKind::MalformedAttributeLine(self.attribute))?;
            count += 1;
        }
        if count < width {
            return Err(ObjErrorKind::MalformedAttributeLine(self.attribute));
        }
        self.data.extend_from_slice(&values[..width]);
        Ok(())
    }

    /// Components of the group addressed by a 1-based OBJ index.
    fn get(&self, index: usize) -> std::result::Result<&[f32], ObjErrorKind> {
        let width = self.attribute.components();
        if index == 0 || index > self.len() {
            return Err(ObjErrorKind::UnresolvableIndex {
                attribute: self.attribute,
                index,
                available: self.len(),
            });
        }
        let start = (index - 1) * width;
        Ok(&self.data[start..start + width])
    }
}

/// One `pos[/tex][/norm]` reference, 1-based as written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct FaceVertexGroup {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

impl FaceVertexGroup {
    fn parse(token: &str) -> std::result::Result<Self, ObjErrorKind> {
        let malformed = || ObjErrorKind::MalformedVertexGroupToken(token.to_owned());
        let index = |part: &str| part.parse::<usize>().map_err(|_| malformed());
        let optional = |part: Option<&str>| match part {
            Some(value) if !value.is_empty() => index(value).map(Some),
            _ => Ok(None),
        };

        let mut split = token.split('/');
        let position = index(split.next().unwrap_or_default())?;
        let texcoord = optional(split.next())?;
        let normal = optional(split.next())?;
        if split.next().is_some() {
            return Err(malformed());
        }

        Ok(Self {
            position,
            texcoord,
            normal,
        })
    }
}

/// A vertex group with its attributes looked up.
#[derive(Clone, Copy, Debug)]
struct ResolvedVertex {
    key: FaceVertexGroup,
    position: Position,
    texcoord: TexCoord,
    normal: Normal,
}

struct ObjParser {
    options: ObjOptions,
    positions: AttributePool,
    texcoords: AttributePool,
    normals: AttributePool,
    mesh: Mesh,
    /// Indices not yet handed to the mesh.
    pending: Vec<u32>,
    reused: HashMap<FaceVertexGroup, u32>,
    faces: usize,
}

impl ObjParser {
    fn new(options: ObjOptions) -> Self {
        Self {
            options,
            positions: AttributePool::new(Attribute::Position),
            texcoords: AttributePool::new(Attribute::TexCoord),
            normals: AttributePool::new(Attribute::Normal),
            mesh: Mesh::new(),
            pending: Vec::new(),
            reused: HashMap::new(),
            faces: 0,
        }
    }

    /// Handle one trimmed line.
    fn parse_line(&mut self, line: &str) -> std::result::Result<(), ObjErrorKind> {
        let mut parts = line.split_whitespace();
        let Some(tag) = parts.next() else {
            return Ok(());
        };

        match tag {
            "vn" => self.normals.push_tokens(parts),
            "vt" => self.texcoords.push_tokens(parts),
            "v" => self.positions.push_tokens(parts),
            "f" => self.expand_face(parts),
            _ => Ok(()),
        }
    }

    fn expand_face<'a>(
        &mut self,
        tokens: impl Iterator<Item = &'a str>,
    ) -> std::result::Result<(), ObjErrorKind> {
        let tokens: Vec<&str> = tokens.collect();
        if tokens.len() < 3 {
            return Err(ObjErrorKind::UnsupportedFaceArity(tokens.len()));
        }

        let groups = tokens
            .into_iter()
            .map(|token| FaceVertexGroup::parse(token).and_then(|group| self.resolve(group)))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        // Fan around the first group: (0, 1, 2), (0, 2, 3), ...
        for k in 2..groups.len() {
            for vertex in [&groups[0], &groups[k - 1], &groups[k]] {
                let index = self.emit(vertex)?;
                self.pending.push(index);
            }
        }

        self.faces += 1;
        log::trace!(
            "face {}: {} groups, {} triangles",
            self.faces,
            groups.len(),
            groups.len() - 2
        );
        Ok(())
    }

    fn resolve(&self, group: FaceVertexGroup) -> std::result::Result<ResolvedVertex, ObjErrorKind> {
        let p = self.positions.get(group.position)?;
        let texcoord = match group.texcoord {
            Some(i) => {
                let t = self.texcoords.get(i)?;
                vec2(t[0], t[1])
            }
            None => DEFAULT_TEXCOORD,
        };
        let normal = match group.normal {
            Some(i) => {
                let n = self.normals.get(i)?;
                vec3(n[0], n[1], n[2])
            }
            None => DEFAULT_NORMAL,
        };

        Ok(ResolvedVertex {
            key: group,
            position: vec3(p[0], p[1], p[2]),
            texcoord,
            normal,
        })
    }

    /// Append a vertex to the mesh (or find its earlier copy) and return its index.
    fn emit(&mut self, vertex: &ResolvedVertex) -> std::result::Result<u32, ObjErrorKind> {
        if self.options.vertex_reuse == VertexReuse::Triple {
            if let Some(&index) = self.reused.get(&vertex.key) {
                return Ok(index);
            }
        }

        let index =
            u32::try_from(self.mesh.vertex_count()).map_err(|_| ObjErrorKind::TooManyVertices)?;
        self.mesh
            .push_vertex(vertex.position, vertex.texcoord, vertex.normal);

        if self.options.vertex_reuse == VertexReuse::Triple {
            self.reused.insert(vertex.key, index);
        }
        Ok(index)
    }

    fn flush_indices(&mut self) {
        self.mesh.add_indices(&self.pending);
        self.pending.clear();
    }

    fn finish(mut self) -> Mesh {
        self.flush_indices();
        log::debug!(
            "OBJ parsed: {} positions, {} texcoords, {} normals, {} faces -> {} vertices, {} indices",
            self.positions.len(),
            self.texcoords.len(),
            self.normals.len(),
            self.faces,
            self.mesh.vertex_count(),
            self.mesh.indices.len()
        );
        self.mesh
    }
}
