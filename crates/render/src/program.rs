use glam::{Mat4, Vec2, Vec3};
use quadshade_common::ShaderPaths;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Errors from building a shader program.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read {stage} shader {}: {source}", path.display())]
    Read {
        stage: ShaderStage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} shader {} failed to compile:\n{message}", path.display())]
    Compile {
        stage: ShaderStage,
        path: PathBuf,
        message: String,
    },
    #[error("shader program failed to link: {message}")]
    Link { message: String },
}

/// Where the two stages of a program come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    pub fn path(&self, stage: ShaderStage) -> &Path {
        match stage {
            ShaderStage::Vertex => &self.vertex,
            ShaderStage::Fragment => &self.fragment,
        }
    }

    /// Read one stage's source text from disk.
    pub fn read(&self, stage: ShaderStage) -> Result<String, ShaderError> {
        let path = self.path(stage);
        std::fs::read_to_string(path).map_err(|source| ShaderError::Read {
            stage,
            path: path.to_path_buf(),
            source,
        })
    }
}

impl From<&ShaderPaths> for ShaderSources {
    fn from(paths: &ShaderPaths) -> Self {
        Self::new(&paths.vertex, &paths.fragment)
    }
}

/// Type of a uniform as declared by a shader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    /// Bytes occupied by the value itself, excluding any std140 padding.
    pub fn byte_size(self) -> usize {
        4 * match self {
            UniformKind::Float => 1,
            UniformKind::Vec2 => 2,
            UniformKind::Vec3 => 3,
            UniformKind::Vec4 => 4,
            UniformKind::Mat4 => 16,
        }
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UniformKind::Float => "float",
            UniformKind::Vec2 => "vec2",
            UniformKind::Vec3 => "vec3",
            UniformKind::Vec4 => "vec4",
            UniformKind::Mat4 => "mat4",
        };
        f.pad(name)
    }
}

/// A value destined for a named uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    /// Write the value's native-endian bytes (matrices column-major) to the
    /// front of `dst`. Returns the number of bytes written.
    ///
    /// # Panics
    /// If `dst` is shorter than [`UniformKind::byte_size`].
    pub fn write_bytes(&self, dst: &mut [u8]) -> usize {
        let n = self.kind().byte_size();
        match self {
            UniformValue::Float(v) => dst[..n].copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec2(v) => dst[..n].copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Vec3(v) => dst[..n].copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Mat4(m) => {
                dst[..n].copy_from_slice(bytemuck::cast_slice(&m.to_cols_array()))
            }
        }
        n
    }
}

/// A linked shader program with uniforms settable by name.
///
/// Setting a uniform the program does not declare is not an error; the value
/// is dropped. Shaders are free to ignore any part of the uniform contract.
pub trait ShaderProgram {
    /// Declared type of `name`, or `None` if the program has no such uniform.
    fn uniform_kind(&self, name: &str) -> Option<UniformKind>;

    fn set_uniform(&mut self, name: &str, value: UniformValue);

    fn has_uniform(&self, name: &str) -> bool {
        self.uniform_kind(name).is_some()
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    fn set_vec2(&mut self, name: &str, x: f32, y: f32) {
        self.set_uniform(name, UniformValue::Vec2(Vec2::new(x, y)));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.set_uniform(name, UniformValue::Vec3(value));
    }

    fn set_mat4(&mut self, name: &str, value: &Mat4) {
        self.set_uniform(name, UniformValue::Mat4(*value));
    }
}
