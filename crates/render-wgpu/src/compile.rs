use naga::front::glsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};
use quadshade_render::{ShaderError, ShaderSources, ShaderStage};
use std::path::Path;

use crate::reflect::UniformLayout;

/// Both stages of a program, parsed and validated, plus the merged uniform
/// block layout. No GPU objects yet.
#[derive(Debug)]
pub struct CompiledProgram {
    pub vertex: naga::Module,
    pub fragment: naga::Module,
    /// `None` when neither stage declares a uniform block.
    pub uniforms: Option<UniformLayout>,
}

/// Read and compile a vertex + fragment pair from disk.
pub fn compile_program(sources: &ShaderSources) -> Result<CompiledProgram, ShaderError> {
    let vertex_src = sources.read(ShaderStage::Vertex)?;
    let fragment_src = sources.read(ShaderStage::Fragment)?;
    let vertex = compile_source(ShaderStage::Vertex, &vertex_src, &sources.vertex)?;
    let fragment = compile_source(ShaderStage::Fragment, &fragment_src, &sources.fragment)?;
    link(vertex, fragment)
}

/// Parse and validate one GLSL stage. `path` only labels diagnostics.
pub fn compile_source(
    stage: ShaderStage,
    source: &str,
    path: &Path,
) -> Result<naga::Module, ShaderError> {
    let compile_error = |message: String| ShaderError::Compile {
        stage,
        path: path.to_path_buf(),
        message,
    };

    let naga_stage = match stage {
        ShaderStage::Vertex => naga::ShaderStage::Vertex,
        ShaderStage::Fragment => naga::ShaderStage::Fragment,
    };
    let mut frontend = glsl::Frontend::default();
    let module = frontend
        .parse(&glsl::Options::from(naga_stage), source)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;

    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| compile_error(e.emit_to_string(source)))?;

    tracing::debug!(%stage, path = %path.display(), "compiled shader stage");
    Ok(module)
}

/// Check that two compiled stages agree on their uniform block.
pub(crate) fn link(
    vertex: naga::Module,
    fragment: naga::Module,
) -> Result<CompiledProgram, ShaderError> {
    let link_error = |message: String| ShaderError::Link { message };

    let vs_block = UniformLayout::reflect(&vertex).map_err(link_error)?;
    let fs_block = UniformLayout::reflect(&fragment).map_err(link_error)?;
    let uniforms = match (vs_block, fs_block) {
        (Some(vs), Some(fs)) => Some(vs.merge(fs).map_err(link_error)?),
        (vs, fs) => vs.or(fs),
    };

    Ok(CompiledProgram {
        vertex,
        fragment,
        uniforms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::{FALLBACK_FRAGMENT, FALLBACK_VERTEX};
    use quadshade_render::UniformKind;
    use quadshade_render::uniforms::{CONTRACT, names};
    use std::io::Write;
    use std::path::PathBuf;

    const FULL_FRAGMENT: &str = r#"#version 450 core
layout(std140, set = 0, binding = 0) uniform ShellUniforms {
    vec2 u_resolution;
    float u_time;
    float u_deltatime;
    vec3 u_camorigin;
    vec3 u_camdir;
    vec3 u_camup;
    mat4 u_projection;
    mat4 u_view;
};

layout(location = 0) out vec4 frag_color;

void main() {
    vec2 uv = gl_FragCoord.xy / u_resolution;
    frag_color = vec4(uv, 0.5 + 0.5 * sin(u_time), 1.0);
}
"#;

    fn compile_pair(vs: &str, fs: &str) -> Result<CompiledProgram, ShaderError> {
        let vertex = compile_source(ShaderStage::Vertex, vs, Path::new("test.vs"))?;
        let fragment = compile_source(ShaderStage::Fragment, fs, Path::new("test.fs"))?;
        link(vertex, fragment)
    }

    #[test]
    fn full_contract_reflects_std140_offsets() {
        let program = compile_pair(FALLBACK_VERTEX, FULL_FRAGMENT).unwrap();
        let layout = program.uniforms.expect("uniform block");

        let offset = |name: &str| layout.get(name).unwrap().offset;
        assert_eq!(offset(names::RESOLUTION), 0);
        assert_eq!(offset(names::TIME), 8);
        assert_eq!(offset(names::DELTA_TIME), 12);
        assert_eq!(offset(names::CAMERA_ORIGIN), 16);
        assert_eq!(offset(names::CAMERA_DIRECTION), 32);
        assert_eq!(offset(names::CAMERA_UP), 48);
        assert_eq!(offset(names::PROJECTION), 64);
        assert_eq!(offset(names::VIEW), 128);
        assert_eq!(layout.buffer_size(), 192);

        for (name, kind) in CONTRACT {
            assert_eq!(layout.get(name).map(|f| f.kind), Some(kind), "{name}");
        }
    }

    #[test]
    fn shipped_sample_shaders_compile() {
        let program = compile_pair(
            include_str!("../../../shaders/shader.vs"),
            include_str!("../../../shaders/shader.fs"),
        )
        .unwrap();
        let layout = program.uniforms.unwrap();
        assert_eq!(layout.fields.len(), CONTRACT.len());
    }

    #[test]
    fn fallback_program_compiles() {
        let program = compile_pair(FALLBACK_VERTEX, FALLBACK_FRAGMENT).unwrap();
        let layout = program.uniforms.unwrap();
        assert_eq!(
            layout.get(names::TIME).map(|f| f.kind),
            Some(UniformKind::Float)
        );
    }

    #[test]
    fn no_uniform_block_is_fine() {
        let fs = r#"#version 450 core
layout(location = 0) out vec4 frag_color;
void main() {
    frag_color = vec4(1.0, 0.0, 1.0, 1.0);
}
"#;
        let program = compile_pair(FALLBACK_VERTEX, fs).unwrap();
        assert!(program.uniforms.is_none());
    }

    #[test]
    fn syntax_error_is_compile_error() {
        let fs = "#version 450 core\nvoid main() { this is not glsl }\n";
        let err = compile_pair(FALLBACK_VERTEX, fs).unwrap_err();
        match err {
            ShaderError::Compile { stage, path, .. } => {
                assert_eq!(stage, ShaderStage::Fragment);
                assert_eq!(path, PathBuf::from("test.fs"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_binding_is_link_error() {
        let fs = r#"#version 450 core
layout(std140, set = 0, binding = 3) uniform Params {
    float u_time;
};
layout(location = 0) out vec4 frag_color;
void main() {
    frag_color = vec4(u_time);
}
"#;
        let err = compile_pair(FALLBACK_VERTEX, fs).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }), "{err}");
    }

    #[test]
    fn conflicting_stage_blocks_are_link_error() {
        let vs = r#"#version 450 core
layout(std140, set = 0, binding = 0) uniform Params {
    float u_time;
};
layout(location = 0) in vec3 a_position;
void main() {
    gl_Position = vec4(a_position * u_time, 1.0);
}
"#;
        let fs = r#"#version 450 core
layout(std140, set = 0, binding = 0) uniform Params {
    vec2 u_resolution;
    float u_time;
};
layout(location = 0) out vec4 frag_color;
void main() {
    frag_color = vec4(u_resolution, u_time, 1.0);
}
"#;
        let err = compile_pair(vs, fs).unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }), "{err}");
    }

    #[test]
    fn compile_program_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let vs_path = dir.path().join("shader.vs");
        let fs_path = dir.path().join("shader.fs");
        std::fs::File::create(&vs_path)
            .unwrap()
            .write_all(FALLBACK_VERTEX.as_bytes())
            .unwrap();
        std::fs::File::create(&fs_path)
            .unwrap()
            .write_all(FULL_FRAGMENT.as_bytes())
            .unwrap();

        let program = compile_program(&ShaderSources::new(&vs_path, &fs_path)).unwrap();
        assert_eq!(program.uniforms.unwrap().fields.len(), CONTRACT.len());
    }

    #[test]
    fn compile_program_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let sources = ShaderSources::new(dir.path().join("a.vs"), dir.path().join("a.fs"));
        let err = compile_program(&sources).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::Read {
                stage: ShaderStage::Vertex,
                ..
            }
        ));
    }
}
