use naga::{AddressSpace, Module, Scalar, TypeInner, VectorSize};
use quadshade_render::{UniformKind, UniformValue};
use std::collections::BTreeMap;

/// One member of the uniform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformField {
    /// Byte offset inside the block (std140).
    pub offset: u32,
    pub kind: UniformKind,
}

impl UniformField {
    fn end(&self) -> u32 {
        self.offset + self.kind.byte_size() as u32
    }

    fn overlaps(&self, other: &UniformField) -> bool {
        self.offset < other.end() && other.offset < self.end()
    }
}

/// Reflected layout of a program's uniform block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UniformLayout {
    /// Block size in bytes as declared by the shader.
    pub span: u32,
    pub fields: BTreeMap<String, UniformField>,
}

impl UniformLayout {
    /// Find the uniform block declared by one shader stage.
    ///
    /// Returns `Ok(None)` when the stage declares no block. Block members of
    /// types the shell never writes (ints, arrays, nested structs) are left
    /// out of `fields`.
    pub fn reflect(module: &Module) -> Result<Option<Self>, String> {
        let mut found: Option<Self> = None;
        for (_, var) in module.global_variables.iter() {
            if var.space != AddressSpace::Uniform {
                continue;
            }
            let name = var.name.as_deref().unwrap_or("<anonymous>");
            let Some(binding) = &var.binding else {
                return Err(format!(
                    "uniform block `{name}` needs layout(set = 0, binding = 0)"
                ));
            };
            if binding.group != 0 || binding.binding != 0 {
                return Err(format!(
                    "uniform block `{name}` is at set = {}, binding = {}; only set = 0, binding = 0 is supported",
                    binding.group, binding.binding
                ));
            }
            if found.is_some() {
                return Err("more than one uniform block declared".into());
            }
            let TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
                return Err(format!("uniform `{name}` must be declared inside a uniform block"));
            };

            let mut fields = BTreeMap::new();
            for member in members {
                let Some(member_name) = &member.name else {
                    continue;
                };
                match kind_of(&module.types[member.ty].inner) {
                    Some(kind) => {
                        fields.insert(
                            member_name.clone(),
                            UniformField {
                                offset: member.offset,
                                kind,
                            },
                        );
                    }
                    None => {
                        tracing::debug!(uniform = %member_name, "unsupported uniform type, not settable");
                    }
                }
            }
            found = Some(Self {
                span: *span,
                fields,
            });
        }
        Ok(found)
    }

    /// Combine the blocks declared by two stages into one.
    ///
    /// Both stages bind the same buffer, so a name must have the same type
    /// and offset everywhere, and distinct names must not share bytes.
    pub fn merge(mut self, other: UniformLayout) -> Result<Self, String> {
        for (name, field) in other.fields {
            match self.fields.get(&name) {
                Some(existing) if *existing == field => continue,
                Some(existing) => {
                    return Err(format!(
                        "uniform `{name}` declared as {} at offset {} and as {} at offset {}",
                        existing.kind, existing.offset, field.kind, field.offset
                    ));
                }
                None => {}
            }
            if let Some((clash, _)) = self.fields.iter().find(|(_, f)| f.overlaps(&field)) {
                return Err(format!(
                    "uniforms `{clash}` and `{name}` overlap in the uniform block"
                ));
            }
            self.fields.insert(name, field);
        }
        self.span = self.span.max(other.span);
        Ok(self)
    }

    /// Size of the GPU buffer backing this block.
    pub fn buffer_size(&self) -> u64 {
        u64::from(self.span.max(16).next_multiple_of(16))
    }

    pub fn get(&self, name: &str) -> Option<&UniformField> {
        self.fields.get(name)
    }
}

fn kind_of(inner: &TypeInner) -> Option<UniformKind> {
    match *inner {
        TypeInner::Scalar(scalar) if scalar == Scalar::F32 => Some(UniformKind::Float),
        TypeInner::Vector { size, scalar } if scalar == Scalar::F32 => Some(match size {
            VectorSize::Bi => UniformKind::Vec2,
            VectorSize::Tri => UniformKind::Vec3,
            VectorSize::Quad => UniformKind::Vec4,
        }),
        TypeInner::Matrix {
            columns: VectorSize::Quad,
            rows: VectorSize::Quad,
            scalar,
        } if scalar == Scalar::F32 => Some(UniformKind::Mat4),
        _ => None,
    }
}

/// CPU copy of a uniform block, written by name and uploaded whole.
#[derive(Debug, Clone)]
pub struct UniformStaging {
    layout: UniformLayout,
    bytes: Vec<u8>,
}

impl UniformStaging {
    pub fn new(layout: UniformLayout) -> Self {
        let bytes = vec![0; layout.buffer_size() as usize];
        Self { layout, bytes }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Write `value` into the slot for `name`. Returns `false` (and leaves
    /// the block untouched) when the name is unknown or the type differs.
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        let Some(field) = self.layout.get(name) else {
            tracing::trace!(uniform = name, "uniform not declared by program, skipped");
            return false;
        };
        if field.kind != value.kind() {
            tracing::debug!(
                uniform = name,
                declared = %field.kind,
                given = %value.kind(),
                "uniform type mismatch, skipped"
            );
            return false;
        }
        let start = field.offset as usize;
        value.write_bytes(&mut self.bytes[start..]);
        true
    }
}
