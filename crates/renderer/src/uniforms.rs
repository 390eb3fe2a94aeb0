use std::collections::BTreeMap;

use serde::Serialize;
use wgpu::naga;

pub const RESOLUTION: &str = "u_resolution";
pub const TIME: &str = "u_time";
pub const OFFSET: &str = "u_offset";
pub const OVERLAY_RECT: &str = "u_rect";

/// std140 blocks are sized in multiples of a vec4.
const BLOCK_ALIGNMENT: u32 = 16;

/// Byte range of one named uniform inside the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UniformSlot {
    pub offset: u32,
    pub size: u32,
}

/// Named uniform slots reflected from the block at group 0 / binding 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UniformTable {
    block_size: u32,
    slots: BTreeMap<String, UniformSlot>,
}

impl UniformTable {
    /// Merges the group 0 / binding 0 uniform block of every module.
    ///
    /// Both stages of a program declare the same block, so a name seen twice
    /// keeps its first slot.
    pub fn reflect(modules: &[&naga::Module]) -> Self {
        let mut table = Self::default();
        for module in modules {
            for (_, global) in module.global_variables.iter() {
                if global.space != naga::AddressSpace::Uniform {
                    continue;
                }
                let bound_at_origin = global
                    .binding
                    .as_ref()
                    .is_some_and(|binding| binding.group == 0 && binding.binding == 0);
                if !bound_at_origin {
                    continue;
                }
                table.absorb(module, global);
            }
        }
        table.block_size = table.block_size.div_ceil(BLOCK_ALIGNMENT) * BLOCK_ALIGNMENT;
        table
    }

    fn absorb(&mut self, module: &naga::Module, global: &naga::GlobalVariable) {
        let inner = &module.types[global.ty].inner;
        match inner {
            naga::TypeInner::Struct { members, span } => {
                self.block_size = self.block_size.max(*span);
                for member in members {
                    let Some(name) = member.name.as_ref() else {
                        continue;
                    };
                    let size = module.types[member.ty].inner.size(module.to_ctx());
                    self.slots.entry(name.clone()).or_insert(UniformSlot {
                        offset: member.offset,
                        size,
                    });
                }
            }
            other => {
                // A bare (non-block) uniform occupies the binding on its own.
                if let Some(name) = global.name.as_ref() {
                    let size = other.size(module.to_ctx());
                    self.block_size = self.block_size.max(size);
                    self.slots
                        .entry(name.clone())
                        .or_insert(UniformSlot { offset: 0, size });
                }
            }
        }
    }

    pub fn slot(&self, name: &str) -> Option<UniformSlot> {
        self.slots.get(name).copied()
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Zeroed CPU-side staging block laid out per this table.
    pub fn block(&self) -> UniformBlock {
        UniformBlock {
            table: self.clone(),
            bytes: vec![0; self.block_size as usize],
        }
    }
}

/// CPU copy of the uniform block, written by name and uploaded whole.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    table: UniformTable,
    bytes: Vec<u8>,
}

impl UniformBlock {
    /// Writes `value` into the named slot. Returns `false` when the program
    /// does not declare the uniform, in which case the write is skipped.
    pub fn set_f32(&mut self, name: &str, value: f32) -> bool {
        self.write(name, bytemuck::bytes_of(&value))
    }

    pub fn set_vec2(&mut self, name: &str, value: [f32; 2]) -> bool {
        self.write(name, bytemuck::cast_slice(&value))
    }

    pub fn set_vec4(&mut self, name: &str, value: [f32; 4]) -> bool {
        self.write(name, bytemuck::cast_slice(&value))
    }

    pub fn read_f32(&self, name: &str) -> Option<f32> {
        let bytes = self.read(name, 4)?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    pub fn read_vec2(&self, name: &str) -> Option<[f32; 2]> {
        let bytes = self.read(name, 8)?;
        Some(bytemuck::pod_read_unaligned(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn table(&self) -> &UniformTable {
        &self.table
    }

    fn write(&mut self, name: &str, data: &[u8]) -> bool {
        let Some(slot) = self.table.slot(name) else {
            tracing::trace!(uniform = name, "uniform not declared; skipping upload");
            return false;
        };
        let start = slot.offset as usize;
        let len = data.len().min(slot.size as usize);
        let Some(target) = self.bytes.get_mut(start..start + len) else {
            return false;
        };
        target.copy_from_slice(&data[..len]);
        true
    }

    fn read(&self, name: &str, len: usize) -> Option<&[u8]> {
        let slot = self.table.slot(name)?;
        if (slot.size as usize) < len {
            return None;
        }
        let start = slot.offset as usize;
        self.bytes.get(start..start + len)
    }
}

/// Reads a value back out of raw block bytes using a reflected slot.
pub fn decode_vec2(bytes: &[u8], slot: UniformSlot) -> Option<[f32; 2]> {
    let start = slot.offset as usize;
    bytes
        .get(start..start + 8)
        .map(bytemuck::pod_read_unaligned)
}

pub fn decode_f32(bytes: &[u8], slot: UniformSlot) -> Option<f32> {
    let start = slot.offset as usize;
    bytes
        .get(start..start + 4)
        .map(bytemuck::pod_read_unaligned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::{compile_stage, pattern_fragment_source, OVERLAY_VERTEX_GLSL};
    use crate::pipeline::Stage;
    use crate::types::ColorMapping;

    fn pattern_table() -> UniformTable {
        let module = compile_stage(
            &pattern_fragment_source(&ColorMapping::default()),
            Stage::Fragment,
        )
        .unwrap();
        UniformTable::reflect(&[&module])
    }

    #[test]
    fn reflects_std140_offsets() {
        let table = pattern_table();
        assert_eq!(table.slot(RESOLUTION), Some(UniformSlot { offset: 0, size: 8 }));
        assert_eq!(table.slot(OFFSET), Some(UniformSlot { offset: 8, size: 8 }));
        assert_eq!(table.slot(TIME), Some(UniformSlot { offset: 16, size: 4 }));
        assert_eq!(table.block_size(), 32);
    }

    #[test]
    fn overlay_rect_is_a_vec4() {
        let module = compile_stage(OVERLAY_VERTEX_GLSL, Stage::Vertex).unwrap();
        let table = UniformTable::reflect(&[&module]);
        assert_eq!(table.slot(OVERLAY_RECT), Some(UniformSlot { offset: 0, size: 16 }));
        assert_eq!(table.block_size(), 16);
    }

    #[test]
    fn block_writes_land_at_reflected_offsets() {
        let table = pattern_table();
        let mut block = table.block();
        assert!(block.set_vec2(RESOLUTION, [1024.0, 768.0]));
        assert!(block.set_f32(TIME, 2.5));
        assert_eq!(block.read_vec2(RESOLUTION), Some([1024.0, 768.0]));
        assert_eq!(block.read_f32(TIME), Some(2.5));
        let time_slot = table.slot(TIME).unwrap();
        assert_eq!(decode_f32(block.as_bytes(), time_slot), Some(2.5));
    }

    #[test]
    fn missing_uniform_is_skipped() {
        let mut block = pattern_table().block();
        let before = block.as_bytes().to_vec();
        assert!(!block.set_f32("u_missing", 1.0));
        assert_eq!(block.as_bytes(), before.as_slice());
        assert_eq!(block.read_f32("u_missing"), None);
    }
}
