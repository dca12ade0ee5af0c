// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the shader pipeline resource and its uniform table.

use crate::asset::{Asset, AssetKind, DeviceState, HostMemory};
use std::{
    any::Any,
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, PoisonError,
    },
};
use thiserror::Error;

/// A programmable stage of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageType {
    /// Runs on the programmable vertex processor.
    Vertex,
    /// Runs on the programmable geometry processor.
    Geometry,
    /// Runs on the programmable fragment processor.
    Fragment,
}

/// The source of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderStage {
    /// Which stage this source is for.
    pub stage: StageType,
    /// Complete GLSL source, shared header included.
    pub source: String,
}

/// The declared type of a uniform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    /// `int`, and samplers (which hold a texture unit).
    Int,
    /// `uvec3`.
    UInt3,
    /// `float`.
    Float,
    /// `vec2`.
    Vec2,
    /// `vec3`.
    Vec3,
    /// `vec4`.
    Vec4,
    /// `mat4`.
    Mat4,
}

impl UniformType {
    /// Maps a GLSL type name to a uniform type.
    pub fn from_glsl(name: &str) -> Option<Self> {
        match name {
            "int" | "bool" | "sampler2D" | "samplerCube" | "sampler2DShadow" => {
                Some(UniformType::Int)
            }
            "uvec3" => Some(UniformType::UInt3),
            "float" => Some(UniformType::Float),
            "vec2" => Some(UniformType::Vec2),
            "vec3" => Some(UniformType::Vec3),
            "vec4" => Some(UniformType::Vec4),
            "mat4" => Some(UniformType::Mat4),
            _ => None,
        }
    }

    /// The zero value of this type.
    pub fn zero(&self) -> UniformValue {
        match self {
            UniformType::Int => UniformValue::Int(0),
            UniformType::UInt3 => UniformValue::UInt3([0; 3]),
            UniformType::Float => UniformValue::Float(0.0),
            UniformType::Vec2 => UniformValue::Vec2([0.0; 2]),
            UniformType::Vec3 => UniformValue::Vec3([0.0; 3]),
            UniformType::Vec4 => UniformValue::Vec4([0.0; 4]),
            UniformType::Mat4 => UniformValue::Mat4([0.0; 16]),
        }
    }
}

/// A uniform value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// A signed integer.
    Int(i32),
    /// Three unsigned integers.
    UInt3([u32; 3]),
    /// A float.
    Float(f32),
    /// Two floats.
    Vec2([f32; 2]),
    /// Three floats.
    Vec3([f32; 3]),
    /// Four floats.
    Vec4([f32; 4]),
    /// A column-major 4x4 matrix.
    Mat4([f32; 16]),
}

impl UniformValue {
    /// The type this value carries.
    pub fn uniform_type(&self) -> UniformType {
        match self {
            UniformValue::Int(_) => UniformType::Int,
            UniformValue::UInt3(_) => UniformType::UInt3,
            UniformValue::Float(_) => UniformType::Float,
            UniformValue::Vec2(_) => UniformType::Vec2,
            UniformValue::Vec3(_) => UniformType::Vec3,
            UniformValue::Vec4(_) => UniformType::Vec4,
            UniformValue::Mat4(_) => UniformType::Mat4,
        }
    }
}

/// Returned when a uniform is set with a value of the wrong type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("uniform declared as {expected:?} cannot hold a {actual:?}")]
pub struct UniformMismatch {
    /// The declared type.
    pub expected: UniformType,
    /// The type of the rejected value.
    pub actual: UniformType,
}

/// One uniform of a published pipeline: its current value and a dirty flag.
#[derive(Debug)]
pub struct UniformCell {
    declared: UniformType,
    value: Mutex<UniformValue>,
    dirty: AtomicBool,
}

impl UniformCell {
    /// Creates a cell holding the zero value of `declared`.
    pub fn new(declared: UniformType) -> Self {
        Self {
            declared,
            value: Mutex::new(declared.zero()),
            dirty: AtomicBool::new(false),
        }
    }

    /// The declared type.
    pub fn declared(&self) -> UniformType {
        self.declared
    }

    /// The current value.
    pub fn value(&self) -> UniformValue {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Changes the value; the dirty flag is raised only if it differs.
    pub fn set(&self, value: UniformValue) -> Result<(), UniformMismatch> {
        if value.uniform_type() != self.declared {
            return Err(UniformMismatch {
                expected: self.declared,
                actual: value.uniform_type(),
            });
        }
        let mut current = self.value.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != value {
            *current = value;
            self.dirty.store(true, Ordering::Release);
        }
        Ok(())
    }

    /// Returns the value if it changed since the last call, clearing the flag.
    pub fn take_dirty(&self) -> Option<UniformValue> {
        if self.dirty.swap(false, Ordering::AcqRel) {
            Some(self.value())
        } else {
            None
        }
    }
}

/// A decoded shader pipeline: stage sources plus the uniforms they declare.
#[derive(Debug)]
pub struct ShaderPipeline {
    stage_types: Vec<StageType>,
    stages: HostMemory<Vec<ShaderStage>>,
    uniforms: BTreeMap<String, UniformCell>,
    device: DeviceState,
}

impl ShaderPipeline {
    /// Creates a pipeline from its stages and declared uniforms.
    pub fn new(stages: Vec<ShaderStage>, uniforms: BTreeMap<String, UniformType>) -> Self {
        Self {
            stage_types: stages.iter().map(|s| s.stage).collect(),
            stages: HostMemory::new(stages),
            uniforms: uniforms
                .into_iter()
                .map(|(name, ty)| (name, UniformCell::new(ty)))
                .collect(),
            device: DeviceState::new(),
        }
    }

    /// The stages present in this pipeline, in declaration order.
    pub fn stage_types(&self) -> &[StageType] {
        &self.stage_types
    }

    /// The source of `stage`, unless absent or already released.
    pub fn source(&self, stage: StageType) -> Option<String> {
        self.stages
            .with(|stages| {
                stages
                    .iter()
                    .find(|s| s.stage == stage)
                    .map(|s| s.source.clone())
            })
            .flatten()
    }

    /// Looks up a uniform by name.
    pub fn uniform(&self, name: &str) -> Option<&UniformCell> {
        self.uniforms.get(name)
    }

    /// Iterates over every uniform, sorted by name.
    pub fn uniforms(&self) -> impl Iterator<Item = (&str, &UniformCell)> {
        self.uniforms.iter().map(|(name, cell)| (name.as_str(), cell))
    }

    /// Collects and clears every uniform changed since the last call.
    pub fn take_dirty_uniforms(&self) -> Vec<(&str, UniformValue)> {
        self.uniforms()
            .filter_map(|(name, cell)| cell.take_dirty().map(|value| (name, value)))
            .collect()
    }

    /// The device-side slot.
    pub fn device(&self) -> &DeviceState {
        &self.device
    }
}

impl Asset for ShaderPipeline {
    fn kind(&self) -> AssetKind {
        AssetKind::Shader
    }

    fn device_state(&self) -> Option<&DeviceState> {
        Some(&self.device)
    }

    fn release_host_memory(&self) {
        self.stages.release();
    }

    fn host_memory_bytes(&self) -> usize {
        self.stages
            .with(|stages| stages.iter().map(|s| s.source.len()).sum())
            .unwrap_or(0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipeline() -> ShaderPipeline {
        let stages = vec![
            ShaderStage {
                stage: StageType::Vertex,
                source: "void main() {}".to_string(),
            },
            ShaderStage {
                stage: StageType::Fragment,
                source: "void main() {}".to_string(),
            },
        ];
        let mut uniforms = BTreeMap::new();
        uniforms.insert("uTime".to_string(), UniformType::Float);
        uniforms.insert("uTexture".to_string(), UniformType::Int);
        ShaderPipeline::new(stages, uniforms)
    }

    #[test]
    fn test_uniform_dirty_flag() {
        let pipeline = pipeline();
        let time = pipeline.uniform("uTime").unwrap();

        time.set(UniformValue::Float(0.0)).unwrap();
        assert!(time.take_dirty().is_none());

        time.set(UniformValue::Float(1.5)).unwrap();
        assert_eq!(
            pipeline.take_dirty_uniforms(),
            vec![("uTime", UniformValue::Float(1.5))]
        );
        assert!(pipeline.take_dirty_uniforms().is_empty());
    }

    #[test]
    fn test_uniform_type_mismatch() {
        let pipeline = pipeline();
        let err = pipeline
            .uniform("uTexture")
            .unwrap()
            .set(UniformValue::Float(1.0))
            .unwrap_err();
        assert_eq!(err.expected, UniformType::Int);
    }

    #[test]
    fn test_release_keeps_uniforms_and_stage_list() {
        let pipeline = pipeline();
        assert!(pipeline.source(StageType::Vertex).is_some());
        pipeline.release_host_memory();
        assert!(pipeline.source(StageType::Vertex).is_none());
        assert_eq!(pipeline.stage_types(), &[StageType::Vertex, StageType::Fragment]);
        assert!(pipeline.uniform("uTime").is_some());
    }
}
