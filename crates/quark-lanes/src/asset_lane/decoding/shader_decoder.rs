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

use super::read_to_vec;
use quark_core::asset::{
    resources::{ShaderPipeline, ShaderStage, StageType, UniformType},
    Asset, AssetDecoder, ByteStream, DecodeError, DeviceCapabilities,
};
use std::{collections::BTreeMap, sync::Arc};

/// Decodes `.pipeline` files: GLSL stage sources split by `@stage` markers.
///
/// ```text
/// #version 330 core          <- shared header, prepended to every stage
/// uniform mat4 u_mvp;
/// @vertex
/// void main() { ... }
/// @fragment
/// uniform sampler2D u_albedo;
/// void main() { ... }
/// ```
///
/// Vertex and fragment stages are mandatory; a geometry stage requires the
/// `geometry_shaders` capability. Every `uniform <type> <name>;` declaration
/// becomes an entry of the pipeline's uniform table.
#[derive(Debug, Clone)]
pub struct GlslPipelineDecoder {
    geometry_shaders: bool,
}

impl GlslPipelineDecoder {
    /// Creates a decoder for a device with the given capabilities.
    pub fn new(capabilities: &DeviceCapabilities) -> Self {
        Self {
            geometry_shaders: capabilities.geometry_shaders,
        }
    }
}

fn stage_marker(line: &str) -> Option<Result<StageType, DecodeError>> {
    let marker = line.strip_prefix('@')?;
    Some(match marker {
        "vertex" => Ok(StageType::Vertex),
        "geometry" => Ok(StageType::Geometry),
        "fragment" => Ok(StageType::Fragment),
        other => Err(DecodeError::malformed(format!(
            "unknown stage marker '@{other}'"
        ))),
    })
}

/// Parses `uniform [precision] <type> <name>[\[n\]];`.
fn uniform_declaration(line: &str) -> Option<Result<(String, UniformType), DecodeError>> {
    let rest = line.strip_prefix("uniform")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    if rest.contains('{') {
        return Some(Err(DecodeError::unsupported("uniform blocks")));
    }
    let tokens: Vec<&str> = rest
        .trim_end()
        .trim_end_matches(';')
        .split_whitespace()
        .filter(|t| !matches!(*t, "lowp" | "mediump" | "highp"))
        .collect();
    let &[ty, name] = tokens.as_slice() else {
        return Some(Err(DecodeError::malformed(format!(
            "cannot parse uniform declaration '{line}'"
        ))));
    };
    let name = name.split('[').next().unwrap_or(name);
    Some(match UniformType::from_glsl(ty) {
        Some(ty) => Ok((name.to_string(), ty)),
        None => Err(DecodeError::unsupported(format!("uniform type '{ty}'"))),
    })
}

impl AssetDecoder for GlslPipelineDecoder {
    fn decode(&self, stream: ByteStream, _extension: &str) -> Result<Arc<dyn Asset>, DecodeError> {
        let text = String::from_utf8(read_to_vec(stream)?)
            .map_err(|_| DecodeError::malformed("pipeline source is not UTF-8"))?;

        let mut header = String::new();
        let mut bodies: Vec<(StageType, String)> = Vec::new();
        let mut uniforms = BTreeMap::new();

        for line in text.lines() {
            let trimmed = line.trim();
            if let Some(stage) = stage_marker(trimmed) {
                let stage = stage?;
                if bodies.iter().any(|(s, _)| *s == stage) {
                    return Err(DecodeError::malformed(format!("duplicate {stage:?} stage")));
                }
                bodies.push((stage, String::new()));
                continue;
            }

            if let Some(declaration) = uniform_declaration(trimmed) {
                let (name, ty) = declaration?;
                if let Some(previous) = uniforms.insert(name.clone(), ty) {
                    if previous != ty {
                        return Err(DecodeError::malformed(format!(
                            "uniform '{name}' declared as both {previous:?} and {ty:?}"
                        )));
                    }
                }
            }

            let target = bodies.last_mut().map_or(&mut header, |(_, body)| body);
            target.push_str(line);
            target.push('\n');
        }

        for required in [StageType::Vertex, StageType::Fragment] {
            if !bodies.iter().any(|(s, _)| *s == required) {
                return Err(DecodeError::malformed(format!("missing {required:?} stage")));
            }
        }
        if !self.geometry_shaders && bodies.iter().any(|(s, _)| *s == StageType::Geometry) {
            return Err(DecodeError::unsupported(
                "geometry stage without geometry shader support",
            ));
        }

        let stages = bodies
            .into_iter()
            .map(|(stage, body)| ShaderStage {
                stage,
                source: format!("{header}{body}"),
            })
            .collect();
        log::trace!("Decoded pipeline with {} uniforms.", uniforms.len());
        Ok(Arc::new(ShaderPipeline::new(stages, uniforms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quark_core::asset::resources::UniformValue;
    use std::io::Cursor;

    const BASIC: &str = "#version 330 core
uniform mat4 u_mvp;
@vertex
layout(location = 0) in vec3 a_pos;
void main() { gl_Position = u_mvp * vec4(a_pos, 1.0); }
@fragment
uniform highp vec4 u_tint;
uniform sampler2D u_albedo;
out vec4 color;
void main() { color = u_tint; }
";

    fn decode(caps: &DeviceCapabilities, text: &str) -> Result<Arc<dyn Asset>, DecodeError> {
        GlslPipelineDecoder::new(caps).decode(Box::new(Cursor::new(text.to_string())), "pipeline")
    }

    #[test]
    fn test_stages_share_header_and_uniforms_are_collected() {
        let asset = decode(&DeviceCapabilities::default(), BASIC).unwrap();
        let pipeline = asset.as_any().downcast_ref::<ShaderPipeline>().unwrap();

        let vertex = pipeline.source(StageType::Vertex).unwrap();
        let fragment = pipeline.source(StageType::Fragment).unwrap();
        assert!(vertex.starts_with("#version 330 core\nuniform mat4 u_mvp;\n"));
        assert!(fragment.starts_with("#version 330 core\n"));
        assert!(fragment.contains("u_tint"));
        assert!(!vertex.contains("u_tint"));

        assert_eq!(pipeline.uniform("u_mvp").unwrap().declared(), UniformType::Mat4);
        assert_eq!(pipeline.uniform("u_tint").unwrap().declared(), UniformType::Vec4);
        assert_eq!(
            pipeline.uniform("u_albedo").unwrap().value(),
            UniformValue::Int(0)
        );
    }

    #[test]
    fn test_missing_fragment_stage_is_malformed() {
        let text = "@vertex\nvoid main() {}\n";
        assert!(matches!(
            decode(&DeviceCapabilities::default(), text),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn test_geometry_stage_depends_on_capability() {
        let text = "@vertex\nvoid main() {}\n@geometry\nvoid main() {}\n@fragment\nvoid main() {}\n";
        assert!(matches!(
            decode(&DeviceCapabilities::default(), text),
            Err(DecodeError::UnsupportedFeature(_))
        ));

        let caps = DeviceCapabilities {
            geometry_shaders: true,
            ..Default::default()
        };
        let asset = decode(&caps, text).unwrap();
        let pipeline = asset.as_any().downcast_ref::<ShaderPipeline>().unwrap();
        assert!(pipeline.source(StageType::Geometry).is_some());
    }

    #[test]
    fn test_unknown_uniform_type_is_unsupported() {
        let text = "uniform dmat4 u_x;\n@vertex\n@fragment\n";
        assert!(matches!(
            decode(&DeviceCapabilities::default(), text),
            Err(DecodeError::UnsupportedFeature(_))
        ));
    }
}
