//! GLSL 450 stage writer. Uniforms are grouped into one std140 block;
//! attributes and interpolants carry explicit location qualifiers.

use serde_json::Value;

use super::{json_number, Syntax, POSITION_ATTRIBUTE, VIEW_PROJECTION_UNIFORM};
use crate::codegen::stage::{Shader, ShaderStage, StageId};
use crate::codegen::types::{fmt_float, TypedExpr, ValueType};

pub const TARGET: &str = "glsl";

#[derive(Debug)]
pub struct GlslSyntax;

impl GlslSyntax {
    fn write_uniform_block(&self, stage: &ShaderStage, out: &mut String) {
        if !stage.uniforms().is_empty() {
            out.push_str("layout(std140, binding = 0) uniform Uniforms {\n");
            for decl in stage.uniforms() {
                out.push_str(&format!(
                    "    {} {};\n",
                    self.type_name(decl.ty),
                    decl.name
                ));
            }
            out.push_str("};\n\n");
        }
        for (i, tex) in stage.textures().iter().enumerate() {
            out.push_str(&format!(
                "layout(binding = {}) uniform sampler2D {};\n",
                i + 1,
                tex.texture
            ));
        }
        if !stage.textures().is_empty() {
            out.push('\n');
        }
    }
}

impl Syntax for GlslSyntax {
    fn target(&self) -> &'static str {
        TARGET
    }

    fn type_name(&self, ty: ValueType) -> &'static str {
        match ty {
            ValueType::Float => "float",
            ValueType::Int => "int",
            ValueType::Bool => "bool",
            ValueType::Vec2 => "vec2",
            ValueType::Vec3 => "vec3",
            ValueType::Vec4 => "vec4",
            ValueType::Mat4 => "mat4",
        }
    }

    fn literal(&self, ty: ValueType, value: &Value) -> Option<String> {
        match ty {
            ValueType::Float => json_number(value).map(fmt_float),
            ValueType::Int => value.as_i64().map(|v| format!("{v}")),
            ValueType::Bool => value.as_bool().map(|v| format!("{v}")),
            ValueType::Vec2 | ValueType::Vec3 | ValueType::Vec4 => {
                let arr = value.as_array()?;
                if arr.len() != ty.components() {
                    return None;
                }
                let parts: Option<Vec<String>> =
                    arr.iter().map(|v| json_number(v).map(fmt_float)).collect();
                let parts = parts?;
                let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
                Some(self.constructor(ty, &refs))
            }
            ValueType::Mat4 => None,
        }
    }

    fn constructor(&self, ty: ValueType, args: &[&str]) -> String {
        format!("{}({})", self.type_name(ty), args.join(", "))
    }

    fn local_decl(&self, name: &str, ty: ValueType, expr: &str) -> String {
        format!("{} {name} = {expr};", self.type_name(ty))
    }

    fn attribute_ref(&self, physical: &str) -> String {
        physical.to_string()
    }

    fn varying_ref(&self, physical: &str) -> String {
        physical.to_string()
    }

    fn varying_assign(&self, physical: &str, expr: &str) -> String {
        format!("{physical} = {expr};")
    }

    fn sample_texture(&self, texture: &str, _sampler: &str, uv: &str) -> String {
        format!("texture({texture}, {uv})")
    }

    fn to_vec4_color(&self, value: &TypedExpr) -> Option<String> {
        match value.ty {
            ValueType::Float => Some(format!("vec4(vec3({}), 1.0)", value.expr)),
            ValueType::Vec2 => Some(format!("vec4({}, 0.0, 1.0)", value.expr)),
            ValueType::Vec3 => Some(format!("vec4({}, 1.0)", value.expr)),
            ValueType::Vec4 => Some(value.expr.clone()),
            ValueType::Int | ValueType::Bool | ValueType::Mat4 => None,
        }
    }

    fn write_stage(&self, shader: &Shader, stage_id: StageId, frag_return: &str) -> String {
        let stage = shader.stage(stage_id);
        let mut out = String::from("#version 450\n\n");

        self.write_uniform_block(stage, &mut out);

        match stage_id {
            StageId::Vertex => {
                for (loc, decl) in stage.attributes().iter().enumerate() {
                    out.push_str(&format!(
                        "layout(location = {loc}) in {} {};\n",
                        self.type_name(decl.ty),
                        decl.name
                    ));
                }
                if !stage.attributes().is_empty() {
                    out.push('\n');
                }
                for (loc, decl) in stage.varyings().iter().enumerate() {
                    out.push_str(&format!(
                        "layout(location = {loc}) out {} {};\n",
                        self.type_name(decl.ty),
                        decl.name
                    ));
                }
                if !stage.varyings().is_empty() {
                    out.push('\n');
                }

                for f in stage.functions() {
                    out.push_str(&f.source);
                    out.push_str("\n\n");
                }

                out.push_str("void main() {\n");
                for stmt in stage.body() {
                    out.push_str(&format!("    {stmt}\n"));
                }
                out.push_str(&format!(
                    "    gl_Position = {VIEW_PROJECTION_UNIFORM} * vec4({POSITION_ATTRIBUTE}, 1.0);\n"
                ));
                out.push_str("}\n");
            }
            StageId::Fragment => {
                for (loc, decl) in stage.varyings().iter().enumerate() {
                    out.push_str(&format!(
                        "layout(location = {loc}) in {} {};\n",
                        self.type_name(decl.ty),
                        decl.name
                    ));
                }
                if !stage.varyings().is_empty() {
                    out.push('\n');
                }
                out.push_str("layout(location = 0) out vec4 frag_color;\n\n");

                for f in stage.functions() {
                    out.push_str(&f.source);
                    out.push_str("\n\n");
                }

                out.push_str("void main() {\n");
                for stmt in stage.body() {
                    out.push_str(&format!("    {stmt}\n"));
                }
                out.push_str(&format!("    frag_color = {frag_return};\n"));
                out.push_str("}\n");
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn glsl_spellings_differ_from_wgsl() {
        let syn = GlslSyntax;
        assert_eq!(syn.type_name(ValueType::Vec3), "vec3");
        assert_eq!(
            syn.literal(ValueType::Vec2, &json!([0.5, 1.0])).unwrap(),
            "vec2(0.5, 1.0)"
        );
        assert_eq!(
            syn.local_decl("x", ValueType::Float, "1.0"),
            "float x = 1.0;"
        );
    }

    #[test]
    fn varying_refs_are_bare_names() {
        let syn = GlslSyntax;
        assert_eq!(syn.varying_ref("v_normal_world"), "v_normal_world");
        assert_eq!(syn.varying_assign("v_uv", "i_uv"), "v_uv = i_uv;");
    }
}
