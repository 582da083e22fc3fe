//! WGSL stage writer. Emitted modules are expected to pass
//! `naga::front::wgsl` validation; the integration tests enforce this.

use serde_json::Value;

use super::{json_number, Syntax, POSITION_ATTRIBUTE, VIEW_PROJECTION_UNIFORM};
use crate::codegen::stage::{Shader, ShaderStage, StageId};
use crate::codegen::types::{fmt_float, TypedExpr, ValueType};

pub const TARGET: &str = "wgsl";

#[derive(Debug)]
pub struct WgslSyntax;

impl WgslSyntax {
    fn write_uniform_block(&self, shader: &Shader, stage: &ShaderStage, out: &mut String) {
        for decl in stage.uniforms() {
            // Binding indices are shader-wide so both stage modules agree.
            let binding = shader.uniform_binding(&decl.name).unwrap_or(0);
            out.push_str(&format!(
                "@group(0) @binding({binding})\nvar<uniform> {}: {};\n",
                decl.name,
                self.type_name(decl.ty)
            ));
        }
        for (i, tex) in stage.textures().iter().enumerate() {
            let tex_binding = i * 2;
            let samp_binding = tex_binding + 1;
            out.push_str(&format!(
                "@group(1) @binding({tex_binding})\nvar {}: texture_2d<f32>;\n",
                tex.texture
            ));
            out.push_str(&format!(
                "@group(1) @binding({samp_binding})\nvar {}: sampler;\n",
                tex.sampler
            ));
        }
        if !stage.uniforms().is_empty() || !stage.textures().is_empty() {
            out.push('\n');
        }
    }

    fn write_vs_out_struct(&self, stage: &ShaderStage, out: &mut String) {
        out.push_str("struct VsOut {\n    @builtin(position) position: vec4f,\n");
        for (loc, decl) in stage.varyings().iter().enumerate() {
            out.push_str(&format!(
                "    @location({loc}) {}: {},\n",
                decl.name,
                self.type_name(decl.ty)
            ));
        }
        out.push_str("}\n\n");
    }
}

impl Syntax for WgslSyntax {
    fn target(&self) -> &'static str {
        TARGET
    }

    fn type_name(&self, ty: ValueType) -> &'static str {
        match ty {
            ValueType::Float => "f32",
            ValueType::Int => "i32",
            ValueType::Bool => "bool",
            ValueType::Vec2 => "vec2f",
            ValueType::Vec3 => "vec3f",
            ValueType::Vec4 => "vec4f",
            ValueType::Mat4 => "mat4x4f",
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
        format!("let {name}: {} = {expr};", self.type_name(ty))
    }

    fn attribute_ref(&self, physical: &str) -> String {
        format!("in.{physical}")
    }

    fn varying_ref(&self, physical: &str) -> String {
        format!("in.{physical}")
    }

    fn varying_assign(&self, physical: &str, expr: &str) -> String {
        format!("out.{physical} = {expr};")
    }

    fn sample_texture(&self, texture: &str, sampler: &str, uv: &str) -> String {
        format!("textureSample({texture}, {sampler}, {uv})")
    }

    fn to_vec4_color(&self, value: &TypedExpr) -> Option<String> {
        match value.ty {
            ValueType::Float => Some(format!("vec4f(vec3f({}), 1.0)", value.expr)),
            ValueType::Vec2 => Some(format!("vec4f({}, 0.0, 1.0)", value.expr)),
            ValueType::Vec3 => Some(format!("vec4f({}, 1.0)", value.expr)),
            ValueType::Vec4 => Some(value.expr.clone()),
            ValueType::Int | ValueType::Bool | ValueType::Mat4 => None,
        }
    }

    fn write_stage(&self, shader: &Shader, stage_id: StageId, frag_return: &str) -> String {
        let stage = shader.stage(stage_id);
        let mut out = String::new();

        self.write_uniform_block(shader, stage, &mut out);

        match stage_id {
            StageId::Vertex => {
                out.push_str("struct VsIn {\n");
                for (loc, decl) in stage.attributes().iter().enumerate() {
                    out.push_str(&format!(
                        "    @location({loc}) {}: {},\n",
                        decl.name,
                        self.type_name(decl.ty)
                    ));
                }
                out.push_str("}\n\n");
                self.write_vs_out_struct(stage, &mut out);

                for f in stage.functions() {
                    out.push_str(&f.source);
                    out.push_str("\n\n");
                }

                out.push_str("@vertex\nfn vs_main(in: VsIn) -> VsOut {\n    var out: VsOut;\n");
                for stmt in stage.body() {
                    out.push_str(&format!("    {stmt}\n"));
                }
                out.push_str(&format!(
                    "    out.position = {VIEW_PROJECTION_UNIFORM} * vec4f(in.{POSITION_ATTRIBUTE}, 1.0);\n"
                ));
                out.push_str("    return out;\n}\n");
            }
            StageId::Fragment => {
                self.write_vs_out_struct(stage, &mut out);

                for f in stage.functions() {
                    out.push_str(&f.source);
                    out.push_str("\n\n");
                }

                out.push_str("@fragment\nfn fs_main(in: VsOut) -> @location(0) vec4f {\n");
                for stmt in stage.body() {
                    out.push_str(&format!("    {stmt}\n"));
                }
                out.push_str(&format!("    return {frag_return};\n}}\n"));
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
    fn literals_follow_wgsl_spelling() {
        let syn = WgslSyntax;
        assert_eq!(syn.literal(ValueType::Float, &json!(0.5)).unwrap(), "0.5");
        assert_eq!(
            syn.literal(ValueType::Vec3, &json!([1.0, 0.0, 0.25])).unwrap(),
            "vec3f(1.0, 0.0, 0.25)"
        );
        assert_eq!(syn.literal(ValueType::Vec3, &json!([1.0, 2.0])), None);
    }

    #[test]
    fn local_decl_uses_let_with_explicit_type() {
        let syn = WgslSyntax;
        assert_eq!(
            syn.local_decl("nd_a_out", ValueType::Vec3, "(a + b)"),
            "let nd_a_out: vec3f = (a + b);"
        );
    }

    #[test]
    fn color_conversion_covers_scalar_and_vectors() {
        let syn = WgslSyntax;
        let f = TypedExpr::new("x", ValueType::Float);
        assert_eq!(syn.to_vec4_color(&f).unwrap(), "vec4f(vec3f(x), 1.0)");
        let m = TypedExpr::new("m", ValueType::Mat4);
        assert!(syn.to_vec4_color(&m).is_none());
    }
}
