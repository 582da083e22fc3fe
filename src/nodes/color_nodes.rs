//! Color processing nodes: luminance, gamma, and HSV conversions.
//!
//! The HSV conversions are too large to inline per call site, so they are
//! emitted once as stage-level helper functions and invoked from the body.

use crate::codegen::{
    CodegenError, GenContext, NodeImpl, ResolvedNode, ShaderStage, ValueType,
};

use super::common::{coerce, emit_output, input_or_float};

/// Rec. 709 luma weights, matching what real-time pipelines use for
/// perceptual brightness of linear RGB.
const LUMA_WEIGHTS: [f64; 3] = [0.2126, 0.7152, 0.0722];

const HSV_TO_RGB_FN: &str = "hsv_to_rgb";
const HSV_TO_RGB_SRC: &str = "\
fn hsv_to_rgb(hsv: vec3f) -> vec3f {
    let h = hsv.x * 6.0;
    let k = vec3f(h, h + 4.0, h + 2.0) - 6.0 * floor(vec3f(h, h + 4.0, h + 2.0) / 6.0);
    let rgb = clamp(min(k, 4.0 - k), vec3f(0.0), vec3f(1.0));
    return hsv.z * mix(vec3f(1.0), rgb, hsv.y);
}";

const RGB_TO_HSV_FN: &str = "rgb_to_hsv";
const RGB_TO_HSV_SRC: &str = "\
fn rgb_to_hsv(rgb: vec3f) -> vec3f {
    let c_max = max(rgb.x, max(rgb.y, rgb.z));
    let c_min = min(rgb.x, min(rgb.y, rgb.z));
    let delta = c_max - c_min;
    var hue = 0.0;
    if (delta > 0.0) {
        if (c_max == rgb.x) {
            hue = (rgb.y - rgb.z) / delta;
        } else if (c_max == rgb.y) {
            hue = 2.0 + (rgb.z - rgb.x) / delta;
        } else {
            hue = 4.0 + (rgb.x - rgb.y) / delta;
        }
        hue = (hue / 6.0) - floor(hue / 6.0);
    }
    let sat = select(0.0, delta / c_max, c_max > 0.0);
    return vec3f(hue, sat, c_max);
}";

fn color_input(node: &ResolvedNode) -> Result<(String, ValueType), CodegenError> {
    let value = node.input("in")?.clone();
    match value.ty {
        // Alpha is passed through untouched for vec4 colors.
        ValueType::Vec3 => Ok((value.expr, ValueType::Vec3)),
        ValueType::Vec4 => Ok((value.expr, ValueType::Vec4)),
        other => Err(CodegenError::TypeMismatch {
            node_id: node.id().to_string(),
            detail: format!("color input must be vec3 or vec4, got {other:?}"),
        }),
    }
}

/// Weighted brightness of a linear RGB color. Port: `in` (vec3 or vec4).
#[derive(Debug)]
pub struct LuminanceImpl;

impl NodeImpl for LuminanceImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let (expr, ty) = color_input(node)?;
        let rgb = match ty {
            ValueType::Vec4 => format!("({expr}).xyz"),
            _ => expr,
        };
        let weights = ctx.syntax().constructor(
            ValueType::Vec3,
            &[
                &crate::codegen::fmt_float(LUMA_WEIGHTS[0]),
                &crate::codegen::fmt_float(LUMA_WEIGHTS[1]),
                &crate::codegen::fmt_float(LUMA_WEIGHTS[2]),
            ],
        );
        let expr = format!("dot({rgb}, {weights})");
        emit_output(node, ctx, stage, "out", ValueType::Float, &expr)?;
        Ok(())
    }
}

/// Per-channel power curve. Ports: `in`, `gamma` (default 2.2).
#[derive(Debug)]
pub struct GammaImpl;

impl NodeImpl for GammaImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let value = node.input("in")?.clone();
        let gamma = input_or_float(node, "gamma", 2.2);
        let gamma = coerce(node.id(), &gamma, value.ty, ctx)?;
        let expr = format!("pow({}, {})", value.expr, gamma.expr);
        emit_output(node, ctx, stage, "out", value.ty, &expr)?;
        Ok(())
    }
}

/// Direction of an HSV conversion node.
#[derive(Clone, Copy, Debug)]
pub enum HsvDirection {
    HsvToRgb,
    RgbToHsv,
}

/// HSV <-> RGB conversion via a shared helper function. Port: `in` (vec3,
/// or vec4 with pass-through alpha).
#[derive(Debug)]
pub struct HsvImpl {
    direction: HsvDirection,
}

impl HsvImpl {
    pub fn new(direction: HsvDirection) -> Self {
        Self { direction }
    }

    fn helper(&self) -> (&'static str, &'static str) {
        match self.direction {
            HsvDirection::HsvToRgb => (HSV_TO_RGB_FN, HSV_TO_RGB_SRC),
            HsvDirection::RgbToHsv => (RGB_TO_HSV_FN, RGB_TO_HSV_SRC),
        }
    }
}

impl NodeImpl for HsvImpl {
    fn emit_function_call(
        &self,
        node: &ResolvedNode,
        ctx: &mut GenContext,
        stage: &mut ShaderStage,
    ) -> Result<(), CodegenError> {
        let (expr, ty) = color_input(node)?;
        let (name, source) = self.helper();
        stage.add_function(name, source);
        let converted = match ty {
            ValueType::Vec4 => format!(
                "vec4f({name}(({expr}).xyz), ({expr}).w)"
            ),
            _ => format!("{name}({expr})"),
        };
        emit_output(node, ctx, stage, "out", ty, &converted)?;
        Ok(())
    }
}
