//! Generated-source validation using the naga library.
//!
//! The generator only promises syntactically well-formed text; these entry
//! points run the real parser/validator over it. Integration tests call them
//! on every generated module, and downstream callers can do the same before
//! handing sources to a GPU API.

use anyhow::{anyhow, Context, Result};

use crate::codegen::StageId;

/// Parse and validate a WGSL module.
///
/// Returns the parsed naga module on success, or an error carrying the full
/// numbered source listing so a bad module can be read in place.
pub fn validate_wgsl(source: &str) -> Result<naga::Module> {
    naga::front::wgsl::parse_str(source)
        .map_err(|e| anyhow!("WGSL validation failed:\n{}", format_error_listing(source, &e)))
}

/// Validate WGSL and name what produced it (e.g. a graph or stage id) in the
/// error chain.
pub fn validate_wgsl_with_context(source: &str, context: &str) -> Result<naga::Module> {
    validate_wgsl(source).with_context(|| format!("{context} generated invalid WGSL"))
}

/// Parse and validate one GLSL stage.
///
/// GLSL modules are per-stage, so the caller names which entry point the
/// source holds.
pub fn validate_glsl(source: &str, stage: StageId) -> Result<naga::Module> {
    let shader_stage = match stage {
        StageId::Vertex => naga::ShaderStage::Vertex,
        StageId::Fragment => naga::ShaderStage::Fragment,
    };
    let options = naga::front::glsl::Options {
        stage: shader_stage,
        defines: Default::default(),
    };
    let module = naga::front::glsl::Frontend::default()
        .parse(&options, source)
        .map_err(|e| anyhow!("GLSL {stage} parse failed: {e:?}\n\nGenerated GLSL:\n{source}"))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| anyhow!("GLSL {stage} validation failed: {e:?}"))?;
    Ok(module)
}

/// Format a naga parse error together with a line-numbered listing of the
/// offending source.
fn format_error_listing(source: &str, error: &naga::front::wgsl::ParseError) -> String {
    let mut output = String::new();
    output.push_str(&format!("  {error}\n"));
    output.push_str("\nGenerated WGSL:\n");
    output.push_str("---\n");
    for (line_num, line) in source.lines().enumerate() {
        output.push_str(&format!("{:4} | {}\n", line_num + 1, line));
    }
    output.push_str("---\n");
    output
}
