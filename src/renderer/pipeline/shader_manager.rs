//! Shader Template Library
//!
//! WGSL sources under `src/renderer/shaders/` are embedded at build time and
//! rendered through a minijinja environment before compilation:
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `{{ NAME }}` | constant injected by the pass (sample counts, physical constants) |
//! | `{$ include "wind" $}` | pulls `chunks/wind.wgsl` |
//! | `$$ if WIREFRAME` | line statement |
//!
//! Compiled modules are cached by the xxh3-128 hash of the final source, so
//! two passes that render to the same WGSL share one `wgpu::ShaderModule`.

use std::borrow::Cow;
use std::sync::OnceLock;

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, Error, ErrorKind, Value};
use parking_lot::Mutex;
use rust_embed::RustEmbed;
use rustc_hash::FxHashMap;
use xxhash_rust::xxh3::xxh3_128;

use crate::errors::Result;

static SHADER_ENV: OnceLock<Option<Environment<'static>>> = OnceLock::new();

#[derive(RustEmbed)]
#[folder = "src/renderer/shaders"]
struct ShaderAssets;

fn build_env() -> Option<Environment<'static>> {
    let syntax = match SyntaxConfig::builder()
        .block_delimiters("{$", "$}")
        .variable_delimiters("{{", "}}")
        .line_statement_prefix("$$")
        .build()
    {
        Ok(syntax) => syntax,
        Err(e) => {
            log::error!("Failed to configure shader template syntax: {e}");
            return None;
        }
    };

    let mut env = Environment::new();
    env.set_syntax(syntax);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_undefined_behavior(minijinja::UndefinedBehavior::SemiStrict);
    env.set_loader(shader_loader);
    env.set_path_join_callback(|name, _parent| format!("chunks/{name}").into());
    Some(env)
}

fn get_env() -> Result<&'static Environment<'static>> {
    SHADER_ENV
        .get_or_init(build_env)
        .as_ref()
        .ok_or_else(|| Error::new(ErrorKind::InvalidOperation, "shader environment unavailable").into())
}

fn shader_loader(name: &str) -> std::result::Result<Option<String>, Error> {
    let filename = if std::path::Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wgsl"))
    {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("{name}.wgsl"))
    };

    let Some(file) = ShaderAssets::get(&filename) else {
        return Ok(None);
    };
    match std::str::from_utf8(file.data.as_ref()) {
        Ok(source) => Ok(Some(source.to_string())),
        Err(e) => Err(Error::new(
            ErrorKind::BadSerialization,
            format!("{filename} is not valid UTF-8: {e}"),
        )),
    }
}

/// Formats an `f32` as a WGSL float literal (always with `.` or exponent).
#[must_use]
pub fn wgsl_f32(value: f32) -> String {
    format!("{value:?}")
}

/// Renders `template` (relative to the shader folder, without extension).
pub fn render_template(template: &str, ctx: &Value) -> Result<String> {
    let env = get_env()?;
    let tmpl = env.get_template(template)?;
    Ok(tmpl.render(ctx)?)
}

/// Shared cache of compiled shader modules.
pub struct ShaderLibrary {
    module_cache: Mutex<FxHashMap<u128, wgpu::ShaderModule>>,
}

impl Default for ShaderLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl ShaderLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self {
            module_cache: Mutex::new(FxHashMap::default()),
        }
    }

    /// Renders `template` with `ctx` and returns the compiled module, reusing a
    /// cached one when the generated source is identical.
    pub fn module(&self, device: &wgpu::Device, template: &str, ctx: &Value) -> Result<wgpu::ShaderModule> {
        let source = render_template(template, ctx)?;
        log::trace!("Generated WGSL for {template}:\n{source}");

        let hash = xxh3_128(source.as_bytes());
        let mut cache = self.module_cache.lock();
        let module = cache.entry(hash).or_insert_with(|| {
            log::debug!("Compiling shader module {template} ({hash:032x})");
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("Shader Module {template}")),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        });
        Ok(module.clone())
    }

    #[must_use]
    pub fn module_count(&self) -> usize {
        self.module_cache.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_literals_are_wgsl_compatible() {
        assert_eq!(wgsl_f32(4.0), "4.0");
        assert_eq!(wgsl_f32(0.758), "0.758");
        assert_eq!(wgsl_f32(5.5e-6), "5.5e-6");
    }

    #[test]
    fn chunks_resolve_through_includes() {
        let source = render_template("passes/blit", &minijinja::context! {}).unwrap();
        assert!(source.contains("fn fullscreen_vertex"));
    }

    #[test]
    fn every_pass_template_renders() {
        use crate::renderer::graph::passes::template_contexts;

        for (name, ctx) in template_contexts() {
            let source = render_template(name, &ctx).unwrap_or_else(|e| panic!("{name}: {e}"));
            assert!(source.contains("@vertex"), "{name} has no vertex stage");
            assert!(!source.contains("{{"), "{name} left an unrendered variable");
        }
    }

    #[test]
    fn every_pass_template_is_valid_wgsl() {
        use crate::renderer::graph::passes::template_contexts;
        use naga::valid::{Capabilities, ValidationFlags, Validator};

        for (name, ctx) in template_contexts() {
            let source = render_template(name, &ctx).unwrap_or_else(|e| panic!("{name}: {e}"));
            let module = naga::front::wgsl::parse_str(&source)
                .unwrap_or_else(|e| panic!("{name} failed to parse:\n{}", e.emit_to_string(&source)));
            if let Err(e) = Validator::new(ValidationFlags::all(), Capabilities::all()).validate(&module) {
                panic!("{name} failed validation:\n{}", e.emit_to_string(&source));
            }
        }
    }
}
