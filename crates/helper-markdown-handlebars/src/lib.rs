//! Handlebars helper rendering markdown.
//!
//! Supports both helper styles:
//!
//! ```handlebars
//! {{#markdown linkify=true}}
//! # Title
//!
//! Body with https://example.com
//! {{/markdown}}
//!
//! {{markdown page.body langPrefix="lang-"}}
//! ```
//!
//! The first string parameter is the markdown text; without one, the block
//! body is rendered against the current context and used instead. The first
//! object parameter is the per-call options object, and hash attributes
//! override everything else.
//!
//! # Example
//!
//! ```
//! use handlebars::Handlebars;
//! use serde_json::json;
//!
//! let mut registry = Handlebars::new();
//! helper_markdown_handlebars::register_default(&mut registry);
//!
//! let html = registry
//!     .render_template("{{#markdown}}# heading{{/markdown}}", &json!({}))
//!     .unwrap();
//! assert_eq!(html, "<h1>heading</h1>\n");
//! ```

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason, Renderable, StringOutput, Template,
};
use helper_markdown::{BlockCall, Markdown, Options};
use serde_json::Value;

/// Name used by [`register_default`].
pub const HELPER_NAME: &str = "markdown";

/// Markdown helper for a handlebars registry.
#[derive(Clone, Debug, Default)]
pub struct MarkdownHelper {
    markdown: Markdown,
}

impl MarkdownHelper {
    /// Helper rendering with `markdown`.
    #[must_use]
    pub fn new(markdown: Markdown) -> Self {
        Self { markdown }
    }

    /// The render function in use.
    pub fn markdown(&self) -> &Markdown {
        &self.markdown
    }
}

impl HelperDef for MarkdownHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let mut text = None;
        let mut options = None;
        for param in h.params() {
            match param.value() {
                Value::String(s) if text.is_none() => text = Some(s.clone()),
                Value::Object(map) if options.is_none() => {
                    options = Some(Options::from(map.clone()));
                }
                _ => {}
            }
        }

        let hash: Options = h
            .hash()
            .iter()
            .map(|(key, value)| (*key, value.value().clone()))
            .collect();

        let body = match h.template() {
            Some(template) if text.is_none() => Some(render_block(template, r, ctx, rc)?),
            _ => None,
        };

        let call = BlockCall {
            body,
            options: options.unwrap_or_default(),
            hash,
        };
        tracing::trace!(helper = h.name(), block = h.is_block(), "Rendering markdown helper");
        let html = self.markdown.render_block(text.as_deref(), &call);
        out.write(&html)?;
        Ok(())
    }
}

/// Render a block body against the current context.
fn render_block<'reg: 'rc, 'rc>(
    template: &'rc Template,
    r: &'reg Handlebars<'reg>,
    ctx: &'rc Context,
    rc: &mut RenderContext<'reg, 'rc>,
) -> Result<String, RenderError> {
    let mut buffer = StringOutput::new();
    template.render(r, ctx, rc, &mut buffer)?;
    buffer
        .into_string()
        .map_err(|e| RenderErrorReason::Other(format!("block body is not UTF-8: {e}")).into())
}

/// Register `markdown` under `name`.
pub fn register(registry: &mut Handlebars<'_>, name: &str, markdown: Markdown) {
    registry.register_helper(name, Box::new(MarkdownHelper::new(markdown)));
}

/// Register a helper with built-in defaults under [`HELPER_NAME`].
pub fn register_default(registry: &mut Handlebars<'_>) {
    register(registry, HELPER_NAME, Markdown::new());
}
