//! Public entry point.
//!
//! A [`Markdown`] value is a render function, optionally bound to factory
//! options. Every call shape a template engine can produce is expressed as a
//! [`Call`] and normalized to one `(text, options, hash)` triple before
//! options are resolved:
//!
//! | Call                      | text                          | options  | hash          |
//! |---------------------------|-------------------------------|----------|---------------|
//! | `Text(text)`              | `text`                        | empty    | empty         |
//! | `TextWithOptions(t, o)`   | `t`                           | `o`      | empty         |
//! | `Block { text, helper }`  | `text`, else the block body   | helper's | helper's hash |
//!
//! `Configure(options)` does not render; it returns a new bound [`Markdown`].

use std::borrow::Cow;
use std::sync::Arc;

use crate::config::{EffectiveConfig, HelperConfig, Profile, resolve};
use crate::error::ConfigError;
use crate::options::Options;
use crate::renderer::MarkdownRenderer;

/// What a host template engine hands to a helper call.
pub trait HelperOptions {
    /// Inline attributes written at the call site.
    fn hash(&self) -> Options;

    /// Options object passed programmatically, below the hash in precedence.
    fn options(&self) -> Options {
        Options::new()
    }

    /// Text between the opening and closing tags of a block call.
    fn block_body(&self) -> Option<String>;
}

/// Helper options gathered up front by the host.
#[derive(Clone, Debug, Default)]
pub struct BlockCall {
    /// Rendered block body, if the helper was used as a block.
    pub body: Option<String>,
    /// Options object passed as a parameter.
    pub options: Options,
    /// Inline attributes.
    pub hash: Options,
}

impl BlockCall {
    /// Block call with a body and no options.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::default()
        }
    }

    /// Set the inline attributes.
    #[must_use]
    pub fn with_hash(mut self, hash: Options) -> Self {
        self.hash = hash;
        self
    }

    /// Set the options object.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }
}

impl HelperOptions for BlockCall {
    fn hash(&self) -> Options {
        self.hash.clone()
    }

    fn options(&self) -> Options {
        self.options.clone()
    }

    fn block_body(&self) -> Option<String> {
        self.body.clone()
    }
}

/// One invocation of the entry point.
pub enum Call<'a> {
    /// `markdown(text)`
    Text(&'a str),
    /// `markdown(text, options)`
    TextWithOptions(&'a str, &'a Options),
    /// `markdown(config)`: bind `config` and return a new render function.
    Configure(Options),
    /// Helper call from a template engine. Explicit `text` wins over the
    /// block body.
    Block {
        /// Explicit text argument.
        text: Option<&'a str>,
        /// Hash, options and block body from the host.
        helper: &'a dyn HelperOptions,
    },
}

/// Result of [`Markdown::call`].
#[derive(Clone, Debug)]
pub enum Outcome {
    /// Rendered HTML.
    Html(String),
    /// A bound render function.
    Helper(Markdown),
}

impl Outcome {
    /// The rendered HTML, if this call rendered.
    pub fn into_html(self) -> Option<String> {
        match self {
            Self::Html(html) => Some(html),
            Self::Helper(_) => None,
        }
    }

    /// The bound render function, if this call configured one.
    pub fn into_helper(self) -> Option<Markdown> {
        match self {
            Self::Helper(markdown) => Some(markdown),
            Self::Html(_) => None,
        }
    }
}

/// Markdown render function.
///
/// Cloning is cheap; the factory options are shared and never modified by
/// rendering, so one value can serve any number of threads.
///
/// ```
/// use helper_markdown::{Markdown, Options};
///
/// let markdown = Markdown::configured(Options::new().set("langPrefix", "lang-"));
/// let html = markdown.render("```js\nvar x;\n```\n");
/// assert!(html.starts_with("<pre><code class=\"lang-js\">"));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Markdown {
    profile: Profile,
    config: Arc<Options>,
}

impl Markdown {
    /// Render function with built-in defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render function bound to factory options.
    #[must_use]
    pub fn configured(config: Options) -> Self {
        Self {
            profile: Profile::default(),
            config: Arc::new(config),
        }
    }

    /// Render function from a TOML configuration with an optional
    /// `profile` key.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config = HelperConfig::from_toml_str(text)?;
        Ok(Self::configured(Options::from(config.options)).with_profile(config.profile))
    }

    /// Use a different set of built-in defaults.
    #[must_use]
    pub fn with_profile(mut self, profile: Profile) -> Self {
        self.profile = profile;
        self
    }

    /// The built-in defaults in use.
    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// The factory options.
    pub fn config(&self) -> &Options {
        &self.config
    }

    /// Dispatch one call.
    pub fn call(&self, call: Call<'_>) -> Outcome {
        let (text, options, hash) = match call {
            Call::Configure(config) => return Outcome::Helper(self.bind(&config)),
            Call::Text(text) => (Cow::Borrowed(text), Cow::Owned(Options::new()), Options::new()),
            Call::TextWithOptions(text, options) => {
                (Cow::Borrowed(text), Cow::Borrowed(options), Options::new())
            }
            Call::Block { text, helper } => {
                let text = match text {
                    Some(text) => Cow::Borrowed(text),
                    None => Cow::Owned(helper.block_body().unwrap_or_default()),
                };
                (text, Cow::Owned(helper.options()), helper.hash())
            }
        };
        Outcome::Html(self.render_resolved(&text, &self.resolve(&options, &hash)))
    }

    /// New render function with `config` layered over this one's factory
    /// options.
    #[must_use]
    pub fn bind(&self, config: &Options) -> Self {
        let mut merged = Options::clone(&self.config);
        merged.merge(config);
        Self {
            profile: self.profile,
            config: Arc::new(merged),
        }
    }

    /// Render with the bound configuration.
    pub fn render(&self, text: &str) -> String {
        self.render_with(text, &Options::new())
    }

    /// Render with per-call options over the bound configuration.
    pub fn render_with(&self, text: &str, options: &Options) -> String {
        self.render_resolved(text, &self.resolve(options, &Options::new()))
    }

    /// Render a helper call; `text` wins over the block body.
    pub fn render_block(&self, text: Option<&str>, helper: &dyn HelperOptions) -> String {
        match self.call(Call::Block { text, helper }) {
            Outcome::Html(html) => html,
            Outcome::Helper(_) => String::new(),
        }
    }

    /// Configuration a call with these options and hash would use.
    pub fn resolve(&self, options: &Options, hash: &Options) -> EffectiveConfig {
        resolve(&self.profile.defaults(), &self.config, options, hash)
    }

    fn render_resolved(&self, text: &str, config: &EffectiveConfig) -> String {
        tracing::trace!(
            len = text.len(),
            linkify = config.linkify(),
            "Rendering markdown"
        );
        MarkdownRenderer::from_config(config).render(text)
    }
}

/// Render `text` with built-in defaults.
///
/// ```
/// assert_eq!(helper_markdown::markdown("# heading"), "<h1>heading</h1>\n");
/// ```
pub fn markdown(text: &str) -> String {
    Markdown::new().render(text)
}

/// Render `text` with `options` over the built-in defaults.
pub fn markdown_with(text: &str, options: &Options) -> String {
    Markdown::new().render_with(text, options)
}

/// Render function bound to `config`.
pub fn configure(config: Options) -> Markdown {
    Markdown::configured(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    const JS_FENCE: &str = "```js\nvar foo = \"bar\";\n```\n";
    const LINK_TEXT: &str = "abc https://github.com/jonschlinkert/remarkable xyz";

    #[test]
    fn test_render_heading() {
        assert_eq!(markdown("# heading"), "<h1>heading</h1>\n");
    }

    #[test]
    fn test_render_code_block_default_prefix() {
        let html = markdown_with(JS_FENCE, &Options::new());
        assert!(html.starts_with("<pre><code class=\"language-js\">"), "{html}");
        assert!(html.contains("&quot;bar&quot;"), "{html}");
        assert!(html.ends_with("</code></pre>\n"), "{html}");
    }

    #[test]
    fn test_render_code_block_lang_prefix_option() {
        let html = markdown_with(JS_FENCE, &Options::new().set("langPrefix", "lang-"));
        assert!(html.starts_with("<pre><code class=\"lang-js\">"), "{html}");
    }

    #[test]
    fn test_render_code_block_lang_alias() {
        let html = markdown_with(JS_FENCE, &Options::new().set("lang", "x-"));
        assert!(html.starts_with("<pre><code class=\"x-js\">"), "{html}");
    }

    #[test]
    fn test_classic_profile_prefix() {
        let html = Markdown::new().with_profile(Profile::Classic).render(JS_FENCE);
        assert!(html.starts_with("<pre><code class=\"lang-js\">"), "{html}");
    }

    #[test]
    fn test_linkify_option() {
        let on = markdown_with(LINK_TEXT, &Options::new().set("linkify", true));
        assert_eq!(
            on,
            "<p>abc <a href=\"https://github.com/jonschlinkert/remarkable\">https://github.com/jonschlinkert/remarkable</a> xyz</p>\n"
        );

        let off = markdown_with(LINK_TEXT, &Options::new().set("linkify", false));
        assert_eq!(off, "<p>abc https://github.com/jonschlinkert/remarkable xyz</p>\n");
        assert_eq!(markdown(LINK_TEXT), off);
    }

    #[test]
    fn test_unknown_fence_language_still_renders() {
        let html = markdown("```klingon\nQapla'\n```\n");
        assert_eq!(html, "<pre><code class=\"language-klingon\">Qapla'\n</code></pre>\n");
    }

    #[test]
    fn test_custom_highlight_replaces_builtin() {
        let options = Options::new().with_highlight(|code, lang| format!("<i>{lang}</i>{code}"));
        let html = markdown_with("```js\nx\n```\n", &options);
        assert_eq!(html, "<pre><code class=\"language-js\"><i>js</i>x\n</code></pre>\n");
    }

    #[test]
    fn test_call_text() {
        let outcome = Markdown::new().call(Call::Text("# heading"));
        assert_eq!(outcome.into_html().as_deref(), Some("<h1>heading</h1>\n"));
    }

    #[test]
    fn test_call_configure_returns_helper() {
        let outcome = Markdown::new().call(Call::Configure(Options::new().set("langPrefix", "f-")));
        let bound = outcome.into_helper().unwrap();
        assert_eq!(bound.config().get("langPrefix"), Some(&json!("f-")));
        assert!(bound.render(JS_FENCE).starts_with("<pre><code class=\"f-js\">"));
    }

    #[test]
    fn test_call_block_uses_body() {
        let call = BlockCall::new("# heading");
        let html = Markdown::new().render_block(None, &call);
        assert_eq!(html, "<h1>heading</h1>\n");
    }

    #[test]
    fn test_call_block_explicit_text_wins() {
        let call = BlockCall::new("# body");
        let html = Markdown::new().render_block(Some("# text"), &call);
        assert_eq!(html, "<h1>text</h1>\n");
    }

    #[test]
    fn test_call_block_without_text_renders_empty() {
        let html = Markdown::new().render_block(None, &BlockCall::default());
        assert_eq!(html, "");
    }

    #[test]
    fn test_call_block_hash_over_options() {
        let call = BlockCall::new(LINK_TEXT)
            .with_options(Options::new().set("linkify", true))
            .with_hash(Options::new().set("linkify", false));
        let html = Markdown::new().render_block(None, &call);
        assert!(!html.contains("<a "), "{html}");
    }

    #[test]
    fn test_call_options_override_factory() {
        let bound = configure(Options::new().set("langPrefix", "factory-"));
        let html = bound.render_with(JS_FENCE, &Options::new().set("langPrefix", "call-"));
        assert!(html.starts_with("<pre><code class=\"call-js\">"), "{html}");
    }

    #[test]
    fn test_factory_reuse_does_not_leak() {
        let bound = configure(Options::new().set("breaks", false));

        let first = bound.resolve(&Options::new().set("langPrefix", "first-"), &Options::new());
        assert_eq!(first.lang_prefix(), "first-");

        let second = bound.resolve(&Options::new().set("typographer", true), &Options::new());
        assert_eq!(second.lang_prefix(), "language-");
        assert!(!second.breaks());
        assert_eq!(bound.config().get("langPrefix"), None);
    }

    #[test]
    fn test_bind_layers_over_existing_config() {
        let bound = configure(Options::new().set("html", false).set("langPrefix", "a-"));
        let rebound = bound.bind(&Options::new().set("langPrefix", "b-"));

        assert_eq!(rebound.config().get("html"), Some(&json!(false)));
        assert_eq!(rebound.config().get("langPrefix"), Some(&json!("b-")));
        assert_eq!(bound.config().get("langPrefix"), Some(&json!("a-")));
    }

    #[test]
    fn test_from_toml_str() {
        let bound = Markdown::from_toml_str("profile = \"classic\"\nbreaks = false\n").unwrap();
        assert_eq!(bound.profile(), Profile::Classic);

        let config = bound.resolve(&Options::new(), &Options::new());
        assert!(config.linkify());
        assert!(!config.breaks());
        assert_eq!(config.lang_prefix(), "lang-");
    }

    #[test]
    fn test_from_toml_str_unknown_profile() {
        assert!(Markdown::from_toml_str("profile = \"fancy\"\n").is_err());
    }

    #[test]
    fn test_shared_across_threads() {
        let bound = configure(Options::new().set("langPrefix", "t-"));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let bound = bound.clone();
                thread::spawn(move || {
                    bound.render_with(
                        "```js\nx\n```\n",
                        &Options::new().set("langPrefix", format!("t{i}-")),
                    )
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let html = handle.join().unwrap();
            assert!(html.starts_with(&format!("<pre><code class=\"t{i}-js\">")), "{html}");
        }
        assert_eq!(bound.config().get("langPrefix"), Some(&json!("t-")));
    }
}
