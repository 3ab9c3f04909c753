//! Markdown to HTML helper for template engines.
//!
//! This crate renders a markdown string to an HTML string with syntax
//! highlighted code blocks and optional link detection. It is meant to be
//! registered as a helper in a template engine, so its entry point accepts
//! every call shape such a helper sees:
//!
//! - `markdown(text)` and `markdown(text, options)` render directly;
//! - `markdown(config)` returns a render function bound to `config`;
//! - a block call takes its text from the block body.
//!
//! # Architecture
//!
//! - [`Options`]: one configuration layer (JSON values plus an optional
//!   highlight function).
//! - [`resolve`]: merges profile defaults, factory options, call options and
//!   the call's hash, in that order of precedence.
//! - [`highlight`]: the built-in highlighter. An unknown language falls back
//!   to language detection; any other failure yields the code unchanged.
//! - [`MarkdownRenderer`]: pulldown-cmark based renderer for one resolved
//!   configuration.
//! - [`Markdown`]: the entry point tying these together.
//!
//! Rendering always returns a string; errors exist only for loading
//! configuration from TOML or JSON text.
//!
//! # Example
//!
//! ```
//! use helper_markdown::{Options, configure, markdown};
//!
//! assert_eq!(markdown("# heading"), "<h1>heading</h1>\n");
//!
//! let helper = configure(Options::new().set("linkify", true));
//! assert_eq!(
//!     helper.render("see https://example.com"),
//!     "<p>see <a href=\"https://example.com\">https://example.com</a></p>\n"
//! );
//! ```

mod config;
mod error;
mod highlight;
mod linkify;
mod markdown;
mod options;
mod renderer;
mod state;

pub use config::{CodeHighlight, EffectiveConfig, HelperConfig, Profile, resolve};
pub use error::ConfigError;
pub use highlight::{
    CLASS_PREFIX, HighlightError, Highlighter, SyntectHighlighter, highlight, highlight_with,
};
pub use linkify::{Link, find_links};
pub use markdown::{
    BlockCall, Call, HelperOptions, Markdown, Outcome, configure, markdown, markdown_with,
};
pub use options::{HighlightFn, Options, is_truthy, keys};
pub use renderer::MarkdownRenderer;
pub use state::escape_html;
