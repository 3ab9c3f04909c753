//! Built-in profiles and option resolution.
//!
//! Effective configuration is built per call by merging, in order:
//!
//! 1. the profile defaults,
//! 2. the factory layer bound with [`crate::configure`],
//! 3. the per-call options,
//! 4. the per-call hash (inline helper attributes).
//!
//! Later layers win key by key. `lang` is a legacy alias: when present it
//! overwrites `langPrefix`. `linkify` is pulled out of the merged layer and
//! kept as a separate toggle.

use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::highlight::{SyntectHighlighter, highlight_with};
use crate::options::{HighlightFn, Options, is_truthy, keys, value_to_string};

/// Class prefix the renderer uses when a configuration sets none.
const RENDERER_LANG_PREFIX: &str = "language-";

/// Built-in defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// `html`, `breaks`, no `linkify`, `language-` class prefix.
    #[default]
    Standard,
    /// `html`, `breaks`, `linkify`, `lang-` class prefix.
    Classic,
}

impl Profile {
    /// Default class prefix for fenced code blocks.
    pub fn lang_prefix(self) -> &'static str {
        match self {
            Self::Standard => "language-",
            Self::Classic => "lang-",
        }
    }

    /// Whether links are detected by default.
    pub fn linkify(self) -> bool {
        match self {
            Self::Standard => false,
            Self::Classic => true,
        }
    }

    /// The defaults layer.
    pub fn defaults(self) -> Options {
        Options::new()
            .set(keys::HTML, true)
            .set(keys::BREAKS, true)
            .set(keys::LINKIFY, self.linkify())
            .set(keys::LANG_PREFIX, self.lang_prefix())
            .set(keys::TYPOGRAPHER, false)
            .set(keys::XHTML_OUT, false)
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "classic" => Ok(Self::Classic),
            other => Err(ConfigError::UnknownProfile(other.to_owned())),
        }
    }
}

/// How fenced code is highlighted.
#[derive(Clone, Default)]
pub enum CodeHighlight {
    /// Bundled engine with language fallback.
    #[default]
    Builtin,
    /// Caller-supplied function; no fallback is applied.
    Custom(HighlightFn),
    /// No highlighting; code is escaped.
    Disabled,
}

impl CodeHighlight {
    /// Highlight `code`. An empty result means "escape it yourself".
    pub fn highlight(&self, code: &str, lang: &str) -> String {
        match self {
            Self::Builtin => highlight_with(&SyntectHighlighter::new(), code, lang),
            Self::Custom(highlight) => highlight(code, lang),
            Self::Disabled => String::new(),
        }
    }
}

impl std::fmt::Debug for CodeHighlight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Builtin => "Builtin",
            Self::Custom(_) => "Custom",
            Self::Disabled => "Disabled",
        })
    }
}

/// Configuration in effect for one render.
#[derive(Clone, Debug)]
pub struct EffectiveConfig {
    /// Merged layer handed to the renderer; never contains `linkify`.
    options: Options,
    linkify: bool,
}

impl EffectiveConfig {
    /// The merged options, without `linkify`.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Allow raw HTML passthrough.
    pub fn html(&self) -> bool {
        self.flag(keys::HTML)
    }

    /// Turn soft line breaks into `<br>`.
    pub fn breaks(&self) -> bool {
        self.flag(keys::BREAKS)
    }

    /// Detect bare links.
    pub fn linkify(&self) -> bool {
        self.linkify
    }

    /// Class prefix for fenced code blocks.
    pub fn lang_prefix(&self) -> String {
        self.options
            .get(keys::LANG_PREFIX)
            .map_or_else(|| RENDERER_LANG_PREFIX.to_owned(), value_to_string)
    }

    /// Smart punctuation.
    pub fn typographer(&self) -> bool {
        self.flag(keys::TYPOGRAPHER)
    }

    /// Self-closing void elements.
    pub fn xhtml_out(&self) -> bool {
        self.flag(keys::XHTML_OUT)
    }

    /// The code highlighter to install.
    pub fn highlighter(&self) -> CodeHighlight {
        if let Some(highlight) = self.options.highlight() {
            return CodeHighlight::Custom(Arc::clone(highlight));
        }
        match self.options.get(keys::HIGHLIGHT) {
            Some(value) if !is_truthy(value) => CodeHighlight::Disabled,
            _ => CodeHighlight::Builtin,
        }
    }

    fn flag(&self, key: &str) -> bool {
        self.options.get(key).is_some_and(is_truthy)
    }
}

/// Merge the four layers into the configuration for one render.
///
/// None of the inputs are modified.
///
/// ```
/// use helper_markdown::{Options, Profile, resolve};
///
/// let factory = Options::new().set("langPrefix", "lang-");
/// let call = Options::new().set("langPrefix", "hl-");
/// let config = resolve(&Profile::Standard.defaults(), &factory, &call, &Options::new());
/// assert_eq!(config.lang_prefix(), "hl-");
/// ```
pub fn resolve(
    defaults: &Options,
    factory: &Options,
    call: &Options,
    hash: &Options,
) -> EffectiveConfig {
    let mut options = defaults.clone();
    for layer in [factory, call, hash] {
        options.merge(layer);
    }

    if let Some(lang) = options.get(keys::LANG).cloned() {
        options.insert(keys::LANG_PREFIX, lang);
    }

    let linkify = options.remove(keys::LINKIFY).is_some_and(|v| is_truthy(&v));

    EffectiveConfig { options, linkify }
}

/// Profile plus factory options, as read from a configuration file.
///
/// ```toml
/// profile = "classic"
/// langPrefix = "hl-"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct HelperConfig {
    /// Defaults to start from.
    #[serde(default)]
    pub profile: Profile,
    /// Every other key is a factory option.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl HelperConfig {
    /// Parse from TOML.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}
