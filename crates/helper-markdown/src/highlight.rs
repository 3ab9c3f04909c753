//! Syntax highlighting for fenced code blocks.
//!
//! The [`Highlighter`] trait is the interface to a highlighting engine;
//! [`SyntectHighlighter`] is the bundled engine. [`highlight_with`] wraps
//! an engine with a two-stage fallback so that a bad language hint never
//! aborts rendering:
//!
//! 1. highlight with the language named by the fence;
//! 2. if the engine does not know that language, let it detect one;
//! 3. if anything else fails, return the code unchanged.

use std::sync::LazyLock;

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::state::escape_html;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// CSS class prefix for the spans emitted by [`SyntectHighlighter`].
pub const CLASS_PREFIX: &str = "hljs-";

/// Highlighting engine error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HighlightError {
    /// The language hint names no language the engine knows.
    #[error("Unknown language: \"{0}\"")]
    UnknownLanguage(String),
    /// Syntect failed while parsing the code.
    #[error("syntect error: {0}")]
    Syntect(#[from] syntect::Error),
    /// Failure reported by another engine.
    #[error("highlighting failed: {0}")]
    Other(String),
}

/// Interface to a syntax highlighting engine.
///
/// Both methods return HTML markup for `code`.
pub trait Highlighter {
    /// Highlight `code` as `lang`.
    ///
    /// Must fail with [`HighlightError::UnknownLanguage`] when `lang` is not
    /// recognized.
    fn highlight_with_language(&self, lang: &str, code: &str) -> Result<String, HighlightError>;

    /// Highlight `code`, letting the engine pick the language.
    fn highlight_auto(&self, code: &str) -> Result<String, HighlightError>;
}

/// Highlighter backed by syntect's bundled syntax definitions.
///
/// Emits `<span>` elements with `hljs-` prefixed scope classes; colors come
/// from the page's stylesheet.
#[derive(Clone, Copy, Debug)]
pub struct SyntectHighlighter {
    syntax_set: &'static SyntaxSet,
    class_style: ClassStyle,
}

impl SyntectHighlighter {
    /// Highlighter over the process-wide syntax set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            syntax_set: &SYNTAX_SET,
            class_style: ClassStyle::SpacedPrefixed {
                prefix: CLASS_PREFIX,
            },
        }
    }

    /// Use a different class style for emitted spans.
    #[must_use]
    pub fn with_class_style(mut self, class_style: ClassStyle) -> Self {
        self.class_style = class_style;
        self
    }

    /// Look up a syntax by fence token (`js`, `rs`, `rust`) or by name.
    pub fn find_syntax(&self, lang: &str) -> Option<&'static SyntaxReference> {
        let lang = lang.trim();
        if lang.is_empty() {
            return None;
        }
        self.syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_name(lang))
    }

    fn generate(&self, syntax: &SyntaxReference, code: &str) -> Result<String, HighlightError> {
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, self.syntax_set, self.class_style);
        for line in LinesWithEndings::from(code) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(generator.finalize())
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight_with_language(&self, lang: &str, code: &str) -> Result<String, HighlightError> {
        let syntax = self
            .find_syntax(lang)
            .ok_or_else(|| HighlightError::UnknownLanguage(lang.to_owned()))?;
        self.generate(syntax, code)
    }

    fn highlight_auto(&self, code: &str) -> Result<String, HighlightError> {
        // Detection only knows shebangs and modelines; anything else is plain text.
        match self.syntax_set.find_syntax_by_first_line(code) {
            Some(syntax) => self.generate(syntax, code),
            None => Ok(escape_html(code)),
        }
    }
}

/// Highlight `code` with the bundled engine, never failing.
///
/// ```
/// use helper_markdown::highlight;
///
/// let html = highlight("fn main() {}\n", "rust");
/// assert!(html.contains("<span"));
///
/// // Unknown hints fall back to detection, then to plain text.
/// let plain = highlight("just words\n", "no-such-language");
/// assert_eq!(plain, "just words\n");
/// ```
pub fn highlight(code: &str, lang: &str) -> String {
    highlight_with(&SyntectHighlighter::new(), code, lang)
}

/// Highlight `code` with `engine`, never failing.
///
/// Returns the engine's markup when possible, the auto-detected markup when
/// `lang` is unknown, and `code` unchanged on any other failure.
pub fn highlight_with<H: Highlighter + ?Sized>(engine: &H, code: &str, lang: &str) -> String {
    let result = match engine.highlight_with_language(lang, code) {
        Err(HighlightError::UnknownLanguage(_)) => {
            tracing::debug!(lang = %lang, "Unknown language hint, detecting language");
            engine.highlight_auto(code)
        }
        other => other,
    };

    result.unwrap_or_else(|e| {
        tracing::warn!(lang = %lang, error = %e, "Highlighting failed, emitting plain code");
        code.to_owned()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Engine with scripted answers for both stages.
    struct Scripted {
        with_language: fn(&str) -> Result<String, HighlightError>,
        auto: fn() -> Result<String, HighlightError>,
    }

    impl Highlighter for Scripted {
        fn highlight_with_language(
            &self,
            lang: &str,
            _code: &str,
        ) -> Result<String, HighlightError> {
            (self.with_language)(lang)
        }

        fn highlight_auto(&self, _code: &str) -> Result<String, HighlightError> {
            (self.auto)()
        }
    }

    fn unknown(lang: &str) -> Result<String, HighlightError> {
        Err(HighlightError::UnknownLanguage(lang.to_owned()))
    }

    fn broken(_: &str) -> Result<String, HighlightError> {
        Err(HighlightError::Other("boom".to_owned()))
    }

    #[test]
    fn test_known_language_uses_first_stage() {
        let engine = Scripted {
            with_language: |lang| Ok(format!("<b>{lang}</b>")),
            auto: || Ok("auto".to_owned()),
        };
        assert_eq!(highlight_with(&engine, "x", "js"), "<b>js</b>");
    }

    #[test]
    fn test_unknown_language_falls_back_to_detection() {
        let engine = Scripted {
            with_language: unknown,
            auto: || Ok("auto".to_owned()),
        };
        assert_eq!(highlight_with(&engine, "x", "nope"), "auto");
    }

    #[test]
    fn test_failed_detection_returns_code_verbatim() {
        let engine = Scripted {
            with_language: unknown,
            auto: || Err(HighlightError::Other("no guess".to_owned())),
        };
        assert_eq!(highlight_with(&engine, "a < b && c", "nope"), "a < b && c");
    }

    #[test]
    fn test_engine_error_skips_detection() {
        let engine = Scripted {
            with_language: broken,
            auto: || Ok("auto".to_owned()),
        };
        assert_eq!(highlight_with(&engine, "<code>", "js"), "<code>");
    }

    #[test]
    fn test_syntect_known_language() {
        let html = highlight("var foo = \"bar\";\n", "js");
        assert!(html.contains(r#"<span class="hljs-"#), "{html}");
        assert!(html.contains("&quot;bar&quot;"), "{html}");
        assert!(html.ends_with('\n'));
    }

    #[test]
    fn test_syntect_language_by_name() {
        let engine = SyntectHighlighter::new();
        assert!(engine.find_syntax("Rust").is_some());
        assert!(engine.find_syntax("rs").is_some());
        assert!(engine.find_syntax("py").is_some());
    }

    #[test]
    fn test_syntect_empty_hint_is_unknown() {
        let err = SyntectHighlighter::new()
            .highlight_with_language("", "x")
            .unwrap_err();
        assert!(matches!(err, HighlightError::UnknownLanguage(_)));
    }

    #[test]
    fn test_syntect_unknown_language_matches_detection() {
        let engine = SyntectHighlighter::new();
        let code = "#!/bin/bash\necho hi\n";
        let expected = engine.highlight_auto(code).unwrap();
        assert_eq!(highlight(code, "not-a-real-language"), expected);
        assert!(expected.contains("<span"));
    }

    #[test]
    fn test_syntect_undetectable_code_is_escaped_plain_text() {
        assert_eq!(highlight("1 < 2\n", "output"), "1 &lt; 2\n");
    }

    #[test]
    fn test_unknown_language_error_message() {
        let err = HighlightError::UnknownLanguage("klingon".to_owned());
        assert_eq!(err.to_string(), "Unknown language: \"klingon\"");
    }
}
