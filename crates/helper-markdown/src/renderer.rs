//! Markdown renderer built on the pulldown-cmark event stream.
//!
//! Events from the parser are rewritten before they reach
//! [`pulldown_cmark::html::push_html`]:
//!
//! - fenced code blocks are replaced by highlighted `<pre><code>` markup;
//! - raw HTML becomes text when HTML is disabled;
//! - soft breaks become `<br>` when `breaks` is on;
//! - images are written without the self-closing slash unless `xhtmlOut`
//!   is on;
//! - bare URLs and emails become links when `linkify` is on, except inside
//!   markdown links, images and raw `<a>` tags.

use pulldown_cmark::{
    CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream, html,
};

use crate::config::{CodeHighlight, EffectiveConfig};
use crate::linkify::find_links;
use crate::state::{HtmlBlockState, ImageState, escape_html, fence_language};

/// Markdown to HTML renderer.
///
/// A renderer holds no document state; build one per configuration and call
/// [`render`](Self::render) as often as needed.
///
/// # Example
///
/// ```
/// use helper_markdown::MarkdownRenderer;
///
/// let html = MarkdownRenderer::new().with_linkify(true).render("see https://example.com");
/// assert_eq!(
///     html,
///     "<p>see <a href=\"https://example.com\">https://example.com</a></p>\n"
/// );
/// ```
#[allow(clippy::struct_excessive_bools)]
#[derive(Clone, Debug)]
pub struct MarkdownRenderer {
    html: bool,
    breaks: bool,
    linkify: bool,
    lang_prefix: String,
    typographer: bool,
    xhtml_out: bool,
    highlighter: CodeHighlight,
}

impl MarkdownRenderer {
    /// Renderer with HTML passthrough and the built-in highlighter; no line
    /// breaks, no link detection, `language-` class prefix.
    #[must_use]
    pub fn new() -> Self {
        Self {
            html: true,
            breaks: false,
            linkify: false,
            lang_prefix: "language-".to_owned(),
            typographer: false,
            xhtml_out: false,
            highlighter: CodeHighlight::Builtin,
        }
    }

    /// Renderer for a resolved configuration.
    #[must_use]
    pub fn from_config(config: &EffectiveConfig) -> Self {
        Self {
            html: config.html(),
            breaks: config.breaks(),
            linkify: config.linkify(),
            lang_prefix: config.lang_prefix(),
            typographer: config.typographer(),
            xhtml_out: config.xhtml_out(),
            highlighter: config.highlighter(),
        }
    }

    /// Allow or escape raw HTML.
    #[must_use]
    pub fn with_html(mut self, enabled: bool) -> Self {
        self.html = enabled;
        self
    }

    /// Render soft line breaks as `<br>`.
    #[must_use]
    pub fn with_breaks(mut self, enabled: bool) -> Self {
        self.breaks = enabled;
        self
    }

    /// Detect bare URLs and emails.
    #[must_use]
    pub fn with_linkify(mut self, enabled: bool) -> Self {
        self.linkify = enabled;
        self
    }

    /// Class prefix for fenced code blocks.
    #[must_use]
    pub fn with_lang_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.lang_prefix = prefix.into();
        self
    }

    /// Smart quotes and dashes.
    #[must_use]
    pub fn with_typographer(mut self, enabled: bool) -> Self {
        self.typographer = enabled;
        self
    }

    /// Write `<br />`, `<hr />` and `<img ... />` instead of `<br>`, `<hr>`
    /// and `<img ...>`.
    #[must_use]
    pub fn with_xhtml_out(mut self, enabled: bool) -> Self {
        self.xhtml_out = enabled;
        self
    }

    /// Code highlighter for fenced blocks.
    #[must_use]
    pub fn with_highlighter(mut self, highlighter: CodeHighlight) -> Self {
        self.highlighter = highlighter;
        self
    }

    /// Parser options for this configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let mut options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        if self.typographer {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        options
    }

    /// Render markdown text to HTML.
    pub fn render(&self, markdown: &str) -> String {
        let parser = TextMergeStream::new(Parser::new_ext(markdown, self.parser_options()));

        let mut state = RenderState::default();
        let mut events = Vec::new();
        for event in parser {
            self.process_event(event, &mut state, &mut events);
        }

        let mut output = String::with_capacity(markdown.len() + markdown.len() / 2);
        html::push_html(&mut output, events.into_iter());
        output
    }

    fn process_event<'a>(
        &self,
        event: Event<'a>,
        state: &mut RenderState,
        out: &mut Vec<Event<'a>>,
    ) {
        if state.image.is_some() {
            Self::image_event(event, state, out);
            return;
        }

        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => Some(fence_language(&info).to_owned()),
                    CodeBlockKind::Indented => None,
                };
                state.code = Some((lang, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, content)) = state.code.take() {
                    out.push(Event::Html(self.code_block(lang.as_deref(), &content).into()));
                }
            }
            Event::Text(text) if state.code.is_some() => {
                if let Some((_, content)) = &mut state.code {
                    content.push_str(&text);
                }
            }
            Event::Start(Tag::HtmlBlock) if !self.html => {
                state.html_block.start();
                out.push(Event::Start(Tag::Paragraph));
            }
            Event::End(TagEnd::HtmlBlock) if !self.html => {
                out.push(Event::Text(state.html_block.end().into()));
                out.push(Event::End(TagEnd::Paragraph));
            }
            Event::Html(raw) | Event::InlineHtml(raw) if !self.html => {
                if !state.html_block.push_str(&raw) {
                    out.push(Event::Text(raw));
                }
            }
            Event::SoftBreak if self.breaks => out.push(Event::InlineHtml(self.line_break())),
            Event::HardBreak => out.push(Event::InlineHtml(self.line_break())),
            Event::Rule => out.push(Event::Html(self.rule())),
            Event::InlineHtml(raw) => {
                if opens_anchor(&raw) {
                    state.link_depth += 1;
                } else if closes_anchor(&raw) {
                    state.link_depth = state.link_depth.saturating_sub(1);
                }
                out.push(Event::InlineHtml(raw));
            }
            Event::Start(Tag::Image {
                dest_url, title, ..
            }) if !self.xhtml_out => {
                state.image = Some(ImageState::new(&dest_url, &title));
            }
            Event::Start(tag @ (Tag::Link { .. } | Tag::Image { .. })) => {
                state.link_depth += 1;
                out.push(Event::Start(tag));
            }
            Event::End(tag @ (TagEnd::Link | TagEnd::Image)) => {
                state.link_depth = state.link_depth.saturating_sub(1);
                out.push(Event::End(tag));
            }
            Event::Text(text) if self.linkify && state.link_depth == 0 => {
                push_linkified(text, out);
            }
            other => out.push(other),
        }
    }

    /// Collect the alt text of an open image. Markup inside the alt text is
    /// reduced to its text, as `push_html` does.
    fn image_event<'a>(event: Event<'a>, state: &mut RenderState, out: &mut Vec<Event<'a>>) {
        let Some(image) = &mut state.image else {
            return;
        };
        match event {
            Event::Text(text)
            | Event::Code(text)
            | Event::InlineMath(text)
            | Event::DisplayMath(text)
            | Event::Html(text)
            | Event::InlineHtml(text) => image.push_str(&text),
            Event::SoftBreak | Event::HardBreak | Event::Rule => image.push_str(" "),
            Event::FootnoteReference(name) => image.push_str(&format!("[{name}]")),
            Event::TaskListMarker(checked) => image.push_str(if checked { "[x]" } else { "[ ]" }),
            Event::Start(Tag::Image { .. }) => image.enter(),
            Event::End(TagEnd::Image) => {
                if image.leave() {
                    let html = image.to_html();
                    state.image = None;
                    out.push(Event::InlineHtml(html.into()));
                }
            }
            _ => {}
        }
    }

    /// Markup for one code block. `lang` is `None` for indented blocks,
    /// which are never highlighted.
    fn code_block(&self, lang: Option<&str>, content: &str) -> String {
        let Some(lang) = lang else {
            return format!("<pre><code>{}</code></pre>\n", escape_html(content));
        };

        let highlighted = self.highlighter.highlight(content, lang);
        let body = if highlighted.is_empty() {
            escape_html(content)
        } else {
            highlighted
        };

        if lang.is_empty() {
            format!("<pre><code>{body}</code></pre>\n")
        } else {
            format!(
                "<pre><code class=\"{}{}\">{body}</code></pre>\n",
                escape_html(&self.lang_prefix),
                escape_html(lang)
            )
        }
    }

    fn line_break(&self) -> CowStr<'static> {
        CowStr::Borrowed(if self.xhtml_out { "<br />\n" } else { "<br>\n" })
    }

    fn rule(&self) -> CowStr<'static> {
        CowStr::Borrowed(if self.xhtml_out { "<hr />\n" } else { "<hr>\n" })
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct RenderState {
    /// Open code block: its language (`None` when indented) and content.
    code: Option<(Option<String>, String)>,
    html_block: HtmlBlockState,
    image: Option<ImageState>,
    /// Nesting depth of links, images and raw anchors; their text is never
    /// linkified.
    link_depth: usize,
}

/// `<a>` or `<a ...>`, in any case.
fn opens_anchor(raw: &str) -> bool {
    matches!(
        raw.as_bytes(),
        [b'<', b'a' | b'A', b'>' | b' ' | b'\t' | b'\n' | b'\r', ..]
    )
}

/// `</a>`, in any case.
fn closes_anchor(raw: &str) -> bool {
    matches!(
        raw.as_bytes(),
        [b'<', b'/', b'a' | b'A', b'>' | b' ' | b'\t' | b'\n' | b'\r', ..]
    )
}

fn push_linkified<'a>(text: CowStr<'a>, out: &mut Vec<Event<'a>>) {
    let links = find_links(&text);
    if links.is_empty() {
        out.push(Event::Text(text));
        return;
    }

    let mut last = 0;
    for link in links {
        if link.range.start > last {
            out.push(Event::Text(text[last..link.range.start].to_owned().into()));
        }
        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: link.href.into(),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        out.push(Event::Text(text[link.range.clone()].to_owned().into()));
        out.push(Event::End(TagEnd::Link));
        last = link.range.end;
    }
    if last < text.len() {
        out.push(Event::Text(text[last..].to_owned().into()));
    }
}
