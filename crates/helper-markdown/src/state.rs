//! State tracked while rewriting the markdown event stream.

/// State for raw HTML blocks rendered as text when HTML is disabled.
#[derive(Default)]
pub struct HtmlBlockState {
    buffer: Option<String>,
}

impl HtmlBlockState {
    pub fn start(&mut self) {
        self.buffer = Some(String::new());
    }

    /// Returns false when no block is open.
    pub fn push_str(&mut self, html: &str) -> bool {
        match &mut self.buffer {
            Some(buffer) => {
                buffer.push_str(html);
                true
            }
            None => false,
        }
    }

    /// End the block, returning its source without the trailing newline.
    pub fn end(&mut self) -> String {
        let mut source = self.buffer.take().unwrap_or_default();
        source.truncate(source.trim_end_matches('\n').len());
        source
    }
}

/// An image whose alt text is being collected, written as a plain `<img>`
/// tag once the image ends.
pub struct ImageState {
    src: String,
    title: String,
    alt: String,
    /// Images nested in the alt text; only their text is kept.
    nested: usize,
}

impl ImageState {
    pub fn new(src: &str, title: &str) -> Self {
        Self {
            src: src.to_owned(),
            title: title.to_owned(),
            alt: String::new(),
            nested: 0,
        }
    }

    pub fn push_str(&mut self, text: &str) {
        self.alt.push_str(text);
    }

    pub fn enter(&mut self) {
        self.nested += 1;
    }

    /// Leave one image level. Returns true when the outer image ends.
    pub fn leave(&mut self) -> bool {
        match self.nested.checked_sub(1) {
            Some(nested) => {
                self.nested = nested;
                false
            }
            None => true,
        }
    }

    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<img src=\"{}\" alt=\"{}\"",
            escape_html(&self.src),
            escape_html(&self.alt)
        );
        if !self.title.is_empty() {
            html.push_str(&format!(" title=\"{}\"", escape_html(&self.title)));
        }
        html.push('>');
        html
    }
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

/// Language token of a fence info string: its first word.
pub(crate) fn fence_language(info: &str) -> &str {
    info.split_whitespace().next().unwrap_or("")
}
