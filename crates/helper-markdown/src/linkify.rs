//! Detection of bare URLs and email addresses in text.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?xi)
        (?P<url>(?:https?|ftp)://[^\s<>]+)
        | (?P<www>\bwww\.[a-z0-9-]+(?:\.[a-z0-9-]+)+[^\s<>]*)
        | (?P<email>\b[a-z0-9._%+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,})",
    )
    .unwrap()
});

/// A link found in plain text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Link {
    /// Byte range of the link text.
    pub range: Range<usize>,
    /// Link target.
    pub href: String,
}

/// Find bare links in `text`, in order.
///
/// `www.` hosts get an `http://` target and emails a `mailto:` target.
/// Trailing punctuation and unbalanced closing parentheses are left out.
///
/// ```
/// use helper_markdown::find_links;
///
/// let text = "see https://example.com/x.";
/// let links = find_links(text);
/// assert_eq!(&text[links[0].range.clone()], "https://example.com/x");
/// ```
pub fn find_links(text: &str) -> Vec<Link> {
    LINK_RE
        .captures_iter(text)
        .filter_map(|caps| {
            if let Some(m) = caps.name("url").or_else(|| caps.name("www")) {
                let matched = trim_trailing(m.as_str());
                // A bare scheme is not a link.
                if matched.ends_with("://") {
                    return None;
                }
                let href = if caps.name("www").is_some() {
                    format!("http://{matched}")
                } else {
                    matched.to_owned()
                };
                Some(Link {
                    range: m.start()..m.start() + matched.len(),
                    href,
                })
            } else {
                caps.name("email").map(|m| Link {
                    range: m.range(),
                    href: format!("mailto:{}", m.as_str()),
                })
            }
        })
        .collect()
}

fn trim_trailing(mut url: &str) -> &str {
    loop {
        let Some(last) = url.chars().next_back() else {
            return url;
        };
        let strip = match last {
            '.' | ',' | ':' | ';' | '!' | '?' | '\'' | '"' | '*' | '_' | '~' => true,
            ')' => url.matches(')').count() > url.matches('(').count(),
            _ => false,
        };
        if !strip {
            return url;
        }
        url = &url[..url.len() - last.len_utf8()];
    }
}
