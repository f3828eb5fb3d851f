//! Allowlist sanitizer for author-supplied rich text.
//!
//! Only formatting tags survive, re-serialized in a canonical form with an
//! allowlisted attribute set. Script-like elements are removed together with
//! their content, unknown elements are unwrapped, and every other `<`, `>` or
//! stray `&` in text is escaped. Because the output only contains canonical
//! tags and complete entities, sanitizing it again yields the same string.

use std::fmt;

const ALLOWED_TAGS: &[&str] = &[
    "a", "b", "blockquote", "br", "code", "div", "em", "h1", "h2", "h3", "h4", "h5", "h6", "hr",
    "i", "img", "li", "ol", "p", "pre", "s", "span", "strike", "strong", "sub", "sup", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "u", "ul",
];

const VOID_TAGS: &[&str] = &["br", "hr", "img"];

/// Elements dropped together with everything up to their closing tag.
const DROPPED_WITH_CONTENT: &[&str] = &[
    "embed", "frameset", "iframe", "math", "noembed", "noframes", "noscript", "object", "script",
    "style", "svg", "template", "textarea", "title", "xmp",
];

const URL_ATTRIBUTES: &[&str] = &["href", "src"];

const ALLOWED_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

const MAX_ENTITY_LEN: usize = 32;

/// Forced on every link that opens a new browsing context.
const OPENER_POLICY: &str = "noopener noreferrer";

/// Markup that is safe to hand to a renderer as raw HTML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeMarkup(String);

impl SafeMarkup {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SafeMarkup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn render(markup: &str) -> SafeMarkup {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(pos) = rest.find(['<', '>', '&']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        rest = if tail.starts_with('<') {
            consume_markup(tail, &mut out)
        } else if tail.starts_with('>') {
            out.push_str("&gt;");
            &tail[1..]
        } else {
            push_ampersand(tail, &mut out)
        };
    }
    out.push_str(rest);

    SafeMarkup(out)
}

/// Handles one `<` at the start of `tail` and returns the unconsumed input.
fn consume_markup<'a>(tail: &'a str, out: &mut String) -> &'a str {
    if let Some(comment) = tail.strip_prefix("<!--") {
        return match comment.find("-->") {
            Some(end) => &comment[end + 3..],
            None => "",
        };
    }

    if tail.starts_with("<!") || tail.starts_with("<?") {
        return match tail.find('>') {
            Some(end) => &tail[end + 1..],
            None => escape_remaining(tail, out),
        };
    }

    let after_lt = &tail[1..];
    let (closing, name_src) = match after_lt.strip_prefix('/') {
        Some(stripped) => (true, stripped),
        None => (false, after_lt),
    };

    let name_len = tag_name_len(name_src);
    if name_len == 0 {
        return escape_lt(tail, out);
    }
    let name = name_src[..name_len].to_ascii_lowercase();
    let attrs_src = &name_src[name_len..];

    // Without a closing `>` no later tag can close either, so the rest is text.
    let Some(end) = tag_end(attrs_src) else {
        return escape_remaining(tail, out);
    };
    let after_tag = &attrs_src[end + 1..];
    let attrs_src = &attrs_src[..end];

    if DROPPED_WITH_CONTENT.contains(&name.as_str()) {
        return if closing {
            after_tag
        } else {
            skip_element_content(after_tag, &name)
        };
    }

    if ALLOWED_TAGS.contains(&name.as_str()) {
        if closing {
            if !VOID_TAGS.contains(&name.as_str()) {
                out.push_str("</");
                out.push_str(&name);
                out.push('>');
            }
        } else {
            push_open_tag(&name, attrs_src, out);
        }
    }

    after_tag
}

fn escape_lt<'a>(tail: &'a str, out: &mut String) -> &'a str {
    out.push_str("&lt;");
    &tail[1..]
}

/// Escapes all of `tail` as text and consumes it.
fn escape_remaining<'a>(tail: &str, out: &mut String) -> &'a str {
    let mut rest = tail;
    while let Some(pos) = rest.find(['<', '>', '&']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        rest = if tail.starts_with('<') {
            escape_lt(tail, out)
        } else if tail.starts_with('>') {
            out.push_str("&gt;");
            &tail[1..]
        } else {
            push_ampersand(tail, out)
        };
    }
    out.push_str(rest);
    ""
}

fn push_ampersand<'a>(tail: &'a str, out: &mut String) -> &'a str {
    match entity_len(tail) {
        Some(len) => {
            out.push_str(&tail[..len]);
            &tail[len..]
        }
        None => {
            out.push_str("&amp;");
            &tail[1..]
        }
    }
}

fn tag_name_len(src: &str) -> usize {
    let bytes = src.as_bytes();
    if !bytes.first().is_some_and(u8::is_ascii_alphabetic) {
        return 0;
    }
    bytes
        .iter()
        .position(|b| !b.is_ascii_alphanumeric())
        .unwrap_or(bytes.len())
}

/// Index of the `>` that closes a tag, skipping over quoted attribute values.
fn tag_end(src: &str) -> Option<usize> {
    let mut quote = None;
    for (idx, byte) in src.bytes().enumerate() {
        match (quote, byte) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'"' | b'\'') => quote = Some(byte),
            (None, b'>') => return Some(idx),
            (None, _) => {}
        }
    }
    None
}

/// Skips to just past `</name ...>`; an unclosed element swallows the rest of the input.
fn skip_element_content<'a>(rest: &'a str, name: &str) -> &'a str {
    let bytes = rest.as_bytes();
    let mut from = 0;
    while let Some(offset) = rest[from..].find("</") {
        let start = from + offset + 2;
        let name_end = start + name.len();
        let closes = bytes
            .get(start..name_end)
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name.as_bytes()))
            && bytes
                .get(name_end)
                .map_or(true, |b| b.is_ascii_whitespace() || matches!(b, b'>' | b'/'));
        if closes {
            return match rest[name_end..].find('>') {
                Some(end) => &rest[name_end + end + 1..],
                None => "",
            };
        }
        from = start;
    }
    ""
}

fn push_open_tag(name: &str, attrs_src: &str, out: &mut String) {
    out.push('<');
    out.push_str(name);

    let mut seen: Vec<String> = Vec::new();
    let mut kept: Vec<(String, String)> = Vec::new();
    for (attr, value) in parse_attributes(attrs_src) {
        if seen.contains(&attr) || !attribute_allowed(name, &attr) {
            continue;
        }
        seen.push(attr.clone());

        let escaped = escape_attribute(value.unwrap_or_default());
        if URL_ATTRIBUTES.contains(&attr.as_str()) && !is_safe_url(&decode_entities(&escaped)) {
            continue;
        }
        kept.push((attr, escaped));
    }

    if kept.iter().any(|(attr, _)| attr == "target") {
        kept.retain(|(attr, _)| attr != "rel");
        kept.push(("rel".to_string(), OPENER_POLICY.to_string()));
    }

    for (attr, value) in kept {
        out.push(' ');
        out.push_str(&attr);
        out.push_str("=\"");
        out.push_str(&value);
        out.push('"');
    }

    out.push('>');
}

fn attribute_allowed(tag: &str, attr: &str) -> bool {
    match (tag, attr) {
        (_, "class") => true,
        ("a", "href" | "title" | "target" | "rel") => true,
        ("img", "src" | "alt" | "title" | "width" | "height") => true,
        ("td" | "th", "colspan" | "rowspan") => true,
        ("ol", "start") => true,
        _ => false,
    }
}

/// Splits the inside of a tag into lowercased attribute names and raw values.
fn parse_attributes(src: &str) -> Vec<(String, Option<&str>)> {
    let mut attrs = Vec::new();
    let mut rest = src;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
        if rest.is_empty() {
            break;
        }

        let name_len = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        if name_len == 0 {
            // A bare `=` with no name in front of it.
            rest = &rest[1..];
            continue;
        }
        let name = rest[..name_len].to_ascii_lowercase();
        rest = rest[name_len..].trim_start_matches(|c: char| c.is_ascii_whitespace());

        let Some(after_eq) = rest.strip_prefix('=') else {
            attrs.push((name, None));
            continue;
        };
        rest = after_eq.trim_start_matches(|c: char| c.is_ascii_whitespace());

        let value = match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let inner = &rest[1..];
                match inner.find(quote) {
                    Some(end) => {
                        rest = &inner[end + 1..];
                        &inner[..end]
                    }
                    None => {
                        rest = "";
                        inner
                    }
                }
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_ascii_whitespace())
                    .unwrap_or(rest.len());
                let value = &rest[..end];
                rest = &rest[end..];
                value
            }
        };
        attrs.push((name, Some(value)));
    }

    attrs
}

fn escape_attribute(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find(['"', '<', '>', '&']) {
        escaped.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        rest = if tail.starts_with('"') {
            escaped.push_str("&quot;");
            &tail[1..]
        } else if tail.starts_with('<') {
            escaped.push_str("&lt;");
            &tail[1..]
        } else if tail.starts_with('>') {
            escaped.push_str("&gt;");
            &tail[1..]
        } else {
            push_ampersand(tail, &mut escaped)
        };
    }
    escaped.push_str(rest);
    escaped
}

/// Length of a complete character reference (`&name;`, `&#123;`, `&#x1f;`) at the start of `s`.
fn entity_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix('&')?;
    let semicolon = body
        .bytes()
        .take(MAX_ENTITY_LEN + 1)
        .position(|b| b == b';')?;
    if semicolon == 0 {
        return None;
    }
    let reference = &body[..semicolon];

    let valid = if let Some(numeric) = reference.strip_prefix('#') {
        match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit()),
            None => !numeric.is_empty() && numeric.bytes().all(|b| b.is_ascii_digit()),
        }
    } else {
        reference.as_bytes()[0].is_ascii_alphabetic()
            && reference.bytes().all(|b| b.is_ascii_alphanumeric())
    };

    valid.then_some(semicolon + 2)
}

/// Decodes the references a browser would resolve before interpreting a URL.
/// Unknown named references are left as-is.
fn decode_entities(value: &str) -> String {
    let mut decoded = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('&') {
        decoded.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let Some(len) = entity_len(tail) else {
            decoded.push('&');
            rest = &tail[1..];
            continue;
        };
        let reference = &tail[1..len - 1];
        match decode_reference(reference) {
            Some(ch) => decoded.push(ch),
            None => decoded.push_str(&tail[..len]),
        }
        rest = &tail[len..];
    }
    decoded.push_str(rest);
    decoded
}

fn decode_reference(reference: &str) -> Option<char> {
    if let Some(numeric) = reference.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
    }
    match reference {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "colon" => Some(':'),
        "Tab" => Some('\t'),
        "NewLine" => Some('\n'),
        "sol" => Some('/'),
        "quest" => Some('?'),
        "num" => Some('#'),
        "period" => Some('.'),
        _ => None,
    }
}

/// Relative URLs and allowlisted schemes only.
fn is_safe_url(value: &str) -> bool {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    let Some(colon) = cleaned.find(':') else {
        return true;
    };
    let scheme = &cleaned[..colon];
    if scheme.contains(['/', '?', '#']) {
        return true;
    }
    ALLOWED_SCHEMES.contains(&scheme)
}

#[cfg(test)]
#[path = "tests/sanitize_tests.rs"]
mod tests;
