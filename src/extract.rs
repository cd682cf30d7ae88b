//! Visible-text extraction.
//!
//! Reduces raw markup to the text a reader would actually see:
//! - script/style/noscript elements and comments are removed wholesale
//! - remaining tags are dropped, each tag boundary becoming a line break
//! - common entities are decoded
//! - lines are trimmed, blank lines removed, and joined with `\n`
//!
//! Deliberately naive string scanning rather than a full HTML parser; it is
//! best-effort on malformed markup and never panics. Operates
//! case-insensitively on ASCII tag names.

const INVISIBLE_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Extracts normalized visible text from markup. Returns `None` for empty
/// input or for pages whose markup contains no visible text at all.
pub fn visible_text(html: &str) -> Option<String> {
    if html.trim().is_empty() {
        return None;
    }

    let mut cleaned = drop_comments(html);
    for tag in INVISIBLE_ELEMENTS {
        cleaned = drop_elements_ci(&cleaned, tag);
    }

    let text = decode_entities(&strip_tags(&cleaned));

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Remove every `<tag ...>...</tag>` block, case-insensitive on the tag name.
/// An unclosed element swallows the rest of the input, matching how browsers
/// treat an unterminated script block.
fn drop_elements_ci(s: &str, tag: &str) -> String {
    let lc = to_lowercase_fast(s);
    let open_pat = format!("<{tag}");
    let close_pat = format!("</{tag}");

    let mut out = String::with_capacity(s.len());
    let mut pos = 0;

    while let Some(rel) = lc[pos..].find(&open_pat) {
        let start = pos + rel;
        let after_name = start + open_pat.len();

        // require a real tag boundary so "<style" does not match "<styled-div"
        let is_boundary = lc[after_name..]
            .chars()
            .next()
            .map_or(true, |c| c == '>' || c == '/' || c.is_ascii_whitespace());
        if !is_boundary {
            out.push_str(&s[pos..after_name]);
            pos = after_name;
            continue;
        }

        out.push_str(&s[pos..start]);

        match lc[after_name..].find(&close_pat) {
            Some(close_rel) => {
                let close_start = after_name + close_rel;
                match lc[close_start..].find('>') {
                    Some(gt) => pos = close_start + gt + 1,
                    None => {
                        pos = s.len();
                    }
                }
            }
            None => {
                pos = s.len();
            }
        }
    }

    out.push_str(&s[pos..]);
    out
}

/// Remove `<!-- ... -->` comments; an unterminated comment drops the rest.
fn drop_comments(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pos = 0;

    while let Some(rel) = s[pos..].find("<!--") {
        let start = pos + rel;
        out.push_str(&s[pos..start]);

        match s[start + 4..].find("-->") {
            Some(end_rel) => pos = start + 4 + end_rel + 3,
            None => {
                pos = s.len();
            }
        }
    }

    out.push_str(&s[pos..]);
    out
}

/// Remove all remaining HTML tags. Every tag boundary becomes a newline so
/// text from adjacent elements never runs together; normalization collapses
/// the extra breaks afterwards.
fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for ch in s.chars() {
        match ch {
            '<' => {
                in_tag = true;
                out.push('\n');
            }
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Minimal entity decoding for the ones that actually show up in page text.
/// `&amp;` goes last so `&amp;lt;` does not double-decode.
fn decode_entities(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Fast ASCII-only lowercasing so byte offsets stay valid in the original.
fn to_lowercase_fast(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}
