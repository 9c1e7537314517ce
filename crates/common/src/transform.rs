// Publication patch for exported HTML: pad the document body.

/// Declarations spliced into the body's inline style.
pub const BODY_PADDING: &str = "padding-top: 1rem !important; padding-left: 3rem !important; ";

/// Anchors recognized as the start of the body's inline style value.
///
/// Other spellings (uppercase, extra whitespace around `=`) are not matched
/// and pass through untouched.
pub const BODY_STYLE_ANCHORS: [&str; 2] = ["body style=\"", "body style='"];

/// Insert [`BODY_PADDING`] right after the first body style anchor.
///
/// Input without an anchor is returned unchanged. When the padding already
/// follows the first anchor the input is also returned unchanged, so applying
/// the patch twice equals applying it once. Works on raw bytes: exports that
/// are not valid UTF-8 still pass through verbatim.
pub fn transform(html: &[u8]) -> Vec<u8> {
    let Some(insert_at) = first_anchor_end(html) else {
        return html.to_vec();
    };

    if html[insert_at..].starts_with(BODY_PADDING.as_bytes()) {
        return html.to_vec();
    }

    let mut patched = Vec::with_capacity(html.len() + BODY_PADDING.len());
    patched.extend_from_slice(&html[..insert_at]);
    patched.extend_from_slice(BODY_PADDING.as_bytes());
    patched.extend_from_slice(&html[insert_at..]);
    patched
}

/// String convenience wrapper around [`transform`].
pub fn transform_str(html: &str) -> String {
    // Inserting ASCII at an ASCII boundary keeps the text valid UTF-8.
    String::from_utf8(transform(html.as_bytes())).unwrap_or_else(|_| html.to_string())
}

/// Byte offset just past the earliest anchor, if any.
fn first_anchor_end(html: &[u8]) -> Option<usize> {
    BODY_STYLE_ANCHORS
        .iter()
        .filter_map(|anchor| find(html, anchor.as_bytes()).map(|start| start + anchor.len()))
        .min()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}
