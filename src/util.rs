use std::collections::HashMap;

/// Returns the text between the first occurrence of `left` and the next
/// occurrence of `right` after it.
pub fn between<'a>(haystack: &'a str, left: &str, right: &str) -> Option<&'a str> {
    let start = haystack.find(left)? + left.len();
    let rest = &haystack[start..];
    let end = rest.find(right)?;
    Some(&rest[..end])
}

/// Strips markup from platform-reported reason text: `<br>` and paragraph
/// breaks become newlines, every other tag is removed.
pub fn strip_html(text: &str) -> String {
    let mut out = text.replace('\n', " ");
    let br = regex::Regex::new(r"(?i)\s*<\s*br\s*/?\s*>\s*").unwrap();
    out = br.replace_all(&out, "\n").to_string();
    let para = regex::Regex::new(r"(?i)<\s*/\s*p\s*>\s*<\s*p[^>]*>").unwrap();
    out = para.replace_all(&out, "\n").to_string();
    let tag = regex::Regex::new(r"<[^>]*>").unwrap();
    tag.replace_all(&out, "").trim().to_string()
}

/// Parses an `application/x-www-form-urlencoded` body into a key/value map.
/// `+` decodes to space; keys repeat last-wins.
pub fn parse_query(body: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for pair in body.split('&') {
        if pair.is_empty() {
            continue;
        }
        let mut parts = pair.splitn(2, '=');
        let key = parts.next().unwrap_or_default();
        let value = parts.next().unwrap_or_default().replace('+', " ");
        let key = urlencoding::decode(key)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| key.to_string());
        let value = urlencoding::decode(&value)
            .map(|c| c.into_owned())
            .unwrap_or_else(|_| value.clone());
        map.insert(key, value);
    }
    map
}
