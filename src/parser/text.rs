//! Label text inside block payloads

use super::ast::{SubField, SubFields};

/// Quoting styles, longest first so `"""` is not read as `"`
const QUOTES: [&str; 4] = ["\"\"\"", "'''", "\"", "'"];

/// Trim a payload and strip one level of quoting
pub(crate) fn extract_text(payload: &str) -> String {
    let trimmed = payload.trim();
    QUOTES
        .iter()
        .find_map(|quote| {
            trimmed
                .strip_prefix(quote)
                .and_then(|rest| rest.strip_suffix(quote))
                .filter(|inner| !inner.is_empty())
        })
        .unwrap_or(trimmed)
        .trim()
        .to_string()
}

/// Split a sub-block payload at its `*xy:` markers
///
/// Each known tag takes the text up to the next marker. The first occurrence
/// of a tag wins and fields with no text are left out.
pub(crate) fn parse_sub_fields(content: &str) -> SubFields {
    let markers = field_markers(content);
    let mut fields = SubFields::new();
    for (i, (start, tag)) in markers.iter().enumerate() {
        let end = markers.get(i + 1).map_or(content.len(), |(next, _)| *next);
        let Some(field) = SubField::from_tag(tag) else {
            continue;
        };
        if fields.contains_key(&field) {
            continue;
        }
        let text = extract_text(&content[start + 4..end]);
        if !text.is_empty() {
            fields.insert(field, text);
        }
    }
    fields
}

/// Byte offsets and tags of every `*xy:` marker in order
fn field_markers(content: &str) -> Vec<(usize, &str)> {
    let bytes = content.as_bytes();
    (0..bytes.len().saturating_sub(3))
        .filter(|&i| {
            bytes[i] == b'*'
                && bytes[i + 1].is_ascii_lowercase()
                && bytes[i + 2].is_ascii_lowercase()
                && bytes[i + 3] == b':'
        })
        .map(|i| (i, &content[i + 1..i + 3]))
        .collect()
}
