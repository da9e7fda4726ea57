//! Writing inline text edits back into the source text

use serde::Serialize;

use super::ast::NodeId;

/// A committed label edit on one block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeEdit {
    pub node: NodeId,
    pub old_text: String,
    pub new_text: String,
    /// Source token before the edit
    pub old_token: String,
    /// Source token after the edit, now stored on the block
    pub new_token: String,
}

impl NodeEdit {
    pub fn new(node: NodeId, old_text: &str, new_text: &str, old_token: &str) -> Self {
        Self {
            node,
            old_text: old_text.to_string(),
            new_text: new_text.to_string(),
            old_token: old_token.to_string(),
            new_token: rewrite_token(old_token, old_text, new_text),
        }
    }

    /// Rewrite every occurrence of the old token in `source`
    ///
    /// Returns the source unchanged when the token does not occur or the edit
    /// did not change it.
    pub fn apply(&self, source: &str) -> String {
        if self.old_token.is_empty() || self.old_token == self.new_token {
            return source.to_string();
        }
        source.replace(&self.old_token, &self.new_token)
    }
}

/// Replace the first occurrence of `old_text` inside a block token's payload
///
/// Only the text between the opening delimiter (`t(`, `p[`, `l[`, `d<`) and
/// the final closing delimiter is touched, so labels that spell the
/// notation letter (`p[p]`) keep their prefix.
pub fn rewrite_token(token: &str, old_text: &str, new_text: &str) -> String {
    if old_text.is_empty() {
        return token.to_string();
    }
    let Some((start, end)) = payload_range(token) else {
        return token.to_string();
    };
    let payload = &token[start..end];
    if !payload.contains(old_text) {
        return token.to_string();
    }
    format!(
        "{}{}{}",
        &token[..start],
        payload.replacen(old_text, new_text, 1),
        &token[end..]
    )
}

/// Byte range of the payload between a token's delimiters
fn payload_range(token: &str) -> Option<(usize, usize)> {
    let open = token.find(['(', '[', '<'])?;
    let close = match token.as_bytes()[open] {
        b'(' => ')',
        b'[' => ']',
        _ => '>',
    };
    let end = token.rfind(close)?;
    (end > open).then_some((open + 1, end))
}
