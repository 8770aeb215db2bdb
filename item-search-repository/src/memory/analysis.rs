//! Text analysis for the in-memory backend.

use std::collections::HashSet;

fn is_cjk(c: char) -> bool {
    matches!(c as u32, 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xF900..=0xFAFF)
}

/// Split text into lower-cased tokens.
///
/// Runs of alphanumeric characters form one token and every CJK ideograph is
/// a token of its own, as with a standard analyzer.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();

    for c in text.chars() {
        if is_cjk(c) {
            if !word.is_empty() {
                tokens.push(std::mem::take(&mut word).to_lowercase());
            }
            tokens.push(c.to_string());
        } else if c.is_alphanumeric() {
            word.push(c);
        } else if !word.is_empty() {
            tokens.push(std::mem::take(&mut word).to_lowercase());
        }
    }
    if !word.is_empty() {
        tokens.push(word.to_lowercase());
    }

    tokens
}

struct Marker<'a> {
    terms: &'a HashSet<String>,
    pre_tag: &'a str,
    post_tag: &'a str,
    out: String,
    marked: bool,
}

impl Marker<'_> {
    fn push_token(&mut self, token: &str) {
        if self.terms.contains(&token.to_lowercase()) {
            self.out.push_str(self.pre_tag);
            self.out.push_str(token);
            self.out.push_str(self.post_tag);
            self.marked = true;
        } else {
            self.out.push_str(token);
        }
    }
}

/// Wrap every token of `value` found in `terms` with the given tags.
///
/// Returns `None` when nothing was marked.
pub(crate) fn highlight_text(
    value: &str,
    terms: &HashSet<String>,
    pre_tag: &str,
    post_tag: &str,
) -> Option<String> {
    let mut marker = Marker {
        terms,
        pre_tag,
        post_tag,
        out: String::with_capacity(value.len()),
        marked: false,
    };
    let mut word = String::new();

    for c in value.chars() {
        if is_cjk(c) {
            marker.push_token(&std::mem::take(&mut word));
            let mut buf = [0u8; 4];
            marker.push_token(c.encode_utf8(&mut buf));
        } else if c.is_alphanumeric() {
            word.push(c);
        } else {
            marker.push_token(&std::mem::take(&mut word));
            marker.out.push(c);
        }
    }
    marker.push_token(&word);

    marker.marked.then_some(marker.out)
}
