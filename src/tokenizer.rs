//! Token extraction from the live cursor position.
//!
//! Free-text fields query on the trailing word to the left of the caret.
//! All offsets here are char (code point) offsets, never bytes: the editor
//! mixes Thai and Latin script and byte offsets would split Thai characters.
//!
//! Structured fields (diagnosis text, medication drug column) do not use
//! token extraction at all — the whole field value is the query and a commit
//! is a whole-value assignment. That path lives in the applicator.

/// Result of [`replace_token`]: the rewritten text and the new caret
/// position (in chars), placed immediately after the inserted replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenReplacement {
    pub text: String,
    pub cursor: usize,
}

/// The maximal run of non-whitespace chars ending at `cursor`.
///
/// Returns an empty string when the caret is at position 0 or right after
/// whitespace. A caret past the end of the text is clamped to the end.
pub fn extract_token(text: &str, cursor: usize) -> String {
    let left: Vec<char> = text.chars().take(cursor).collect();
    let start = token_start(&left);
    left[start..].iter().collect()
}

/// Replace the trailing token at `cursor` with `replacement`.
///
/// Surrounding text is untouched. When there is no trailing token (caret at
/// 0 or after whitespace) the input is returned unchanged — mirrors the
/// editor, which never commits without an open session anyway.
pub fn replace_token(text: &str, cursor: usize, replacement: &str) -> TokenReplacement {
    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());
    let start = token_start(&chars[..cursor]);

    if start == cursor {
        return TokenReplacement {
            text: text.to_string(),
            cursor,
        };
    }

    let mut out: String = chars[..start].iter().collect();
    out.push_str(replacement);
    let new_cursor = start + replacement.chars().count();
    out.extend(&chars[cursor..]);

    TokenReplacement {
        text: out,
        cursor: new_cursor,
    }
}

/// Char index where the trailing token begins (== `left.len()` if none).
fn token_start(left: &[char]) -> usize {
    left.iter()
        .rposition(|c| c.is_whitespace())
        .map(|i| i + 1)
        .unwrap_or(0)
}
