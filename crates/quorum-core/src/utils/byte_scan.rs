//! Scanning helpers for JSON bodies that avoid full structural parsing.
//!
//! Canonicalization and milestone extraction only need to locate a handful of
//! known field markers, so they work on the raw bytes instead of decoding the
//! whole document.

use std::borrow::Cow;

/// Position of the first occurrence of `needle` in `haystack`.
#[must_use]
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Position of the last occurrence of `needle` in `haystack`.
#[must_use]
pub fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|window| window == needle)
}

fn skip_whitespace(data: &[u8], mut pos: usize) -> usize {
    while pos < data.len() && data[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Exclusive end of the JSON value starting at `start`.
///
/// Strings honor backslash escapes, objects and arrays are matched by depth,
/// scalars run until the next delimiter. Returns `None` if the value is
/// unterminated.
#[must_use]
pub fn value_end(data: &[u8], start: usize) -> Option<usize> {
    let first = *data.get(start)?;
    match first {
        b'"' => string_end(data, start),
        b'{' | b'[' => {
            let mut depth = 0usize;
            let mut pos = start;
            while pos < data.len() {
                match data[pos] {
                    b'"' => {
                        pos = string_end(data, pos)?;
                        continue;
                    }
                    b'{' | b'[' => depth += 1,
                    b'}' | b']' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(pos + 1);
                        }
                    }
                    _ => {}
                }
                pos += 1;
            }
            None
        }
        _ => {
            let end = data[start..]
                .iter()
                .position(|b| matches!(b, b',' | b'}' | b']') || b.is_ascii_whitespace())
                .map_or(data.len(), |offset| start + offset);
            (end > start).then_some(end)
        }
    }
}

/// Exclusive end of the string literal whose opening quote is at `start`.
fn string_end(data: &[u8], start: usize) -> Option<usize> {
    let mut pos = start + 1;
    while pos < data.len() {
        match data[pos] {
            b'\\' => pos += 2,
            b'"' => return Some(pos + 1),
            _ => pos += 1,
        }
    }
    None
}

/// Removes the last field introduced by `marker` (e.g. `"duration":`) together
/// with its value and one separating comma.
///
/// Returns the input unchanged (borrowed) when the marker is absent or its
/// value is malformed.
#[must_use]
pub fn strip_field<'a>(data: &'a [u8], marker: &[u8]) -> Cow<'a, [u8]> {
    let Some(key_start) = rfind(data, marker) else {
        return Cow::Borrowed(data);
    };
    let value_start = skip_whitespace(data, key_start + marker.len());
    let Some(value_end) = value_end(data, value_start) else {
        return Cow::Borrowed(data);
    };

    let mut cut_start = key_start;
    let mut cut_end = value_end;

    let before = data[..key_start].iter().rposition(|b| !b.is_ascii_whitespace());
    if let Some(comma) = before.filter(|&i| data[i] == b',') {
        cut_start = comma;
    } else {
        let after = skip_whitespace(data, value_end);
        if data.get(after) == Some(&b',') {
            cut_end = after + 1;
        }
    }

    let mut stripped = Vec::with_capacity(data.len() - (cut_end - cut_start));
    stripped.extend_from_slice(&data[..cut_start]);
    stripped.extend_from_slice(&data[cut_end..]);
    Cow::Owned(stripped)
}
