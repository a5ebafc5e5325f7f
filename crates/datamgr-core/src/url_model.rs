//! Local filenames for downloaded data files.
//!
//! The downloader names each file after the server's Content-Disposition
//! hint or the last URL path segment, sanitized for Linux, and never reuses
//! a path that already exists in the cache directory.

use std::path::{Path, PathBuf};

/// Used when neither the header nor the URL yield a usable name.
const FALLBACK_FILENAME: &str = "data.bin";

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Filename for a download of `url`, preferring a Content-Disposition hint.
///
/// - `filename_for("https://example.com/aia/lev1.fits", None)` → `"lev1.fits"`
/// - `filename_for("https://example.com/get?id=3", Some("attachment; filename=\"map.fits\""))` → `"map.fits"`
pub fn filename_for(url: &str, content_disposition: Option<&str>) -> String {
    content_disposition
        .and_then(disposition_filename)
        .or_else(|| last_path_segment(url))
        .map(|raw| sanitize(&raw))
        .filter(|name| !name.is_empty() && name != "." && name != "..")
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// First path in `dir` for `filename` that does not exist yet:
/// `name.ext`, then `name.1.ext`, `name.2.ext`, ...
pub fn unique_destination(dir: &Path, filename: &str) -> PathBuf {
    let first = dir.join(filename);
    if !first.exists() {
        return first;
    }
    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    };
    (1u32..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem}.{n}.{ext}")),
            None => dir.join(format!("{stem}.{n}")),
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Last non-empty path segment of `url`, percent-decoded.
fn last_path_segment(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?;
    Some(percent_decode(segment).unwrap_or_else(|| segment.to_string()))
}

/// `filename*=UTF-8''...` wins over `filename=...`.
fn disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    for param in header.split(';').map(str::trim) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                let encoded = value
                    .split_once("''")
                    .filter(|(charset, _)| charset.eq_ignore_ascii_case("utf-8"))
                    .map(|(_, rest)| rest);
                if let Some(name) = encoded.and_then(percent_decode).filter(|n| !n.is_empty()) {
                    return Some(name);
                }
            }
            "filename" => {
                let unquoted = value
                    .strip_prefix('"')
                    .and_then(|v| v.strip_suffix('"'))
                    .map(|v| v.replace("\\\"", "\"").replace("\\\\", "\\"))
                    .unwrap_or_else(|| value.to_string());
                if !unquoted.is_empty() {
                    plain = Some(unquoted);
                }
            }
            _ => {}
        }
    }
    plain
}

/// Decodes `%XX` escapes; `None` on malformed escapes or invalid UTF-8.
fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

/// Replaces path separators, NUL, control chars and whitespace with `_`
/// (runs collapsed), trims dots/underscores at the ends, caps at NAME_MAX bytes.
fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let bad = c == '/' || c == '\\' || c.is_control() || c.is_whitespace();
        if !bad {
            out.push(c);
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}
