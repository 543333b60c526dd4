//! Remote key and URL construction.
//!
//! Key format: `[folderPath/][datePath/]sanitizedFileName`.
//! URL format: `{base}/{bucket}/{key}` for path-style settings, `{base}/{key}` otherwise.
//! [`key_from_url`] is the inverse the reference collector relies on.

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::config::UploadSettings;

/// Replace whitespace, control characters and the URL delimiters `#`, `?`
/// and `%` with `-` so keys need no escaping.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_whitespace() || c.is_control() || matches!(c, '#' | '?' | '%') {
                '-'
            } else {
                c
            }
        })
        .collect()
}

/// Non-empty `/`-separated segments of `path`.
fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// Substitute `YYYY`, `YY`, `MM`, `DD`, `HH`, `mm` and `ss` tokens. Other text
/// is copied verbatim.
pub fn format_date(now: NaiveDateTime, format: &str) -> String {
    const TOKENS: [&str; 7] = ["YYYY", "YY", "MM", "DD", "HH", "mm", "ss"];

    let mut out = String::with_capacity(format.len() + 8);
    let mut rest = format;
    'outer: while !rest.is_empty() {
        for token in TOKENS {
            if let Some(tail) = rest.strip_prefix(token) {
                let value = match token {
                    "YYYY" => format!("{:04}", now.year()),
                    "YY" => format!("{:02}", now.year().rem_euclid(100)),
                    "MM" => format!("{:02}", now.month()),
                    "DD" => format!("{:02}", now.day()),
                    "HH" => format!("{:02}", now.hour()),
                    "mm" => format!("{:02}", now.minute()),
                    _ => format!("{:02}", now.second()),
                };
                out.push_str(&value);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

/// Compute the remote object key for a local file name.
pub fn compute_key(file_name: &str, settings: &UploadSettings, now: NaiveDateTime) -> String {
    let mut segments: Vec<String> = path_segments(&settings.folder_path)
        .map(str::to_string)
        .collect();
    if settings.organize_by_date {
        let date_path = format_date(now, &settings.date_format);
        segments.extend(path_segments(&date_path).map(str::to_string));
    }
    segments.push(sanitize_file_name(file_name));
    segments.join("/")
}

/// Compute the externally visible URL for a key.
pub fn compute_url(key: &str, settings: &UploadSettings) -> String {
    let base = settings.public_base_url();
    if settings.use_path_style {
        format!("{}/{}/{}", base, settings.bucket_name, key)
    } else {
        format!("{}/{}", base, key)
    }
}

/// Recover the candidate key from text containing `base_url`.
///
/// Everything up to and including `base_url` is dropped, then one leading `/`
/// and any query string or fragment. For path-style URLs the result still
/// starts with the bucket name.
pub fn key_from_url(text: &str, base_url: &str) -> Option<String> {
    let base = base_url.trim_end_matches('/');
    if base.is_empty() {
        return None;
    }
    let idx = text.find(base)?;
    let rest = &text[idx + base.len()..];
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    let end = rest.find(|c: char| c == '?' || c == '#').unwrap_or(rest.len());
    let key = &rest[..end];
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}
