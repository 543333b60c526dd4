//! Attachment link extraction.
//!
//! Two syntaxes are recognised:
//! - inline links `![alt](target)` / `[label](target)`, kept when the target is
//!   local (no URL scheme);
//! - wikilinks `[[target]]` / `![[target]]`, kept only when the target has an
//!   allowed attachment extension. Anything else is a note link.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::{AttachmentReference, LinkSyntax};

static INLINE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(!?)\[([^\]\n]*)\]\(((?:[^()\n]|\([^()\n]*\))*)\)").expect("valid inline regex")
});

static WIKILINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[\[([^\[\]\n]+)\]\]").expect("valid wikilink regex"));

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").expect("valid scheme regex"));

static LINK_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\s+("[^"]*"|'[^']*')$"#).expect("valid title regex"));

/// Extract local attachment paths in document order. Duplicates are kept.
pub fn extract_attachment_paths(text: &str, allowed_extensions: &BTreeSet<String>) -> Vec<String> {
    extract_attachment_references(text, allowed_extensions)
        .into_iter()
        .map(|reference| reference.path)
        .collect()
}

/// Extract local attachment references, tagged with their syntax, in document order.
pub fn extract_attachment_references(
    text: &str,
    allowed_extensions: &BTreeSet<String>,
) -> Vec<AttachmentReference> {
    let mut references = Vec::new();

    for caps in INLINE_LINK.captures_iter(text) {
        let (Some(whole), Some(target)) = (caps.get(0), caps.get(3)) else {
            continue;
        };
        if let Some(path) = clean_inline_target(target.as_str()) {
            references.push(AttachmentReference {
                path,
                syntax: LinkSyntax::Inline,
                embed: !caps[1].is_empty(),
                offset: whole.start(),
            });
        }
    }

    for caps in WIKILINK.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        let Some(path) = clean_wikilink_target(inner.as_str()) else {
            continue;
        };
        if !has_allowed_extension(&path, allowed_extensions) {
            continue;
        }
        references.push(AttachmentReference {
            path,
            syntax: LinkSyntax::Wikilink,
            embed: !caps[1].is_empty(),
            offset: whole.start(),
        });
    }

    references.sort_by_key(|reference| reference.offset);
    references
}

fn clean_inline_target(raw: &str) -> Option<String> {
    let mut target = raw.trim();
    if let Some(inner) = target.strip_prefix('<') {
        target = inner.split('>').next().unwrap_or(inner);
    } else if let Some(title) = LINK_TITLE.find(target) {
        target = &target[..title.start()];
    }
    let target = target.trim();

    if target.is_empty()
        || target.starts_with('#')
        || target.starts_with("//")
        || URL_SCHEME.is_match(target)
    {
        return None;
    }
    Some(target.to_string())
}

fn clean_wikilink_target(inner: &str) -> Option<String> {
    let target = inner.split('|').next().unwrap_or(inner);
    let target = target.split('#').next().unwrap_or(target).trim();
    if target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}

fn has_allowed_extension(path: &str, allowed_extensions: &BTreeSet<String>) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => {
            allowed_extensions.contains(&name[idx + 1..].to_lowercase())
        }
        _ => false,
    }
}
