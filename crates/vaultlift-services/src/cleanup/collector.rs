use percent_encoding::percent_decode_str;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use vaultlift_core::{key_from_url, AppError, UploadSettings};
use vaultlift_vault::DocumentStore;

/// `![alt](target)`; the target may contain one level of balanced parentheses.
static IMAGE_EMBED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[[^\]\n]*\]\(\s*<?((?:[^()\s<>]|\([^()\s]*\))+)>?").expect("valid regex")
});

/// `[text](target)`, with or without a leading `!`.
static PLAIN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]\n]*\]\(\s*<?((?:[^()\s<>]|\([^()\s]*\))+)>?").expect("valid regex")
});

/// `[[target]]`, with or without a leading `!`.
static WIKILINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]\n]+)\]\]").expect("valid regex"));

/// Candidate remote keys referenced from `text`.
///
/// Only matches containing `base_url` count. Each hit contributes the key as
/// written and, when it differs, its percent-decoded form.
pub fn referenced_keys_in_text(text: &str, base_url: &str) -> BTreeSet<String> {
    let base = base_url.trim_end_matches('/');
    let mut keys = BTreeSet::new();
    if base.is_empty() {
        return keys;
    }

    let mut add = |candidate: &str| {
        if !candidate.contains(base) {
            return;
        }
        if let Some(key) = key_from_url(candidate, base) {
            let decoded = percent_decode_str(&key).decode_utf8_lossy().into_owned();
            if decoded != key {
                keys.insert(decoded);
            }
            keys.insert(key);
        }
    };

    for pattern in [&*IMAGE_EMBED, &*PLAIN_LINK, &*WIKILINK] {
        for caps in pattern.captures_iter(text) {
            add(&caps[1]);
        }
    }

    // Bare URLs outside any link syntax.
    let bare_url = format!(
        r"{}(?:[^\s()\[\]<>]|\([^\s()\[\]<>]*\))*",
        regex::escape(base)
    );
    if let Ok(raw) = Regex::new(&bare_url) {
        for m in raw.find_iter(text) {
            add(m.as_str());
            // Sentence punctuation after a bare URL.
            add(m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?', '"', '\'']));
        }
    }

    keys
}

/// Union of [`referenced_keys_in_text`] over every markdown document.
#[tracing::instrument(skip(vault, settings))]
pub async fn collect_referenced_keys(
    vault: &dyn DocumentStore,
    settings: &UploadSettings,
) -> Result<BTreeSet<String>, AppError> {
    let base = settings.public_base_url();
    let documents = vault
        .list_markdown_files()
        .await
        .map_err(|e| AppError::Scan(format!("listing documents failed: {}", e)))?;

    let mut keys = BTreeSet::new();
    for document in &documents {
        let text = vault
            .read_text(&document.path)
            .await
            .map_err(|e| AppError::Scan(format!("reading {} failed: {}", document.path, e)))?;
        keys.extend(referenced_keys_in_text(&text, &base));
    }

    tracing::info!(
        documents = documents.len(),
        references = keys.len(),
        "Remote references collected"
    );
    Ok(keys)
}
