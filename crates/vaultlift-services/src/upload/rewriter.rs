//! Reference rewriting after an attachment has been uploaded.
//!
//! Inline links to the attachment become `![alt](url)`; wikilinks and wikilink
//! embeds become `![](url)`. Documents are only written back when something
//! changed.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};
use std::sync::Arc;
use vaultlift_core::FileRef;
use vaultlift_vault::{DocumentStore, VaultResult};

/// Characters left alone when percent-encoding a file name for comparison.
const NAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~')
    .remove(b'(')
    .remove(b')');

struct AttachmentPatterns {
    inline: Regex,
    wikilink: Regex,
}

impl AttachmentPatterns {
    fn new(file_name: &str) -> Option<Self> {
        let mut spellings = vec![
            file_name.to_string(),
            file_name.replace(' ', "%20"),
            utf8_percent_encode(file_name, NAME_ENCODE_SET).to_string(),
        ];
        spellings.sort();
        spellings.dedup();
        let names = spellings
            .iter()
            .map(|s| regex::escape(s))
            .collect::<Vec<_>>()
            .join("|");

        let inline = Regex::new(&format!(
            r#"!?\[([^\]\n]*)\]\(\s*<?(?:[^()<>\n]*/)?(?:{names})>?(?:\s+(?:"[^"]*"|'[^']*'))?\s*\)"#
        ))
        .ok()?;
        let wikilink = Regex::new(&format!(
            r"!?\[\[(?:[^\[\]|#\n]*/)?(?:{names})(?:[|#][^\[\]\n]*)?\]\]"
        ))
        .ok()?;

        Some(AttachmentPatterns { inline, wikilink })
    }
}

/// Rewrite every reference to `file_name` in `content`. Returns `None` when
/// the document does not mention the attachment.
pub fn rewrite_document(content: &str, file_name: &str, cloud_url: &str) -> Option<String> {
    let patterns = AttachmentPatterns::new(file_name)?;
    rewrite_with(&patterns, content, cloud_url)
}

fn rewrite_with(patterns: &AttachmentPatterns, content: &str, cloud_url: &str) -> Option<String> {
    let mut changed = false;

    let after_inline = patterns.inline.replace_all(content, |caps: &Captures| {
        changed = true;
        format!("![{}]({})", &caps[1], cloud_url)
    });
    let after_wikilinks = patterns
        .wikilink
        .replace_all(&after_inline, |_: &Captures| {
            changed = true;
            format!("![]({})", cloud_url)
        })
        .into_owned();

    if changed {
        Some(after_wikilinks)
    } else {
        None
    }
}

/// Rewrites attachment references in vault documents.
#[derive(Clone)]
pub struct ReferenceRewriter {
    vault: Arc<dyn DocumentStore>,
}

impl ReferenceRewriter {
    pub fn new(vault: Arc<dyn DocumentStore>) -> Self {
        Self { vault }
    }

    /// Point every reference to `attachment` at `cloud_url`, in `target` only
    /// or in every markdown document. Returns how many documents were written.
    #[tracing::instrument(skip(self, attachment, target), fields(attachment = %attachment.path))]
    pub async fn replace_references(
        &self,
        attachment: &FileRef,
        cloud_url: &str,
        target: Option<&FileRef>,
    ) -> VaultResult<usize> {
        let Some(patterns) = AttachmentPatterns::new(&attachment.name) else {
            tracing::warn!(name = %attachment.name, "Could not build reference patterns");
            return Ok(0);
        };

        let documents = match target {
            Some(document) => vec![document.clone()],
            None => self.vault.list_markdown_files().await?,
        };

        let mut written = 0;
        for document in documents {
            let content = self.vault.read_text(&document.path).await?;
            if let Some(updated) = rewrite_with(&patterns, &content, cloud_url) {
                self.vault.write_text(&document.path, &updated).await?;
                written += 1;
                tracing::debug!(document = %document.path, "References rewritten");
            }
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://cdn.example.com/vault/a.png";

    #[test]
    fn inline_reference_keeps_alt_text() {
        let out = rewrite_document("Look: ![x](attachments/a.png) done", "a.png", URL).unwrap();
        assert_eq!(out, format!("Look: ![x]({}) done", URL));
        assert!(!out.contains("attachments/a.png"));
    }

    #[test]
    fn plain_link_becomes_image_embed() {
        let out = rewrite_document("[the file](a.png)", "a.png", URL).unwrap();
        assert_eq!(out, format!("![the file]({})", URL));
    }

    #[test]
    fn wikilinks_and_embeds_are_normalized() {
        let out = rewrite_document("[[a.png]] and ![[img/a.png|300]]", "a.png", URL).unwrap();
        assert_eq!(out, format!("![]({}) and ![]({})", URL, URL));
    }

    #[test]
    fn encoded_and_angle_bracket_spellings_match() {
        let url = "https://cdn.example.com/my-shot.png";
        let text = "![a](img/my%20shot.png) ![b](<img/my shot.png>) ![[my shot.png]]";
        let out = rewrite_document(text, "my shot.png", url).unwrap();
        assert_eq!(out, format!("![a]({u}) ![b]({u}) ![]({u})", u = url));
    }

    #[test]
    fn titles_are_dropped() {
        let out = rewrite_document(r#"![x](a.png "Figure 1")"#, "a.png", URL).unwrap();
        assert_eq!(out, format!("![x]({})", URL));
    }

    #[test]
    fn names_with_parentheses_match() {
        let out = rewrite_document("![](Pasted%20image%20(1).png)", "Pasted image (1).png", URL)
            .unwrap();
        assert_eq!(out, format!("![]({})", URL));
    }

    #[test]
    fn similar_names_are_left_alone() {
        let text = "![x](data.png) [[ba.png]] ![y](a.png.bak)";
        assert!(rewrite_document(text, "a.png", URL).is_none());
    }

    #[test]
    fn dollar_signs_in_urls_are_literal() {
        let url = "https://cdn.example.com/$1/a.png";
        let out = rewrite_document("![x](a.png)", "a.png", url).unwrap();
        assert_eq!(out, format!("![x]({})", url));
    }

    #[test]
    fn unrelated_documents_are_untouched() {
        assert!(rewrite_document("no attachments here", "a.png", URL).is_none());
    }
}
