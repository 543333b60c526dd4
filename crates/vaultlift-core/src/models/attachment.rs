use serde::{Deserialize, Serialize};

/// Markdown syntax an attachment reference was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkSyntax {
    /// `![alt](target)` or `[label](target)`
    Inline,
    /// `[[target]]` or `![[target]]`
    Wikilink,
}

/// A local attachment path found in document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentReference {
    /// Link target with titles, aliases and heading suffixes removed. Not yet
    /// percent-decoded.
    pub path: String,
    pub syntax: LinkSyntax,
    /// Whether the link was written as an embed (`!` prefix).
    pub embed: bool,
    /// Byte offset of the whole link in the source text.
    pub offset: usize,
}
