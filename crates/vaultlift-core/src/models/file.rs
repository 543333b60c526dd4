use serde::{Deserialize, Serialize};

/// A file inside the vault, addressed by its vault-relative `/`-separated path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRef {
    pub path: String,
    pub name: String,
    /// Extension without the dot, as written on disk. Empty when absent.
    pub extension: String,
}

impl FileRef {
    pub fn from_path(path: &str) -> Self {
        let path = path.trim_start_matches("./").trim_start_matches('/');
        let name = path.rsplit('/').next().unwrap_or(path).to_string();
        let extension = match name.rfind('.') {
            Some(idx) if idx > 0 => name[idx + 1..].to_string(),
            _ => String::new(),
        };
        FileRef {
            path: path.to_string(),
            name,
            extension,
        }
    }

    /// Folder containing the file, empty for the vault root.
    pub fn parent(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[..idx],
            None => "",
        }
    }

    pub fn is_markdown(&self) -> bool {
        self.extension.eq_ignore_ascii_case("md")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_splits_name_and_extension() {
        let file = FileRef::from_path("attachments/Screen Shot.PNG");
        assert_eq!(file.name, "Screen Shot.PNG");
        assert_eq!(file.extension, "PNG");
        assert_eq!(file.parent(), "attachments");
    }

    #[test]
    fn dotfiles_have_no_extension() {
        let file = FileRef::from_path(".gitignore");
        assert_eq!(file.extension, "");
        assert_eq!(file.parent(), "");
    }

    #[test]
    fn markdown_detection_ignores_case() {
        assert!(FileRef::from_path("Daily/2024-01-01.MD").is_markdown());
        assert!(!FileRef::from_path("a.png").is_markdown());
    }
}
