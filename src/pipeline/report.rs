//! Per-run change report.

use std::path::Path;

use crate::error::Result;

/// An entry whose worker failed and was left at its previous state.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryFailure {
    /// Listing path of the entry
    pub url: String,
    pub title: String,
    pub error: String,
}

/// What a run added.
///
/// `added` holds the titles of chapters whose images were fetched this run,
/// grouped by entry in catalog order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeReport {
    pub added: Vec<String>,
    pub failures: Vec<EntryFailure>,
}

impl ChangeReport {
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
    }

    /// Plain-text summary: a count header, then one title per line.
    pub fn render(&self) -> String {
        let count = self.added.len();
        let mut text = format!(
            "Added {} new chapter{}\n",
            count,
            if count == 1 { "" } else { "s" }
        );
        for title in &self.added {
            text.push_str(title);
            text.push('\n');
        }
        text
    }

    /// Write the rendered summary, replacing any previous one.
    pub async fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, self.render()).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_render_plural() {
        let report = ChangeReport {
            added: vec![
                "One Piece Chapter 1052".to_string(),
                "Jujutsu Kaisen Chapter 190".to_string(),
            ],
            failures: Vec::new(),
        };
        assert_eq!(
            report.render(),
            "Added 2 new chapters\nOne Piece Chapter 1052\nJujutsu Kaisen Chapter 190\n"
        );
    }

    #[test]
    fn test_render_singular_and_empty() {
        let one = ChangeReport {
            added: vec!["Bleach Chapter 1".to_string()],
            ..ChangeReport::default()
        };
        assert_eq!(one.render(), "Added 1 new chapter\nBleach Chapter 1\n");
        assert_eq!(ChangeReport::default().render(), "Added 0 new chapters\n");
        assert!(!ChangeReport::default().has_changes());
    }

    #[tokio::test]
    async fn test_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out").join("commit_msg");
        let report = ChangeReport {
            added: vec!["Chapter 3".to_string()],
            ..ChangeReport::default()
        };

        report.write(&path).await.unwrap();
        let text = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(text, "Added 1 new chapter\nChapter 3\n");
    }
}
