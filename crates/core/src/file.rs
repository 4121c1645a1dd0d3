use serde::{Deserialize, Serialize};

/// MIME type the storage provider assigns to folders.
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// MIME prefixes with no text-extraction adapter. Files of these types are
/// skipped before any network call is made.
pub const MEDIA_MIME_PREFIXES: [&str; 3] = ["image/", "video/", "audio/"];

/// A file as reported by the storage provider.
///
/// The identifier is provider-assigned and immutable. `organized` mirrors the
/// provider-side marker written after a successful move; it is the only field
/// the pipeline ever mutates, and it is set at most once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Provider-assigned identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Declared MIME type.
    pub mime_type: String,

    /// Size in bytes. Native provider documents may report none.
    #[serde(default)]
    pub size: u64,

    /// Parent folder identifier, when reported.
    pub parent_id: Option<String>,

    /// Whether a successful move has already marked this file.
    #[serde(default)]
    pub organized: bool,
}

impl FileRecord {
    /// Create a record with the fields every provider listing carries.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            size: 0,
            parent_id: None,
            organized: false,
        }
    }

    /// Whether this record is a folder rather than a document.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME
    }

    /// Whether this record's type is a media type with no extractor.
    #[must_use]
    pub fn is_media(&self) -> bool {
        MEDIA_MIME_PREFIXES
            .iter()
            .any(|prefix| self.mime_type.starts_with(prefix))
    }

    /// Whether this is a native provider document (editor format) that must
    /// be exported rather than downloaded as raw bytes.
    #[must_use]
    pub fn is_native_doc(&self) -> bool {
        self.mime_type.starts_with("application/vnd.google-apps.") && !self.is_folder()
    }

    /// Export target for native provider documents, `None` for regular
    /// files. Spreadsheets export as CSV, everything else as plain text.
    #[must_use]
    pub fn export_mime(&self) -> Option<&'static str> {
        if !self.is_native_doc() {
            return None;
        }
        match self.mime_type.as_str() {
            "application/vnd.google-apps.spreadsheet" => Some("text/csv"),
            _ => Some("text/plain"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_detection() {
        let folder = FileRecord::new("f1", "Reports", FOLDER_MIME);
        assert!(folder.is_folder());
        assert!(!folder.is_media());

        let doc = FileRecord::new("f2", "notes.txt", "text/plain");
        assert!(!doc.is_folder());
    }

    #[test]
    fn media_detection() {
        for mime in ["image/jpeg", "video/mp4", "audio/mpeg"] {
            let file = FileRecord::new("m", "media", mime);
            assert!(file.is_media(), "{mime} should be media");
        }
        assert!(!FileRecord::new("p", "doc.pdf", "application/pdf").is_media());
    }

    #[test]
    fn native_doc_detection() {
        let doc = FileRecord::new("d", "Plan", "application/vnd.google-apps.document");
        assert!(doc.is_native_doc());
        let folder = FileRecord::new("f", "Inbox", FOLDER_MIME);
        assert!(!folder.is_native_doc());
        let pdf = FileRecord::new("p", "a.pdf", "application/pdf");
        assert!(!pdf.is_native_doc());
    }

    #[test]
    fn export_targets_by_type() {
        let doc = FileRecord::new("d", "Plan", "application/vnd.google-apps.document");
        assert_eq!(doc.export_mime(), Some("text/plain"));
        let sheet = FileRecord::new("s", "Budget", "application/vnd.google-apps.spreadsheet");
        assert_eq!(sheet.export_mime(), Some("text/csv"));
        let pdf = FileRecord::new("p", "a.pdf", "application/pdf");
        assert_eq!(pdf.export_mime(), None);
        let folder = FileRecord::new("f", "Inbox", FOLDER_MIME);
        assert_eq!(folder.export_mime(), None);
    }

    #[test]
    fn serde_defaults_missing_fields() {
        let record: FileRecord = serde_json::from_str(
            r#"{"id":"x","name":"a.pdf","mime_type":"application/pdf","parent_id":null}"#,
        )
        .unwrap();
        assert_eq!(record.size, 0);
        assert!(!record.organized);
    }
}
