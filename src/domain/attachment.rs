use std::collections::HashSet;
use std::fmt;

use uuid::Uuid;

/// Number of attachments suggested for a new ticket. Not enforced.
pub const SUGGESTED_ATTACHMENT_LIMIT: usize = 10;

/// Opaque per-attachment key, assigned once when the attachment is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentId(Uuid);

impl AttachmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: AttachmentId,
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Attachment {
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            id: AttachmentId::new(),
            filename: filename.into(),
            content_type: content_type.into(),
            data,
        }
    }
}

/// File names to write attachments under. Later attachments that reuse an
/// earlier name are prefixed with their short id so nothing is overwritten.
pub fn download_names(attachments: &[Attachment]) -> Vec<(AttachmentId, String)> {
    let mut taken = HashSet::new();
    attachments
        .iter()
        .map(|attachment| {
            let base = sanitize_file_name(&attachment.filename);
            let name = if taken.contains(&base) {
                format!("{}-{base}", attachment.id.short())
            } else {
                base
            };
            taken.insert(name.clone());
            (attachment.id, name)
        })
        .collect()
}

fn sanitize_file_name(name: &str) -> String {
    let file_name = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if file_name.is_empty() || file_name == "." || file_name == ".." {
        "attachment".to_string()
    } else {
        file_name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colliding_names_are_disambiguated_by_id() {
        let first = Attachment::new("log.txt", "text/plain", b"one".to_vec());
        let second = Attachment::new("log.txt", "text/plain", b"two".to_vec());
        let third = Attachment::new("trace.txt", "text/plain", b"three".to_vec());

        let names = download_names(&[first.clone(), second.clone(), third]);

        assert_eq!(names[0], (first.id, "log.txt".to_string()));
        assert_eq!(names[1].0, second.id);
        assert_eq!(names[1].1, format!("{}-log.txt", second.id.short()));
        assert_eq!(names[2].1, "trace.txt");
    }

    #[test]
    fn strips_directories_from_names() {
        let nested = Attachment::new("../../etc/passwd", "text/plain", Vec::new());
        let empty = Attachment::new("", "text/plain", Vec::new());

        let names = download_names(&[nested, empty]);

        assert_eq!(names[0].1, "passwd");
        assert_eq!(names[1].1, "attachment");
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(AttachmentId::new(), AttachmentId::new());
    }
}
