use std::path::Path;

use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::attachment::Attachment;
use crate::domain::ticket::Ticket;
use crate::error::{AppError, AppResult};

#[cfg(test)]
const BUFFER_TYPE: &str = "Buffer";

/// A stored file as returned by the files endpoint. `data.data` holds the
/// base64 text of the payload, one byte per character.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFile {
    pub filename: String,
    pub content_type: String,
    #[serde(rename = "_id", default)]
    pub record_id: String,
    pub data: WireData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireData {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub data: Vec<u8>,
}

#[cfg(test)]
pub fn encode_wire(attachment: &Attachment) -> WireFile {
    WireFile {
        filename: attachment.filename.clone(),
        content_type: attachment.content_type.clone(),
        record_id: String::new(),
        data: WireData {
            kind: BUFFER_TYPE.to_string(),
            data: BASE64_STANDARD.encode(&attachment.data).into_bytes(),
        },
    }
}

pub fn decode_wire(file: WireFile) -> AppResult<Attachment> {
    let encoded = String::from_utf8(file.data.data).map_err(|_| {
        AppError::Attachment(format!("{} is not base64 text", file.filename))
    })?;
    let data = BASE64_STANDARD
        .decode(encoded.trim())
        .map_err(|err| AppError::Attachment(format!("{}: {err}", file.filename)))?;
    Ok(Attachment::new(file.filename, file.content_type, data))
}

pub fn decode_files(files: Vec<WireFile>) -> AppResult<Vec<Attachment>> {
    files.into_iter().map(decode_wire).collect()
}

/// Multipart body for ticket creation: `userId`, the ticket as JSON, and one
/// `files` part per attachment.
pub fn upload_form(user_id: &str, ticket: &Ticket) -> AppResult<Form> {
    let ticket_json = serde_json::to_string(ticket)
        .map_err(|err| AppError::Attachment(format!("failed to encode ticket: {err}")))?;

    let mut form = Form::new()
        .text("userId", user_id.to_string())
        .text("ticket", ticket_json);

    for attachment in &ticket.attachments {
        let part = Part::bytes(attachment.data.clone())
            .file_name(attachment.filename.clone())
            .mime_str(&attachment.content_type)
            .unwrap_or_else(|_| {
                Part::bytes(attachment.data.clone()).file_name(attachment.filename.clone())
            });
        form = form.part("files", part);
    }

    debug!(
        attachment_count = ticket.attachments.len(),
        "built ticket upload form"
    );
    Ok(form)
}

pub async fn read_local_file(path: &Path) -> AppResult<Attachment> {
    let data = tokio::fs::read(path).await?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| AppError::Attachment(format!("{} has no file name", path.display())))?
        .to_string();
    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    Ok(Attachment::new(filename, content_type, data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_keeps_name_type_and_bytes() {
        let original = Attachment::new(
            "dump.bin",
            "application/octet-stream",
            vec![0, 159, 255, 10],
        );

        let decoded = decode_wire(encode_wire(&original)).unwrap();

        assert_eq!(decoded.filename, original.filename);
        assert_eq!(decoded.content_type, original.content_type);
        assert_eq!(decoded.data, original.data);
    }

    #[test]
    fn decodes_backend_payload() {
        let json = r#"{
            "files": [{
                "filename": "hello.txt",
                "contentType": "text/plain",
                "_id": "66a0",
                "data": {"type": "Buffer", "data": [97, 71, 107, 61]}
            }]
        }"#;
        #[derive(Deserialize)]
        struct Envelope {
            files: Vec<WireFile>,
        }
        let envelope: Envelope = serde_json::from_str(json).unwrap();

        let files = decode_files(envelope.files).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].filename, "hello.txt");
        assert_eq!(files[0].data, b"hi");
    }

    #[test]
    fn rejects_payload_that_is_not_base64() {
        let file = WireFile {
            filename: "bad.txt".to_string(),
            content_type: "text/plain".to_string(),
            record_id: String::new(),
            data: WireData {
                kind: BUFFER_TYPE.to_string(),
                data: b"%%%".to_vec(),
            },
        };
        assert!(matches!(decode_wire(file), Err(AppError::Attachment(_))));
    }

    #[tokio::test]
    async fn reads_local_file_with_guessed_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"remember").unwrap();

        let attachment = read_local_file(&path).await.unwrap();

        assert_eq!(attachment.filename, "notes.txt");
        assert_eq!(attachment.content_type, "text/plain");
        assert_eq!(attachment.data, b"remember");
    }
}
