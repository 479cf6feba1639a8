use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::attachment::Attachment;
use crate::domain::user::UserRef;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketStatus {
    #[serde(default)]
    pub status_title: String,
    #[serde(default)]
    pub color: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// User-facing label; backend lookups always go through `internal_id`.
    #[serde(default)]
    pub id: String,
    /// Set when `id` was generated instead of typed.
    #[serde(default)]
    pub uuid: bool,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub ticket_status: TicketStatus,
    #[serde(default)]
    pub users: Vec<UserRef>,
    /// Loaded separately through the files endpoint and uploaded as multipart parts.
    #[serde(skip)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub internal_id: String,
    #[serde(rename = "_id", default)]
    pub record_id: String,
}

/// A single field change applied to a draft.
#[derive(Debug, Clone)]
pub enum TicketEdit {
    Title(String),
    Description(String),
    Category(String),
    Label(String),
    GenerateLabel(bool),
    StatusTitle(String),
    StatusColor(String),
    Attachments(Vec<Attachment>),
}

impl Ticket {
    /// Returns a new ticket with `edit` applied; `self` is left untouched.
    pub fn edited(&self, edit: TicketEdit) -> Self {
        let mut next = self.clone();
        match edit {
            TicketEdit::Title(title) => next.title = title,
            TicketEdit::Description(description) => next.description = description,
            TicketEdit::Category(category) => next.category = category,
            TicketEdit::Label(label) => {
                if !next.uuid {
                    next.id = label;
                }
            }
            TicketEdit::GenerateLabel(true) => {
                next.uuid = true;
                next.id = Uuid::new_v4().to_string();
            }
            TicketEdit::GenerateLabel(false) => {
                next.uuid = false;
                next.id = String::new();
            }
            TicketEdit::StatusTitle(title) => {
                next.ticket_status = TicketStatus {
                    status_title: title,
                    color: self.ticket_status.color.clone(),
                }
            }
            TicketEdit::StatusColor(color) => {
                next.ticket_status = TicketStatus {
                    status_title: self.ticket_status.status_title.clone(),
                    color,
                }
            }
            TicketEdit::Attachments(attachments) => next.attachments = attachments,
        }
        next
    }

    pub fn has_assignee(&self, user_id: &str) -> bool {
        self.users.iter().any(|user| user.user_id == user_id)
    }

    pub fn assignee_names(&self) -> String {
        self.users
            .iter()
            .map(|user| user.user_name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parses `#rrggbb` or `r,g,b` into the `rgb(r, g, b)` form the backend stores.
pub fn parse_status_color(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let (r, g, b) = if let Some(hex) = trimmed.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        (
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        )
    } else {
        let channels = trimmed
            .split(',')
            .map(|part| part.trim().parse::<u8>())
            .collect::<Result<Vec<_>, _>>()
            .ok()?;
        match channels.as_slice() {
            [r, g, b] => (*r, *g, *b),
            _ => return None,
        }
    };
    Some(format!("rgb({r}, {g}, {b})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_produce_new_values() {
        let original = Ticket {
            title: "Printer".to_string(),
            ticket_status: TicketStatus {
                status_title: "Open".to_string(),
                color: "rgb(0, 0, 0)".to_string(),
            },
            ..Ticket::default()
        };

        let edited = original
            .edited(TicketEdit::StatusColor("rgb(255, 0, 0)".to_string()))
            .edited(TicketEdit::Title("Printer jam".to_string()));

        assert_eq!(original.title, "Printer");
        assert_eq!(original.ticket_status.color, "rgb(0, 0, 0)");
        assert_eq!(edited.title, "Printer jam");
        assert_eq!(edited.ticket_status.status_title, "Open");
        assert_eq!(edited.ticket_status.color, "rgb(255, 0, 0)");
    }

    #[test]
    fn toggling_generated_label() {
        let generated = Ticket::default().edited(TicketEdit::GenerateLabel(true));
        assert!(generated.uuid);
        assert!(Uuid::parse_str(&generated.id).is_ok());

        let typed_over = generated.edited(TicketEdit::Label("T-9".to_string()));
        assert_eq!(typed_over.id, generated.id);

        let cleared = generated.edited(TicketEdit::GenerateLabel(false));
        assert!(!cleared.uuid);
        assert!(cleared.id.is_empty());
    }

    #[test]
    fn parses_status_colors() {
        assert_eq!(
            parse_status_color("#ff8000").as_deref(),
            Some("rgb(255, 128, 0)")
        );
        assert_eq!(
            parse_status_color(" 1, 2 ,3 ").as_deref(),
            Some("rgb(1, 2, 3)")
        );
        assert_eq!(parse_status_color("#fff"), None);
        assert_eq!(parse_status_color("300,0,0"), None);
        assert_eq!(parse_status_color("red"), None);
    }

    #[test]
    fn deserializes_backend_ticket() {
        let json = r#"{
            "title": "Bug",
            "description": "",
            "uuid": false,
            "id": "T-1",
            "category": "infra",
            "users": [{"userId": "u2", "userName": "bo"}],
            "ticket_status": {"status_title": "Open", "color": "rgb(1, 2, 3)"},
            "attachments": ["665f"],
            "internal_id": "abc",
            "_id": "665e"
        }"#;
        let ticket: Ticket = serde_json::from_str(json).unwrap();
        assert_eq!(ticket.internal_id, "abc");
        assert_eq!(ticket.record_id, "665e");
        assert!(ticket.has_assignee("u2"));
        assert!(ticket.attachments.is_empty());
    }
}
