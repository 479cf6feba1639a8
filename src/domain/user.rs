use serde::{Deserialize, Serialize};

use crate::domain::ticket::Ticket;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub user_id: String,
    pub user_name: String,
}

impl UserRef {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
        }
    }
}

/// The signed-in user's aggregate view, replaced wholesale on every fetch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub tickets: Vec<Ticket>,
    #[serde(default)]
    pub assigned_tickets: Vec<Ticket>,
}

impl UserData {
    pub fn owned_ticket(&self, internal_id: &str) -> Option<&Ticket> {
        self.tickets
            .iter()
            .find(|ticket| ticket.internal_id == internal_id)
    }
}

/// A ticket owned by someone else that has the signed-in user among its assignees.
#[derive(Debug, Clone)]
pub struct AssignedTicket {
    pub owner_id: String,
    pub ticket: Ticket,
}
