use async_trait::async_trait;

use crate::domain::attachment::Attachment;
use crate::domain::ticket::Ticket;
use crate::domain::user::{AssignedTicket, UserData, UserRef};
use crate::error::AppResult;

/// One method per backend endpoint. Each call issues exactly one request.
#[async_trait]
pub trait TicketBackend: Send + Sync {
    async fn get_user_data(&self, user: &UserRef) -> AppResult<UserData>;
    async fn get_assigned_tickets(&self, user_id: &str) -> AppResult<Vec<AssignedTicket>>;
    /// Uploads the ticket with its attachments; returns the owner's refreshed data.
    async fn create_ticket(&self, user_id: &str, ticket: &Ticket) -> AppResult<UserData>;
    async fn update_ticket(
        &self,
        user_id: &str,
        internal_id: &str,
        ticket: &Ticket,
    ) -> AppResult<UserData>;
    async fn delete_ticket(&self, user_id: &str, internal_id: &str) -> AppResult<UserData>;
    async fn search_users(&self, query: &str) -> AppResult<Vec<UserRef>>;
    async fn assign_user(&self, user_id: &str, internal_id: &str) -> AppResult<()>;
    async fn unassign_user(&self, user_id: &str, internal_id: &str) -> AppResult<()>;
    async fn get_ticket_files(&self, user_id: &str, internal_id: &str)
    -> AppResult<Vec<Attachment>>;
}
