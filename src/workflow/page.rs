use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::form::{FormKind, FormOutcome, TicketForm};
use crate::domain::ticket::Ticket;
use crate::domain::user::{AssignedTicket, UserData, UserRef};
use crate::error::{AppError, AppResult};
use crate::services::TicketBackend;
use crate::workflow::sync::{AssignmentPlan, BatchOutcome, reconcile_assignments};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Owned and assigned tickets.
    Dashboard,
    /// Owned tickets only.
    MyTickets,
}

/// What a submitted form did to the backend.
#[derive(Debug)]
pub enum PageChange {
    Saved(BatchOutcome),
    Deleted(BatchOutcome),
    Unchanged,
}

/// In-memory copy of the signed-in user's tickets, owner of record between fetches.
pub struct TicketPage {
    kind: PageKind,
    backend: Arc<dyn TicketBackend>,
    session: UserRef,
    data: UserData,
    assigned: Vec<AssignedTicket>,
}

impl TicketPage {
    pub async fn load(
        kind: PageKind,
        backend: Arc<dyn TicketBackend>,
        session: UserRef,
    ) -> AppResult<Self> {
        let mut page = Self {
            kind,
            backend,
            data: UserData::default(),
            assigned: Vec::new(),
            session,
        };
        page.refresh().await?;
        Ok(page)
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }

    pub fn owned(&self) -> &[Ticket] {
        &self.data.tickets
    }

    pub fn assigned(&self) -> &[AssignedTicket] {
        &self.assigned
    }

    /// Replaces all local state with a fresh fetch.
    pub async fn refresh(&mut self) -> AppResult<()> {
        self.data = self.backend.get_user_data(&self.session).await?;
        if self.kind == PageKind::Dashboard {
            self.assigned = self
                .backend
                .get_assigned_tickets(&self.data.user_id)
                .await?;
        }
        debug!(
            owned = self.data.tickets.len(),
            assigned = self.assigned.len(),
            "page data loaded"
        );
        Ok(())
    }

    pub fn open_new(&self) -> TicketForm {
        TicketForm::new_ticket(self.data.user_id.clone())
    }

    /// Opens an owned or assigned ticket with its attachments loaded.
    pub async fn open_ticket(&self, internal_id: &str) -> AppResult<TicketForm> {
        let (kind, owner_id, ticket) = if let Some(ticket) = self.data.owned_ticket(internal_id) {
            (FormKind::Existing, self.data.user_id.clone(), ticket.clone())
        } else if let Some(entry) = self
            .assigned
            .iter()
            .find(|entry| entry.ticket.internal_id == internal_id)
        {
            (
                FormKind::Assigned,
                entry.owner_id.clone(),
                entry.ticket.clone(),
            )
        } else {
            return Err(AppError::NotFound(format!("ticket {internal_id}")));
        };

        let attachments = self
            .backend
            .get_ticket_files(&owner_id, &ticket.internal_id)
            .await?;
        let ticket = Ticket {
            attachments,
            ..ticket
        };
        Ok(TicketForm::open(kind, owner_id, ticket))
    }

    pub async fn submit(&mut self, outcome: FormOutcome) -> AppResult<PageChange> {
        match outcome {
            FormOutcome::Cancelled { restored } => {
                if let Some(ticket) = restored {
                    self.restore(ticket);
                }
                Ok(PageChange::Unchanged)
            }
            FormOutcome::Saved {
                kind: FormKind::New,
                actor_id,
                draft,
                ..
            } => self.save_new_ticket(&actor_id, draft).await.map(PageChange::Saved),
            FormOutcome::Saved {
                kind,
                actor_id,
                draft,
                snapshot,
            } => {
                let batch = self.save_existing_ticket(&actor_id, draft, &snapshot).await?;
                if kind == FormKind::Assigned {
                    self.refresh_after_write(&batch).await;
                }
                Ok(PageChange::Saved(batch))
            }
            FormOutcome::Deleted {
                kind,
                actor_id,
                ticket,
                snapshot,
            } => {
                let batch = self.delete_ticket(&actor_id, ticket, &snapshot).await?;
                if kind == FormKind::Assigned {
                    self.refresh_after_write(&batch).await;
                }
                Ok(PageChange::Deleted(batch))
            }
        }
    }

    /// Puts the ticket as it was at open time back into local state.
    fn restore(&mut self, ticket: Ticket) {
        if let Some(slot) = self
            .data
            .tickets
            .iter_mut()
            .find(|stored| stored.internal_id == ticket.internal_id)
        {
            *slot = ticket;
        } else if let Some(entry) = self
            .assigned
            .iter_mut()
            .find(|entry| entry.ticket.internal_id == ticket.internal_id)
        {
            entry.ticket = ticket;
        }
    }

    /// Every call of `batch` has settled by now. A failed re-fetch is logged
    /// and leaves local state stale.
    async fn refresh_after_write(&mut self, batch: &BatchOutcome) {
        if let Err(err) = self.refresh().await {
            warn!(
                ticket = %batch.ticket_id,
                error = %err,
                "re-fetch after write failed; local tickets may be stale"
            );
        }
    }

    async fn save_new_ticket(&mut self, owner_id: &str, draft: Ticket) -> AppResult<BatchOutcome> {
        let data = self.backend.create_ticket(owner_id, &draft).await?;
        let internal_id = data
            .tickets
            .last()
            .map(|ticket| ticket.internal_id.clone())
            .ok_or_else(|| {
                AppError::Request("new_ticket response did not include the ticket".to_string())
            })?;
        self.data = data;
        info!(ticket = %internal_id, "ticket created");

        let plan = AssignmentPlan::for_save(&[], &draft.users);
        Ok(reconcile_assignments(self.backend.as_ref(), &internal_id, plan).await)
    }

    async fn save_existing_ticket(
        &mut self,
        owner_id: &str,
        draft: Ticket,
        snapshot: &[UserRef],
    ) -> AppResult<BatchOutcome> {
        let data = self
            .backend
            .update_ticket(owner_id, &draft.internal_id, &draft)
            .await?;
        if owner_id == self.data.user_id {
            self.data = data;
        }
        info!(ticket = %draft.internal_id, "ticket updated");

        let plan = AssignmentPlan::for_save(snapshot, &draft.users);
        Ok(reconcile_assignments(self.backend.as_ref(), &draft.internal_id, plan).await)
    }

    async fn delete_ticket(
        &mut self,
        owner_id: &str,
        ticket: Ticket,
        snapshot: &[UserRef],
    ) -> AppResult<BatchOutcome> {
        let data = self
            .backend
            .delete_ticket(owner_id, &ticket.internal_id)
            .await?;
        if owner_id == self.data.user_id {
            self.data = data;
        }
        info!(ticket = %ticket.internal_id, "ticket deleted");

        let plan = AssignmentPlan::for_delete(snapshot, &ticket.users);
        Ok(reconcile_assignments(self.backend.as_ref(), &ticket.internal_id, plan).await)
    }
}
