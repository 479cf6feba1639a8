use tracing::warn;

use crate::domain::attachment::{Attachment, SUGGESTED_ATTACHMENT_LIMIT};
use crate::domain::ticket::{Ticket, TicketEdit};
use crate::domain::user::UserRef;

/// Which flow a form was opened for; decides how a submission is synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    New,
    Existing,
    Assigned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionRejected {
    SelfAssignment,
    AlreadySelected,
}

/// What closing a form hands back to the owning page.
#[derive(Debug, Clone)]
pub enum FormOutcome {
    Saved {
        kind: FormKind,
        actor_id: String,
        draft: Ticket,
        snapshot: Vec<UserRef>,
    },
    Deleted {
        kind: FormKind,
        actor_id: String,
        ticket: Ticket,
        snapshot: Vec<UserRef>,
    },
    Cancelled {
        restored: Option<Ticket>,
    },
}

/// An open ticket modal. Closing it consumes the form.
#[derive(Debug, Clone)]
pub struct TicketForm {
    kind: FormKind,
    actor_id: String,
    draft: Ticket,
    original: Option<Ticket>,
    snapshot: Vec<UserRef>,
}

impl TicketForm {
    pub fn new_ticket(actor_id: impl Into<String>) -> Self {
        Self {
            kind: FormKind::New,
            actor_id: actor_id.into(),
            draft: Ticket::default(),
            original: None,
            snapshot: Vec::new(),
        }
    }

    /// Opens `ticket` for editing. `actor_id` is the ticket owner, who can
    /// never be assigned to their own ticket.
    pub fn open(kind: FormKind, actor_id: impl Into<String>, ticket: Ticket) -> Self {
        Self {
            kind,
            actor_id: actor_id.into(),
            snapshot: ticket.users.clone(),
            draft: ticket.clone(),
            original: Some(ticket),
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn draft(&self) -> &Ticket {
        &self.draft
    }

    pub fn apply(&mut self, edit: TicketEdit) {
        self.draft = self.draft.edited(edit);
    }

    pub fn attach(&mut self, attachment: Attachment) {
        let mut attachments = self.draft.attachments.clone();
        attachments.push(attachment);
        if attachments.len() > SUGGESTED_ATTACHMENT_LIMIT {
            warn!(
                count = attachments.len(),
                limit = SUGGESTED_ATTACHMENT_LIMIT,
                "more attachments than recommended for one ticket"
            );
        }
        self.apply(TicketEdit::Attachments(attachments));
    }

    pub fn select_user(&mut self, user: UserRef) -> Result<(), SelectionRejected> {
        if self.draft.has_assignee(&user.user_id) {
            warn!(user_id = %user.user_id, "user already selected");
            return Err(SelectionRejected::AlreadySelected);
        }
        if user.user_id == self.actor_id {
            warn!(user_id = %user.user_id, "user cannot assign a ticket to themselves");
            return Err(SelectionRejected::SelfAssignment);
        }
        let mut next = self.draft.clone();
        next.users.push(user);
        self.draft = next;
        Ok(())
    }

    /// Returns whether the user was selected.
    pub fn remove_user(&mut self, user_id: &str) -> bool {
        if !self.draft.has_assignee(user_id) {
            return false;
        }
        let mut next = self.draft.clone();
        next.users.retain(|user| user.user_id != user_id);
        self.draft = next;
        true
    }

    pub fn save(self) -> FormOutcome {
        FormOutcome::Saved {
            kind: self.kind,
            actor_id: self.actor_id,
            draft: self.draft,
            snapshot: self.snapshot,
        }
    }

    pub fn cancel(self) -> FormOutcome {
        FormOutcome::Cancelled {
            restored: self.original,
        }
    }

    /// New tickets have nothing to delete; their form is simply cancelled.
    pub fn delete(self) -> FormOutcome {
        match self.kind {
            FormKind::New => self.cancel(),
            kind => FormOutcome::Deleted {
                kind,
                actor_id: self.actor_id,
                ticket: self.draft,
                snapshot: self.snapshot,
            },
        }
    }
}
