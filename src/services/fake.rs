use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::attachment::Attachment;
use crate::domain::ticket::Ticket;
use crate::domain::user::{AssignedTicket, UserData, UserRef};
use crate::error::{AppError, AppResult};
use crate::infra::attachments::{WireFile, decode_files, encode_wire};
use crate::services::TicketBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetUserData(String),
    GetAssignedTickets(String),
    Create(String),
    Update(String),
    Delete(String),
    Search(String),
    Assign { user_id: String, ticket: String },
    Unassign { user_id: String, ticket: String },
    Files(String),
}

#[derive(Default)]
struct State {
    users: HashMap<String, UserData>,
    directory: Vec<UserRef>,
    files: HashMap<String, Vec<WireFile>>,
    assignments: HashSet<(String, String)>,
    failing_users: HashSet<String>,
    assigned_fetch_fails: bool,
    calls: Vec<Call>,
    next_ticket: usize,
}

/// In-memory backend that records every call it receives.
#[derive(Default)]
pub struct RecordingBackend {
    state: Mutex<State>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: UserRef) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            state.directory.push(user.clone());
            state.users.insert(
                user.user_id.clone(),
                UserData {
                    user_id: user.user_id,
                    user_name: user.user_name,
                    ..UserData::default()
                },
            );
        }
        self
    }

    /// Stores `ticket` under `owner_id` with its current assignees.
    pub fn with_ticket(self, owner_id: &str, ticket: Ticket) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for user in &ticket.users {
                state
                    .assignments
                    .insert((user.user_id.clone(), ticket.internal_id.clone()));
            }
            let wire = ticket.attachments.iter().map(encode_wire).collect();
            state.files.insert(ticket.internal_id.clone(), wire);
            if let Some(data) = state.users.get_mut(owner_id) {
                data.tickets.push(ticket);
            }
        }
        self
    }

    /// Assign and unassign calls for `user_id` fail from now on.
    pub fn failing_for(self, user_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_users
            .insert(user_id.to_string());
        self
    }

    /// Assigned-ticket fetches fail from now on.
    pub fn fail_assigned_fetch(&self) {
        self.state.lock().unwrap().assigned_fetch_fails = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    pub fn is_assigned(&self, user_id: &str, internal_id: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .assignments
            .contains(&(user_id.to_string(), internal_id.to_string()))
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn owner_data(state: &State, user_id: &str) -> AppResult<UserData> {
    state
        .users
        .get(user_id)
        .cloned()
        .ok_or_else(|| AppError::Request(format!("unknown user {user_id}")))
}

#[async_trait]
impl TicketBackend for RecordingBackend {
    async fn get_user_data(&self, user: &UserRef) -> AppResult<UserData> {
        self.record(Call::GetUserData(user.user_id.clone()));
        let state = self.state.lock().unwrap();
        owner_data(&state, &user.user_id)
    }

    async fn get_assigned_tickets(&self, user_id: &str) -> AppResult<Vec<AssignedTicket>> {
        self.record(Call::GetAssignedTickets(user_id.to_string()));
        let state = self.state.lock().unwrap();
        if state.assigned_fetch_fails {
            return Err(AppError::Request("network response was not ok".to_string()));
        }
        let mut assigned = Vec::new();
        for (owner_id, data) in &state.users {
            for ticket in &data.tickets {
                if state
                    .assignments
                    .contains(&(user_id.to_string(), ticket.internal_id.clone()))
                {
                    assigned.push(AssignedTicket {
                        owner_id: owner_id.clone(),
                        ticket: ticket.clone(),
                    });
                }
            }
        }
        Ok(assigned)
    }

    async fn create_ticket(&self, user_id: &str, ticket: &Ticket) -> AppResult<UserData> {
        self.record(Call::Create(user_id.to_string()));
        let mut state = self.state.lock().unwrap();
        state.next_ticket += 1;
        let mut stored = ticket.clone();
        stored.internal_id = format!("internal-{}", state.next_ticket);
        let wire = stored.attachments.iter().map(encode_wire).collect();
        state.files.insert(stored.internal_id.clone(), wire);
        stored.attachments.clear();
        let data = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::Request(format!("unknown user {user_id}")))?;
        data.tickets.push(stored);
        Ok(data.clone())
    }

    async fn update_ticket(
        &self,
        user_id: &str,
        internal_id: &str,
        ticket: &Ticket,
    ) -> AppResult<UserData> {
        self.record(Call::Update(internal_id.to_string()));
        let mut state = self.state.lock().unwrap();
        let data = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::Request(format!("unknown user {user_id}")))?;
        let slot = data
            .tickets
            .iter_mut()
            .find(|stored| stored.internal_id == internal_id)
            .ok_or_else(|| AppError::Request(format!("unknown ticket {internal_id}")))?;
        *slot = Ticket {
            attachments: Vec::new(),
            ..ticket.clone()
        };
        Ok(data.clone())
    }

    async fn delete_ticket(&self, user_id: &str, internal_id: &str) -> AppResult<UserData> {
        self.record(Call::Delete(internal_id.to_string()));
        let mut state = self.state.lock().unwrap();
        state.files.remove(internal_id);
        let data = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::Request(format!("unknown user {user_id}")))?;
        data.tickets.retain(|ticket| ticket.internal_id != internal_id);
        Ok(data.clone())
    }

    async fn search_users(&self, query: &str) -> AppResult<Vec<UserRef>> {
        self.record(Call::Search(query.to_string()));
        let state = self.state.lock().unwrap();
        Ok(state
            .directory
            .iter()
            .filter(|user| {
                user.user_name
                    .to_lowercase()
                    .contains(&query.to_lowercase())
            })
            .cloned()
            .collect())
    }

    async fn assign_user(&self, user_id: &str, internal_id: &str) -> AppResult<()> {
        self.record(Call::Assign {
            user_id: user_id.to_string(),
            ticket: internal_id.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        if state.failing_users.contains(user_id) {
            return Err(AppError::Request("network response was not ok".to_string()));
        }
        state
            .assignments
            .insert((user_id.to_string(), internal_id.to_string()));
        Ok(())
    }

    async fn unassign_user(&self, user_id: &str, internal_id: &str) -> AppResult<()> {
        self.record(Call::Unassign {
            user_id: user_id.to_string(),
            ticket: internal_id.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        if state.failing_users.contains(user_id) {
            return Err(AppError::Request("network response was not ok".to_string()));
        }
        state
            .assignments
            .remove(&(user_id.to_string(), internal_id.to_string()));
        Ok(())
    }

    async fn get_ticket_files(
        &self,
        _user_id: &str,
        internal_id: &str,
    ) -> AppResult<Vec<Attachment>> {
        self.record(Call::Files(internal_id.to_string()));
        let wire = self
            .state
            .lock()
            .unwrap()
            .files
            .get(internal_id)
            .cloned()
            .unwrap_or_default();
        decode_files(wire)
    }
}
