use tracing::debug;

use crate::domain::user::UserRef;
use crate::error::{AppError, AppResult};
use crate::services::TicketBackend;

/// A search the caller must run against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSearch {
    pub generation: u64,
    pub query: String,
}

/// Search box state. Every query change bumps the generation, and results
/// are only accepted for the latest generation.
#[derive(Debug, Default)]
pub struct UserSearch {
    query: String,
    results: Vec<UserRef>,
    generation: u64,
}

impl UserSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[UserRef] {
        &self.results
    }

    /// Returns the request to issue, or `None` when the query is blank and
    /// the results were cleared locally.
    pub fn set_query(&mut self, query: impl Into<String>) -> Option<PendingSearch> {
        self.query = query.into();
        self.generation += 1;
        if self.query.trim().is_empty() {
            self.results.clear();
            return None;
        }
        Some(PendingSearch {
            generation: self.generation,
            query: self.query.clone(),
        })
    }

    /// Returns false when the response belongs to a superseded query.
    pub fn accept(&mut self, pending: &PendingSearch, results: Vec<UserRef>) -> bool {
        if pending.generation != self.generation {
            debug!(
                stale = pending.generation,
                current = self.generation,
                "dropping stale search results"
            );
            return false;
        }
        self.results = results;
        true
    }

    /// Clears the query and hands back the chosen user.
    pub fn select(&mut self, user_id: &str) -> Option<UserRef> {
        let chosen = self
            .results
            .iter()
            .find(|user| user.user_id == user_id)
            .cloned()?;
        self.set_query("");
        Some(chosen)
    }

    pub async fn search(
        &mut self,
        backend: &dyn TicketBackend,
        query: &str,
    ) -> AppResult<&[UserRef]> {
        if let Some(pending) = self.set_query(query) {
            let results = backend.search_users(&pending.query).await?;
            self.accept(&pending, results);
        }
        Ok(self.results())
    }
}

/// Resolves a user by exact user name, ignoring case. The search endpoint
/// matches names only, so user ids are never looked up here.
pub async fn resolve_user(backend: &dyn TicketBackend, user_name: &str) -> AppResult<UserRef> {
    let needle = user_name.trim();
    let mut search = UserSearch::new();
    let found = search
        .search(backend, needle)
        .await?
        .iter()
        .find(|user| user.user_name.eq_ignore_ascii_case(needle))
        .map(|user| user.user_id.clone());
    found
        .and_then(|user_id| search.select(&user_id))
        .ok_or_else(|| AppError::NotFound(format!("no user matching '{needle}'")))
}
