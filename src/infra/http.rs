use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, header::ACCEPT};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, error};

use crate::domain::attachment::Attachment;
use crate::domain::ticket::Ticket;
use crate::domain::user::{AssignedTicket, UserData, UserRef};
use crate::error::{AppError, AppResult};
use crate::infra::attachments::{WireFile, decode_files, upload_form};
use crate::services::TicketBackend;

pub struct HttpTicketBackend {
    http: Client,
    base_url: String,
}

impl HttpTicketBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> AppResult<T> {
        debug!(endpoint = path, "sending request");
        let response = request
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| {
                error!(endpoint = path, error = %err, "request failed");
                AppError::Request(format!("{path}: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            error!(endpoint = path, %status, body = %body, "network response was not ok");
            return Err(AppError::Request(format!(
                "{path} responded with {status}: network response was not ok"
            )));
        }

        response.json::<T>().await.map_err(|err| {
            error!(endpoint = path, error = %err, "failed to parse response");
            AppError::Request(format!("failed to parse {path} response: {err}"))
        })
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let request = self.http.post(self.endpoint(path)).json(body);
        self.send(path, request).await
    }
}

#[async_trait]
impl TicketBackend for HttpTicketBackend {
    async fn get_user_data(&self, user: &UserRef) -> AppResult<UserData> {
        let envelope: UserEnvelope = self.post_json("get_user_data", user).await?;
        Ok(envelope.user)
    }

    async fn get_assigned_tickets(&self, user_id: &str) -> AppResult<Vec<AssignedTicket>> {
        let response: AssignedTicketsResponse = self
            .post_json("get_assigned_tickets", &UserIdRequest { user_id })
            .await?;
        response.into_assigned()
    }

    async fn create_ticket(&self, user_id: &str, ticket: &Ticket) -> AppResult<UserData> {
        let path = "new_ticket";
        let form = upload_form(user_id, ticket)?;
        let request = self.http.post(self.endpoint(path)).multipart(form);
        let envelope: UserEnvelope = self.send(path, request).await?;
        Ok(envelope.user)
    }

    async fn update_ticket(
        &self,
        user_id: &str,
        internal_id: &str,
        ticket: &Ticket,
    ) -> AppResult<UserData> {
        let path = "update_ticket";
        let request = self
            .http
            .patch(self.endpoint(path))
            .json(&UpdateTicketRequest {
                user_id,
                ticket_id: internal_id,
                updated_ticket: ticket,
            });
        let envelope: UserEnvelope = self.send(path, request).await?;
        Ok(envelope.user)
    }

    async fn delete_ticket(&self, user_id: &str, internal_id: &str) -> AppResult<UserData> {
        let path = "delete_ticket";
        let request = self
            .http
            .delete(self.endpoint(path))
            .json(&TicketRequest {
                user_id,
                ticket_id: internal_id,
            });
        let envelope: UserEnvelope = self.send(path, request).await?;
        Ok(envelope.user)
    }

    async fn search_users(&self, query: &str) -> AppResult<Vec<UserRef>> {
        let response: UserSearchResponse = self
            .post_json(
                "user_search",
                &UserSearchRequest {
                    search_query: query,
                },
            )
            .await?;
        Ok(response.users)
    }

    async fn assign_user(&self, user_id: &str, internal_id: &str) -> AppResult<()> {
        let _: serde_json::Value = self
            .post_json(
                "assign_user",
                &AssignmentRequest {
                    assigned_user_id: user_id,
                    ticket_id: internal_id,
                },
            )
            .await?;
        Ok(())
    }

    async fn unassign_user(&self, user_id: &str, internal_id: &str) -> AppResult<()> {
        let _: serde_json::Value = self
            .post_json(
                "unassign_user",
                &AssignmentRequest {
                    assigned_user_id: user_id,
                    ticket_id: internal_id,
                },
            )
            .await?;
        Ok(())
    }

    async fn get_ticket_files(
        &self,
        user_id: &str,
        internal_id: &str,
    ) -> AppResult<Vec<Attachment>> {
        let response: TicketFilesResponse = self
            .post_json(
                "get_ticket_files",
                &TicketRequest {
                    user_id,
                    ticket_id: internal_id,
                },
            )
            .await?;
        decode_files(response.files)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserIdRequest<'a> {
    user_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TicketRequest<'a> {
    user_id: &'a str,
    ticket_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTicketRequest<'a> {
    user_id: &'a str,
    ticket_id: &'a str,
    updated_ticket: &'a Ticket,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserSearchRequest<'a> {
    search_query: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentRequest<'a> {
    assigned_user_id: &'a str,
    ticket_id: &'a str,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: UserData,
}

#[derive(Deserialize)]
struct UserSearchResponse {
    #[serde(default)]
    users: Vec<UserRef>,
}

#[derive(Deserialize)]
struct TicketFilesResponse {
    #[serde(default)]
    files: Vec<WireFile>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignedTicketsResponse {
    #[serde(default)]
    assigned_tickets_data: Vec<Ticket>,
    /// Owner id of each ticket, index-aligned with `assigned_tickets_data`.
    #[serde(default)]
    original_users: Vec<String>,
}

impl AssignedTicketsResponse {
    fn into_assigned(self) -> AppResult<Vec<AssignedTicket>> {
        if self.assigned_tickets_data.len() != self.original_users.len() {
            error!(
                tickets = self.assigned_tickets_data.len(),
                owners = self.original_users.len(),
                "assigned tickets and owners are not aligned"
            );
            return Err(AppError::Request(
                "get_assigned_tickets returned mismatched owner list".to_string(),
            ));
        }
        Ok(self
            .original_users
            .into_iter()
            .zip(self.assigned_tickets_data)
            .map(|(owner_id, ticket)| AssignedTicket { owner_id, ticket })
            .collect())
    }
}
