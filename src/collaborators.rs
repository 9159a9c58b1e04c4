//! External club administration services the engine depends on.

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use url::Url;

use crate::billing::{NewPayment, Payment, Registration, RegistrationFilters, RegistrationPatch};
use crate::config;
use crate::membership::{Club, Group};

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} responded with status {status}")]
    Status { endpoint: String, status: u16 },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid collaborator url: {0}")]
    Url(#[from] url::ParseError),
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
}

// key: collaborator-directory -> clubs and group rosters

#[async_trait]
pub trait ClubDirectory: Send + Sync {
    async fn list_clubs(&self) -> Result<Vec<Club>, CollaboratorError>;
    async fn list_groups_by_club(&self, club_id: &str) -> Result<Vec<Group>, CollaboratorError>;
    async fn get_group(&self, group_id: &str) -> Result<Group, CollaboratorError>;
}

// key: collaborator-ledger -> registrations and payments

#[async_trait]
pub trait RegistrationLedger: Send + Sync {
    async fn list_registrations_by_assignment(
        &self,
        assignment_id: &str,
        filters: &RegistrationFilters,
    ) -> Result<Vec<Registration>, CollaboratorError>;
    async fn list_unpaid_registrations_by_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<Vec<Registration>, CollaboratorError>;
    async fn list_payments(
        &self,
        athlete_id: &str,
        group_id: &str,
    ) -> Result<Vec<Payment>, CollaboratorError>;
    async fn update_registration(
        &self,
        registration_id: &str,
        patch: &RegistrationPatch,
    ) -> Result<Registration, CollaboratorError>;
    async fn create_payment(&self, record: &NewPayment) -> Result<Payment, CollaboratorError>;
}

// key: collaborator-http -> REST client for the club administration API

#[derive(Clone)]
pub struct HttpCollaborator {
    client: reqwest::Client,
    base_url: Url,
    auth_token: Option<String>,
}

impl HttpCollaborator {
    pub fn new(
        base_url: &str,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CollaboratorError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| CollaboratorError::Transport {
                endpoint: base_url.to_string(),
                source,
            })?;
        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
            auth_token,
        })
    }

    pub fn from_config() -> Result<Self, CollaboratorError> {
        Self::new(
            config::CLUB_API_BASE_URL.as_str(),
            config::CLUB_API_TOKEN.clone(),
            Duration::from_secs(*config::CLUB_API_TIMEOUT_SECS),
        )
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CollaboratorError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if let Some(token) = &self.auth_token {
            request.bearer_auth(token)
        } else {
            request
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        url: Url,
    ) -> Result<T, CollaboratorError> {
        let endpoint = url.path().to_string();
        let response = self
            .auth(request)
            .send()
            .await
            .map_err(|source| CollaboratorError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CollaboratorError::NotFound(endpoint));
        }
        if !status.is_success() {
            tracing::warn!(%endpoint, status = status.as_u16(), "collaborator rejected request");
            return Err(CollaboratorError::Status {
                endpoint,
                status: status.as_u16(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| CollaboratorError::Transport { endpoint, source })
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, CollaboratorError> {
        let request = self.client.get(url.clone());
        self.execute(request, url).await
    }

    async fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: reqwest::Method,
        url: Url,
        body: &B,
    ) -> Result<T, CollaboratorError> {
        let request = self.client.request(method, url.clone()).json(body);
        self.execute(request, url).await
    }
}

#[async_trait]
impl ClubDirectory for HttpCollaborator {
    async fn list_clubs(&self) -> Result<Vec<Club>, CollaboratorError> {
        self.get(self.endpoint(&["clubs"])?).await
    }

    async fn list_groups_by_club(&self, club_id: &str) -> Result<Vec<Group>, CollaboratorError> {
        self.get(self.endpoint(&["clubs", club_id, "groups"])?).await
    }

    async fn get_group(&self, group_id: &str) -> Result<Group, CollaboratorError> {
        self.get(self.endpoint(&["groups", group_id])?).await
    }
}

#[async_trait]
impl RegistrationLedger for HttpCollaborator {
    async fn list_registrations_by_assignment(
        &self,
        assignment_id: &str,
        filters: &RegistrationFilters,
    ) -> Result<Vec<Registration>, CollaboratorError> {
        let mut url = self.endpoint(&["assignments", assignment_id, "registrations"])?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(group) = &filters.group {
                query.append_pair("group", group);
            }
            if let Some(unpaid) = filters.unpaid {
                query.append_pair("unpaid", if unpaid { "true" } else { "false" });
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }
        self.get(url).await
    }

    async fn list_unpaid_registrations_by_assignment(
        &self,
        assignment_id: &str,
    ) -> Result<Vec<Registration>, CollaboratorError> {
        self.get(self.endpoint(&["assignments", assignment_id, "registrations", "unpaid"])?)
            .await
    }

    async fn list_payments(
        &self,
        athlete_id: &str,
        group_id: &str,
    ) -> Result<Vec<Payment>, CollaboratorError> {
        let mut url = self.endpoint(&["payments"])?;
        url.query_pairs_mut()
            .append_pair("athlete", athlete_id)
            .append_pair("group", group_id);
        self.get(url).await
    }

    async fn update_registration(
        &self,
        registration_id: &str,
        patch: &RegistrationPatch,
    ) -> Result<Registration, CollaboratorError> {
        let url = self.endpoint(&["registrations", registration_id])?;
        self.send(reqwest::Method::PATCH, url, patch).await
    }

    async fn create_payment(&self, record: &NewPayment) -> Result<Payment, CollaboratorError> {
        let url = self.endpoint(&["payments"])?;
        self.send(reqwest::Method::POST, url, record).await
    }
}
