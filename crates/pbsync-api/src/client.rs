// Hand-crafted async HTTP client for the PocketBase admin API.
//
// Base path: /api/
// Auth: `Authorization: Bearer <token>` obtained from the admin
// password auth endpoint or supplied directly.

use std::sync::RwLock;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{
    AuthResponse, CollectionRecord, CollectionWrite, ErrorResponse, ListPage, PasswordAuthRequest,
};

/// Async client for the PocketBase collections admin API.
///
/// Holds the bearer token for the current session. Every collection
/// endpoint requires one; calling them without a session yields
/// [`Error::NoSession`] before any request is sent.
pub struct PocketBaseClient {
    http: reqwest::Client,
    base_url: Url,
    token: RwLock<Option<SecretString>>,
}

impl PocketBaseClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a server root URL and a transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            token: RwLock::new(None),
        })
    }

    /// Build a client and open a session with the given credentials.
    pub async fn connect(
        base_url: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let client = Self::new(base_url, transport)?;
        match credentials {
            Credentials::Password { identity, password } => {
                client.authenticate(identity, password).await?;
            }
            Credentials::Token(token) => client.set_token(token.clone()),
        }
        debug!(auth = credentials.kind(), "session established");
        Ok(client)
    }

    /// Strip any trailing `/api` and guarantee a trailing slash so that
    /// relative joins land under the server root.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        if url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }

        let path = url.path().trim_end_matches('/');
        let path = path.strip_suffix("/api").unwrap_or(path).to_owned();
        url.set_path(&format!("{path}/"));

        Ok(url)
    }

    /// The server root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Session ──────────────────────────────────────────────────────

    /// Install a bearer token for subsequent requests.
    pub fn set_token(&self, token: SecretString) {
        if let Ok(mut guard) = self.token.write() {
            *guard = Some(token);
        }
    }

    /// Exchange superuser credentials for a bearer token.
    pub async fn authenticate(&self, identity: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.url(&["api", "admins", "auth-with-password"]);
        debug!("POST {url}");

        let body = PasswordAuthRequest {
            identity,
            password: password.expose_secret(),
        };
        let resp = self.http.post(url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = match Self::parse_error(status, resp).await {
                Error::Api { message, .. } => message,
                other => other.to_string(),
            };
            return Err(Error::Authentication { message });
        }

        let auth: AuthResponse = Self::decode(resp).await?;
        self.set_token(SecretString::from(auth.token));
        debug!("admin authentication successful");
        Ok(())
    }

    fn bearer(&self) -> Result<HeaderValue, Error> {
        let guard = self.token.read().map_err(|_| Error::NoSession)?;
        let token = guard.as_ref().ok_or(Error::NoSession)?;
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
            .map_err(|e| Error::Authentication {
                message: format!("invalid token header value: {e}"),
            })?;
        value.set_sensitive(true);
        Ok(value)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Append percent-encoded path segments to the base URL.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // base_url was checked to be a base in the constructor.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(segments);
        debug!("GET {url} params={params:?}");

        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, self.bearer()?)
            .query(params)
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(segments);
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .header(AUTHORIZATION, self.bearer()?)
            .json(body)
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    async fn patch<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(segments);
        debug!("PATCH {url}");

        let resp = self
            .http
            .patch(url)
            .header(AUTHORIZATION, self.bearer()?)
            .json(body)
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), Error> {
        let url = self.url(segments);
        debug!("DELETE {url}");

        let resp = self
            .http
            .delete(url)
            .header(AUTHORIZATION, self.bearer()?)
            .send()
            .await?;
        Self::handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            Self::decode(resp).await
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }

    async fn parse_error(status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();

        match serde_json::from_str::<ErrorResponse>(&raw) {
            Ok(err) => Error::Api {
                status: status.as_u16(),
                message: err.message.unwrap_or_else(|| status.to_string()),
                data: err
                    .data
                    .filter(|d| d.as_object().is_none_or(|m| !m.is_empty())),
            },
            Err(_) => Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                data: None,
            },
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Collections ──────────────────────────────────────────────────

    pub async fn list_collections(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<ListPage<CollectionRecord>, Error> {
        self.get(
            &["api", "collections"],
            &[("page", page.to_string()), ("perPage", per_page.to_string())],
        )
        .await
    }

    /// Fetch one collection by id or name.
    pub async fn get_collection(&self, id_or_name: &str) -> Result<CollectionRecord, Error> {
        self.get(&["api", "collections", id_or_name], &[]).await
    }

    pub async fn create_collection(
        &self,
        body: &CollectionWrite,
    ) -> Result<CollectionRecord, Error> {
        self.post(&["api", "collections"], body).await
    }

    /// Partially update a collection; only members present in `body` change.
    pub async fn update_collection(
        &self,
        id_or_name: &str,
        body: &CollectionWrite,
    ) -> Result<CollectionRecord, Error> {
        self.patch(&["api", "collections", id_or_name], body).await
    }

    pub async fn delete_collection(&self, id_or_name: &str) -> Result<(), Error> {
        self.delete(&["api", "collections", id_or_name]).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> PocketBaseClient {
        PocketBaseClient::with_client(reqwest::Client::new(), base).unwrap()
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let c = client("http://127.0.0.1:8090");
        assert_eq!(c.base_url().as_str(), "http://127.0.0.1:8090/");
    }

    #[test]
    fn base_url_strips_api_suffix() {
        let c = client("https://pb.example.com/sub/api/");
        assert_eq!(c.base_url().as_str(), "https://pb.example.com/sub/");
    }

    #[test]
    fn url_segments_are_encoded() {
        let c = client("http://localhost:8090");
        let url = c.url(&["api", "collections", "my posts"]);
        assert_eq!(url.as_str(), "http://localhost:8090/api/collections/my%20posts");
    }

    #[test]
    fn rejects_non_base_url() {
        let err = PocketBaseClient::with_client(reqwest::Client::new(), "mailto:admin@example.com");
        assert!(matches!(err, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn no_session_before_token() {
        let c = client("http://localhost:8090");
        assert!(matches!(c.bearer(), Err(Error::NoSession)));
        c.set_token(SecretString::from("tok".to_owned()));
        assert!(c.bearer().is_ok());
    }
}
