// ── Remote client facade ──
//
// The single seam between the reconciler and the server. Implementations
// own transport, timeouts and any retry policy; the reconciler sees
// exactly one result per call.

use std::future::Future;

use pbsync_api::PocketBaseClient;
use pbsync_api::types::CollectionWrite;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::error::CoreError;
use crate::model::{CollectionAttributes, RemoteResource};

/// CRUD access to collections, keyed by server identifier.
///
/// `read` must report an absent collection as an error for which
/// [`CoreError::is_not_found`] holds. `delete` must succeed when the
/// collection is already gone.
pub trait CollectionFacade: Send + Sync {
    fn create(
        &self,
        attributes: &CollectionAttributes,
    ) -> impl Future<Output = Result<RemoteResource, CoreError>> + Send;

    fn read(&self, id: &str) -> impl Future<Output = Result<RemoteResource, CoreError>> + Send;

    fn update(
        &self,
        id: &str,
        changes: &CollectionAttributes,
    ) -> impl Future<Output = Result<RemoteResource, CoreError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), CoreError>> + Send;
}

/// Tag a not-found error with the identifier that was asked for; the
/// transport only knows the server's message.
fn not_found_as(id: &str, err: pbsync_api::Error) -> CoreError {
    match CoreError::from(err) {
        CoreError::NotFound { .. } => CoreError::NotFound {
            identifier: id.to_owned(),
        },
        other => other,
    }
}

impl CollectionFacade for PocketBaseClient {
    async fn create(&self, attributes: &CollectionAttributes) -> Result<RemoteResource, CoreError> {
        let record = self
            .create_collection(&CollectionWrite::from(attributes))
            .await?;
        Ok(record.into())
    }

    async fn read(&self, id: &str) -> Result<RemoteResource, CoreError> {
        let record = self
            .get_collection(id)
            .await
            .map_err(|e| not_found_as(id, e))?;
        Ok(record.into())
    }

    async fn update(
        &self,
        id: &str,
        changes: &CollectionAttributes,
    ) -> Result<RemoteResource, CoreError> {
        let record = self
            .update_collection(id, &CollectionWrite::from(changes))
            .await
            .map_err(|e| not_found_as(id, e))?;
        Ok(record.into())
    }

    async fn delete(&self, id: &str) -> Result<(), CoreError> {
        match self.delete_collection(id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                debug!(id, "collection already absent");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Build a client for `config` and open a session.
pub async fn connect(config: &ProviderConfig) -> Result<PocketBaseClient, CoreError> {
    let client =
        PocketBaseClient::connect(config.url.as_str(), &config.credentials(), &config.transport())
            .await?;
    debug!(url = %client.base_url(), "connected to server");
    Ok(client)
}
