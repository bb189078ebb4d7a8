use std::{sync::Arc, time::Duration};

use async_stream::stream;
use futures::{future::BoxFuture, stream::BoxStream};
use reqwest::{Client, Method, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value};
use tokio::time::sleep;
use tracing::warn;

use crate::dao::{
    models::{ConfigPatch, GuestEntity},
    remote_store::RemoteStore,
    storage::{StorageError, StorageResult},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, CONFIG_DOC_ID, ChangesResponse, CouchConfigDocument, CouchGuestDocument,
        END_SUFFIX, GUEST_PREFIX, RevisionOnly, guest_doc_id,
    },
};

const RETRY_INITIAL: Duration = Duration::from_secs(1);
const RETRY_MAX: Duration = Duration::from_secs(30);
/// Extra time granted to the HTTP client on top of the server-side long-poll timeout.
const LONGPOLL_GRACE: Duration = Duration::from_secs(10);

/// [`RemoteStore`] backed by a CouchDB database.
#[derive(Clone)]
pub struct CouchRemoteStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
    longpoll_timeout: Duration,
}

impl CouchRemoteStore {
    /// Connect to CouchDB and make sure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            database: Arc::from(config.database),
            auth,
            longpoll_timeout: config.longpoll_timeout,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.database_url(), path);
        self.authorize(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: url.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    /// Current update sequence of the database, used as the starting point of the changes feed.
    async fn update_seq(&self) -> CouchResult<Value> {
        let url = self.database_url();
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: url,
                status: response.status(),
            });
        }

        let info = response
            .json::<Value>()
            .await
            .map_err(|source| CouchDaoError::DecodeResponse {
                path: url.clone(),
                source,
            })?;
        Ok(info.get("update_seq").cloned().unwrap_or(Value::from(0)))
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::GET, doc_id)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                response.json::<T>().await.map(Some).map_err(|source| {
                    CouchDaoError::DecodeResponse {
                        path: doc_id.to_string(),
                        source,
                    }
                })
            }
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    async fn current_rev(&self, doc_id: &str) -> CouchResult<Option<String>> {
        Ok(self
            .get_document::<RevisionOnly>(doc_id)
            .await?
            .map(|doc| doc.rev))
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .request(Method::PUT, doc_id)
            .json(document)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: response.status(),
            })
        }
    }

    async fn delete_document(&self, doc_id: &str) -> CouchResult<()> {
        let Some(rev) = self.current_rev(doc_id).await? else {
            return Ok(());
        };

        let response = self
            .request(Method::DELETE, doc_id)
            .query(&[("rev", rev)])
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Ok(()),
            other => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: other,
            }),
        }
    }

    /// Load every guest document. Documents that fail to decode are skipped.
    async fn list_guests(&self) -> CouchResult<Vec<GuestEntity>> {
        const ALL_DOCS: &str = "_all_docs";
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{GUEST_PREFIX}\"")),
            ("endkey", format!("\"{GUEST_PREFIX}{END_SUFFIX}\"")),
        ];

        let response = self
            .request(Method::GET, ALL_DOCS)
            .query(&query)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: ALL_DOCS.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: ALL_DOCS.to_string(),
                status: response.status(),
            });
        }

        let payload = response.json::<AllDocsResponse>().await.map_err(|source| {
            CouchDaoError::DecodeResponse {
                path: ALL_DOCS.to_string(),
                source,
            }
        })?;

        let mut guests = Vec::with_capacity(payload.rows.len());
        for row in payload.rows {
            let Some(doc) = row.doc else { continue };
            let decoded = from_value::<CouchGuestDocument>(doc)
                .map_err(|source| CouchDaoError::DeserializeValue {
                    path: row.id.clone(),
                    source,
                })
                .and_then(GuestEntity::try_from);
            match decoded {
                Ok(guest) => guests.push(guest),
                Err(err) => warn!(doc_id = %row.id, error = %err, "skipping malformed guest document"),
            }
        }

        Ok(guests)
    }

    async fn load_config(&self) -> CouchResult<Option<CouchConfigDocument>> {
        self.get_document::<CouchConfigDocument>(CONFIG_DOC_ID).await
    }

    /// Wait on the long-poll changes feed for anything newer than `since`.
    async fn changes(&self, since: &Value) -> CouchResult<ChangesResponse> {
        const CHANGES: &str = "_changes";
        let since = match since {
            Value::String(token) => token.clone(),
            other => other.to_string(),
        };
        let query = [
            ("feed", "longpoll".to_string()),
            ("since", since),
            ("timeout", self.longpoll_timeout.as_millis().to_string()),
        ];

        let response = self
            .request(Method::GET, CHANGES)
            .query(&query)
            .timeout(self.longpoll_timeout + LONGPOLL_GRACE)
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: CHANGES.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: CHANGES.to_string(),
                status: response.status(),
            });
        }

        response
            .json::<ChangesResponse>()
            .await
            .map_err(|source| CouchDaoError::DecodeResponse {
                path: CHANGES.to_string(),
                source,
            })
    }
}

impl RemoteStore for CouchRemoteStore {
    fn put_guest(&self, guest: GuestEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let doc_id = guest_doc_id(&guest.id);
            let rev = store.current_rev(&doc_id).await?;
            let doc = CouchGuestDocument::from((guest, rev));
            store.put_document(&doc_id, &doc).await.map_err(Into::into)
        })
    }

    fn delete_guest(&self, id: String) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_document(&guest_doc_id(&id))
                .await
                .map_err(Into::into)
        })
    }

    fn merge_config(&self, patch: ConfigPatch) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut doc = store
                .load_config()
                .await?
                .unwrap_or_else(CouchConfigDocument::empty);
            doc.apply(patch);
            store
                .put_document(CONFIG_DOC_ID, &doc)
                .await
                .map_err(Into::into)
        })
    }

    fn watch_guests(&self) -> BoxStream<'static, StorageResult<Vec<GuestEntity>>> {
        let store = self.clone();
        Box::pin(stream! {
            let mut delay = RETRY_INITIAL;
            let mut since: Option<Value> = None;
            let mut stale = true;
            loop {
                if since.is_none() {
                    match store.update_seq().await {
                        Ok(seq) => since = Some(seq),
                        Err(err) => {
                            yield Err(StorageError::from(err));
                            sleep(delay).await;
                            delay = (delay * 2).min(RETRY_MAX);
                            continue;
                        }
                    }
                }

                if stale {
                    match store.list_guests().await {
                        Ok(guests) => {
                            stale = false;
                            yield Ok(guests);
                        }
                        Err(err) => {
                            yield Err(StorageError::from(err));
                            sleep(delay).await;
                            delay = (delay * 2).min(RETRY_MAX);
                            continue;
                        }
                    }
                }

                let Some(cursor) = since.clone() else { continue };
                match store.changes(&cursor).await {
                    Ok(changes) => {
                        delay = RETRY_INITIAL;
                        stale = changes
                            .results
                            .iter()
                            .any(|row| row.id.starts_with(GUEST_PREFIX));
                        since = Some(changes.last_seq);
                    }
                    Err(err) => {
                        yield Err(StorageError::from(err));
                        sleep(delay).await;
                        delay = (delay * 2).min(RETRY_MAX);
                    }
                }
            }
        })
    }

    fn watch_config(&self) -> BoxStream<'static, StorageResult<ConfigPatch>> {
        let store = self.clone();
        Box::pin(stream! {
            let mut delay = RETRY_INITIAL;
            let mut since: Option<Value> = None;
            let mut stale = true;
            loop {
                if since.is_none() {
                    match store.update_seq().await {
                        Ok(seq) => since = Some(seq),
                        Err(err) => {
                            yield Err(StorageError::from(err));
                            sleep(delay).await;
                            delay = (delay * 2).min(RETRY_MAX);
                            continue;
                        }
                    }
                }

                if stale {
                    match store.load_config().await {
                        Ok(Some(doc)) => {
                            stale = false;
                            yield Ok(doc.to_patch());
                        }
                        Ok(None) => stale = false,
                        Err(err) => {
                            yield Err(StorageError::from(err));
                            sleep(delay).await;
                            delay = (delay * 2).min(RETRY_MAX);
                            continue;
                        }
                    }
                }

                let Some(cursor) = since.clone() else { continue };
                match store.changes(&cursor).await {
                    Ok(changes) => {
                        delay = RETRY_INITIAL;
                        stale = changes.results.iter().any(|row| row.id == CONFIG_DOC_ID);
                        since = Some(changes.last_seq);
                    }
                    Err(err) => {
                        yield Err(StorageError::from(err));
                        sleep(delay).await;
                        delay = (delay * 2).min(RETRY_MAX);
                    }
                }
            }
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.update_seq().await?;
            Ok(())
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
