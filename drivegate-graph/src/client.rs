use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use reqwest::Client;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::auth::TokenProvider;
use crate::cache::CacheStore;
use crate::error::GraphError;
use crate::gateway::Gateway;
use crate::models::{CustomFile, Drive, FileDetails, ListResponse};
use crate::resolver::Resolver;

/// Projection applied when the caller does not ask for specific fields.
pub const DEFAULT_SELECT: &str =
    "id,name,size,webUrl,createdDateTime,lastModifiedDateTime,parentReference";

/// Connection settings for the remote resource API.
#[derive(Debug, Clone)]
pub struct GraphOptions {
    /// Resource API root, e.g. `https://graph.microsoft.com/v1.0`.
    pub base_url: String,
    /// Tenant hostname the `sites/...` addresses hang off, e.g.
    /// `contoso.sharepoint.com`.
    pub site_host: String,
}

/// File operations against document libraries, addressed by site and drive
/// name. Every operation resolves the drive first and fails fast with
/// [`GraphError::DriveNotFound`] before any file request is attempted.
pub struct DriveClient {
    gateway: Arc<Gateway>,
    resolver: Resolver,
}

impl DriveClient {
    pub fn new(
        http: Client,
        options: &GraphOptions,
        cache: Arc<dyn CacheStore>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        let gateway = Arc::new(Gateway::new(http, &options.base_url, tokens));
        let resolver = Resolver::new(Arc::clone(&gateway), cache, &options.site_host);
        Self { gateway, resolver }
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    async fn require_drive(&self, site: &str, drive: &str) -> Result<Drive, GraphError> {
        self.resolver
            .resolve_drive(site, drive)
            .await?
            .ok_or_else(|| GraphError::DriveNotFound {
                site: site.to_string(),
                drive: drive.to_string(),
            })
    }

    /// Lists the children of the folder at `path`. Only the first page of
    /// the upstream collection is returned.
    pub async fn list_files(
        &self,
        site: &str,
        drive: &str,
        path: &str,
        select: Option<&str>,
    ) -> Result<Vec<FileDetails>, GraphError> {
        let d = self.require_drive(site, drive).await?;
        let select = select.unwrap_or(DEFAULT_SELECT);
        let endpoint = format!("drives/{}/items/root:/{}:/children?$select={}", d.id, path, select);
        let resp: ListResponse<FileDetails> = self.gateway.get(&endpoint).await?;
        Ok(resp.value)
    }

    /// Lists the drives of a site.
    pub async fn list_drives(&self, site: &str) -> Result<Vec<Drive>, GraphError> {
        self.resolver.list_drives(site).await
    }

    /// Creates a file. The remote service renames on name collision rather
    /// than overwriting.
    pub async fn add_file(
        &self,
        site: &str,
        drive: &str,
        path: &str,
        file: CustomFile,
    ) -> Result<FileDetails, GraphError> {
        let d = self.require_drive(site, drive).await?;
        let CustomFile { name, content } = file;
        let data = drain(content).await?;
        let endpoint = format!(
            "drives/{}/items/root:/{}/{}:/content?@microsoft.graph.conflictBehavior=rename",
            d.id, path, name
        );
        self.gateway.upload(&endpoint, data).await
    }

    /// Overwrites the file's content at the same name.
    pub async fn update_file(
        &self,
        site: &str,
        drive: &str,
        path: &str,
        file: CustomFile,
    ) -> Result<FileDetails, GraphError> {
        let d = self.require_drive(site, drive).await?;
        let CustomFile { name, content } = file;
        let data = drain(content).await?;
        let endpoint = format!("drives/{}/items/root:/{}/{}:/content", d.id, path, name);
        self.gateway.upload(&endpoint, data).await
    }

    pub async fn delete_file(
        &self,
        site: &str,
        drive: &str,
        path: &str,
        file_name: &str,
    ) -> Result<(), GraphError> {
        let d = self.require_drive(site, drive).await?;
        let endpoint = format!("drives/{}/root:/{}/{}", d.id, path, file_name);
        self.gateway.delete(&endpoint).await
    }

    /// Reads a single item's metadata, not its content.
    pub async fn read_file(
        &self,
        site: &str,
        drive: &str,
        path: &str,
        file_name: &str,
        select: Option<&str>,
    ) -> Result<FileDetails, GraphError> {
        let d = self.require_drive(site, drive).await?;
        let select = select.unwrap_or(DEFAULT_SELECT);
        let endpoint = format!(
            "drives/{}/items/root:/{}/{}?$select={}",
            d.id, path, file_name, select
        );
        self.gateway.get(&endpoint).await
    }

    /// Patches the supplied field/value pairs onto the item. An empty map
    /// is rejected before any network call.
    pub async fn update_file_metadata(
        &self,
        site: &str,
        drive: &str,
        path: &str,
        file_name: &str,
        updates: &HashMap<String, String>,
    ) -> Result<FileDetails, GraphError> {
        if updates.is_empty() {
            return Err(GraphError::Validation(
                "Metadata updates cannot be empty.".to_string(),
            ));
        }
        let d = self.require_drive(site, drive).await?;
        let endpoint = format!("drives/{}/root:/{}/{}", d.id, path, file_name);
        self.gateway.patch(&endpoint, updates).await
    }
}

async fn drain(mut reader: Box<dyn AsyncRead + Send + Unpin>) -> Result<Bytes, GraphError> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(Bytes::from(buf))
}

/// Builds a facade bound to a fresh authenticating transport per call,
/// sharing the identifier cache and token provider across instances.
pub struct ClientFactory {
    options: GraphOptions,
    cache: Arc<dyn CacheStore>,
    tokens: Arc<dyn TokenProvider>,
}

impl ClientFactory {
    pub fn new(
        options: GraphOptions,
        cache: Arc<dyn CacheStore>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            options,
            cache,
            tokens,
        }
    }

    pub fn create(&self) -> DriveClient {
        DriveClient::new(
            Client::new(),
            &self.options,
            Arc::clone(&self.cache),
            Arc::clone(&self.tokens),
        )
    }
}

#[cfg(test)]
mod tests {
    use httpmock::{Method, MockServer};

    use super::*;
    use crate::auth::StaticToken;
    use crate::cache::MemoryCache;

    const SITE_HOST: &str = "contoso.example.com";

    fn client(server: &MockServer) -> DriveClient {
        let options = GraphOptions {
            base_url: server.base_url(),
            site_host: SITE_HOST.to_string(),
        };
        DriveClient::new(
            Client::new(),
            &options,
            Arc::new(MemoryCache::new()),
            Arc::new(StaticToken::new("test-token")),
        )
    }

    /// Mocks the two resolution lookups: root site and its drive listing
    /// containing a single drive named "Documents" with id "drive1".
    async fn mock_resolution(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method(Method::GET).path("/sites/contoso.example.com");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({ "id": "siteroot" }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(Method::GET).path("/sites/siteroot/drives");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({
                        "value": [{ "id": "drive1", "name": "Documents" }]
                    }));
            })
            .await;
    }

    fn item_json(name: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "item1",
            "name": name,
            "webUrl": format!("https://example.invalid/{name}"),
            "size": 7,
            "file": { "mimeType": "text/plain" },
        })
    }

    #[tokio::test]
    async fn test_list_files_returns_first_page_value() {
        let server = MockServer::start_async().await;
        mock_resolution(&server).await;
        let children = server
            .mock_async(|when, then| {
                when.method(Method::GET)
                    .path("/drives/drive1/items/root:/Reports/2024:/children")
                    .query_param("$select", DEFAULT_SELECT);
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({
                        "value": [item_json("a.txt"), item_json("b.txt")]
                    }));
            })
            .await;

        let c = client(&server);
        let files = c
            .list_files("root", "Documents", "Reports/2024", None)
            .await
            .unwrap();
        children.assert_async().await;
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "a.txt");
        assert!(files[0].is_file());
    }

    #[tokio::test]
    async fn test_unknown_drive_fails_without_file_request() {
        let server = MockServer::start_async().await;
        mock_resolution(&server).await;
        let children = server
            .mock_async(|when, then| {
                when.method(Method::GET).path_includes(":/children");
                then.status(200).json_body(serde_json::json!({ "value": [] }));
            })
            .await;

        let c = client(&server);
        let err = c
            .list_files("root", "Nope", "Reports", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::DriveNotFound { .. }));
        assert_eq!(children.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_add_file_requests_rename_on_conflict() {
        let server = MockServer::start_async().await;
        mock_resolution(&server).await;
        let upload = server
            .mock_async(|when, then| {
                when.method(Method::PUT)
                    .path("/drives/drive1/items/root:/Reports/notes.txt:/content")
                    .query_param("@microsoft.graph.conflictBehavior", "rename")
                    .body("file body");
                then.status(201)
                    .header("content-type", "application/json")
                    .json_body(item_json("notes.txt"));
            })
            .await;

        let c = client(&server);
        let file = CustomFile::from_bytes("notes.txt", b"file body".to_vec());
        let created = c.add_file("root", "Documents", "Reports", file).await.unwrap();
        upload.assert_async().await;
        assert_eq!(created.name, "notes.txt");
    }

    #[tokio::test]
    async fn test_update_file_overwrites_without_conflict_directive() {
        let server = MockServer::start_async().await;
        mock_resolution(&server).await;
        // Registered first: poisons the test if the overwrite request ever
        // carries the rename-on-conflict directive.
        let conflict = server
            .mock_async(|when, then| {
                when.method(Method::PUT)
                    .path("/drives/drive1/items/root:/Reports/notes.txt:/content")
                    .query_param("@microsoft.graph.conflictBehavior", "rename");
                then.status(500).body("conflict directive not expected");
            })
            .await;
        let upload = server
            .mock_async(|when, then| {
                when.method(Method::PUT)
                    .path("/drives/drive1/items/root:/Reports/notes.txt:/content")
                    .body("new body");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(item_json("notes.txt"));
            })
            .await;

        let c = client(&server);
        let file = CustomFile::from_bytes("notes.txt", b"new body".to_vec());
        c.update_file("root", "Documents", "Reports", file).await.unwrap();
        upload.assert_async().await;
        assert_eq!(conflict.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_delete_surfaces_upstream_error_verbatim() {
        let server = MockServer::start_async().await;
        mock_resolution(&server).await;
        let del = server
            .mock_async(|when, then| {
                when.method(Method::DELETE)
                    .path("/drives/drive1/root:/Reports/locked.txt");
                then.status(403).body(r#"{"error":"Forbidden"}"#);
            })
            .await;

        let c = client(&server);
        let err = c
            .delete_file("root", "Documents", "Reports", "locked.txt")
            .await
            .unwrap_err();
        match err {
            GraphError::Api { status, body } => {
                assert_eq!(status.as_u16(), 403);
                assert_eq!(body, r#"{"error":"Forbidden"}"#);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Surfaced synchronously, no retry.
        assert_eq!(del.hits_async().await, 1);
    }

    #[tokio::test]
    async fn test_empty_metadata_update_is_rejected_before_any_network_call() {
        let server = MockServer::start_async().await;
        let any = server
            .mock_async(|when, then| {
                when.path_includes("/");
                then.status(200).json_body(serde_json::json!({}));
            })
            .await;

        let c = client(&server);
        let err = c
            .update_file_metadata("root", "Documents", "Reports", "a.txt", &HashMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::Validation(_)));
        // Rejected before resolution, so nothing reached the wire.
        assert_eq!(any.hits_async().await, 0);
    }

    #[tokio::test]
    async fn test_metadata_patch_body_is_exactly_the_supplied_map() {
        let server = MockServer::start_async().await;
        mock_resolution(&server).await;
        let patch = server
            .mock_async(|when, then| {
                when.method(Method::PATCH)
                    .path("/drives/drive1/root:/Reports/a.txt")
                    .json_body(serde_json::json!({ "description": "Q4 draft" }));
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(item_json("a.txt"));
            })
            .await;

        let c = client(&server);
        let mut updates = HashMap::new();
        updates.insert("description".to_string(), "Q4 draft".to_string());
        c.update_file_metadata("root", "Documents", "Reports", "a.txt", &updates)
            .await
            .unwrap();
        patch.assert_async().await;
    }

    #[tokio::test]
    async fn test_read_file_fetches_metadata_with_select() {
        let server = MockServer::start_async().await;
        mock_resolution(&server).await;
        let read = server
            .mock_async(|when, then| {
                when.method(Method::GET)
                    .path("/drives/drive1/items/root:/Reports/a.txt")
                    .query_param("$select", "id,name,webUrl");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(item_json("a.txt"));
            })
            .await;

        let c = client(&server);
        let details = c
            .read_file("root", "Documents", "Reports", "a.txt", Some("id,name,webUrl"))
            .await
            .unwrap();
        read.assert_async().await;
        assert_eq!(details.name, "a.txt");
    }

    #[tokio::test]
    async fn test_factory_clients_share_the_cache() {
        let server = MockServer::start_async().await;
        let site_mock = server
            .mock_async(|when, then| {
                when.method(Method::GET).path("/sites/contoso.example.com");
                then.status(200)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({ "id": "siteroot" }));
            })
            .await;

        let factory = ClientFactory::new(
            GraphOptions {
                base_url: server.base_url(),
                site_host: SITE_HOST.to_string(),
            },
            Arc::new(MemoryCache::new()),
            Arc::new(StaticToken::new("test-token")),
        );

        factory.create().resolver().resolve_site("root").await.unwrap();
        factory.create().resolver().resolve_site("root").await.unwrap();
        // The second client resolves from the shared cache.
        assert_eq!(site_mock.hits_async().await, 1);
    }
}
