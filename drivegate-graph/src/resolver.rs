use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::cache::CacheStore;
use crate::error::GraphError;
use crate::gateway::Gateway;
use crate::models::{Drive, ListResponse, SiteDetails};

const ID_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);
const DRIVE_SELECT: &str = "id,name,description,webUrl";

/// Resolves human-readable site and drive names to opaque identifiers,
/// memoizing each level for a fixed TTL.
///
/// There is no invalidation on remote rename or deletion; a stale entry
/// (including a memoized not-found) self-heals only at expiry. Concurrent
/// cold lookups of the same key may each hit the remote once; the redundant
/// call is tolerated instead of single-flighting.
pub struct Resolver {
    gateway: Arc<Gateway>,
    cache: Arc<dyn CacheStore>,
    site_host: String,
    ttl: Duration,
}

impl Resolver {
    pub fn new(gateway: Arc<Gateway>, cache: Arc<dyn CacheStore>, site_host: &str) -> Self {
        Self {
            gateway,
            cache,
            site_host: site_host.to_string(),
            ttl: ID_CACHE_TTL,
        }
    }

    /// Shrinks the memoization window. Tests use this to exercise expiry.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Empty, whitespace-only, or the literal "root" address the tenant's
    /// root site; anything else addresses a named sub-site under it.
    fn site_endpoint(&self, site_name: &str) -> String {
        if site_name.trim().is_empty() || site_name.eq_ignore_ascii_case("root") {
            format!("sites/{}", self.site_host)
        } else {
            format!("sites/{}:/sites/{}", self.site_host, site_name)
        }
    }

    pub async fn resolve_site(&self, site_name: &str) -> Result<SiteDetails, GraphError> {
        let endpoint = self.site_endpoint(site_name);
        let key = format!("site::{}", urlencoding::encode(&endpoint));

        if let Some(raw) = self.cache.get(&key).await.map_err(GraphError::Cache)? {
            return Ok(serde_json::from_slice(&raw)?);
        }

        let site: SiteDetails = self.gateway.get(&endpoint).await?;
        self.cache
            .set(&key, &serde_json::to_vec(&site)?, self.ttl)
            .await
            .map_err(GraphError::Cache)?;
        debug!(site = site_name, id = %site.id, "Site resolved");
        Ok(site)
    }

    /// Resolves a drive by exact name match among the site's drives.
    /// Not-found is memoized too: a drive created after a failed lookup
    /// stays unresolvable until the entry expires.
    pub async fn resolve_drive(
        &self,
        site_name: &str,
        drive_name: &str,
    ) -> Result<Option<Drive>, GraphError> {
        let key = format!(
            "drive::{}::{}",
            urlencoding::encode(site_name),
            urlencoding::encode(drive_name)
        );

        if let Some(raw) = self.cache.get(&key).await.map_err(GraphError::Cache)? {
            return Ok(serde_json::from_slice(&raw)?);
        }

        let drives = self.list_drives(site_name).await?;
        let drive = drives.into_iter().find(|d| d.name == drive_name);
        self.cache
            .set(&key, &serde_json::to_vec(&drive)?, self.ttl)
            .await
            .map_err(GraphError::Cache)?;
        Ok(drive)
    }

    /// Lists all drives of a site with the fixed identifier projection.
    pub async fn list_drives(&self, site_name: &str) -> Result<Vec<Drive>, GraphError> {
        let site = self.resolve_site(site_name).await?;
        let resp: ListResponse<Drive> = self
            .gateway
            .get(&format!("sites/{}/drives?$select={}", site.id, DRIVE_SELECT))
            .await?;
        Ok(resp.value)
    }
}
