use std::path::Path;

use serde::Deserialize;

fn default_listen_port() -> u16 {
    8080
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Resource API root, e.g. "https://graph.microsoft.com/v1.0".
    pub graph_base_url: String,
    /// Tenant hostname site addresses hang off, e.g. "contoso.sharepoint.com".
    pub site_host: String,
}

impl ServerConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.graph_base_url.is_empty() {
            anyhow::bail!("graph_base_url must not be empty");
        }
        if self.site_host.is_empty() {
            anyhow::bail!("site_host must not be empty");
        }
        Ok(())
    }
}
