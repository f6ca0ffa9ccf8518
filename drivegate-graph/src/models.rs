use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

/// Resolved site identifier. Extra fields in the upstream payload are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteDetails {
    pub id: String,
}

/// A document library within a site. Listed with a `$select` projection of
/// `id,name,description,webUrl` and matched by exact name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drive {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "webUrl", default)]
    pub web_url: Option<String>,
}

/// First page of a paginated collection response. Continuation links are
/// not followed.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ListResponse<T> {
    #[serde(default)]
    pub value: Vec<T>,
}

/// A drive item as the resource API reports it. Optional scalar fields
/// serialize as explicit nulls; `parent_reference` is omitted when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDetails {
    #[serde(rename = "@odata.etag", default)]
    pub etag: Option<String>,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(rename = "webUrl")]
    pub web_url: String,
    #[serde(rename = "createdDateTime", default)]
    pub created_date_time: Option<DateTime<Utc>>,
    #[serde(rename = "lastModifiedDateTime", default)]
    pub last_modified_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub folder: Option<FolderDetails>,
    #[serde(default)]
    pub file: Option<FileProperties>,
    #[serde(rename = "parentReference", default, skip_serializing_if = "Option::is_none")]
    pub parent_reference: Option<ParentReference>,
}

impl FileDetails {
    /// The folder facet marks a directory. A projection that selects
    /// neither facet classifies as neither directory nor file.
    pub fn is_directory(&self) -> bool {
        self.folder.is_some()
    }

    pub fn is_file(&self) -> bool {
        self.file.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderDetails {
    #[serde(rename = "childCount", default)]
    pub child_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileProperties {
    #[serde(rename = "mimeType", default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentReference {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Inbound file payload for create/update. The reader is owned by the
/// operation and drained fully into memory before the upstream request is
/// built.
pub struct CustomFile {
    pub name: String,
    pub content: Box<dyn AsyncRead + Send + Unpin>,
}

impl CustomFile {
    pub fn new(name: impl Into<String>, content: Box<dyn AsyncRead + Send + Unpin>) -> Self {
        Self {
            name: name.into(),
            content,
        }
    }

    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content: Box::new(std::io::Cursor::new(bytes)),
        }
    }
}
