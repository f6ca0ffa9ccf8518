//! Client library for document libraries hosted behind a Graph-style
//! resource API: identifier resolution with TTL memoization, a verb-oriented
//! gateway, and a file-operations facade addressed by site and drive name.

pub mod auth;
pub mod cache;
pub mod client;
pub mod error;
pub mod gateway;
pub mod models;
pub mod resolver;

pub use auth::{StaticToken, TokenProvider};
pub use cache::{CacheStore, MemoryCache};
pub use client::{ClientFactory, DriveClient, GraphOptions, DEFAULT_SELECT};
pub use error::GraphError;
pub use models::{CustomFile, Drive, FileDetails, SiteDetails};
