//! Value Object Module

pub mod access_token;
pub mod content_hash;
pub mod directory_path;
pub mod email;
pub mod endpoint;
pub mod engine;
pub mod label;
pub mod lifecycle;
pub mod permission;
pub mod role;
pub mod run_status;

pub use access_token::{AccessToken, TokenLifetime, TokenSecret, TokenType};
pub use content_hash::ContentHash;
pub use directory_path::DirectoryPath;
pub use email::Email;
pub use endpoint::{Endpoint, RepositoryUrl};
pub use engine::{CatalogName, EngineName, WorkflowCatalog, WorkflowEngine};
pub use label::{Description, DisplayName, RunTag, VersionLabel, WorkflowName};
pub use lifecycle::Lifecycle;
pub use permission::{Permission, Viewer};
pub use role::{Role, RoleSet};
pub use run_status::RunStatus;
