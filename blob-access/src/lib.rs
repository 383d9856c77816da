#![allow(clippy::uninlined_format_args)]

pub mod auth;
pub mod blob_id;
pub mod complete;
pub mod download;
pub mod error;
pub mod principals;
pub mod signing;
pub mod store;

pub use auth::{authorize_account, AuthenticatedCaller, IdentitySignals};
pub use blob_id::{BlobId, BlobIdError, ByteRange};
pub use complete::{CompleteRequest, CompleteResponse, CompletionValidator};
pub use download::DownloadAuthorizer;
pub use error::{AccessError, BoxError, ErrorKind, StartupError};
pub use principals::{PluginRecord, PluginSource, PrincipalRegistry};
