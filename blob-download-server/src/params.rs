use std::path::PathBuf;
use blob_access::signing::key_age::DEFAULT_THRESHOLD_DAYS;
use blob_access::signing::RotationPhase;
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};

/// Seven days, the longest expiry CloudFront accepts for a signed URL.
pub const MAX_SIGNED_URL_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Local,
    S3,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Authorizes blob downloads and issues signed delivery URLs")]
pub struct Args {
    #[arg(long, env = "HTTP_ADDR", default_value = "127.0.0.1:8080")]
    pub(crate) http_addr: String,
    #[arg(long, env = "DB_PATH", default_value = "blob-access.db")]
    pub(crate) db_path: PathBuf,

    /// Domain of the delivery network serving `/blobs/...`.
    #[arg(long, env = "CDN_DOMAIN")]
    pub(crate) cdn_domain: String,
    /// Key pair id of the current signing key.
    #[arg(long, env = "KEY_PAIR_ID")]
    pub(crate) key_pair_id: String,
    /// Secret reference of the current private key.
    #[arg(long, env = "PRIVATE_KEY_SECRET")]
    pub(crate) private_key_secret: String,
    #[arg(long, env = "SECRETS_DIR", default_value = "secrets")]
    pub(crate) secrets_dir: PathBuf,
    #[arg(long, env = "SIGNED_URL_TTL_SECS", default_value_t = 300, value_parser = clap::value_parser!(i64).range(1..=MAX_SIGNED_URL_TTL_SECS))]
    pub(crate) signed_url_ttl_secs: i64,

    #[arg(long, env = "ROTATION_PHASE", default_value = "normal")]
    pub(crate) rotation_phase: RotationPhase,
    #[arg(long, env = "PREVIOUS_KEY_PAIR_ID")]
    pub(crate) previous_key_pair_id: Option<String>,
    /// When the current key was created (RFC 3339). The key age monitor is off
    /// without it.
    #[arg(long, env = "KEY_CREATED_AT")]
    pub(crate) key_created_at: Option<DateTime<Utc>>,
    #[arg(long, env = "KEY_AGE_THRESHOLD_DAYS", default_value_t = DEFAULT_THRESHOLD_DAYS)]
    pub(crate) key_age_threshold_days: i64,
    #[arg(long, env = "KEY_AGE_CHECK_INTERVAL_SECS", default_value_t = 86_400, value_parser = clap::value_parser!(u64).range(1..))]
    pub(crate) key_age_check_interval_secs: u64,

    #[arg(long, env = "STORAGE", value_enum, default_value_t = StorageKind::Local)]
    pub(crate) storage: StorageKind,
    #[arg(long, env = "STORAGE_DIR", default_value = "blobs")]
    pub(crate) storage_dir: PathBuf,
    #[arg(long, env = "BUCKET")]
    pub(crate) bucket: Option<String>,

    #[arg(long, env = "SIGNER_ARN_HEADER", default_value = "x-signer-arn")]
    pub(crate) signer_arn_header: String,
    #[arg(long, env = "CALLER_ID_HEADER", default_value = "x-caller-id")]
    pub(crate) caller_id_header: String,
    #[arg(long, env = "CLAIMS_HEADER", default_value = "x-authorizer-claims")]
    pub(crate) claims_header: String,
}
