mod errors;
mod identity;
mod params;
mod services;

use std::sync::Arc;
use std::time::Duration as StdDuration;
use actix_web::middleware::{from_fn, Logger};
use actix_web::{web, App, HttpServer};
use blob_access::signing::{load_signer, KeyAgeMonitor, RotationConfig, SignedUrlIssuer};
use blob_access::store::multipart::local::LocalMultipartStorage;
use blob_access::store::multipart::s3::S3MultipartStorage;
use blob_access::store::multipart::MultipartStores;
use blob_access::store::{BlobMetadata, FileSecretStore, RocksMetadataStore};
use blob_access::{CompletionValidator, DownloadAuthorizer, PrincipalRegistry, StartupError};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use crate::identity::{is_valid_header_name, IdentityHeaders};
use crate::params::{Args, StorageKind};
use crate::services::{configure, request_id_middleware, AppState};

#[actix_web::main]
async fn main() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let state = web::Data::new(build_state(&args).await?);

    tracing::info!("Serving blob downloads on {}", args.http_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(from_fn(request_id_middleware))
            .wrap(Logger::default())
            .configure(configure)
    })
        .bind(args.http_addr.clone())?
        .run()
        .await?;
    Ok(())
}

/// Everything the server needs before it takes traffic. Any failure here stops
/// the process.
async fn build_state(args: &Args) -> Result<AppState, StartupError> {
    let identity = IdentityHeaders {
        signer_arn: args.signer_arn_header.to_ascii_lowercase(),
        caller_id: args.caller_id_header.to_ascii_lowercase(),
        claims: args.claims_header.to_ascii_lowercase(),
    };
    for name in [&identity.signer_arn, &identity.caller_id, &identity.claims] {
        if !is_valid_header_name(name) {
            return Err(StartupError::Config(format!("invalid header name {:?}", name)));
        }
    }

    let rotation = RotationConfig {
        phase: args.rotation_phase,
        current_key_pair_id: args.key_pair_id.clone(),
        previous_key_pair_id: args.previous_key_pair_id.clone(),
    };
    rotation.validate()?;
    tracing::info!(
        "Key rotation phase {}, trusted key pairs {:?}",
        rotation.phase,
        rotation.trusted_key_pair_ids()
    );

    let metadata = Arc::new(RocksMetadataStore::open(&args.db_path)?);
    let registry = Arc::new(PrincipalRegistry::load(metadata.as_ref()).await?);
    if registry.is_empty() {
        tracing::warn!("No plugin principals registered; every signed caller will be rejected");
    }

    let secrets = FileSecretStore::new(args.secrets_dir.clone());
    let signer = load_signer(&secrets, &args.private_key_secret, &args.key_pair_id).await?;
    let ttl = chrono::Duration::try_seconds(args.signed_url_ttl_secs).ok_or_else(|| {
        StartupError::Config(format!("signed URL TTL {}s is out of range", args.signed_url_ttl_secs))
    })?;
    let issuer = SignedUrlIssuer::new(args.cdn_domain.clone(), ttl, Arc::new(signer));

    let storage = match args.storage {
        StorageKind::Local => {
            tracing::info!("Using local multipart storage at {}", args.storage_dir.display());
            MultipartStores::Local(LocalMultipartStorage::new(args.storage_dir.clone()))
        }
        StorageKind::S3 => {
            let bucket = args
                .bucket
                .clone()
                .filter(|b| !b.is_empty())
                .ok_or_else(|| StartupError::Config("--bucket is required with --storage s3".to_string()))?;
            tracing::info!("Using S3 multipart storage in bucket {}", bucket);
            MultipartStores::S3(S3MultipartStorage::from_env(bucket).await)
        }
    };

    match args.key_created_at {
        Some(created_at) => {
            let monitor = KeyAgeMonitor::new(args.key_pair_id.clone(), created_at, args.key_age_threshold_days);
            tokio::spawn(monitor.run(StdDuration::from_secs(args.key_age_check_interval_secs)));
        }
        None => tracing::info!("Key creation time not configured; key age monitor disabled"),
    }

    let blobs: Arc<dyn BlobMetadata> = metadata;
    Ok(AppState {
        identity,
        registry: registry.clone(),
        downloads: DownloadAuthorizer::new(registry, blobs.clone(), issuer),
        completion: CompletionValidator::new(blobs, Arc::new(storage)),
    })
}
