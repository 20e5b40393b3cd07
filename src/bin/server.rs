use log::{error, info, warn};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;

use rusty_sessions::auth::hasher::{generate_salt, Argon2Hasher, CredentialHasher};
use rusty_sessions::auth::user::User;
use rusty_sessions::config::ServerConfig;
use rusty_sessions::core::SessionService;
use rusty_sessions::error::{Result, RustySessionsError};
use rusty_sessions::handlers;
use rusty_sessions::storage::MemoryStore;
use rusty_sessions::tls::validate_tls_files;

/// Account entry in the users file. Passwords are hashed at load time.
#[derive(Debug, Deserialize)]
struct SeedUser {
    id: String,
    email: String,
    username: String,
    password: String,
}

#[tokio::main]
async fn main() {
    // Initialize env
    match dotenvy::dotenv() {
        Ok(_) => info!("Environment variables loaded from .env file"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Initialize logging
    env_logger::init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Configuration: host={}, port={}, algorithms={:?}, identifier_fields={:?}, token_ttl={:?}",
        config.host, config.port, config.accepted_algorithms, config.identifier_fields, config.token_ttl
    );

    let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher::new());
    info!("Password hashing: {}", hasher.name());
    let store = Arc::new(MemoryStore::new());

    if let Some(path) = &config.users_file {
        match seed_users(&store, hasher.as_ref(), path).await {
            Ok(count) => info!("Loaded {} users from {}", count, path),
            Err(e) => {
                error!("Failed to load users from {}: {}", path, e);
                std::process::exit(1);
            }
        }
    } else {
        warn!("RUSTY_SESSIONS_USERS_FILE is not set; no account can log in");
    }

    let service = match SessionService::in_memory(&config, store, hasher) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("Failed to build session service: {}", e);
            std::process::exit(1);
        }
    };

    service.events().on_session_created(|session| {
        info!("auth_session_created: session={} user={}", session.id, session.user_id);
    });

    let routes = handlers::routes(service);

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    match (config.enable_tls, &config.tls_cert_path, &config.tls_key_path) {
        (true, Some(cert_path), Some(key_path)) => {
            match validate_tls_files(cert_path, key_path) {
                Ok(material) => info!(
                    "TLS certificate chain of {} from {}, {:?} key from {}",
                    material.certificate_count, cert_path, material.key_format, key_path
                ),
                Err(e) => {
                    error!("TLS setup failed: {}", e);
                    std::process::exit(1);
                }
            }

            info!("Starting Rusty Sessions server on https://{}", addr);
            warp::serve(routes)
                .tls()
                .cert_path(cert_path)
                .key_path(key_path)
                .run(addr)
                .await;
        }
        _ => {
            info!("Starting Rusty Sessions server on http://{}", addr);
            warp::serve(routes).run(addr).await;
        }
    }
}

async fn seed_users(store: &MemoryStore, hasher: &dyn CredentialHasher, path: &str) -> Result<usize> {
    let raw = std::fs::read_to_string(path)?;
    let seeds: Vec<SeedUser> = serde_json::from_str(&raw)?;
    let count = seeds.len();

    for seed in seeds {
        if seed.password.is_empty() {
            return Err(RustySessionsError::ValidationError(format!(
                "User {} has an empty password",
                seed.id
            )));
        }
        let salt = generate_salt();
        let digest = hasher.hash(&seed.password, &salt)?;
        store
            .insert_user(User::new(seed.id, seed.email, seed.username, digest, salt))
            .await?;
    }

    Ok(count)
}
