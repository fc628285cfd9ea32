use std::process::exit;

use oidc_store::auth::OidcStore;
use oidc_store::config::{load_config, schema_json, ConfigV1};
use oidc_store::providers::InMemoryProvider;
use oidc_store::utils::logger::init_logging;
use serde_json::json;
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "./config.yaml";

/// Validates a configuration file and prints what the store derives from it.
///
/// Usage: `oidc-store [CONFIG] [--schema]`
fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|arg| arg == "--schema") {
        println!("{}", schema_json());
        return;
    }
    let path = args
        .iter()
        .find(|arg| !arg.starts_with("--"))
        .map_or(DEFAULT_CONFIG_PATH, String::as_str);

    let config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration from '{}': {}", path, e);
            exit(1);
        }
    };
    if let Err(e) = init_logging(&config.logging) {
        eprintln!("{}", e);
        exit(1);
    }

    if let Err(e) = report(config) {
        error!("{}", e);
        exit(1);
    }
}

fn report(config: ConfigV1) -> Result<(), oidc_store::error::ConfigurationError> {
    let public_route_paths = config.store.public_route_paths.clone();
    let store = OidcStore::builder(config.oidc)
        .store_settings(config.store)
        .build(InMemoryProvider::new)?;
    info!("Configuration is valid");

    let summary = json!({
        "effective_config": store.effective_config().as_map(),
        "callback_routes": store.callback_paths(),
        "public_route_paths": public_route_paths,
        "is_authenticated_by": store.store_settings().is_authenticated_by,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).unwrap_or_default()
    );
    Ok(())
}
