#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use oidc_store::auth::{OidcEventListeners, OidcStore};
use oidc_store::browser::{BroadcastWindow, FrameLoader};
use oidc_store::config::{load_config_from_str, ConfigV1, OidcSettings, StoreSettings};
use oidc_store::models::User;
use oidc_store::providers::InMemoryProvider;
use oidc_store::routes::Navigator;
use oidc_store::store::MemorySessionStore;
use oidc_store::utils::clock::ManualClock;
use serde::{Deserialize, Serialize};

pub const TEST_SECRET: &str = "test-secret";

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
logging:
  level: "debug"
  format: "console"
oidc:
  authority: https://idp.example.com
  client_id: vuex-app
  redirect_uri: http://localhost:1337/oidc-callback
  popup_redirect_uri: http://localhost:1337/oidc-popup-callback
  response_type: code
  scope: openid profile email
  post_logout_redirect_uri: http://localhost:1337/
store:
  publicRoutePaths:
    - /public/
"#;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub exp: i64,
}

/// The fixed "now" every harness clock starts at.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
}

pub fn mint_token(sub: &str, exp: i64) -> String {
    let claims = Claims {
        sub: sub.to_string(),
        name: format!("{} example", sub),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_ref()),
    )
    .expect("token should encode")
}

/// A user whose tokens expire in 2028.
pub fn valid_user(sub: &str) -> User {
    let exp = Utc.with_ymd_and_hms(2028, 1, 1, 0, 0, 0).unwrap().timestamp();
    User::from_tokens(Some(mint_token(sub, exp)), Some(mint_token(sub, exp)))
        .with_refresh_token("refresh-token")
        .with_scope("openid profile email")
}

pub fn expired_user(sub: &str) -> User {
    let exp = now().timestamp() - 60;
    User::from_tokens(Some(mint_token(sub, exp)), Some(mint_token(sub, exp)))
        .with_scope("openid")
}

pub fn test_config() -> ConfigV1 {
    load_config_from_str(TEST_CONFIG).expect("test config should load")
}

/// Test settings with silent sign-in on load enabled.
pub fn silent_settings() -> OidcSettings {
    test_config()
        .oidc
        .with("silent_redirect_uri", "http://localhost:1337/silent-renew-oidc.html")
        .with("automaticSilentSignin", true)
}

#[derive(Default)]
pub struct RecordingNavigator {
    pub paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn navigate(&self, path: &str) -> Result<(), String> {
        self.paths.lock().unwrap().push(path.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingFrameLoader {
    pub urls: Mutex<Vec<String>>,
}

impl RecordingFrameLoader {
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FrameLoader for RecordingFrameLoader {
    async fn open_url_with_iframe(&self, url: &str) -> Result<(), String> {
        self.urls.lock().unwrap().push(url.to_string());
        Ok(())
    }
}

/// A store wired to in-memory collaborators the test can inspect.
pub struct Harness {
    pub store: OidcStore,
    pub provider: Arc<InMemoryProvider>,
    pub session: Arc<MemorySessionStore>,
    pub window: BroadcastWindow,
    pub frames: Arc<RecordingFrameLoader>,
    pub clock: Arc<ManualClock>,
}

pub fn build_harness(
    settings: OidcSettings,
    store_settings: StoreSettings,
    listeners: OidcEventListeners,
) -> Harness {
    let session = Arc::new(MemorySessionStore::new());
    let window = BroadcastWindow::default();
    let frames = Arc::new(RecordingFrameLoader::default());
    let clock = Arc::new(ManualClock::new(now()));

    let mut constructed = None;
    let store = OidcStore::builder(settings)
        .store_settings(store_settings)
        .listeners(listeners)
        .session_store(session.clone())
        .window(Arc::new(window.clone()))
        .frame_loader(frames.clone())
        .clock(clock.clone())
        .build(|config| {
            let provider = Arc::new(InMemoryProvider::new(config));
            constructed = Some(provider.clone());
            provider
        })
        .expect("store should build");

    Harness {
        store,
        provider: constructed.expect("provider should be constructed"),
        session,
        window,
        frames,
        clock,
    }
}

/// The store from [`TEST_CONFIG`] with default listeners.
pub fn default_harness() -> Harness {
    let config = test_config();
    build_harness(config.oidc, config.store, OidcEventListeners::default())
}
