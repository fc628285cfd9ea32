mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::{build_harness, default_harness, expired_user, silent_settings, test_config, valid_user};
use oidc_store::auth::{OidcEventListeners, SignInMode};
use oidc_store::error::ProviderError;
use oidc_store::models::{Mutation, Route, RouteMeta};
use oidc_store::providers::memory_provider::Operation;
use oidc_store::providers::ProviderEvent;
use oidc_store::store::{SessionStore, ACTIVE_ROUTE_KEY};

#[tokio::test]
async fn callback_route_is_always_accessible() {
    let harness = default_harness();
    let route = Route::new("/whatever").with_meta(RouteMeta::oidc_callback());

    assert!(harness.store.oidc_check_access(&route).await);
    assert!(harness.store.oidc_check_access(&Route::new("/oidc-callback/")).await);
    assert_eq!(harness.provider.call_count(Operation::GetUser), 0);
    assert_eq!(harness.provider.call_count(Operation::SigninRedirect), 0);
}

#[tokio::test]
async fn public_route_unsets_stale_store_state_once() {
    let harness = default_harness();
    harness.store.set_oidc_auth(&valid_user("alice"));
    assert!(harness.store.oidc_is_authenticated());
    let mut mutations = harness.store.subscribe();

    assert!(harness.store.oidc_check_access(&Route::new("/public")).await);

    let mut unset = 0;
    while let Ok(mutation) = mutations.try_recv() {
        if mutation == Mutation::UnsetOidcAuth {
            unset += 1;
        }
    }
    assert_eq!(unset, 1);
    assert!(!harness.store.oidc_is_authenticated());
    assert_eq!(harness.provider.call_count(Operation::SigninRedirect), 0);
}

#[tokio::test]
async fn protected_route_without_session_redirects() {
    let harness = default_harness();
    let route = Route::new("/protected").with_full_path("/protected?tab=2");

    assert!(!harness.store.oidc_check_access(&route).await);
    assert_eq!(harness.provider.call_count(Operation::SigninRedirect), 1);
    assert_eq!(
        harness.session.get_item(ACTIVE_ROUTE_KEY).as_deref(),
        Some("/protected?tab=2")
    );
    assert_eq!(harness.store.oidc_error(), None);
}

#[tokio::test]
async fn protected_route_with_valid_session_is_granted() {
    let harness = default_harness();
    harness.provider.set_session(Some(valid_user("alice")));

    assert!(harness.store.oidc_check_access(&Route::new("/protected")).await);
    assert_eq!(harness.provider.call_count(Operation::SigninRedirect), 0);

    let state = harness.store.state();
    assert!(state.is_checked);
    assert!(state.events_are_bound);
    assert_eq!(state.scopes, Some(vec!["openid".into(), "profile".into(), "email".into()]));
    assert!(harness.store.oidc_access_token().is_some());
    assert_eq!(harness.store.oidc_refresh_token().as_deref(), Some("refresh-token"));
    assert_eq!(
        harness.store.oidc_user().and_then(|p| p.get("sub").cloned()),
        Some("alice".into())
    );
}

#[tokio::test]
async fn protected_route_with_expired_session_redirects() {
    let harness = default_harness();
    harness.provider.set_session(Some(expired_user("alice")));

    assert!(!harness.store.oidc_check_access(&Route::new("/protected")).await);
    assert_eq!(harness.provider.call_count(Operation::SigninRedirect), 1);
}

#[tokio::test]
async fn unreadable_session_counts_as_none() {
    let harness = default_harness();
    harness
        .provider
        .script(Operation::GetUser, Err(ProviderError::new("storage unavailable")));

    assert!(!harness.store.oidc_check_access(&Route::new("/protected")).await);
    assert!(harness.store.oidc_check_access(&Route::new("/public")).await);
}

#[tokio::test]
async fn user_loaded_fires_only_when_store_was_not_authenticated() {
    let loaded = Arc::new(AtomicUsize::new(0));
    let counter = loaded.clone();
    let listeners = OidcEventListeners::new().on(ProviderEvent::UserLoaded, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    let config = test_config();
    let harness = build_harness(config.oidc, config.store, listeners);
    harness.provider.set_session(Some(valid_user("alice")));

    assert!(harness.store.oidc_check_access(&Route::new("/a")).await);
    assert!(harness.store.oidc_check_access(&Route::new("/b")).await);
    assert_eq!(loaded.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn silent_sign_in_grants_protected_route() {
    let harness = build_harness(silent_settings(), test_config().store, OidcEventListeners::default());
    harness
        .provider
        .script(Operation::SigninSilent, Ok(Some(valid_user("alice"))));

    assert!(harness.store.oidc_check_access(&Route::new("/protected")).await);
    assert_eq!(harness.provider.call_count(Operation::SigninSilent), 1);
    assert_eq!(harness.provider.call_count(Operation::SigninRedirect), 0);
    assert!(harness.store.oidc_is_authenticated());
}

#[tokio::test]
async fn failed_silent_sign_in_falls_back_to_redirect() {
    let harness = build_harness(silent_settings(), test_config().store, OidcEventListeners::default());

    assert!(!harness.store.oidc_check_access(&Route::new("/protected")).await);
    assert_eq!(harness.provider.call_count(Operation::SigninSilent), 1);
    assert_eq!(harness.provider.call_count(Operation::SigninRedirect), 1);
    assert_eq!(harness.store.oidc_error(), None);
    assert!(harness.store.oidc_authentication_is_checked());
}

#[tokio::test]
async fn silent_sign_in_leaving_expired_session_redirects() {
    let harness = build_harness(silent_settings(), test_config().store, OidcEventListeners::default());
    harness
        .provider
        .script(Operation::SigninSilent, Ok(Some(expired_user("alice"))));

    assert!(!harness.store.oidc_check_access(&Route::new("/protected")).await);
    assert_eq!(harness.provider.call_count(Operation::SigninRedirect), 1);
}

#[tokio::test]
async fn public_route_signs_in_silently_in_the_background() {
    let harness = build_harness(silent_settings(), test_config().store, OidcEventListeners::default());
    harness
        .provider
        .script(Operation::SigninSilent, Ok(Some(valid_user("alice"))));

    assert!(harness.store.oidc_check_access(&Route::new("/public")).await);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(harness.provider.call_count(Operation::SigninSilent), 1);
    assert!(harness.store.oidc_is_authenticated());
}

#[tokio::test]
async fn popup_mode_signs_in_without_redirect() {
    let harness = default_harness();
    harness
        .provider
        .script(Operation::SigninPopup, Ok(Some(valid_user("alice"))));

    assert!(
        harness
            .store
            .oidc_check_access_with(&Route::new("/protected"), SignInMode::Popup)
            .await
    );
    assert_eq!(harness.provider.call_count(Operation::SigninRedirect), 0);

    harness.provider.set_session(None);
    harness.store.unset_oidc_auth();
    assert!(
        !harness
            .store
            .oidc_check_access_with(&Route::new("/protected"), SignInMode::Popup)
            .await
    );
    assert_eq!(harness.store.oidc_error().as_deref(), Some("Popup window closed"));
}
