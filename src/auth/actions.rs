//! Store actions: the access decision, the sign-in and sign-out families and user
//! storage. Every provider call is an await point; the state lock is never held across one.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::listeners::AUTOMATIC_SILENT_RENEW_ERROR;
use super::payload::{AuthenticatePayload, PopupPayload, SignInMode, SilentPayload};
use super::store::OidcStore;
use crate::error::{ErrorPayload, OidcError, ProviderError};
use crate::models::{Route, User};
use crate::providers::{EventListener, ListenerId, ProviderEvent, ProviderOptions, SignoutResponse};
use crate::routes::classify::RouteClassification;
use crate::store::ACTIVE_ROUTE_KEY;
use crate::utils::value::is_truthy;

impl OidcStore {
    /// Decides whether navigation to `route` may proceed, starting a redirect sign-in
    /// when it may not. Never fails.
    pub async fn oidc_check_access(&self, route: &Route) -> bool {
        self.oidc_check_access_with(route, SignInMode::Redirect).await
    }

    /// As [`OidcStore::oidc_check_access`], signing in with `mode` on protected routes.
    pub async fn oidc_check_access_with(&self, route: &Route, mode: SignInMode) -> bool {
        let classification = self.inner.classifier.classify(route);
        if classification == RouteClassification::OidcCallback {
            debug!("'{}' is a sign-in callback route, access granted", route.path);
            return true;
        }

        let is_authenticated_in_store = self.oidc_is_authenticated();
        let user = match self.inner.provider.get_user().await {
            Ok(user) => user,
            Err(e) => {
                debug!("Could not read persisted user: {}", e);
                None
            }
        };

        if let Some(user) = user.filter(|user| !user.expired_at(self.now())) {
            debug!("Persisted session for '{}' grants access to '{}'", user.subject(), route.path);
            self.oidc_was_authenticated(&user);
            if !is_authenticated_in_store {
                self.notify_user_loaded(&user);
            }
            return true;
        }

        let authenticate_silently = self.inner.config.silent_redirect_uri().is_some()
            && self.inner.config.automatic_silent_signin();

        if classification == RouteClassification::Public {
            if is_authenticated_in_store {
                self.unset_oidc_auth();
            }
            if authenticate_silently {
                let store = self.clone();
                self.spawn_background("silent sign-in", async move {
                    let _ = store
                        .authenticate_oidc_silent(SilentPayload::ignoring_errors())
                        .await;
                });
            }
            return true;
        }

        if authenticate_silently {
            if let Ok(Some(_)) = self
                .authenticate_oidc_silent(SilentPayload::ignoring_errors())
                .await
            {
                match self.inner.provider.get_user().await {
                    Ok(Some(user)) if !user.expired_at(self.now()) => return true,
                    Ok(_) => debug!("Silent sign-in left no valid session"),
                    Err(e) => debug!("Could not read persisted user: {}", e),
                }
            }
        }
        self.sign_in_for(route, is_authenticated_in_store, mode).await
    }

    async fn sign_in_for(&self, route: &Route, is_authenticated_in_store: bool, mode: SignInMode) -> bool {
        if is_authenticated_in_store {
            self.unset_oidc_auth();
        }
        match mode {
            SignInMode::Redirect => {
                info!("Access to '{}' denied, redirecting to sign in", route.full_path);
                // Recorded in `error`; the decision stays false either way.
                let _ = self
                    .authenticate_oidc(AuthenticatePayload::redirect_path(route.full_path.clone()))
                    .await;
                false
            }
            SignInMode::Popup => {
                info!("Access to '{}' requires sign in, opening popup", route.full_path);
                self.authenticate_oidc_popup(PopupPayload::default())
                    .await
                    .is_some_and(|user| !user.expired_at(self.now()))
            }
        }
    }

    /// Starts a full-page redirect sign-in, remembering where to return to.
    pub async fn authenticate_oidc(
        &self,
        payload: impl Into<AuthenticatePayload>,
    ) -> Result<(), OidcError> {
        let payload = payload.into();
        match payload.redirect_path.as_deref().filter(|path| !path.is_empty()) {
            Some(path) => self.inner.session.set_item(ACTIVE_ROUTE_KEY, path),
            None => self.inner.session.remove_item(ACTIVE_ROUTE_KEY),
        }
        let options = payload
            .options
            .or_else(|| self.inner.store_settings.default_signin_redirect_options.clone())
            .unwrap_or_default();

        self.inner
            .provider
            .signin_redirect(&options)
            .await
            .map_err(|e| self.fail("authenticateOidc", e, OidcError::Authentication))
    }

    /// Non-interactive sign-in. With `ignore_errors` a failure resolves `Ok(None)`.
    pub async fn authenticate_oidc_silent(
        &self,
        payload: SilentPayload,
    ) -> Result<Option<User>, OidcError> {
        self.sign_in_silently(payload, true).await
    }

    async fn sign_in_silently(
        &self,
        payload: SilentPayload,
        record_errors: bool,
    ) -> Result<Option<User>, OidcError> {
        let options = payload
            .options
            .or_else(|| self.inner.store_settings.default_signin_silent_options.clone())
            .unwrap_or_default();

        match self.inner.provider.signin_silent(&options).await {
            Ok(user) => {
                self.oidc_was_authenticated(&user);
                Ok(Some(user))
            }
            Err(e) => {
                self.set_oidc_auth_is_checked();
                if payload.ignore_errors {
                    debug!("Silent sign-in failed, ignored: {}", e);
                    Ok(None)
                } else if record_errors {
                    Err(self.fail("authenticateOidcSilent", e, OidcError::SilentRenew))
                } else {
                    Err(OidcError::SilentRenew(e))
                }
            }
        }
    }

    /// Popup sign-in. Failures (a closed popup included) are recorded, never returned.
    pub async fn authenticate_oidc_popup(&self, payload: PopupPayload) -> Option<User> {
        let options = payload
            .options
            .or_else(|| self.inner.store_settings.default_signin_popup_options.clone())
            .unwrap_or_default();

        match self.inner.provider.signin_popup(&options).await {
            Ok(user) => {
                self.oidc_was_authenticated(&user);
                Some(user)
            }
            Err(e) => {
                self.fail("authenticateOidcPopup", e, OidcError::Authentication);
                None
            }
        }
    }

    /// Completes a redirect sign-in; resolves the path to return to (`/` if none).
    pub async fn oidc_sign_in_callback(&self, url: Option<&str>) -> Result<String, OidcError> {
        match self.inner.provider.signin_redirect_callback(url).await {
            Ok(user) => {
                self.oidc_was_authenticated(&user);
                let path = self
                    .inner
                    .session
                    .get_item(ACTIVE_ROUTE_KEY)
                    .filter(|path| !path.is_empty())
                    .unwrap_or_else(|| "/".to_string());
                info!("Signed in '{}', returning to '{}'", user.subject(), path);
                Ok(path)
            }
            Err(e) => {
                let err = self.fail("oidcSignInCallback", e, OidcError::Callback);
                self.set_oidc_auth_is_checked();
                Err(err)
            }
        }
    }

    pub async fn oidc_sign_in_popup_callback(&self, url: Option<&str>) -> Result<(), OidcError> {
        self.inner
            .provider
            .signin_popup_callback(url)
            .await
            .map_err(|e| {
                let err = self.fail("oidcSignInPopupCallback", e, OidcError::Callback);
                self.set_oidc_auth_is_checked();
                err
            })
    }

    /// Adopts `user` as the signed-in session and binds the expiry listeners once.
    pub fn oidc_was_authenticated(&self, user: &User) {
        self.set_oidc_auth(user);
        if self.claim_event_binding() {
            self.bind_expiry_listeners();
        }
        self.set_oidc_auth_is_checked();
    }

    fn bind_expiry_listeners(&self) {
        let events = self.inner.provider.events();

        let weak = self.downgrade();
        let expired: EventListener = Arc::new(move |_| {
            let Some(inner) = weak.upgrade() else { return };
            let store = OidcStore::from_inner(inner);
            if store.inner.store_settings.remove_user_when_tokens_expire {
                info!("Access token expired, removing session");
                store.unset_oidc_auth();
            } else {
                info!("Access token expired, removing tokens");
                store.unset_oidc_tokens();
            }
        });
        events.add(ProviderEvent::AccessTokenExpired, expired);

        if self.inner.settings.automatic_silent_renew() {
            let weak = self.downgrade();
            let expiring: EventListener = Arc::new(move |_| {
                let Some(inner) = weak.upgrade() else { return };
                let store = OidcStore::from_inner(inner);
                let renewing = store.clone();
                store.spawn_background("automatic silent renew", async move {
                    if let Err(e) = renewing.sign_in_silently(SilentPayload::default(), false).await {
                        warn!("Automatic silent renew failed: {}", e);
                        renewing.dispatch_custom_error_event(
                            AUTOMATIC_SILENT_RENEW_ERROR,
                            &ErrorPayload::new("authenticateOidcSilent", e.message()),
                        );
                    }
                });
            });
            events.add(ProviderEvent::AccessTokenExpiring, expiring);
        }
        debug!("Bound access token expiry listeners");
    }

    /// Persists `user` through the provider and adopts what it then reports.
    pub async fn store_oidc_user(&self, user: &User) -> Result<(), OidcError> {
        let stored = match self.inner.provider.store_user(user).await {
            Ok(()) => self.inner.provider.get_user().await,
            Err(e) => Err(e),
        };
        let stored = stored.and_then(|user| {
            user.ok_or_else(|| ProviderError::new("No user found after storing it"))
        });
        match stored {
            Ok(user) => {
                self.oidc_was_authenticated(&user);
                Ok(())
            }
            Err(e) => {
                let err = self.fail("storeOidcUser", e, OidcError::Storage);
                self.set_oidc_auth_is_checked();
                Err(err)
            }
        }
    }

    /// Refreshes `user` in the state from the persisted session.
    pub async fn get_oidc_user(&self) -> Result<Option<User>, OidcError> {
        let user = self
            .inner
            .provider
            .get_user()
            .await
            .map_err(OidcError::Storage)?;
        self.set_oidc_user(user.as_ref());
        Ok(user)
    }

    pub fn add_oidc_event_listener(&self, event: ProviderEvent, listener: EventListener) -> ListenerId {
        self.inner.provider.events().add(event, listener)
    }

    pub fn remove_oidc_event_listener(&self, event: ProviderEvent, id: ListenerId) -> bool {
        self.inner.provider.events().remove(event, id)
    }

    /// Redirect sign-out. Resolves once the local state is unset.
    pub async fn sign_out_oidc(&self, options: Option<ProviderOptions>) -> Result<(), OidcError> {
        self.inner
            .provider
            .signout_redirect(&options.unwrap_or_default())
            .await
            .map_err(|e| self.fail("signOutOidc", e, OidcError::SignOut))?;
        self.unset_oidc_auth();
        Ok(())
    }

    pub async fn sign_out_oidc_callback(&self, url: Option<&str>) -> Result<SignoutResponse, OidcError> {
        let response = self
            .inner
            .provider
            .signout_redirect_callback(url)
            .await
            .map_err(|e| self.fail("signOutOidcCallback", e, OidcError::SignOut))?;
        self.unset_oidc_auth();
        Ok(response)
    }

    pub async fn sign_out_popup_oidc(&self, options: Option<ProviderOptions>) -> Result<(), OidcError> {
        self.inner
            .provider
            .signout_popup(&options.unwrap_or_default())
            .await
            .map_err(|e| self.fail("signOutPopupOidc", e, OidcError::SignOut))?;
        self.unset_oidc_auth();
        Ok(())
    }

    pub async fn sign_out_popup_oidc_callback(&self, url: Option<&str>) -> Result<(), OidcError> {
        self.inner
            .provider
            .signout_popup_callback(url)
            .await
            .map_err(|e| self.fail("signOutPopupOidcCallback", e, OidcError::SignOut))?;
        self.unset_oidc_auth();
        Ok(())
    }

    /// Ends the provider session in a hidden frame, then removes the local user.
    /// `id_token_hint` defaults to the persisted user's id token.
    pub async fn sign_out_oidc_silent(&self, options: Option<ProviderOptions>) -> Result<(), OidcError> {
        let context = "signOutOidcSilent";
        let user = self
            .inner
            .provider
            .get_user()
            .await
            .map_err(|e| self.fail(context, e, OidcError::SignOut))?;

        let mut args = options.unwrap_or_default();
        if !is_truthy(args.get("id_token_hint")) {
            let hint = user
                .and_then(|user| user.id_token)
                .map_or(Value::Null, Value::String);
            args.insert("id_token_hint".to_string(), hint);
        }

        let request = self
            .inner
            .provider
            .create_signout_request(&args)
            .await
            .map_err(|e| self.fail(context, e, OidcError::SignOut))?;

        let Some(frame_loader) = self.inner.frame_loader.as_ref() else {
            let message = "Cannot open a hidden frame without a window";
            self.set_oidc_error(ErrorPayload::new(context, message));
            return Err(OidcError::Navigation(message.to_string()));
        };
        if let Err(e) = frame_loader.open_url_with_iframe(&request.url).await {
            self.set_oidc_error(ErrorPayload::new(context, e.as_str()));
            return Err(OidcError::Navigation(e));
        }
        self.remove_oidc_user().await
    }

    pub async fn remove_user(&self) -> Result<(), OidcError> {
        self.remove_oidc_user().await
    }

    /// Removes the persisted user, then unsets the local state.
    pub async fn remove_oidc_user(&self) -> Result<(), OidcError> {
        self.inner
            .provider
            .remove_user()
            .await
            .map_err(|e| self.fail("removeOidcUser", e, OidcError::Storage))?;
        self.unset_oidc_auth();
        Ok(())
    }

    /// Drops round-trip state left behind by abandoned sign-in attempts.
    pub async fn clear_stale_state(&self) -> Result<(), OidcError> {
        self.inner
            .provider
            .clear_stale_state()
            .await
            .map_err(OidcError::Storage)
    }

    /// Records `e` under `context` and wraps it as the action's error.
    fn fail(
        &self,
        context: &str,
        e: ProviderError,
        wrap: impl FnOnce(ProviderError) -> OidcError,
    ) -> OidcError {
        self.set_oidc_error(ErrorPayload::new(context, e.message.as_str()));
        wrap(e)
    }
}
