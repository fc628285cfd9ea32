use serde::{Deserialize, Serialize};

use super::user::{Profile, User};

/// Authentication state held by one store.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<Profile>,
    pub scopes: Option<Vec<String>>,
    /// Set once any access check or callback cycle has completed.
    pub is_checked: bool,
    /// Provider lifecycle listeners have been registered for this store.
    pub events_are_bound: bool,
    pub error: Option<String>,
}

/// A named change to [`AuthState`], published to store subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SetOidcAuth,
    SetOidcUser,
    UnsetOidcAuth,
    UnsetOidcTokens,
    SetOidcAuthIsChecked,
    SetOidcEventsAreBound,
    SetOidcError(String),
}

impl AuthState {
    /// Overwrites every token field, the profile and scopes from one record.
    pub(crate) fn set_auth(&mut self, user: &User) {
        self.id_token = user.id_token.clone();
        self.access_token = user.access_token.clone();
        self.refresh_token = user.refresh_token.clone();
        self.user = Some(user.profile.clone());
        self.scopes = user.scopes();
        self.error = None;
    }

    pub(crate) fn set_user(&mut self, user: Option<&User>) {
        self.user = user.map(|u| u.profile.clone());
    }

    /// Clears tokens and profile. Scopes, error and the lifecycle flags survive.
    pub(crate) fn unset_auth(&mut self) {
        self.unset_tokens();
        self.user = None;
    }

    pub(crate) fn unset_tokens(&mut self) {
        self.id_token = None;
        self.access_token = None;
        self.refresh_token = None;
    }

    /// Returns true only for the call that flips the flag.
    pub(crate) fn bind_events_once(&mut self) -> bool {
        if self.events_are_bound {
            return false;
        }
        self.events_are_bound = true;
        true
    }
}
