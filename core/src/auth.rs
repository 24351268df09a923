//! Login, registration and logout on top of a `SessionStore`.
//!
//! A session counts as authenticated only when both the token slot and the
//! user slot are present. `restore` reads them once at startup; `logout`
//! clears both.

use tracing::{info, warn};

use crate::client::TodoClient;
use crate::error::{ApiError, AuthError, SessionError};
use crate::http::{HttpRequest, Transport};
use crate::session::{SessionStore, TOKEN_SLOT, USER_SLOT};
use crate::types::{AuthResponse, LoginCredentials, RegisterCredentials, User};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub user: Option<User>,
    pub token: Option<String>,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.token.is_some()
    }
}

pub struct AuthContext<S, T> {
    store: S,
    client: TodoClient,
    transport: T,
    state: AuthState,
}

impl<S: SessionStore, T: Transport> AuthContext<S, T> {
    /// Starts signed out; call `restore` to pick up a persisted session.
    pub fn new(store: S, client: TodoClient, transport: T) -> Self {
        Self {
            store,
            client,
            transport,
            state: AuthState::default(),
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// A client that sends the current token, if any.
    pub fn authorized_client(&self) -> TodoClient {
        match &self.state.token {
            Some(token) => self.client.clone().with_token(token.clone()),
            None => self.client.clone(),
        }
    }

    /// Rebuild the session from the store. Unreadable or partial data leaves
    /// the context signed out.
    pub fn restore(&mut self) -> &AuthState {
        match self.read_persisted() {
            Ok(Some((token, user))) => {
                info!(user = %user.email, "restored session");
                self.state = AuthState {
                    user: Some(user),
                    token: Some(token),
                };
            }
            Ok(None) => self.state = AuthState::default(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable session");
                self.state = AuthState::default();
            }
        }
        &self.state
    }

    pub async fn login(&mut self, credentials: &LoginCredentials) -> Result<&AuthState, AuthError> {
        let request = self.client.build_login(credentials)?;
        let response = self
            .exchange(request)
            .await
            .inspect_err(|e| warn!(error = %e, "login failed"))?;
        self.establish(response)
    }

    pub async fn register(
        &mut self,
        credentials: &RegisterCredentials,
    ) -> Result<&AuthState, AuthError> {
        let request = self.client.build_register(credentials)?;
        let response = self
            .exchange(request)
            .await
            .inspect_err(|e| warn!(error = %e, "registration failed"))?;
        self.establish(response)
    }

    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.store.remove(TOKEN_SLOT)?;
        self.store.remove(USER_SLOT)?;
        self.state = AuthState::default();
        info!("logged out");
        Ok(())
    }

    async fn exchange(&self, request: HttpRequest) -> Result<AuthResponse, AuthError> {
        let response = self.transport.execute(request).await?;
        match self.client.parse_auth(response) {
            Ok(auth) => Ok(auth),
            Err(ApiError::HttpError { status: 401, .. }) => Err(AuthError::InvalidCredentials),
            Err(e) => Err(e.into()),
        }
    }

    fn establish(&mut self, auth: AuthResponse) -> Result<&AuthState, AuthError> {
        let user_json = serde_json::to_string(&auth.user).map_err(SessionError::from)?;
        self.store.set(TOKEN_SLOT, &auth.access_token)?;
        self.store.set(USER_SLOT, &user_json)?;

        info!(user = %auth.user.email, "signed in");
        self.state = AuthState {
            user: Some(auth.user),
            token: Some(auth.access_token),
        };
        Ok(&self.state)
    }

    fn read_persisted(&self) -> Result<Option<(String, User)>, SessionError> {
        let (Some(token), Some(user)) = (self.store.get(TOKEN_SLOT)?, self.store.get(USER_SLOT)?)
        else {
            return Ok(None);
        };
        Ok(Some((token, serde_json::from_str(&user)?)))
    }
}
