//! Session lifecycle: login, signup, logout, and restore-on-load.
//!
//! The token is persisted through a [`TokenStore`]; the profile is always
//! fetched from `/api/current_user`. A profile fetch that fails while
//! resolving clears the token and returns to [`SessionState::Anonymous`].
//!
//! Each login/restore attempt takes a generation number. If a newer
//! operation (including `logout`) started while it was awaiting, its result
//! is discarded instead of overwriting the newer state.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::{debug, info, warn};

use crate::config::endpoints;
use crate::core::error::{ApiError, AuthError};
use crate::core::http::{ApiClient, RequestOptions};
use crate::core::storage::TokenStore;
use crate::core::transport::Method;
use crate::models::{LoginRequest, Profile, SessionState, SignupRequest, TokenResponse};

type Listener = Rc<dyn Fn(&SessionState)>;

pub struct SessionStore {
    client: Rc<ApiClient>,
    tokens: Rc<dyn TokenStore>,
    state: RefCell<SessionState>,
    generation: Cell<u64>,
    listeners: RefCell<Vec<Listener>>,
}

impl SessionStore {
    /// A stored token puts the session in `Resolving` until
    /// [`restore`](Self::restore) runs.
    pub fn new(client: Rc<ApiClient>, tokens: Rc<dyn TokenStore>) -> Self {
        let state = match tokens.get() {
            Some(token) => SessionState::Resolving { token },
            None => SessionState::Anonymous,
        };
        Self {
            client,
            tokens,
            state: RefCell::new(state),
            generation: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token().map(str::to_string)
    }

    pub fn user(&self) -> Option<Profile> {
        self.state.borrow().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Call `listener` after every state change.
    pub fn subscribe(&self, listener: impl Fn(&SessionState) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    fn set_state(&self, next: SessionState) {
        *self.state.borrow_mut() = next.clone();
        // Clone the list so listeners may subscribe or read state
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&next);
        }
    }

    fn next_generation(&self) -> u64 {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.get() == generation
    }

    async fn fetch_profile(&self, token: &str) -> Result<Profile, ApiError> {
        self.client
            .request(endpoints::CURRENT_USER, RequestOptions::get().with_bearer(token))
            .await?
            .decode()
    }

    /// Resolve a stored token into a profile.
    ///
    /// Called once on mount. Without a stored token this settles on
    /// `Anonymous` without touching the network.
    pub async fn restore(&self) -> SessionState {
        let Some(token) = self.tokens.get() else {
            if self.state.borrow().token().is_some() {
                self.set_state(SessionState::Anonymous);
            }
            return self.state();
        };

        let generation = self.next_generation();
        self.set_state(SessionState::Resolving {
            token: token.clone(),
        });

        let result = self.fetch_profile(&token).await;
        if !self.is_current(generation) {
            debug!("[session] discarding superseded profile result");
            return self.state();
        }

        match result {
            Ok(user) => {
                info!("[session] restored session for {}", user.email);
                self.set_state(SessionState::Authenticated { token, user });
            }
            Err(e) => {
                warn!("[session] stored token rejected: {}", e);
                self.forget_token();
                self.set_state(SessionState::Anonymous);
            }
        }
        self.state()
    }

    /// Exchange credentials for a token, persist it, and load the profile.
    ///
    /// Request failures map to [`AuthError::InvalidCredentials`]. If
    /// `logout` or another login runs while this one is awaiting, nothing is
    /// persisted and [`AuthError::Superseded`] is returned.
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile, AuthError> {
        let generation = self.next_generation();
        let body = LoginRequest { email, password };

        let response: TokenResponse = self
            .client
            .send_json(endpoints::LOGIN, Method::Post, &body)
            .await
            .map_err(|e| {
                warn!("[session] login failed: {}", e);
                AuthError::InvalidCredentials
            })?;

        if !self.is_current(generation) {
            debug!("[session] discarding superseded login token");
            return Err(AuthError::Superseded);
        }

        let token = response
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::InvalidCredentials)?;

        if let Err(e) = self.tokens.set(&token) {
            warn!("[session] could not persist token: {}", e);
        }
        self.set_state(SessionState::Resolving {
            token: token.clone(),
        });

        let result = self.fetch_profile(&token).await;
        if !self.is_current(generation) {
            // Whoever took over already owns the stored token
            debug!("[session] discarding superseded login profile");
            return Err(AuthError::Superseded);
        }

        match result {
            Ok(user) => {
                info!("[session] logged in as {}", user.email);
                self.set_state(SessionState::Authenticated {
                    token,
                    user: user.clone(),
                });
                Ok(user)
            }
            Err(e) => {
                warn!("[session] profile load after login failed: {}", e);
                self.forget_token();
                self.set_state(SessionState::Anonymous);
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Create an account, then log in with the same credentials.
    ///
    /// Signup rejections keep the server's message (e.g. duplicate email).
    pub async fn signup(&self, request: &SignupRequest) -> Result<Profile, AuthError> {
        self.client
            .send_json::<_, serde_json::Value>(endpoints::SIGNUP, Method::Post, request)
            .await
            .map_err(|e| {
                warn!("[session] signup failed: {}", e);
                AuthError::Signup(e.to_string())
            })?;

        info!("[session] account created for {}", request.email);
        self.login(&request.email, &request.password).await
    }

    /// Forget the token and return to `Anonymous`. Does not hit the network.
    pub fn logout(&self) {
        self.next_generation();
        self.forget_token();
        self.set_state(SessionState::Anonymous);
        info!("[session] logged out");
    }

    fn forget_token(&self) {
        if let Err(e) = self.tokens.remove() {
            warn!("[session] could not clear token: {}", e);
        }
    }
}
