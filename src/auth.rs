//! Login, registration and the admin gate.

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::model::{Role, User};
use crate::remote::{FetchError, RemoteClient};

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

/// A signed-in user and the bearer token the API issued for them.
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    token: SecretString,
}

impl Session {
    pub fn new(user: User, token: SecretString) -> Self {
        Self { user, token }
    }

    pub fn token(&self) -> &SecretString {
        &self.token
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

/// Outcome of the admin gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    /// Nobody is signed in.
    RedirectToLogin,
    /// Signed in, but not as an admin.
    RedirectToHome,
}

/// Decide whether `user` may enter the admin console.
pub fn admin_access(user: Option<&User>) -> Access {
    match user {
        None => Access::RedirectToLogin,
        Some(user) if user.is_admin() => Access::Granted,
        Some(_) => Access::RedirectToHome,
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    username: &'a str,
    password: &'a str,
    role: Role,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    user: User,
}

#[derive(Deserialize)]
struct RegisterResponse {
    user: User,
}

/// `/auth/*` endpoints.
#[derive(Debug, Clone)]
pub struct AuthService {
    client: RemoteClient,
}

impl AuthService {
    pub fn new(client: RemoteClient) -> Self {
        Self { client }
    }

    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<Session, FetchError> {
        let username = username.trim();
        if username.is_empty() || password.expose_secret().is_empty() {
            return Err(FetchError::InvalidInput(
                "Username and password are required".to_string(),
            ));
        }

        let body = LoginBody {
            username,
            password: password.expose_secret(),
        };
        let response: LoginResponse = self.post(&["auth", "login"], &body).await?;
        tracing::info!(user = %response.user.username, role = ?response.user.role, "Signed in");
        Ok(Session::new(response.user, SecretString::from(response.token)))
    }

    /// Create an account. The API does not issue a token here; call
    /// [`login`](AuthService::login) afterwards.
    pub async fn register(
        &self,
        username: &str,
        password: &SecretString,
        role: Role,
    ) -> Result<User, FetchError> {
        let username = username.trim();
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(FetchError::InvalidInput(format!(
                "Username must be at least {MIN_USERNAME_LEN} characters"
            )));
        }
        if password.expose_secret().chars().count() < MIN_PASSWORD_LEN {
            return Err(FetchError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let body = RegisterBody {
            username,
            password: password.expose_secret(),
            role,
        };
        let response: RegisterResponse = self.post(&["auth", "register"], &body).await?;
        tracing::info!(user = %response.user.username, "Registered account");
        Ok(response.user)
    }

    /// Current user for `token`.
    pub async fn profile(&self, token: &SecretString) -> Result<User, FetchError> {
        let url = self.client.url_for(&["auth", "profile"])?;
        let origin = url.to_string();
        let bytes = self
            .client
            .with_token(token.clone())
            .send(Method::GET, url, None::<&()>)
            .await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::parse(origin, e))
    }

    /// Rebuild a session from a stored token.
    ///
    /// Any failure means the token is no longer usable: it is dropped and
    /// the caller continues signed out.
    pub async fn restore(&self, token: SecretString) -> Option<Session> {
        match self.profile(&token).await {
            Ok(user) => Some(Session::new(user, token)),
            Err(e) => {
                tracing::warn!(error = %e, "Stored token rejected, signing out");
                None
            }
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, FetchError> {
        let url = self.client.url_for(segments)?;
        let origin = url.to_string();
        let bytes = self.client.send(Method::POST, url, Some(body)).await?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::parse(origin, e))
    }
}
