use serde::{Deserialize, Serialize};

/// Body of `POST /register`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Successful login payload. The backend names the field `access_token`;
/// older deployments answered with `token`, which is still accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl LoginResponse {
    /// The bearer token, preferring `access_token`. Empty strings count as
    /// absent.
    pub fn into_token(self) -> Option<String> {
        self.access_token
            .filter(|t| !t.is_empty())
            .or(self.token.filter(|t| !t.is_empty()))
    }
}
