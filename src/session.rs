use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearer-токен, который UI-оболочка явно передаёт в каждый вызов API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

// Токен в логи не попадает
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("token", &"***").finish()
    }
}

/// Пользователь, под которым выполнен вход.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub credentials: Credentials,
    pub user: AuthUser,
}

impl Session {
    pub fn new(credentials: Credentials, user: AuthUser) -> Self {
        Self { credentials, user }
    }

    pub fn is_admin(&self) -> bool {
        self.user.is_admin
    }
}
