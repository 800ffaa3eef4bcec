use serde::Deserialize;

use westeros_auth::RegisterUser;

/// OAuth2 password-grant form (`application/x-www-form-urlencoded`).
#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Space-delimited scopes requested for the token; empty means all granted.
    #[serde(default)]
    pub scope: String,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

impl From<CreateUserRequest> for RegisterUser {
    fn from(req: CreateUserRequest) -> Self {
        RegisterUser {
            email: req.email,
            password: req.password,
        }
    }
}
