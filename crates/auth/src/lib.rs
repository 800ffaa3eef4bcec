//! `westeros-auth`: credentials, access tokens and scoped authorization.
//!
//! Decoupled from HTTP and storage: the persistence layer plugs in through
//! [`PrincipalDirectory`], the HTTP layer only maps [`GuardError`]/[`AuthError`]
//! to responses.

pub mod authenticate;
pub mod authorize;
pub mod claims;
pub mod password;
pub mod principal;
pub mod scope;
pub mod token;
pub mod user;

pub use authenticate::{AccessToken, AuthError, Authenticator};
pub use authorize::{check_scopes, extract_bearer, AccessGuard, GuardError};
pub use claims::{validate_expiry, TokenClaims, TokenError};
pub use password::{Argon2Verifier, CredentialError, CredentialVerifier};
pub use principal::{DirectoryError, Principal, PrincipalDirectory, SecretHash};
pub use scope::{Scope, ScopeSet};
pub use token::{parse_algorithm, TokenCodec, TokenConfigError, TokenSettings};
pub use user::{NewUser, RegisterUser, RegistrationError, User, UserView, DEFAULT_USER_SCOPES};

pub use jsonwebtoken::Algorithm;
