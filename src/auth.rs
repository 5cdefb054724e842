//! Shared-credential guard for the order routes.

use std::env;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::Next;
use actix_web::web;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::errors::AppError;

/// The single credential pair guarding the order routes, checked as HTTP
/// Basic. Unset credentials disable the check so local development works out
/// of the box.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    credentials: Option<Credentials>,
}

#[derive(Debug, Clone)]
struct Credentials {
    username: String,
    password: String,
}

impl AuthSettings {
    pub fn disabled() -> Self {
        AuthSettings { credentials: None }
    }

    pub fn single_user(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthSettings {
            credentials: Some(Credentials {
                username: username.into(),
                password: password.into(),
            }),
        }
    }

    /// Read `AUTH_USERNAME`/`AUTH_PASSWORD`; with either missing the guard is
    /// disabled and a warning logged.
    pub fn from_env() -> Self {
        match (env::var("AUTH_USERNAME"), env::var("AUTH_PASSWORD")) {
            (Ok(username), Ok(password)) if !username.is_empty() => {
                AuthSettings::single_user(username, password)
            }
            _ => {
                log::warn!(
                    "AUTH_USERNAME/AUTH_PASSWORD not set; order routes are unauthenticated"
                );
                AuthSettings::disabled()
            }
        }
    }

    fn authorize(&self, header: Option<&header::HeaderValue>) -> Result<(), AppError> {
        let Some(expected) = &self.credentials else {
            return Ok(());
        };
        let value = header
            .and_then(|h| h.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let encoded = value.strip_prefix("Basic ").ok_or(AppError::Unauthorized)?;
        let decoded = BASE64
            .decode(encoded)
            .map_err(|_| AppError::Unauthorized)?;
        let decoded = String::from_utf8(decoded).map_err(|_| AppError::Unauthorized)?;
        let (username, password) = decoded.split_once(':').ok_or(AppError::Unauthorized)?;
        if username == expected.username && password == expected.password {
            Ok(())
        } else {
            Err(AppError::Unauthorized)
        }
    }
}

/// Scope middleware: rejects with 401 before the handler runs unless the
/// request carries the configured credential pair.
pub async fn basic_auth_guard(
    settings: web::Data<AuthSettings>,
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    settings.authorize(req.headers().get(header::AUTHORIZATION))?;
    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn basic(user: &str, pass: &str) -> HeaderValue {
        let encoded = BASE64.encode(format!("{user}:{pass}"));
        HeaderValue::from_str(&format!("Basic {encoded}")).expect("valid header")
    }

    #[test]
    fn disabled_guard_lets_everything_through() {
        let settings = AuthSettings::disabled();
        assert!(settings.authorize(None).is_ok());
    }

    #[test]
    fn missing_header_is_rejected() {
        let settings = AuthSettings::single_user("admin", "secret");
        assert!(matches!(
            settings.authorize(None),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn wrong_password_is_rejected() {
        let settings = AuthSettings::single_user("admin", "secret");
        let header = basic("admin", "nope");
        assert!(matches!(
            settings.authorize(Some(&header)),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let settings = AuthSettings::single_user("admin", "secret");

        let bearer = HeaderValue::from_static("Bearer abc");
        assert!(settings.authorize(Some(&bearer)).is_err());

        let garbage = HeaderValue::from_static("Basic not-base64!!!");
        assert!(settings.authorize(Some(&garbage)).is_err());
    }

    #[test]
    fn correct_credentials_pass() {
        let settings = AuthSettings::single_user("admin", "secret");
        let header = basic("admin", "secret");
        assert!(settings.authorize(Some(&header)).is_ok());
    }

    #[test]
    fn password_containing_a_colon_is_preserved() {
        let settings = AuthSettings::single_user("admin", "se:cret");
        let header = basic("admin", "se:cret");
        assert!(settings.authorize(Some(&header)).is_ok());
    }
}
