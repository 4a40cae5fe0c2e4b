//! Signed-in session context.
//!
//! A [`Session`] is created by `rfpsum login` from a validated token and
//! persisted to the configured session file; `rfpsum logout` removes it.
//! Commands that talk to the backend load the session (or build a transient
//! one from `--token`) and revalidate it before use. Anything that fails
//! validation is an `AuthInvalid` error and sends the user back to sign in.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{self, Claims};
use crate::config::AuthConfig;
use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    token: String,
    user_email: String,
    #[serde(default)]
    expires_at: Option<i64>,
}

impl Session {
    /// Validate `token` and resolve the user's email.
    ///
    /// The email comes from the token's `email` claim when present,
    /// otherwise from the identity provider's user-info endpoint.
    pub async fn establish(config: &AuthConfig, token: &str) -> ClientResult<Self> {
        let claims = auth::validate_token(token, config)?;
        let email = match claims.email.clone() {
            Some(email) if !email.is_empty() => email,
            _ => auth::fetch_user_email(config, token).await?,
        };
        tracing::info!(user = %email, "session established");
        Ok(Self::from_claims(token, &claims, &email))
    }

    pub fn from_claims(token: &str, claims: &Claims, user_email: &str) -> Self {
        Self {
            token: token.to_string(),
            user_email: user_email.to_string(),
            expires_at: claims.exp,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    /// Re-check a stored session's token against the configuration.
    pub fn revalidate(&self, config: &AuthConfig) -> ClientResult<()> {
        auth::validate_token(&self.token, config).map(|_| ())
    }

    /// Persist the session, readable only by the current user.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(path)
            .with_context(|| format!("Failed to open session file: {}", path.display()))?;

        // `mode` only applies on creation; tighten a pre-existing file first.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write session file: {}", path.display()))?;
        Ok(())
    }

    /// Load a saved session; `Ok(None)` when nobody is signed in.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;
        let session = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt session file: {}", path.display()))?;
        Ok(Some(session))
    }

    /// Remove the saved session. Returns whether one existed.
    pub fn sign_out(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove session file: {}", path.display()))?;
        tracing::info!("signed out");
        Ok(true)
    }
}

/// Session for a command: an explicit token wins, then the saved session.
pub async fn resolve(
    config: &AuthConfig,
    session_path: &Path,
    token: Option<&str>,
) -> ClientResult<Session> {
    if let Some(token) = token {
        return Session::establish(config, token).await;
    }

    let saved = Session::load(session_path)
        .map_err(|e| ClientError::AuthInvalid(format!("{:#}", e)))?
        .ok_or_else(|| ClientError::AuthInvalid("no active session".to_string()))?;
    saved.revalidate(config)?;
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session() -> Session {
        let claims = Claims {
            exp: Some(2_000_000_000),
            ..Default::default()
        };
        Session::from_claims("a.b.c", &claims, "jane@corp.com")
    }

    #[test]
    fn save_load_and_sign_out() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("session.json");

        assert_eq!(Session::load(&path).unwrap(), None);

        session().save(&path).unwrap();
        let loaded = Session::load(&path).unwrap().unwrap();
        assert_eq!(loaded.user_email(), "jane@corp.com");
        assert_eq!(loaded.expires_at(), Some(2_000_000_000));

        assert!(Session::sign_out(&path).unwrap());
        assert!(!Session::sign_out(&path).unwrap());
        assert_eq!(Session::load(&path).unwrap(), None);
    }

    #[cfg(unix)]
    #[test]
    fn session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let fresh = tmp.path().join("session.json");
        session().save(&fresh).unwrap();
        let mode = std::fs::metadata(&fresh).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        // An existing world-readable file is tightened and overwritten.
        let existing = tmp.path().join("old.json");
        std::fs::write(&existing, "stale payload ".repeat(100)).unwrap();
        std::fs::set_permissions(&existing, std::fs::Permissions::from_mode(0o644)).unwrap();
        session().save(&existing).unwrap();
        let mode = std::fs::metadata(&existing).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(Session::load(&existing).unwrap().is_some());
    }

    #[test]
    fn corrupt_session_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(Session::load(&path).is_err());
    }

    #[tokio::test]
    async fn resolve_without_session_is_auth_invalid() {
        let tmp = TempDir::new().unwrap();
        let config = AuthConfig {
            issuer: "https://issuer.example.com/pool".to_string(),
            client_id: "client-1".to_string(),
            region: "ap-south-1".to_string(),
            user_info_endpoint: None,
            redirect_url: None,
        };
        let err = resolve(&config, &tmp.path().join("none.json"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::AuthInvalid(_)));
    }
}
