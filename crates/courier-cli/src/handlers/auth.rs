//! Credential command handlers (login, logout, status)

use super::utils::credential_store;
use crate::cli::LoginArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use chrono::Duration;
use courier_core::{Credential, CredentialStore};
use serde::Serialize;

/// Credential summary shown by `status`; never includes token values
#[derive(Debug, Serialize, PartialEq)]
pub struct CredentialStatus {
    pub stored: bool,
    pub has_refresh_token: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub expired: bool,
}

impl CredentialStatus {
    fn from_credential(credential: Option<&Credential>) -> Self {
        match credential {
            None => Self {
                stored: false,
                has_refresh_token: false,
                expires_at: None,
                expired: false,
            },
            Some(credential) => Self {
                stored: true,
                has_refresh_token: credential.refresh_token().is_some(),
                expires_at: credential.expires_at().map(|at| at.to_rfc3339()),
                expired: credential.is_expired(),
            },
        }
    }
}

/// Handle the login command
pub async fn handle_login(args: LoginArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let credential = build_credential(args)?;
    let store = credential_store(config)?;
    store.save(credential).await?;

    output.success(&format!("✓ Credential saved to {}", store.path().display()))
}

/// Handle the logout command
pub async fn handle_logout(config: &Config, output: &mut OutputWriter) -> Result<()> {
    let store = credential_store(config)?;

    if store.is_stored().await? {
        store.clear().await?;
        output.success("✓ Credential removed")
    } else {
        output.info("No credential stored")
    }
}

/// Handle the status command
pub async fn handle_status(config: &Config, output: &mut OutputWriter) -> Result<()> {
    let store = credential_store(config)?;
    let credential = store.read().await?;
    let status = CredentialStatus::from_credential(credential.as_ref());

    if status.expired {
        output.warning("Stored credential has expired")?;
    }
    output.data(&status)
}

fn build_credential(args: LoginArgs) -> Result<Credential> {
    if args.access_token.trim().is_empty() {
        return Err(Error::invalid_args("--access-token must not be empty"));
    }

    let mut credential = Credential::new(args.access_token);
    if let Some(refresh_token) = args.refresh_token {
        credential = credential.with_refresh_token(refresh_token);
    }
    if let Some(seconds) = args.expires_in {
        if seconds <= 0 {
            return Err(Error::invalid_args("--expires-in must be positive"));
        }
        let lifetime = Duration::try_seconds(seconds)
            .ok_or_else(|| Error::invalid_args(format!("--expires-in {} is out of range", seconds)))?;
        credential = credential.with_expires_in(lifetime);
    }

    Ok(credential)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        Config {
            credentials_file: Some(dir.path().join("credentials.json")),
            ..Default::default()
        }
    }

    fn quiet_output() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Json, true, Box::new(std::io::sink()))
    }

    fn login_args(expires_in: Option<i64>) -> LoginArgs {
        LoginArgs {
            access_token: "abc".to_string(),
            refresh_token: Some("r1".to_string()),
            expires_in,
        }
    }

    #[test]
    fn test_build_credential() {
        let credential = build_credential(login_args(Some(3600))).unwrap();
        assert_eq!(credential.access_token(), "abc");
        assert_eq!(credential.refresh_token(), Some("r1"));
        assert!(!credential.is_expired());

        assert!(build_credential(login_args(Some(0))).is_err());

        assert!(matches!(
            build_credential(login_args(Some(i64::MAX))),
            Err(Error::InvalidArgs(_))
        ));

        let mut args = login_args(None);
        args.access_token = "  ".to_string();
        assert!(matches!(build_credential(args), Err(Error::InvalidArgs(_))));
    }

    #[test]
    fn test_status_hides_tokens() {
        let credential = Credential::new("secret").with_refresh_token("r1");
        let status = CredentialStatus::from_credential(Some(&credential));
        let printed = serde_json::to_string(&status).unwrap();

        assert!(status.stored);
        assert!(status.has_refresh_token);
        assert!(!printed.contains("secret"));
        assert!(!printed.contains("expires_at"));
    }

    #[tokio::test]
    async fn test_login_logout_cycle() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut output = quiet_output();

        handle_login(login_args(Some(60)), &config, &mut output).await.unwrap();
        let store = credential_store(&config).unwrap();
        assert!(store.is_stored().await.unwrap());
        assert_eq!(store.path(), dir.path().join("credentials.json").as_path());

        handle_status(&config, &mut output).await.unwrap();

        handle_logout(&config, &mut output).await.unwrap();
        assert!(!store.is_stored().await.unwrap());

        // Logging out twice is fine
        handle_logout(&config, &mut output).await.unwrap();
    }
}
