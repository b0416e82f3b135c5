//! OAuth credentials for the posting account.

use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable overriding the API key.
pub const API_KEY_ENV: &str = "TWITIMG_API_KEY";
/// Environment variable overriding the API secret.
pub const API_SECRET_ENV: &str = "TWITIMG_API_SECRET";
/// Environment variable overriding the access token.
pub const ACCESS_TOKEN_ENV: &str = "TWITIMG_ACCESS_TOKEN";
/// Environment variable overriding the access token secret.
pub const ACCESS_TOKEN_SECRET_ENV: &str = "TWITIMG_ACCESS_TOKEN_SECRET";

const ENV_VARS: [&str; 4] = [
    API_KEY_ENV,
    API_SECRET_ENV,
    ACCESS_TOKEN_ENV,
    ACCESS_TOKEN_SECRET_ENV,
];

/// The four OAuth 1.0a user-context secrets.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub api_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

// Never print secrets, even in debug output.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("credential {0} is not set and no secrets file was found at {1}")]
    Missing(&'static str, PathBuf),

    #[error("secrets file {path} is malformed: it needs at least 4 lines, found {found}")]
    Malformed { path: PathBuf, found: usize },

    #[error("failed to read secrets file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            access_token: access_token.into(),
            access_token_secret: access_token_secret.into(),
        }
    }

    /// Resolve credentials from the process environment and `auth_file`.
    pub fn resolve(auth_file: &Path) -> Result<Self, CredentialError> {
        Self::resolve_with(auth_file, |name| std::env::var(name).ok())
    }

    /// Resolve credentials using `lookup` in place of the environment.
    ///
    /// If the secrets file exists its first four lines are API key, API
    /// secret, access token and access token secret, and any variable that
    /// `lookup` returns overrides the matching line. Without the file, all
    /// four variables are required.
    pub fn resolve_with<F>(auth_file: &Path, lookup: F) -> Result<Self, CredentialError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env: Vec<Option<String>> = ENV_VARS
            .iter()
            .map(|name| lookup(name).filter(|v| !v.is_empty()))
            .collect();

        let values: Vec<String> = if auth_file.exists() {
            let content =
                std::fs::read_to_string(auth_file).map_err(|source| CredentialError::Io {
                    path: auth_file.to_path_buf(),
                    source,
                })?;
            let lines: Vec<&str> = content.lines().map(str::trim).collect();
            if lines.len() < 4 {
                return Err(CredentialError::Malformed {
                    path: auth_file.to_path_buf(),
                    found: lines.len(),
                });
            }
            from_env
                .into_iter()
                .zip(lines)
                .map(|(env, line)| env.unwrap_or_else(|| line.to_string()))
                .collect()
        } else {
            from_env
                .into_iter()
                .zip(ENV_VARS)
                .map(|(env, name)| {
                    env.ok_or_else(|| CredentialError::Missing(name, auth_file.to_path_buf()))
                })
                .collect::<Result<_, _>>()?
        };

        let [api_key, api_secret, access_token, access_token_secret]: [String; 4] = values
            .try_into()
            .map_err(|v: Vec<String>| CredentialError::Malformed {
                path: auth_file.to_path_buf(),
                found: v.len(),
            })?;

        Ok(Self {
            api_key,
            api_secret,
            access_token,
            access_token_secret,
        })
    }
}
