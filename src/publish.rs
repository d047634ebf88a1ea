//! Publish endpoint and credential lookup.
//!
//! Credentials come from two environment variables named in the `publish`
//! section (`REPO_USER` and `REPO_PASSWORD` by default). A missing variable is
//! not an error: it resolves to an empty string and the publishing tool
//! downstream decides what to do with it.

use std::env;
use std::fmt;

use url::Url;

use crate::config::PublishSection;
use crate::error::Result;

/// Remote artifact repository built from the `publish` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepositoryConfig {
    pub name: String,
    pub url: Url,
    pub username_env: String,
    pub password_env: String,
}

/// Username and password for the publish endpoint
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Both values are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() { "" } else { "***" };
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &password)
            .finish()
    }
}

impl RemoteRepositoryConfig {
    pub fn from_section(section: &PublishSection) -> Result<Self> {
        Ok(Self {
            name: section.name.clone(),
            url: Url::parse(&section.url)?,
            username_env: section.username_env.clone(),
            password_env: section.password_env.clone(),
        })
    }

    /// Read credentials from the process environment.
    pub fn resolve_credentials(&self) -> Credentials {
        self.resolve_credentials_with(|name| env::var(name).ok())
    }

    /// Read credentials through `lookup`; `None` means unset.
    pub fn resolve_credentials_with<F>(&self, lookup: F) -> Credentials
    where
        F: Fn(&str) -> Option<String>,
    {
        Credentials {
            username: lookup(&self.username_env).unwrap_or_default(),
            password: lookup(&self.password_env).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{PUBLISH_PASSWORD_ENV, PUBLISH_USERNAME_ENV};
    use serial_test::serial;

    fn repo(username_env: &str, password_env: &str) -> RemoteRepositoryConfig {
        RemoteRepositoryConfig::from_section(&PublishSection {
            name: "trlcore-finally".to_string(),
            url: "https://maven.leafmc.one/snapshots/".to_string(),
            username_env: username_env.to_string(),
            password_env: password_env.to_string(),
        })
        .unwrap()
    }

    #[test]
    #[serial]
    fn test_unset_variables_resolve_to_empty() {
        env::remove_var(PUBLISH_USERNAME_ENV);
        env::remove_var(PUBLISH_PASSWORD_ENV);

        let credentials = repo(PUBLISH_USERNAME_ENV, PUBLISH_PASSWORD_ENV).resolve_credentials();
        assert_eq!(credentials.username, "");
        assert_eq!(credentials.password, "");
        assert!(!credentials.is_complete());
    }

    #[test]
    #[serial]
    fn test_resolve_from_environment() {
        env::set_var("FORKPATCH_TEST_PUBLISH_USER", "deployer");
        env::set_var("FORKPATCH_TEST_PUBLISH_PASSWORD", "s3cret");

        let credentials = repo("FORKPATCH_TEST_PUBLISH_USER", "FORKPATCH_TEST_PUBLISH_PASSWORD")
            .resolve_credentials();

        env::remove_var("FORKPATCH_TEST_PUBLISH_USER");
        env::remove_var("FORKPATCH_TEST_PUBLISH_PASSWORD");

        assert_eq!(credentials.username, "deployer");
        assert_eq!(credentials.password, "s3cret");
        assert!(credentials.is_complete());
    }

    #[test]
    fn test_resolve_with_lookup_only_username() {
        let credentials = repo("U", "P").resolve_credentials_with(|name| {
            (name == "U").then(|| "deployer".to_string())
        });
        assert_eq!(credentials.username, "deployer");
        assert_eq!(credentials.password, "");
    }

    #[test]
    fn test_debug_masks_password() {
        let credentials = Credentials {
            username: "deployer".to_string(),
            password: "s3cret".to_string(),
        };
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("deployer"));
        assert!(!debug.contains("s3cret"));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = RemoteRepositoryConfig::from_section(&PublishSection {
            name: "r".to_string(),
            url: "not a url".to_string(),
            username_env: "U".to_string(),
            password_env: "P".to_string(),
        })
        .unwrap_err();
        assert_eq!(err.kind(), "ConfigurationError");
    }
}
