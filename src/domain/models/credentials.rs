//! Credentials Model
//!
//! Key material read from the file at `DB_CERT_PATH` and handed to the driver
//! on registration.

use std::path::Path;

use serde::Deserialize;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::shared::errors::CredentialsError;

/// Kind of credential file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    ServiceAccount,
    AuthorizedUser,
    ExternalAccount,
    ImpersonatedServiceAccount,
}

impl CredentialKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServiceAccount => "service_account",
            Self::AuthorizedUser => "authorized_user",
            Self::ExternalAccount => "external_account",
            Self::ImpersonatedServiceAccount => "impersonated_service_account",
        }
    }
}

/// Parsed credential file; secret fields are wiped on drop
#[derive(Clone, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    #[serde(rename = "type")]
    #[zeroize(skip)]
    kind: CredentialKind,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default)]
    client_email: Option<String>,
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    private_key: Option<String>,
}

impl Credentials {
    /// Read and validate a credential file
    ///
    /// # Errors
    ///
    /// Returns `CredentialsError::Read` if the file cannot be read, and the
    /// errors of [`Credentials::from_json`] for its content.
    pub fn from_file(path: &Path) -> Result<Self, CredentialsError> {
        let content = std::fs::read_to_string(path).map_err(|source| CredentialsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate credential JSON
    ///
    /// # Errors
    ///
    /// Returns `CredentialsError::Parse` for malformed JSON or an unknown
    /// credential type, and `CredentialsError::MissingField` when a service
    /// account key lacks its email or private key.
    pub fn from_json(content: &str) -> Result<Self, CredentialsError> {
        let credentials: Self = serde_json::from_str(content)?;
        credentials.validate()?;
        Ok(credentials)
    }

    fn validate(&self) -> Result<(), CredentialsError> {
        if self.kind != CredentialKind::ServiceAccount {
            return Ok(());
        }
        let missing = |field: &Option<String>| field.as_deref().map_or(true, str::is_empty);
        if missing(&self.client_email) {
            return Err(CredentialsError::MissingField {
                kind: self.kind.as_str(),
                field: "client_email",
            });
        }
        if missing(&self.private_key) {
            return Err(CredentialsError::MissingField {
                kind: self.kind.as_str(),
                field: "private_key",
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn kind(&self) -> CredentialKind {
        self.kind
    }

    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Principal the credentials act as, when the file names one
    #[must_use]
    pub fn principal(&self) -> Option<&str> {
        self.client_email.as_deref().or(self.client_id.as_deref())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("kind", &self.kind)
            .field("project_id", &self.project_id)
            .field("principal", &self.principal())
            .field("private_key_id", &self.private_key_id)
            .finish_non_exhaustive()
    }
}
