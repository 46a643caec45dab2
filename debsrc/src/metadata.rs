//! Package metadata model
//!
//! The input to the descriptor pipeline. Optional text fields use the empty
//! string for "not set".

use indexmap::IndexMap;
use thiserror::Error;

use crate::version::compose_version;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("package {0} must be provided")]
    FieldEmpty(&'static str),
}

/// Key material used to clear-sign the descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningOptions {
    /// Path to an armored or binary secret key
    pub key_file: String,
    pub key_passphrase: Option<String>,
    /// Key to sign with when the key file holds more than one
    pub key_id: Option<String>,
}

/// Fields specific to the source package descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceOptions {
    pub standards_version: String,

    /// Extra control fields, emitted in insertion order
    pub fields: IndexMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebOptions {
    /// Overrides the top-level architecture when set
    pub arch: String,
    pub source: SourceOptions,
    pub signature: Option<SigningOptions>,
}

/// Everything needed to describe one source package
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageMetadata {
    pub name: String,
    pub version: String,
    pub epoch: String,
    pub prerelease: String,
    pub version_metadata: String,
    pub release: String,
    pub arch: String,
    pub maintainer: String,
    pub homepage: String,
    pub deb: DebOptions,
}

impl PackageMetadata {
    pub fn new(name: impl Into<String>, version: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            arch: arch.into(),
            ..Default::default()
        }
    }

    /// Full Debian version including epoch
    pub fn composed_version(&self) -> String {
        compose_version(
            &self.epoch,
            &self.version,
            &self.prerelease,
            &self.version_metadata,
            &self.release,
        )
    }

    /// Signing options, only when a key file is actually configured
    pub fn signing_key(&self) -> Option<&SigningOptions> {
        self.deb
            .signature
            .as_ref()
            .filter(|sig| !sig.key_file.is_empty())
    }

    /// Check the fields every descriptor needs.
    ///
    /// Fields are checked in order name, arch, version and the first empty
    /// one is reported.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("name", &self.name),
            ("arch", &self.arch),
            ("version", &self.version),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::FieldEmpty(field));
            }
        }

        Ok(())
    }
}
