//! YAML package configuration
//!
//! Loads the package description from a YAML file laid out like:
//!
//! ```yaml
//! name: foo
//! arch: amd64
//! version: 2.3
//! release: 1
//! homepage: https://example.com
//! deb:
//!   source:
//!     standards_version: 4.6.2
//!     fields:
//!       Build-Depends: [debhelper-compat (= 13), cargo]
//!   signature:
//!     key_file: ${HOME}/.keys/release.asc
//! ```

use std::path::Path;

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer};

use crate::{
    metadata::{DebOptions, PackageMetadata, SigningOptions, SourceOptions},
    render::join_list,
    Error, Result,
};

/// Environment variables consulted for the signing passphrase, in order
pub const PASSPHRASE_ENV: &[&str] = &["DEBSRC_DEB_PASSPHRASE", "DEBSRC_PASSPHRASE"];

/// Scalar that may be written as a string, number or boolean
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scalar(pub String);

impl<'de> Deserialize<'de> for Scalar {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            None,
            Text(String),
            Number(serde_yaml::Number),
            Bool(bool),
        }

        Ok(match Helper::deserialize(deserializer)? {
            Helper::None => Scalar::default(),
            Helper::Text(s) => Scalar(s),
            Helper::Number(n) => Scalar(n.to_string()),
            Helper::Bool(b) => Scalar(b.to_string()),
        })
    }
}

/// Control field value, either a scalar or a list joined with ", "
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValue(pub String);

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Seq(Vec<Scalar>),
            Single(Scalar),
        }

        Ok(match Helper::deserialize(deserializer)? {
            Helper::Seq(items) => {
                let items: Vec<String> = items.into_iter().map(|s| s.0).collect();
                FieldValue(join_list(&items))
            }
            Helper::Single(s) => FieldValue(s.0),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignatureConfig {
    #[serde(default)]
    pub key_file: Scalar,
    #[serde(default)]
    pub key_id: Scalar,
    #[serde(default)]
    pub key_passphrase: Scalar,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub standards_version: Scalar,
    #[serde(default)]
    pub fields: IndexMap<String, FieldValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DebConfig {
    #[serde(default)]
    pub arch: Scalar,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub signature: SignatureConfig,
}

/// Package configuration as written on disk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub name: Scalar,
    #[serde(default)]
    pub arch: Scalar,
    #[serde(default)]
    pub version: Scalar,
    #[serde(default)]
    pub epoch: Scalar,
    #[serde(default)]
    pub prerelease: Scalar,
    #[serde(default)]
    pub version_metadata: Scalar,
    #[serde(default)]
    pub release: Scalar,
    #[serde(default)]
    pub maintainer: Scalar,
    #[serde(default)]
    pub homepage: Scalar,
    #[serde(default)]
    pub deb: DebConfig,
}

impl Config {
    /// Read and parse a config file, expanding variables from the process
    /// environment.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Self::from_yaml_with(content, |name| std::env::var(name).ok())
    }

    /// Parse `content` using `lookup` for variable expansion and the
    /// passphrase fallback.
    ///
    /// Only the key file, key id and source field values are expanded, after
    /// parsing. Every other value, the passphrase included, is taken literally.
    pub fn from_yaml_with<F>(content: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: Config = serde_yaml::from_str(content)?;

        let signature = &mut config.deb.signature;
        signature.key_file.0 = expand_env(&signature.key_file.0, &lookup)?;
        signature.key_id.0 = expand_env(&signature.key_id.0, &lookup)?;
        for value in config.deb.source.fields.values_mut() {
            value.0 = expand_env(&value.0, &lookup)?;
        }

        if signature.key_passphrase.0.is_empty() {
            if let Some(passphrase) = PASSPHRASE_ENV
                .iter()
                .filter_map(|var| lookup(var))
                .find(|v| !v.is_empty())
            {
                signature.key_passphrase = Scalar(passphrase);
            }
        }

        Ok(config)
    }

    pub fn into_metadata(self) -> PackageMetadata {
        let sig = self.deb.signature;
        let signature = (!sig.key_file.0.is_empty()).then(|| SigningOptions {
            key_file: sig.key_file.0,
            key_passphrase: Some(sig.key_passphrase.0).filter(|p| !p.is_empty()),
            key_id: Some(sig.key_id.0).filter(|id| !id.is_empty()),
        });

        PackageMetadata {
            name: self.name.0,
            version: self.version.0,
            epoch: self.epoch.0,
            prerelease: self.prerelease.0,
            version_metadata: self.version_metadata.0,
            release: self.release.0,
            arch: self.arch.0,
            maintainer: self.maintainer.0,
            homepage: self.homepage.0,
            deb: DebOptions {
                arch: self.deb.arch.0,
                source: SourceOptions {
                    standards_version: self.deb.source.standards_version.0,
                    fields: self
                        .deb
                        .source
                        .fields
                        .into_iter()
                        .map(|(k, v)| (k, v.0))
                        .collect(),
                },
                signature,
            },
        }
    }
}

/// Replace `${NAME}` and `$NAME` with values from `lookup`.
///
/// `$$` produces a literal `$`. Unset variables expand to an empty string.
pub fn expand_env<F>(input: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    if !input.contains('$') {
        return Ok(input.to_string());
    }

    let re = Regex::new(r"\$\$|\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)")
        .map_err(|e| Error::Config(e.to_string()))?;

    let expanded = re.replace_all(input, |caps: &Captures<'_>| {
        if &caps[0] == "$$" {
            return "$".to_string();
        }
        caps.get(1)
            .or_else(|| caps.get(2))
            .and_then(|name| lookup(name.as_str()))
            .unwrap_or_default()
    });

    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_expand_env() {
        let lookup = env(&[("HOME", "/home/me"), ("VER", "1.2")]);
        assert_eq!(
            expand_env("key: ${HOME}/k.asc v=$VER x=$MISSING", &lookup).unwrap(),
            "key: /home/me/k.asc v=1.2 x="
        );
        assert_eq!(expand_env("no vars here", &lookup).unwrap(), "no vars here");
        assert_eq!(expand_env("cost $$VER", &lookup).unwrap(), "cost $VER");
    }

    #[test]
    fn test_literal_dollar_in_passphrase() {
        let yaml = "name: foo\ndeb:\n  signature:\n    key_file: k.asc\n    key_passphrase: 'pa$word'\n";
        let lookup = env(&[("word", "XX")]);
        let info = Config::from_yaml_with(yaml, lookup).unwrap().into_metadata();
        assert_eq!(
            info.deb.signature.unwrap().key_passphrase.as_deref(),
            Some("pa$word")
        );
    }

    #[test]
    fn test_expansion_limited_to_chosen_fields() {
        let yaml = r#"
# built by $USER
name: foo
maintainer: Jane $USER
deb:
  source:
    fields:
      Vcs-Git: ${REPO}
  signature:
    key_file: ${KEYS}/release.asc
"#;
        let lookup = env(&[
            ("USER", "bob"),
            ("REPO", "https://example.com/foo.git"),
            ("KEYS", "C:\\keys\nname: injected"),
        ]);
        let info = Config::from_yaml_with(yaml, lookup).unwrap().into_metadata();
        assert_eq!(info.name, "foo");
        assert_eq!(info.maintainer, "Jane $USER");
        assert_eq!(
            info.deb.source.fields.get("Vcs-Git").map(String::as_str),
            Some("https://example.com/foo.git")
        );
        assert_eq!(
            info.deb.signature.unwrap().key_file,
            "C:\\keys\nname: injected/release.asc"
        );
    }

    #[test]
    fn test_scalar_coercion() {
        let yaml = "name: foo\nversion: 2.3\nrelease: 1\narch: amd64\nepoch:\n";
        let info = Config::from_yaml_with(yaml, env(&[])).unwrap().into_metadata();
        assert_eq!(info.version, "2.3");
        assert_eq!(info.release, "1");
        assert_eq!(info.epoch, "");
        assert_eq!(info.composed_version(), "2.3-1");
    }

    #[test]
    fn test_source_fields_keep_order_and_join_lists() {
        let yaml = r#"
name: foo
version: "1.0"
arch: amd64
deb:
  source:
    standards_version: 4.6.2
    fields:
      Section: utils
      Build-Depends: [debhelper-compat (= 13), cargo]
      Priority: optional
"#;
        let info = Config::from_yaml_with(yaml, env(&[])).unwrap().into_metadata();
        let fields: Vec<_> = info.deb.source.fields.iter().collect();
        assert_eq!(fields[0], (&"Section".to_string(), &"utils".to_string()));
        assert_eq!(
            fields[1],
            (
                &"Build-Depends".to_string(),
                &"debhelper-compat (= 13), cargo".to_string()
            )
        );
        assert_eq!(fields[2].0, "Priority");
        assert_eq!(info.deb.source.standards_version, "4.6.2");
    }

    #[test]
    fn test_signature_from_env() {
        let yaml = "name: foo\nversion: '1'\narch: amd64\ndeb:\n  signature:\n    key_file: ${KEYS}/release.asc\n    key_id: ABCD\n";
        let lookup = env(&[("KEYS", "/keys"), ("DEBSRC_PASSPHRASE", "generic")]);
        let info = Config::from_yaml_with(yaml, lookup).unwrap().into_metadata();

        let sig = info.deb.signature.unwrap();
        assert_eq!(sig.key_file, "/keys/release.asc");
        assert_eq!(sig.key_id.as_deref(), Some("ABCD"));
        assert_eq!(sig.key_passphrase.as_deref(), Some("generic"));
    }

    #[test]
    fn test_deb_passphrase_takes_precedence() {
        let yaml = "deb:\n  signature:\n    key_file: k.asc\n";
        let lookup = env(&[
            ("DEBSRC_PASSPHRASE", "generic"),
            ("DEBSRC_DEB_PASSPHRASE", "deb"),
        ]);
        let config = Config::from_yaml_with(yaml, lookup).unwrap();
        assert_eq!(config.deb.signature.key_passphrase.0, "deb");
    }

    #[test]
    fn test_no_key_file_means_unsigned() {
        let yaml = "name: foo\ndeb:\n  signature:\n    key_id: ABCD\n";
        let info = Config::from_yaml_with(yaml, env(&[])).unwrap().into_metadata();
        assert!(info.deb.signature.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"name: foo\nversion: '2.3'\narch: '386'\n").unwrap();
        file.flush().unwrap();

        let info = Config::load(file.path()).unwrap().into_metadata();
        assert_eq!(info.name, "foo");
        assert_eq!(info.arch, "386");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/debsrc.yaml").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::from_yaml_with("name: [unterminated", env(&[])).unwrap_err();
        assert!(matches!(err, Error::Yaml(_)));
    }
}
