//! Descriptor signing using gpg
//!
//! The rendered descriptor is handed to a clear-signer, which returns the
//! document wrapped in a PGP signed-message envelope.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use thiserror::Error;
use tracing::debug;

use crate::metadata::SigningOptions;

#[derive(Error, Debug)]
pub enum SignError {
    #[error("gpg not found - install gnupg to sign descriptors")]
    GpgNotFound,

    #[error("signing key not found: {0}")]
    KeyNotFound(String),

    #[error("key import failed: {0}")]
    ImportFailed(String),

    #[error("signing failed: {0}")]
    SignFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Produces a clear-signed copy of a document
pub trait ClearSigner {
    fn clear_sign(&self, data: &[u8], opts: &SigningOptions) -> Result<Vec<u8>, SignError>;
}

impl<T: ClearSigner + ?Sized> ClearSigner for &T {
    fn clear_sign(&self, data: &[u8], opts: &SigningOptions) -> Result<Vec<u8>, SignError> {
        (**self).clear_sign(data, opts)
    }
}

/// Sign `data` when `opts` names a key file, otherwise return it unchanged.
pub fn sign<S: ClearSigner + ?Sized>(
    signer: &S,
    data: Vec<u8>,
    opts: Option<&SigningOptions>,
) -> Result<Vec<u8>, SignError> {
    match opts {
        Some(opts) if !opts.key_file.is_empty() => {
            debug!(key_file = %opts.key_file, "clear-signing descriptor");
            signer.clear_sign(&data, opts)
        }
        _ => Ok(data),
    }
}

/// Clear-signer backed by the `gpg` binary.
///
/// Every call imports the key into a throwaway home directory so the
/// user's keyring is never touched.
#[derive(Debug, Clone)]
pub struct GpgSigner {
    program: PathBuf,
}

impl Default for GpgSigner {
    fn default() -> Self {
        Self {
            program: PathBuf::from("gpg"),
        }
    }
}

impl GpgSigner {
    /// Use a specific gpg executable
    pub fn with_program<P: AsRef<Path>>(path: P) -> Self {
        Self {
            program: path.as_ref().to_path_buf(),
        }
    }

    /// Check if gpg is available
    pub fn check_gpg(&self) -> Result<PathBuf, SignError> {
        which::which(&self.program).map_err(|_| SignError::GpgNotFound)
    }

    fn run(
        &self,
        gpg: &Path,
        home: &Path,
        args: &[&str],
        passphrase: Option<&str>,
    ) -> Result<Output, SignError> {
        let mut cmd = Command::new(gpg);
        cmd.arg("--no-permission-warning")
            .arg("--homedir")
            .arg(home)
            .args(["--batch", "--yes", "--no-tty", "--pinentry-mode", "loopback"]);
        if passphrase.is_some() {
            cmd.args(["--passphrase-fd", "0"]);
        }

        let mut child = cmd
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Dropping stdin closes it, so gpg never waits on us.
        if let Some(mut stdin) = child.stdin.take() {
            if let Some(passphrase) = passphrase {
                writeln!(stdin, "{}", passphrase)?;
            }
        }

        Ok(child.wait_with_output()?)
    }

    /// Stop the agent gpg spawned for a throwaway home
    fn kill_agent(&self, home: &Path) {
        Command::new("gpgconf")
            .arg("--homedir")
            .arg(home)
            .args(["--kill", "gpg-agent"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .ok();
    }
}

/// gpg's stderr without its advisory warning lines
fn failure_message(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .filter(|line| !line.trim_start().starts_with("gpg: WARNING:"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

impl ClearSigner for GpgSigner {
    fn clear_sign(&self, data: &[u8], opts: &SigningOptions) -> Result<Vec<u8>, SignError> {
        let key_file = Path::new(&opts.key_file);
        if !key_file.is_file() {
            return Err(SignError::KeyNotFound(opts.key_file.clone()));
        }

        let gpg = self.check_gpg()?;
        let home = tempfile::Builder::new().prefix("debsrc-gnupg-").tempdir()?;

        let result = self.import_and_sign(&gpg, home.path(), key_file, data, opts);
        self.kill_agent(home.path());
        result
    }
}

impl GpgSigner {
    fn import_and_sign(
        &self,
        gpg: &Path,
        home: &Path,
        key_file: &Path,
        data: &[u8],
        opts: &SigningOptions,
    ) -> Result<Vec<u8>, SignError> {
        let passphrase = opts.key_passphrase.as_deref();

        let key_path = key_file.to_string_lossy().into_owned();
        let output = self.run(gpg, home, &["--import", key_path.as_str()], passphrase)?;
        if !output.status.success() {
            return Err(SignError::ImportFailed(failure_message(&output.stderr)));
        }

        let payload = home.join("payload");
        std::fs::write(&payload, data)?;
        let payload = payload.to_string_lossy().into_owned();

        let mut args = vec!["--armor", "--output", "-"];
        if let Some(key_id) = opts.key_id.as_deref().filter(|id| !id.is_empty()) {
            args.extend(["--local-user", key_id]);
        }
        args.extend(["--clearsign", payload.as_str()]);

        let output = self.run(gpg, home, &args, passphrase)?;
        if !output.status.success() {
            return Err(SignError::SignFailed(failure_message(&output.stderr)));
        }

        debug!(bytes = output.stdout.len(), "gpg produced signed descriptor");
        Ok(output.stdout)
    }
}
