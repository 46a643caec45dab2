//! Source package descriptor packager
//!
//! Ties the pipeline together: normalize the architecture, validate, render,
//! optionally sign, then hand the finished bytes to the output in one write.

use std::io::Write;

use tracing::{debug, info};

use crate::{
    arch::ensure_valid_arch,
    metadata::PackageMetadata,
    render::render,
    signing::{self, ClearSigner, GpgSigner},
    version::conventional_file_name,
    Result,
};

/// Architecture normalization step, injected so callers can swap the table
pub type Normalizer = fn(&PackageMetadata) -> PackageMetadata;

/// Debian source control file packager
pub struct Dsc<S = GpgSigner> {
    signer: S,
    normalize: Normalizer,
}

impl Default for Dsc<GpgSigner> {
    fn default() -> Self {
        Self::new()
    }
}

impl Dsc<GpgSigner> {
    pub fn new() -> Self {
        Self::with_signer(GpgSigner::default())
    }
}

impl<S: ClearSigner> Dsc<S> {
    pub fn with_signer(signer: S) -> Self {
        Self {
            signer,
            normalize: ensure_valid_arch,
        }
    }

    /// Replace the architecture normalizer
    pub fn with_normalizer(mut self, normalize: Normalizer) -> Self {
        self.normalize = normalize;
        self
    }

    /// `<name>_<version>_<arch>.dsc` for `info` after normalization
    pub fn conventional_file_name(&self, info: &PackageMetadata) -> String {
        conventional_file_name(&(self.normalize)(info))
    }

    /// Build the final descriptor bytes without writing them anywhere.
    pub fn build(&self, info: &PackageMetadata) -> Result<Vec<u8>> {
        let info = (self.normalize)(info);
        info.validate()?;

        debug!(name = %info.name, arch = %info.arch, "rendering descriptor");
        let content = render(&info)?;

        let content = signing::sign(&self.signer, content, info.signing_key())?;
        Ok(content)
    }

    /// Write the descriptor for `info` to `out`.
    ///
    /// Nothing is written unless every step before the write succeeded.
    pub fn package<W: Write + ?Sized>(&self, info: &PackageMetadata, out: &mut W) -> Result<()> {
        let content = self.build(info)?;
        out.write_all(&content)?;

        info!(
            name = %info.name,
            version = %info.composed_version(),
            bytes = content.len(),
            "wrote source descriptor"
        );
        Ok(())
    }
}
