//! debsrc: Debian source package descriptor generator
//!
//! This crate provides:
//! - Version and conventional filename composition
//! - Rendering of `.dsc` control documents
//! - Optional PGP clear-signing through an external `gpg`
//! - YAML package configuration loading
//! - A deb822 paragraph reader for inspecting generated descriptors

pub mod arch;
pub mod config;
pub mod control;
pub mod error;
pub mod metadata;
pub mod packager;
pub mod render;
pub mod signing;
pub mod version;

pub use config::Config;
pub use control::Paragraph;
pub use error::{Error, Result};
pub use metadata::{DebOptions, PackageMetadata, SigningOptions, SourceOptions};
pub use packager::Dsc;
pub use signing::{ClearSigner, GpgSigner};
pub use version::{compose_version, conventional_file_name};
