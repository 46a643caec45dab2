//! Architecture normalization
//!
//! Maps Go-style architecture names to the names Debian uses.

use crate::metadata::PackageMetadata;

const ARCH_TO_DEBIAN: &[(&str, &str)] = &[
    ("386", "i386"),
    ("arm5", "armel"),
    ("arm6", "armhf"),
    ("arm7", "armhf"),
    ("mips64le", "mips64el"),
    ("mipsle", "mipsel"),
    ("ppc64le", "ppc64el"),
    ("s390", "s390x"),
];

/// Debian name for `arch`, or `arch` itself when no alias applies
pub fn to_debian(arch: &str) -> &str {
    ARCH_TO_DEBIAN
        .iter()
        .find(|(alias, _)| *alias == arch)
        .map(|(_, debian)| *debian)
        .unwrap_or(arch)
}

/// Return a copy of `info` with a Debian architecture.
///
/// A non-empty `deb.arch` wins over the alias table.
pub fn ensure_valid_arch(info: &PackageMetadata) -> PackageMetadata {
    let mut info = info.clone();
    info.arch = if info.deb.arch.is_empty() {
        to_debian(&info.arch).to_string()
    } else {
        info.deb.arch.clone()
    };
    info
}
