//! Version string and output filename composition

use crate::metadata::PackageMetadata;

/// Compose a Debian version string.
///
/// Produces `[epoch:]version[~prerelease][+metadata][-release]`, adding each
/// optional segment only when its source is non-empty. Values are used as-is.
pub fn compose_version(
    epoch: &str,
    version: &str,
    prerelease: &str,
    metadata: &str,
    release: &str,
) -> String {
    let mut composed = String::with_capacity(
        epoch.len() + version.len() + prerelease.len() + metadata.len() + release.len() + 4,
    );

    if !epoch.is_empty() {
        composed.push_str(epoch);
        composed.push(':');
    }
    composed.push_str(version);
    for (sep, segment) in [('~', prerelease), ('+', metadata), ('-', release)] {
        if !segment.is_empty() {
            composed.push(sep);
            composed.push_str(segment);
        }
    }

    composed
}

/// Conventional `<name>_<version>_<arch>.dsc` filename.
///
/// Expects an already normalized architecture. The epoch never appears in
/// archive filenames, so it is left out here.
pub fn conventional_file_name(info: &PackageMetadata) -> String {
    let version = compose_version(
        "",
        &info.version,
        &info.prerelease,
        &info.version_metadata,
        &info.release,
    );
    format!("{}_{}_{}.dsc", info.name, version, info.arch)
}
