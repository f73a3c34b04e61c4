//! Centralized limits and checks applied while reading inputs.

use std::path::Path;

/// Maximum number of contigs allowed in a reference or header (DOS protection)
pub const MAX_CONTIGS: usize = 100_000;

/// Maximum number of `@RG` lines allowed in a header
pub const MAX_READ_GROUPS: usize = 100_000;

/// Check if adding another contig would exceed the maximum allowed.
///
/// Call this with the current count BEFORE adding a new contig.
/// Returns an error message if adding would exceed the limit, None if safe to add.
///
/// # Example
/// ```ignore
/// if check_contig_limit(contigs.len()).is_some() {
///     return Err(...);
/// }
/// contigs.push(new_contig); // Safe to add
/// ```
#[must_use]
pub fn check_contig_limit(count: usize) -> Option<String> {
    if count >= MAX_CONTIGS {
        Some(format!(
            "Too many contigs: adding another would exceed maximum of {MAX_CONTIGS}"
        ))
    } else {
        None
    }
}

/// Same as [`check_contig_limit`], for read groups
#[must_use]
pub fn check_read_group_limit(count: usize) -> Option<String> {
    if count >= MAX_READ_GROUPS {
        Some(format!(
            "Too many read groups: adding another would exceed maximum of {MAX_READ_GROUPS}"
        ))
    } else {
        None
    }
}

/// Lowercased file name, used for extension checks on names like `ref.fa.gz`
#[must_use]
pub fn lowercase_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Whether `path` names a gzip or bgzip compressed file
#[must_use]
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn is_gzipped(path: &Path) -> bool {
    let name = lowercase_file_name(path);
    name.ends_with(".gz") || name.ends_with(".bgz")
}
