//! Centralized environment-variable lookups.
//!
//! Every environment variable [`crate::query`] ever consults is read through
//! one of the functions here, so there is a single call site to audit —
//! mirroring `turbo-tasks-fs`'s habit of funneling `std::env::var` reads
//! through one spot rather than scattering them across the codebase.

use std::env;
use std::path::PathBuf;

/// `$HOME` on POSIX. Empty/unset is treated as absent.
pub fn home_dir() -> Option<PathBuf> {
    non_empty_var("HOME").map(PathBuf::from)
}

/// `$XDG_DATA_HOME`, falling back to `$HOME/.local/share`.
#[cfg(unix)]
pub fn xdg_data_home() -> Option<PathBuf> {
    non_empty_var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|home| home.join(".local/share")))
}

/// `$TMPDIR`, `$TMP`, `$TEMP`, `$TEMPDIR` in that order, falling back to
/// `/tmp`.
#[cfg(unix)]
pub fn posix_temp_dir() -> PathBuf {
    ["TMPDIR", "TMP", "TEMP", "TEMPDIR"]
        .into_iter()
        .find_map(|name| non_empty_var(name).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("/tmp"))
}

/// `%APPDATA%`.
#[cfg(windows)]
pub fn appdata() -> Option<PathBuf> {
    non_empty_var("APPDATA").map(PathBuf::from)
}

/// `%TEMP%`/`%TMP%`.
#[cfg(windows)]
pub fn windows_temp_dir() -> Option<PathBuf> {
    ["TEMP", "TMP"]
        .into_iter()
        .find_map(|name| non_empty_var(name).map(PathBuf::from))
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_var_rejects_empty_string() {
        std::env::set_var("NATIVEFS_ENV_TEST_EMPTY", "");
        assert_eq!(non_empty_var("NATIVEFS_ENV_TEST_EMPTY"), None);
        std::env::remove_var("NATIVEFS_ENV_TEST_EMPTY");
    }

    #[test]
    fn non_empty_var_reads_set_value() {
        std::env::set_var("NATIVEFS_ENV_TEST_VALUE", "/somewhere");
        assert_eq!(
            non_empty_var("NATIVEFS_ENV_TEST_VALUE"),
            Some("/somewhere".to_string())
        );
        std::env::remove_var("NATIVEFS_ENV_TEST_VALUE");
    }
}
