use std::path::PathBuf;

use thiserror::Error;

/// An environment variable required by the application is not set.
#[derive(Debug, Error)]
#[error("Missing environment variable: {0}")]
pub struct MissingEnvVarError(pub String);

/// Reads an environment variable, returning a structured error if it's missing.
///
/// This is a thin wrapper around `std::env::var` that provides a more
/// ergonomic and specific error type for missing variables.
///
/// # Arguments
/// * `name` - The name of the environment variable to read.
pub fn get_env_var(name: &str) -> Result<String, MissingEnvVarError> {
    std::env::var(name).map_err(|_| MissingEnvVarError(name.to_string()))
}

/// Reads an optional environment variable.
///
/// Unset, non-unicode and whitespace-only values are all reported as `None`,
/// so CI runners that export an empty variable behave like ones that don't
/// export it at all.
pub fn get_env_var_opt(name: &str) -> Option<String> {
    get_env_var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolves a directory from an environment variable, falling back to `default`.
pub fn dir_from_env_or(name: &str, default: impl Into<PathBuf>) -> PathBuf {
    get_env_var_opt(name)
        .map(PathBuf::from)
        .unwrap_or_else(|| default.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VAR: &str = "SHARED_UTILS_TEST_DIR";

    #[test]
    #[serial]
    fn missing_var_reports_its_name() {
        unsafe { std::env::remove_var(VAR) };
        let err = get_env_var(VAR).unwrap_err();
        assert_eq!(err.to_string(), format!("Missing environment variable: {VAR}"));
    }

    #[test]
    #[serial]
    fn blank_var_is_treated_as_unset() {
        unsafe { std::env::set_var(VAR, "   ") };
        assert_eq!(get_env_var_opt(VAR), None);
        assert_eq!(dir_from_env_or(VAR, "."), PathBuf::from("."));
        unsafe { std::env::remove_var(VAR) };
    }

    #[test]
    #[serial]
    fn dir_comes_from_env_when_set() {
        unsafe { std::env::set_var(VAR, "/srv/workspace") };
        assert_eq!(dir_from_env_or(VAR, "."), PathBuf::from("/srv/workspace"));
        unsafe { std::env::remove_var(VAR) };
    }
}
