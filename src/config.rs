//! Runtime settings read from environment variables.
//!
//! The server binary exports its command line flags into the environment at startup, so every
//! value here has a single source regardless of how it was provided.

use itertools::Itertools;
use std::path::PathBuf;

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const JWT_SECRET_KEY_ENV: &str = "JWT_SECRET_KEY";
pub const UPLOAD_DIR_ENV: &str = "UPLOAD_DIR";
pub const STATIC_DIR_ENV: &str = "STATIC_DIR";
pub const PUBLIC_BASE_URL_ENV: &str = "PUBLIC_BASE_URL";
pub const CORS_ORIGINS_ENV: &str = "CORS_ORIGINS";

pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:3000",
    "https://gastronomi.id",
];

fn non_empty_env(key: &str) -> Option<String> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

pub fn jwt_secret_key() -> Option<String> {
    non_empty_env(JWT_SECRET_KEY_ENV)
}

/// Root directory for user uploads, served under `/uploads`.
pub fn upload_dir() -> PathBuf {
    PathBuf::from(non_empty_env(UPLOAD_DIR_ENV).unwrap_or(DEFAULT_UPLOAD_DIR.to_string()))
}

/// Root directory for static assets, served under `/static`.
pub fn static_dir() -> PathBuf {
    PathBuf::from(non_empty_env(STATIC_DIR_ENV).unwrap_or(DEFAULT_STATIC_DIR.to_string()))
}

pub fn public_base_url() -> String {
    normalize_base_url(non_empty_env(PUBLIC_BASE_URL_ENV))
}

fn normalize_base_url(value: Option<String>) -> String {
    value
        .unwrap_or(DEFAULT_PUBLIC_BASE_URL.to_string())
        .trim_end_matches('/')
        .to_string()
}

/// Check a base url before exporting it, e.g. `http://example.com:8000`.
pub fn validate_base_url(value: &str) -> Result<(), String> {
    let parsed = url::Url::parse(value).map_err(|e| format!("Invalid url {}: {}", value, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("Unsupported url scheme: {}", other)),
    }
}

pub fn cors_origins() -> Vec<String> {
    parse_cors_origins(non_empty_env(CORS_ORIGINS_ENV))
}

fn parse_cors_origins(value: Option<String>) -> Vec<String> {
    match value {
        Some(v) => v
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unique()
            .collect(),
        None => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
    }
}

/// Public URL of a stored upload given its relative path such as `classes/1700000000_ab12cd34.jpg`.
pub fn upload_url(relative_path: &str) -> String {
    join_url(&public_base_url(), "uploads", relative_path)
}

fn join_url(base: &str, mount: &str, relative_path: &str) -> String {
    let encoded = relative_path
        .trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .join("/");
    format!("{}/{}/{}", base, mount, encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url(None), "http://localhost:3000");
        assert_eq!(
            normalize_base_url(Some("https://api.gastronomi.id/".to_string())),
            "https://api.gastronomi.id"
        );
    }

    #[test]
    fn test_validate_base_url() {
        assert!(validate_base_url("http://localhost:3000").is_ok());
        assert!(validate_base_url("https://api.gastronomi.id").is_ok());
        assert!(validate_base_url("ftp://files.gastronomi.id").is_err());
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn test_parse_cors_origins() {
        assert_eq!(parse_cors_origins(None).len(), 3);
        let origins = parse_cors_origins(Some(
            " https://a.example/, https://b.example,,https://a.example".to_string(),
        ));
        assert_eq!(origins, vec!["https://a.example", "https://b.example"]);
    }

    #[test]
    fn test_join_url_encodes_segments() {
        assert_eq!(
            join_url("http://localhost:3000", "uploads", "gallery/my photo.jpg"),
            "http://localhost:3000/uploads/gallery/my%20photo.jpg"
        );
        assert_eq!(
            join_url("http://localhost:3000", "uploads", "/slider/a.jpg"),
            "http://localhost:3000/uploads/slider/a.jpg"
        );
    }
}
