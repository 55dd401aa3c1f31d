//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

/// Strip everything but ASCII digits
pub fn clean_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Check whether a value is an 8-digit CEP after cleaning
pub fn is_valid_cep_format(value: &str) -> bool {
    clean_digits(value).len() == 8
}

/// Format a CEP as 00000-000
pub fn format_cep(value: &str) -> String {
    let cleaned = clean_digits(value);
    if cleaned.len() <= 5 {
        return cleaned;
    }
    format!("{}-{}", &cleaned[..5], &cleaned[5..cleaned.len().min(8)])
}

/// Generate a unique certificate code: base-36 timestamp plus a random suffix
pub fn generate_certificate_code() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| char::from_digit(rng.gen_range(0..36), 36).unwrap_or('0'))
        .collect();
    format!("{}-{}", to_base36(millis), suffix).to_uppercase()
}

/// Generate a collision-free stored file name, preserving the extension
pub fn unique_file_name(extension: &str) -> String {
    format!("{}.{}", Uuid::new_v4().simple(), extension.to_lowercase())
}

/// Lowercased extension of an uploaded file name, if any
pub fn file_extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(char::from_digit((n % 36) as u32, 36).unwrap_or('0'));
        n /= 36;
    }
    out.iter().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_digits() {
        assert_eq!(clean_digits("01310-100"), "01310100");
        assert_eq!(clean_digits("abc"), "");
    }

    #[test]
    fn test_cep_format_validation() {
        assert!(is_valid_cep_format("01310-100"));
        assert!(is_valid_cep_format("01310100"));
        assert!(!is_valid_cep_format("0131010"));
        assert!(!is_valid_cep_format("013101000"));
    }

    #[test]
    fn test_format_cep() {
        assert_eq!(format_cep("01310100"), "01310-100");
        assert_eq!(format_cep("013"), "013");
    }

    #[test]
    fn test_certificate_code_shape() {
        let code = generate_certificate_code();
        assert!(code.contains('-'));
        assert!(code.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-'));
    }

    #[test]
    fn test_certificate_codes_are_unique() {
        let a = generate_certificate_code();
        let b = generate_certificate_code();
        assert_ne!(a, b);
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("scan.PDF"), Some("pdf".to_string()));
        assert_eq!(file_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn test_unique_file_name_keeps_extension() {
        let name = unique_file_name("PNG");
        assert!(name.ends_with(".png"));
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
