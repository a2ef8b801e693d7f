//! Integration tests for the logging system

use core_runtime::logging::{redact_if_sensitive, LogFormat, LogLevel, LoggingConfig};

#[test]
fn test_logging_configuration() {
    // The global subscriber can only be installed once per process, so the
    // integration surface under test is the config builder.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Debug)
        .with_target(false);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Debug);
    assert!(!config.display_target);
}

#[test]
fn test_redaction_of_credentials() {
    assert_eq!(
        redact_if_sensitive("access_token", "sensitive_access_token"),
        "[REDACTED]"
    );
    assert_eq!(redact_if_sensitive("password", "my_password"), "[REDACTED]");
    assert_eq!(
        redact_if_sensitive("client_secret", "s3cr3t"),
        "[REDACTED]"
    );
}

#[test]
fn test_redaction_of_account_names() {
    let redacted = redact_if_sensitive("user", "librarian@example.com");
    assert!(redacted.starts_with('l'));
    assert!(redacted.contains("[REDACTED]"));
    assert!(!redacted.contains("example.com"));
}

#[test]
fn test_normal_values_pass_through() {
    assert_eq!(redact_if_sensitive("attempt_id", "12345"), "12345");
    assert_eq!(redact_if_sensitive("title", "field notes"), "field notes");
    assert_eq!(
        redact_if_sensitive("file_path", "/data/scan/page1.jpg"),
        "/data/scan/page1.jpg"
    );
}
