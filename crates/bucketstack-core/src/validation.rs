//! Bucket name validation.
//!
//! Follows the rules defined in the
//! [Amazon S3 documentation](https://docs.aws.amazon.com/AmazonS3/latest/userguide/bucketnamingrules.html).

use std::net::Ipv4Addr;

use crate::error::ProvisionError;

/// Minimum bucket name length.
const MIN_BUCKET_NAME_LEN: usize = 3;

/// Maximum bucket name length.
const MAX_BUCKET_NAME_LEN: usize = 63;

fn invalid(name: &str, reason: impl Into<String>) -> ProvisionError {
    ProvisionError::InvalidName {
        name: name.to_owned(),
        reason: reason.into(),
    }
}

/// Validate an S3 bucket name.
///
/// Rules (per AWS documentation):
/// - 3-63 characters long
/// - Only lowercase letters, numbers, hyphens, and dots
/// - Must start and end with a letter or number
/// - No consecutive dots (`..`)
/// - Not formatted as an IPv4 address (e.g. `192.168.0.1`)
/// - Must not start with `xn--`
/// - Must not end with `-s3alias`
/// - Must not start with `sthree-`
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidName`] if any rule is violated.
///
/// # Examples
///
/// ```
/// use bucketstack_core::validation::validate_bucket_name;
///
/// assert!(validate_bucket_name("acme-dev-assets-bucket").is_ok());
/// assert!(validate_bucket_name("AB").is_err());
/// ```
pub fn validate_bucket_name(name: &str) -> Result<(), ProvisionError> {
    let len = name.len();

    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&len) {
        return Err(invalid(
            name,
            format!(
                "Bucket name must be between {MIN_BUCKET_NAME_LEN} and {MAX_BUCKET_NAME_LEN} characters long"
            ),
        ));
    }

    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
    {
        return Err(invalid(
            name,
            "Bucket name must only contain lowercase letters, numbers, hyphens, and dots",
        ));
    }

    let first = name.as_bytes()[0];
    let last = name.as_bytes()[len - 1];
    if !(first.is_ascii_lowercase() || first.is_ascii_digit())
        || !(last.is_ascii_lowercase() || last.is_ascii_digit())
    {
        return Err(invalid(
            name,
            "Bucket name must start and end with a letter or number",
        ));
    }

    if name.contains("..") {
        return Err(invalid(name, "Bucket name must not contain consecutive dots"));
    }

    if name.parse::<Ipv4Addr>().is_ok() {
        return Err(invalid(
            name,
            "Bucket name must not be formatted as an IP address",
        ));
    }

    if name.starts_with("xn--") {
        return Err(invalid(name, "Bucket name must not start with 'xn--'"));
    }

    if name.ends_with("-s3alias") {
        return Err(invalid(name, "Bucket name must not end with '-s3alias'"));
    }

    if name.starts_with("sthree-") {
        return Err(invalid(name, "Bucket name must not start with 'sthree-'"));
    }

    Ok(())
}

/// Validate one user-supplied segment of the composed bucket name `name`.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidName`] if the segment is empty.
pub fn validate_name_segment(name: &str, field: &str, value: &str) -> Result<(), ProvisionError> {
    if value.is_empty() {
        return Err(invalid(name, format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_accept_valid_bucket_names() {
        let long_name = "a".repeat(63);
        let valid = [
            "my-bucket",
            "abc",
            "a-b-c",
            "bucket.with.dots",
            "123bucket",
            "acme-dev-assets-bucket",
            long_name.as_str(),
        ];
        for name in valid {
            assert!(validate_bucket_name(name).is_ok(), "expected valid: {name}");
        }
    }

    #[test]
    fn test_should_reject_short_bucket_name() {
        assert!(validate_bucket_name("ab").is_err());
        assert!(validate_bucket_name("").is_err());
    }

    #[test]
    fn test_should_reject_long_bucket_name() {
        let name = "a".repeat(64);
        assert!(validate_bucket_name(&name).is_err());
    }

    #[test]
    fn test_should_reject_disallowed_characters() {
        assert!(validate_bucket_name("MyBucket").is_err());
        assert!(validate_bucket_name("my_bucket").is_err());
        assert!(validate_bucket_name("[stack prefix name]-bucket").is_err());
    }

    #[test]
    fn test_should_reject_bucket_with_bad_edges() {
        assert!(validate_bucket_name("-bucket").is_err());
        assert!(validate_bucket_name("bucket-").is_err());
    }

    #[test]
    fn test_should_reject_reserved_forms() {
        assert!(validate_bucket_name("my..bucket").is_err());
        assert!(validate_bucket_name("192.168.1.1").is_err());
        assert!(validate_bucket_name("xn--example").is_err());
        assert!(validate_bucket_name("mybucket-s3alias").is_err());
        assert!(validate_bucket_name("sthree-bucket").is_err());
    }

    #[test]
    fn test_should_report_violated_rule() {
        let err = validate_bucket_name("My-Bucket").unwrap_err();
        match err {
            ProvisionError::InvalidName { name, reason } => {
                assert_eq!(name, "My-Bucket");
                assert!(reason.contains("lowercase"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_should_reject_empty_segment() {
        let err = validate_name_segment("acme-dev--bucket", "BUCKET_NAME", "").unwrap_err();
        assert!(err.to_string().contains("BUCKET_NAME must not be empty"));
        assert!(validate_name_segment("acme-dev-assets-bucket", "BUCKET_NAME", "assets").is_ok());
    }
}
