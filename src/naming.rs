//! Resource naming policy.
//!
//! Labels are the user-facing tags attached to resources; names are the
//! provider-side identifiers CloudBridge generates from them. Both must be
//! 3 to 63 characters, start with a lowercase letter, end with a lowercase
//! letter or digit, and contain only lowercase letters, digits and dashes.

use crate::error::{CloudError, CloudResult, ErrorKind};
use regex::Regex;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU32, Ordering};
use uuid::Uuid;

static RESOURCE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][-a-z0-9]{1,61}[a-z0-9]$").expect("valid name regex"));

static BUCKET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][-.a-z0-9]{1,61}[a-z0-9]$").expect("valid bucket regex")
});

const SUFFIX_LEN: usize = 6;
const MAX_NAME_LEN: usize = 63;

/// Suffixes are a bijection of this counter over 24 bits, offset by a per-process
/// random seed, so the first 2^24 names of a process never repeat.
static SUFFIX_COUNTER: AtomicU32 = AtomicU32::new(0);
static SUFFIX_SEED: LazyLock<u32> = LazyLock::new(|| {
    let bytes = Uuid::new_v4().into_bytes();
    u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]])
});
const SUFFIX_MASK: u32 = 0x00ff_ffff;
const SUFFIX_STRIDE: u32 = 0x009e_3779;

const POLICY: &str = "must be 3-63 characters long, start with a lowercase letter, \
     end with a lowercase letter or digit, and contain only lowercase letters, digits and dashes";

#[must_use]
pub fn is_valid_label(label: &str) -> bool {
    RESOURCE_NAME.is_match(label)
}

/// # Errors
///
/// Returns `InvalidLabel` if `label` breaks the naming policy.
pub fn assert_valid_label(label: &str) -> CloudResult<()> {
    if is_valid_label(label) {
        Ok(())
    } else {
        Err(CloudError::new(
            ErrorKind::InvalidLabel,
            format!("Invalid label {label:?}: labels {POLICY}"),
        ))
    }
}

/// # Errors
///
/// Returns `InvalidName` if `name` breaks the naming policy.
pub fn assert_valid_name(name: &str) -> CloudResult<()> {
    if RESOURCE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(CloudError::new(
            ErrorKind::InvalidName,
            format!("Invalid name {name:?}: names {POLICY}"),
        ))
    }
}

/// Bucket names additionally allow dots and a leading digit.
///
/// # Errors
///
/// Returns `InvalidName` if `name` is not a valid bucket name.
pub fn assert_valid_bucket_name(name: &str) -> CloudResult<()> {
    if BUCKET_NAME.is_match(name) && !name.contains("..") {
        Ok(())
    } else {
        Err(CloudError::new(
            ErrorKind::InvalidName,
            format!(
                "Invalid bucket name {name:?}: bucket names must be 3-63 characters of \
                 lowercase letters, digits, dots and dashes, starting and ending with a letter or digit"
            ),
        ))
    }
}

/// Build a unique provider-side name from an optional label.
///
/// The result is `"{label}-{suffix}"`, or `"{default_prefix}-{suffix}"` without a
/// label, where the suffix is six hex digits.
///
/// # Errors
///
/// Returns `InvalidLabel` if the label is invalid, or `InvalidName` if the
/// prefix cannot form a valid name.
pub fn generate_name(label: Option<&str>, default_prefix: &str) -> CloudResult<String> {
    let base = match label {
        Some(label) => {
            assert_valid_label(label)?;
            label
        }
        None => default_prefix,
    };

    let keep = MAX_NAME_LEN - SUFFIX_LEN - 1;
    let base = base.get(..keep).unwrap_or(base).trim_end_matches('-');
    let name = format!("{base}-{}", unique_suffix());
    assert_valid_name(&name)?;
    Ok(name)
}

fn unique_suffix() -> String {
    let n = SUFFIX_COUNTER.fetch_add(1, Ordering::Relaxed);
    let value = n.wrapping_mul(SUFFIX_STRIDE).wrapping_add(*SUFFIX_SEED) & SUFFIX_MASK;
    hex::encode(&value.to_be_bytes()[1..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_valid_labels() {
        assert!(is_valid_label("web-server-1"));
        assert!(is_valid_label("abc"));
        assert!(!is_valid_label("ab"));
        assert!(!is_valid_label("1abc"));
        assert!(!is_valid_label("ends-with-"));
        assert!(!is_valid_label("Upper"));
        assert!(!is_valid_label("has_underscore"));
        assert!(!is_valid_label(&"a".repeat(64)));
        assert!(is_valid_label(&"a".repeat(63)));
    }

    #[test]
    fn test_assert_kinds() {
        assert_eq!(
            assert_valid_label("No").unwrap_err().kind,
            ErrorKind::InvalidLabel
        );
        assert_eq!(
            assert_valid_name("No").unwrap_err().kind,
            ErrorKind::InvalidName
        );
    }

    #[test]
    fn test_bucket_names() {
        assert!(assert_valid_bucket_name("my.bucket-01").is_ok());
        assert!(assert_valid_bucket_name("0data").is_ok());
        assert!(assert_valid_bucket_name("a..b").is_err());
        assert!(assert_valid_bucket_name("-bad").is_err());
    }

    #[test]
    fn test_generate_name() {
        let name = generate_name(Some("web"), "cb-inst").unwrap();
        assert!(name.starts_with("web-"));
        assert_eq!(name.len(), "web-".len() + 6);

        let unlabeled = generate_name(None, "cb-vol").unwrap();
        assert!(unlabeled.starts_with("cb-vol-"));

    }

    #[test]
    fn test_generated_names_do_not_repeat() {
        let names: HashSet<String> = (0..20_000)
            .map(|_| generate_name(None, "cb-vol").unwrap())
            .collect();
        assert_eq!(names.len(), 20_000);
        assert!(names.iter().all(|name| is_valid_label(name)));
    }

    #[test]
    fn test_generate_name_long_label() {
        let name = generate_name(Some(&"x".repeat(63)), "cb").unwrap();
        assert_eq!(name.len(), 63);
    }

    #[test]
    fn test_generate_name_bad_label() {
        let err = generate_name(Some("Bad Label"), "cb").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidLabel);
    }
}
