use crate::TransferError;

/// Validates a client-supplied content hash before it is used as a file name
/// under the storage root.
///
/// The key becomes a path component, so anything but plain lowercase hex is
/// rejected: empty strings, separators, `..`, uppercase, non-hex bytes.
pub fn validate_content_key(key: &str) -> Result<(), TransferError> {
    if key.is_empty() {
        return Err(TransferError::InvalidKey("empty content key".into()));
    }

    if !key
        .bytes()
        .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    {
        return Err(TransferError::InvalidKey(format!(
            "content key is not lowercase hex: {key}"
        )));
    }

    Ok(())
}
