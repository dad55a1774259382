use serde::Serialize;
use serde::de::DeserializeOwned;

/// Maximum encoded snapshot or input size in bytes.
pub const MAX_SNAPSHOT_SIZE: usize = 64 * 1024; // 64 KiB

#[derive(Debug)]
pub enum SnapshotError {
    Empty,
    PayloadTooLarge(usize),
    SerializeError(String),
    DeserializeError(String),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty payload"),
            Self::PayloadTooLarge(size) => {
                write!(
                    f,
                    "payload too large: {size} bytes (max {MAX_SNAPSHOT_SIZE})"
                )
            },
            Self::SerializeError(e) => write!(f, "serialize error: {e}"),
            Self::DeserializeError(e) => write!(f, "deserialize error: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Encode a value as MessagePack.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, SnapshotError> {
    let bytes =
        rmp_serde::to_vec(value).map_err(|e| SnapshotError::SerializeError(e.to_string()))?;
    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(SnapshotError::PayloadTooLarge(bytes.len()));
    }
    Ok(bytes)
}

/// Decode a MessagePack payload produced by [`encode`].
pub fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, SnapshotError> {
    if data.is_empty() {
        return Err(SnapshotError::Empty);
    }
    if data.len() > MAX_SNAPSHOT_SIZE {
        return Err(SnapshotError::PayloadTooLarge(data.len()));
    }
    rmp_serde::from_slice(data).map_err(|e| SnapshotError::DeserializeError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ShotResult;

    #[test]
    fn decode_rejects_empty() {
        let r: Result<ShotResult, _> = decode(&[]);
        assert!(matches!(r, Err(SnapshotError::Empty)));
    }

    #[test]
    fn decode_rejects_garbage() {
        let r: Result<ShotResult, _> = decode(&[0xc1, 0x00, 0xff]);
        assert!(matches!(r, Err(SnapshotError::DeserializeError(_))));
    }

    #[test]
    fn decode_rejects_oversized() {
        let data = vec![0u8; MAX_SNAPSHOT_SIZE + 1];
        let r: Result<ShotResult, _> = decode(&data);
        assert!(matches!(r, Err(SnapshotError::PayloadTooLarge(_))));
    }

    #[test]
    fn encoded_result_decodes() {
        let original = ShotResult::new(30, "Red Zone", "red");
        let bytes = encode(&original).unwrap();
        let decoded: ShotResult = decode(&bytes).unwrap();
        assert_eq!(decoded, original);
    }
}
