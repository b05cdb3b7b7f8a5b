// Live room sharing over a realtime key/value store.

pub mod firebase;
pub mod keys;
pub mod memory;
pub mod session;

use crate::model::SyncError;
use rand::Rng;
use serde_json::Value;

pub use firebase::FirebaseRoomStore;
pub use memory::MemoryRoomStore;
pub use session::SyncSession;

/// Room code characters; look-alikes (i, l, o, 0, 1) are left out.
pub const ROOM_ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";
pub const ROOM_CODE_LEN: usize = 6;
/// Shortest code accepted when joining.
pub const MIN_ROOM_CODE_LEN: usize = 4;

pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_ALPHABET[rng.random_range(0..ROOM_ALPHABET.len())] as char)
        .collect()
}

/// Trims and lowercases a typed room code.
pub fn normalize_room_code(code: &str) -> Result<String, SyncError> {
    let code = code.trim().to_lowercase();
    if code.chars().count() < MIN_ROOM_CODE_LEN {
        return Err(SyncError::InvalidRoomCode(code));
    }
    Ok(code)
}

/// Whole-document storage for one room. Bodies are already key-sanitized.
#[async_trait::async_trait]
pub trait RoomStore: Send + Sync {
    async fn write_room(&self, room: &str, body: Value) -> Result<(), SyncError>;
    /// `None` when the room has never been written.
    async fn read_room(&self, room: &str) -> Result<Option<Value>, SyncError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_codes_use_alphabet() {
        let code = generate_room_code();
        assert_eq!(code.len(), ROOM_CODE_LEN);
        assert!(code.bytes().all(|b| ROOM_ALPHABET.contains(&b)));
    }

    #[test]
    fn join_codes_are_normalized() {
        assert_eq!(normalize_room_code("  AbCd7 ").unwrap(), "abcd7");
        assert!(matches!(
            normalize_room_code(" ab "),
            Err(SyncError::InvalidRoomCode(_))
        ));
    }
}
