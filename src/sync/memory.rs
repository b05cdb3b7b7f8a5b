use crate::model::SyncError;
use crate::sync::RoomStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Process-local room store, for offline sessions and tests.
#[derive(Default)]
pub struct MemoryRoomStore {
    rooms: Mutex<HashMap<String, Value>>,
    writes: AtomicUsize,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes so far, across all rooms.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RoomStore for MemoryRoomStore {
    async fn write_room(&self, room: &str, body: Value) -> Result<(), SyncError> {
        self.rooms.lock().await.insert(room.to_string(), body);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn read_room(&self, room: &str) -> Result<Option<Value>, SyncError> {
        Ok(self.rooms.lock().await.get(room).cloned())
    }
}
