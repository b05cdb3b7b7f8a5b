// Room session: debounced pushes of local edits, polling for remote ones,
// and a short cool-down after a remote update so it is not echoed back.
use crate::config::SyncConfig;
use crate::model::SyncError;
use crate::storage::Document;
use crate::sync::keys::{restore_keys, sanitize_keys};
use crate::sync::{generate_room_code, normalize_room_code, RoomStore};
use chrono::Utc;
use futures::stream::{self, Stream};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Default)]
struct SessionState {
    /// Local pushes are dropped until this instant.
    suppress_until: Option<Instant>,
    pending: Option<JoinHandle<()>>,
    /// `updatedAt` of our own latest write.
    own_stamp: Option<i64>,
}

impl SessionState {
    fn suppressed(&self) -> bool {
        self.suppress_until.is_some_and(|until| Instant::now() < until)
    }
}

pub struct SyncSession<S: RoomStore + 'static> {
    store: Arc<S>,
    room: String,
    debounce: Duration,
    echo_cooldown: Duration,
    poll_interval: Duration,
    state: Arc<Mutex<SessionState>>,
}

async fn push<S: RoomStore + ?Sized>(
    store: &S,
    room: &str,
    state: &Mutex<SessionState>,
    doc: &Document,
) -> Result<(), SyncError> {
    let mut outgoing = doc.stripped_for_persistence();
    let stamp = Utc::now().timestamp_millis();
    outgoing.updated_at = Some(stamp);
    let body = sanitize_keys(serde_json::to_value(&outgoing)?);

    state.lock().await.own_stamp = Some(stamp);
    store.write_room(room, body).await?;
    info!("📤 Pushed {} offers to room {}", outgoing.offers.len(), room);
    Ok(())
}

impl<S: RoomStore + 'static> SyncSession<S> {
    /// Opens a fresh room with a random code.
    pub async fn create(store: Arc<S>, config: &SyncConfig, local: &Document) -> Result<Self, SyncError> {
        Self::join(store, &generate_room_code(), config, local).await
    }

    /// Joins `code`. Local offers, if any, are pushed right away.
    pub async fn join(
        store: Arc<S>,
        code: &str,
        config: &SyncConfig,
        local: &Document,
    ) -> Result<Self, SyncError> {
        let room = normalize_room_code(code)?;
        let session = Self {
            store,
            room,
            debounce: Duration::from_millis(config.debounce_ms),
            echo_cooldown: Duration::from_millis(config.echo_cooldown_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            state: Arc::new(Mutex::new(SessionState::default())),
        };
        info!("🔗 Connected to room {}", session.room);
        if !local.offers.is_empty() {
            session.push_now(local).await?;
        }
        Ok(session)
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    /// Writes `doc` immediately, bypassing the debounce.
    pub async fn push_now(&self, doc: &Document) -> Result<(), SyncError> {
        push(self.store.as_ref(), &self.room, &self.state, doc).await
    }

    /// Queues `doc` for writing after the debounce delay. A newer call
    /// replaces a queued one. Ignored during the echo cool-down.
    pub async fn schedule_push(&self, doc: Document) {
        let mut state = self.state.lock().await;
        if state.suppressed() {
            debug!("Skipping push during remote cool-down");
            return;
        }
        if let Some(pending) = state.pending.take() {
            pending.abort();
        }

        let store = Arc::clone(&self.store);
        let shared = Arc::clone(&self.state);
        let room = self.room.clone();
        let debounce = self.debounce;
        state.pending = Some(tokio::spawn(async move {
            sleep(debounce).await;
            let suppressed = shared.lock().await.suppressed();
            if suppressed {
                debug!("Dropping queued push after remote update");
                return;
            }
            if let Err(e) = push(store.as_ref(), &room, &shared, &doc).await {
                error!("Room write failed: {}", e);
            }
        }));
    }

    /// Waits for a queued push to finish.
    pub async fn flush(&self) {
        let pending = self.state.lock().await.pending.take();
        if let Some(handle) = pending {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    error!("Queued push panicked: {}", e);
                }
            }
        }
    }

    /// Remote snapshots as they change. Our own writes are not reported.
    /// Each yielded snapshot starts the echo cool-down and cancels any
    /// queued local push.
    pub fn subscribe(&self) -> impl Stream<Item = Document> + Send + use<S> {
        let poller = RoomPoller {
            store: Arc::clone(&self.store),
            room: self.room.clone(),
            state: Arc::clone(&self.state),
            interval: self.poll_interval,
            echo_cooldown: self.echo_cooldown,
            last_seen: None,
            started: false,
        };
        stream::unfold(poller, |mut poller| async move {
            let doc = poller.next_snapshot().await;
            Some((doc, poller))
        })
    }

    /// Leaves the room; a queued push is discarded.
    pub async fn disconnect(self) {
        if let Some(pending) = self.state.lock().await.pending.take() {
            pending.abort();
        }
        info!("🔌 Left room {}", self.room);
    }
}

struct RoomPoller<S: RoomStore + 'static> {
    store: Arc<S>,
    room: String,
    state: Arc<Mutex<SessionState>>,
    interval: Duration,
    echo_cooldown: Duration,
    last_seen: Option<Value>,
    started: bool,
}

impl<S: RoomStore + 'static> RoomPoller<S> {
    async fn next_snapshot(&mut self) -> Document {
        loop {
            if self.started {
                sleep(self.interval).await;
            }
            self.started = true;

            let raw = match self.store.read_room(&self.room).await {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Room read failed: {}", e);
                    continue;
                }
            };
            if self.last_seen.as_ref() == Some(&raw) {
                continue;
            }
            self.last_seen = Some(raw.clone());

            let doc = match Document::from_remote(restore_keys(raw)) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("Ignoring malformed room snapshot: {}", e);
                    continue;
                }
            };

            let mut state = self.state.lock().await;
            if doc.updated_at.is_some() && doc.updated_at == state.own_stamp {
                continue;
            }
            state.suppress_until = Some(Instant::now() + self.echo_cooldown);
            if let Some(pending) = state.pending.take() {
                pending.abort();
            }
            debug!("Remote update with {} offers in room {}", doc.offers.len(), self.room);
            return doc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::ParameterRanges;
    use crate::sync::MemoryRoomStore;
    use futures::StreamExt;
    use serde_json::json;

    fn config() -> SyncConfig {
        SyncConfig {
            poll_interval_ms: 10,
            debounce_ms: 30,
            echo_cooldown_ms: 200,
            ..SyncConfig::default()
        }
    }

    fn doc(ids: &[&str]) -> Document {
        let offers = ids
            .iter()
            .map(|id| serde_json::from_value(json!({"id": id, "name": id})).unwrap())
            .collect();
        Document::new(offers, ParameterRanges::default())
    }

    #[tokio::test]
    async fn joining_with_local_offers_pushes_them() {
        let store = Arc::new(MemoryRoomStore::new());
        let session = SyncSession::join(store.clone(), " ROOM42 ", &config(), &doc(&["a"]))
            .await
            .unwrap();
        assert_eq!(session.room(), "room42");
        assert_eq!(store.write_count(), 1);
        let stored = store.read_room("room42").await.unwrap().unwrap();
        assert!(stored["updatedAt"].is_i64());

        let empty = SyncSession::create(store.clone(), &config(), &Document::default())
            .await
            .unwrap();
        assert_eq!(empty.room().len(), 6);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn pushes_are_debounced() {
        let store = Arc::new(MemoryRoomStore::new());
        let session = SyncSession::join(store.clone(), "abcd", &config(), &Document::default())
            .await
            .unwrap();
        session.schedule_push(doc(&["a"])).await;
        session.schedule_push(doc(&["a", "b"])).await;
        session.schedule_push(doc(&["a", "b", "c"])).await;
        assert_eq!(store.write_count(), 0);
        session.flush().await;
        assert_eq!(store.write_count(), 1);
        let stored = store.read_room("abcd").await.unwrap().unwrap();
        assert_eq!(stored["offers"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn remote_updates_are_not_echoed() {
        let store = Arc::new(MemoryRoomStore::new());
        let session = SyncSession::join(store.clone(), "abcd", &config(), &doc(&["mine"]))
            .await
            .unwrap();
        let mut updates = Box::pin(session.subscribe());

        // Someone else writes the room.
        let mut remote = doc(&["theirs"]);
        remote.updated_at = Some(1);
        let body = sanitize_keys(serde_json::to_value(&remote).unwrap());
        store.write_room("abcd", body).await.unwrap();

        let received = updates.next().await.unwrap();
        assert_eq!(received.offers[0].id, "theirs");

        let writes = store.write_count();
        session.schedule_push(received.clone()).await;
        session.flush().await;
        assert_eq!(store.write_count(), writes);
    }

    #[tokio::test]
    async fn own_writes_are_not_reported() {
        let store = Arc::new(MemoryRoomStore::new());
        let session = SyncSession::join(store.clone(), "abcd", &config(), &doc(&["mine"]))
            .await
            .unwrap();
        let mut updates = Box::pin(session.subscribe());
        let next = tokio::time::timeout(Duration::from_millis(100), updates.next()).await;
        assert!(next.is_err());
        session.disconnect().await;
    }
}
