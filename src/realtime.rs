use crate::api::{PushHandler, PushTransport, Subscription};
use crate::models::{PushStatus, Scope};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use uuid::Uuid;

pub fn room_topic(room_id: i64) -> String {
    format!("/topic/room/{}", room_id)
}

type InvalidateFn = Arc<dyn Fn() + Send + Sync>;

struct ActiveSubscription {
    id: Uuid,
    room_id: i64,
    handle: Box<dyn Subscription>,
}

/// Keeps one live subscription to the active room's update topic and turns
/// every signal into a reload of the current view query. The payload is never
/// interpreted; a signal only means "something changed".
///
/// Handlers are guarded by a generation counter bumped on every scope change,
/// so a signal delivered for a scope that is no longer current is ignored
/// even if the transport has not processed the unsubscribe yet.
#[derive(Clone)]
pub struct InvalidationListener {
    transport: Arc<dyn PushTransport>,
    status: Arc<StdMutex<PushStatus>>,
    active: Arc<Mutex<Option<ActiveSubscription>>>,
    generation: Arc<AtomicU64>,
}

impl InvalidationListener {
    pub fn new(transport: Arc<dyn PushTransport>) -> Self {
        Self {
            transport,
            status: Arc::new(StdMutex::new(PushStatus::Unsubscribed)),
            active: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn status(&self) -> PushStatus {
        *self.status.lock().expect("push status lock")
    }

    fn set_status(&self, status: PushStatus) {
        tracing::debug!(status = status.as_str(), "push status changed");
        *self.status.lock().expect("push status lock") = status;
    }

    /// Moves the subscription to the given scope. The personal scope has no
    /// update channel, so it simply tears down.
    ///
    /// A subscription failure degrades: it is logged and surfaced through
    /// `status()`, while manual reloads and mutations stay available.
    pub async fn rescope(&self, scope: Scope, on_invalidate: InvalidateFn) {
        // Bump first: in-flight signals for the previous scope go stale
        // before the old handle is even released.
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            tracing::debug!(
                subscription = %previous.id,
                room_id = previous.room_id,
                "unsubscribing from previous scope"
            );
            previous.handle.unsubscribe().await;
        }

        let Some(room_id) = scope.room_id() else {
            self.set_status(PushStatus::Unsubscribed);
            return;
        };

        self.set_status(PushStatus::Subscribing);
        let current_generation = self.generation.clone();
        let handler: PushHandler = Arc::new(move |_payload: &str| {
            if current_generation.load(Ordering::SeqCst) != generation {
                tracing::debug!(room_id, "ignoring invalidation signal for a superseded scope");
                return;
            }
            on_invalidate();
        });

        match self.transport.subscribe(&room_topic(room_id), handler).await {
            Ok(handle) => {
                let id = Uuid::new_v4();
                tracing::debug!(subscription = %id, room_id, "room subscription established");
                *active = Some(ActiveSubscription { id, room_id, handle });
                self.set_status(PushStatus::Subscribed);
            }
            Err(err) => {
                tracing::warn!(room_id, error = %err, "room subscription failed");
                self.set_status(PushStatus::Failed);
            }
        }
    }

    pub async fn shutdown(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            previous.handle.unsubscribe().await;
        }
        self.set_status(PushStatus::Unsubscribed);
    }
}

#[cfg(test)]
mod tests {
    use super::{room_topic, InvalidationListener};
    use crate::api::{ApiError, ApiResult, PushHandler, PushTransport, Subscription};
    use crate::models::{PushStatus, Scope};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    struct FakeSubscription {
        alive: Arc<AtomicBool>,
    }

    #[async_trait]
    impl Subscription for FakeSubscription {
        async fn unsubscribe(&self) {
            self.alive.store(false, Ordering::SeqCst);
        }
    }

    /// Records every subscription and lets tests deliver signals, including
    /// deliberately to handlers that were already unsubscribed.
    #[derive(Default)]
    struct FakeTransport {
        handlers: Mutex<Vec<(String, PushHandler, Arc<AtomicBool>)>>,
        fail_next: AtomicBool,
    }

    impl FakeTransport {
        fn emit(&self, topic: &str) {
            let handlers = self.handlers.lock().expect("handlers lock");
            for (registered, handler, alive) in handlers.iter() {
                if registered == topic && alive.load(Ordering::SeqCst) {
                    handler("UPDATE");
                }
            }
        }

        fn emit_ignoring_unsubscribe(&self, topic: &str) {
            let handlers = self.handlers.lock().expect("handlers lock");
            for (registered, handler, _) in handlers.iter() {
                if registered == topic {
                    handler("UPDATE");
                }
            }
        }
    }

    #[async_trait]
    impl PushTransport for FakeTransport {
        async fn subscribe(&self, topic: &str, handler: PushHandler) -> ApiResult<Box<dyn Subscription>> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                return Err(ApiError::Network("broker unreachable".to_string()));
            }
            let alive = Arc::new(AtomicBool::new(true));
            self.handlers
                .lock()
                .expect("handlers lock")
                .push((topic.to_string(), handler, alive.clone()));
            Ok(Box::new(FakeSubscription { alive }))
        }
    }

    fn counting_invalidate() -> (Arc<AtomicU64>, Arc<dyn Fn() + Send + Sync>) {
        let count = Arc::new(AtomicU64::new(0));
        let callback = {
            let count = count.clone();
            Arc::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        (count, callback)
    }

    #[tokio::test]
    async fn signal_on_the_active_room_triggers_one_invalidation() {
        let transport = Arc::new(FakeTransport::default());
        let listener = InvalidationListener::new(transport.clone());
        let (count, callback) = counting_invalidate();

        listener.rescope(Scope::Room(7), callback).await;
        assert_eq!(listener.status(), PushStatus::Subscribed);

        transport.emit(&room_topic(7));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn signals_for_a_superseded_scope_are_ignored() {
        let transport = Arc::new(FakeTransport::default());
        let listener = InvalidationListener::new(transport.clone());
        let (count, callback) = counting_invalidate();

        listener.rescope(Scope::Room(7), callback.clone()).await;
        listener.rescope(Scope::Room(9), callback).await;

        // Room 7's handle was unsubscribed.
        transport.emit(&room_topic(7));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        // Even a transport that keeps delivering to the old handler is
        // stopped by the generation guard.
        transport.emit_ignoring_unsubscribe(&room_topic(7));
        assert_eq!(count.load(Ordering::SeqCst), 0);

        transport.emit(&room_topic(9));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn personal_scope_tears_down_the_subscription() {
        let transport = Arc::new(FakeTransport::default());
        let listener = InvalidationListener::new(transport.clone());
        let (count, callback) = counting_invalidate();

        listener.rescope(Scope::Room(4), callback.clone()).await;
        listener.rescope(Scope::Personal, callback).await;
        assert_eq!(listener.status(), PushStatus::Unsubscribed);

        transport.emit(&room_topic(4));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn subscription_failure_degrades_without_blocking() {
        let transport = Arc::new(FakeTransport::default());
        transport.fail_next.store(true, Ordering::SeqCst);
        let listener = InvalidationListener::new(transport.clone());
        let (count, callback) = counting_invalidate();

        listener.rescope(Scope::Room(3), callback).await;
        assert_eq!(listener.status(), PushStatus::Failed);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn shutdown_unsubscribes() {
        let transport = Arc::new(FakeTransport::default());
        let listener = InvalidationListener::new(transport.clone());
        let (count, callback) = counting_invalidate();

        listener.rescope(Scope::Room(2), callback).await;
        listener.shutdown().await;
        assert_eq!(listener.status(), PushStatus::Unsubscribed);

        transport.emit_ignoring_unsubscribe(&room_topic(2));
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
