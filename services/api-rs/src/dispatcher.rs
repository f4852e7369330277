use std::sync::Arc;

use evsim_generator::{Event, EventKind};
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::collector::{Collector, HttpCollector, LogCollector};

/// Builds a collector client for a `(write_key, api_host)` pair.
pub type CollectorFactory = Arc<dyn Fn(&str, &str) -> Arc<dyn Collector> + Send + Sync>;

struct Loaded {
    write_key: String,
    api_host: String,
    collector: Arc<dyn Collector>,
}

/// Owns the current collector and forwards events to it without waiting.
pub struct Dispatcher {
    factory: CollectorFactory,
    current: RwLock<Option<Loaded>>,
}

impl Dispatcher {
    pub fn new(factory: CollectorFactory) -> Self {
        Self {
            factory,
            current: RwLock::new(None),
        }
    }

    pub fn http(client: Client) -> Self {
        Self::new(Arc::new(move |write_key: &str, api_host: &str| -> Arc<dyn Collector> {
            Arc::new(HttpCollector::new(client.clone(), write_key, api_host))
        }))
    }

    pub fn dry_run() -> Self {
        Self::new(Arc::new(|write_key: &str, api_host: &str| -> Arc<dyn Collector> {
            Arc::new(LogCollector::new(write_key, api_host))
        }))
    }

    /// Points the dispatcher at `(write_key, api_host)`.
    ///
    /// Loading the pair that is already loaded does nothing. Otherwise the old
    /// client is replaced under one write lock, so no call ever sees two
    /// clients, and the new one records a page view. A blank key unloads.
    /// Returns whether the client changed.
    pub async fn load(&self, write_key: &str, api_host: &str) -> bool {
        let mut current = self.current.write().await;

        let unchanged = match current.as_ref() {
            Some(loaded) => loaded.write_key == write_key && loaded.api_host == api_host,
            None => write_key.trim().is_empty(),
        };
        if unchanged {
            return false;
        }

        if write_key.trim().is_empty() {
            *current = None;
            info!("collector unloaded, write key is empty");
            return true;
        }

        let collector = (self.factory)(write_key, api_host);
        *current = Some(Loaded {
            write_key: write_key.to_string(),
            api_host: api_host.to_string(),
            collector: collector.clone(),
        });
        info!(api_host, "collector loaded");

        tokio::spawn(async move {
            if let Err(e) = collector.page().await {
                warn!(error = %e, "page call after load failed");
            }
        });
        true
    }

    pub async fn is_loaded(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Hands the event to the collector in a detached task. Returns `false`
    /// when nothing was sent: no collector loaded, or the payload lacks the
    /// id/name its kind needs.
    pub async fn dispatch(&self, event: &Event) -> bool {
        let collector = match self.current.read().await.as_ref() {
            Some(loaded) => loaded.collector.clone(),
            None => {
                debug!("no collector loaded, dropping event");
                return false;
            }
        };

        let data = event.data().clone();
        match event.kind() {
            EventKind::Identify => {
                let Some(user_id) = event.user_id().map(str::to_string) else {
                    return false;
                };
                tokio::spawn(async move {
                    if let Err(e) = collector.identify(&user_id, &data).await {
                        warn!(error = %e, user_id = %user_id, "identify dispatch failed");
                    }
                });
            }
            EventKind::Track => {
                let Some(name) = event.event_name().map(str::to_string) else {
                    return false;
                };
                tokio::spawn(async move {
                    if let Err(e) = collector.track(&name, &data).await {
                        warn!(error = %e, event = %name, "track dispatch failed");
                    }
                });
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;
    use async_trait::async_trait;
    use evsim_generator::Payload;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    struct Recording {
        tag: String,
        recorder: Arc<Recorder>,
    }

    #[async_trait]
    impl Collector for Recording {
        async fn identify(&self, user_id: &str, _traits: &Payload) -> Result<(), DispatchError> {
            self.recorder.calls.lock().unwrap().push(format!("{}:identify:{}", self.tag, user_id));
            Ok(())
        }

        async fn track(&self, event: &str, _properties: &Payload) -> Result<(), DispatchError> {
            self.recorder.calls.lock().unwrap().push(format!("{}:track:{}", self.tag, event));
            Ok(())
        }

        async fn page(&self) -> Result<(), DispatchError> {
            self.recorder.calls.lock().unwrap().push(format!("{}:page", self.tag));
            Ok(())
        }
    }

    fn recording_dispatcher() -> (Dispatcher, Arc<Recorder>, Arc<AtomicUsize>) {
        let recorder = Arc::new(Recorder::default());
        let builds = Arc::new(AtomicUsize::new(0));
        let (r, b) = (recorder.clone(), builds.clone());
        let dispatcher = Dispatcher::new(Arc::new(move |key: &str, _host: &str| -> Arc<dyn Collector> {
            b.fetch_add(1, Ordering::SeqCst);
            Arc::new(Recording {
                tag: key.to_string(),
                recorder: r.clone(),
            })
        }));
        (dispatcher, recorder, builds)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn track(name: &str) -> Event {
        let mut data = Payload::new();
        data.insert("event_name".into(), json!(name));
        Event::new(EventKind::Track, "2024-01-01T00:00:00.000Z".into(), data)
    }

    #[tokio::test]
    async fn reloading_same_pair_is_a_noop() {
        let (dispatcher, recorder, builds) = recording_dispatcher();
        assert!(dispatcher.load("k1", "host").await);
        assert!(!dispatcher.load("k1", "host").await);
        settle().await;
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert_eq!(*recorder.calls.lock().unwrap(), vec!["k1:page".to_string()]);
    }

    #[tokio::test]
    async fn new_key_replaces_client() {
        let (dispatcher, recorder, builds) = recording_dispatcher();
        dispatcher.load("k1", "host").await;
        dispatcher.load("k2", "host").await;
        assert!(dispatcher.dispatch(&track("Cart Viewed")).await);
        settle().await;
        assert_eq!(builds.load(Ordering::SeqCst), 2);
        let calls = recorder.calls.lock().unwrap();
        assert!(calls.contains(&"k2:track:Cart Viewed".to_string()));
        assert!(!calls.iter().any(|c| c.starts_with("k1:track")));
    }

    #[tokio::test]
    async fn dispatch_without_client_is_silent() {
        let (dispatcher, recorder, _) = recording_dispatcher();
        assert!(!dispatcher.load("", "host").await);
        assert!(!dispatcher.is_loaded().await);
        assert!(!dispatcher.dispatch(&track("Cart Viewed")).await);
        settle().await;
        assert!(recorder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_key_unloads() {
        let (dispatcher, _, _) = recording_dispatcher();
        dispatcher.load("k1", "host").await;
        assert!(dispatcher.load("  ", "host").await);
        assert!(!dispatcher.is_loaded().await);
    }

    #[tokio::test]
    async fn identify_routes_by_user_id() {
        let (dispatcher, recorder, _) = recording_dispatcher();
        dispatcher.load("k1", "host").await;
        let mut data = Payload::new();
        data.insert("id".into(), json!("user_abc"));
        let event = Event::new(EventKind::Identify, "2024-01-01T00:00:00.000Z".into(), data);
        assert!(dispatcher.dispatch(&event).await);
        settle().await;
        assert!(recorder
            .calls
            .lock()
            .unwrap()
            .contains(&"k1:identify:user_abc".to_string()));
    }

    #[tokio::test]
    async fn track_without_name_is_not_sent() {
        let (dispatcher, _, _) = recording_dispatcher();
        dispatcher.load("k1", "host").await;
        let event = Event::new(EventKind::Track, "2024-01-01T00:00:00.000Z".into(), Payload::new());
        assert!(!dispatcher.dispatch(&event).await);
    }
}
