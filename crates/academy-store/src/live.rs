//! A tab-local view of one key that follows changes from other tabs.
//!
//! [`LiveView`] is the "mounted component" pattern: it subscribes before the
//! first read, re-reads the whole key whenever another tab changes it, and
//! stops listening when dropped. The writing tab never receives its own
//! events, so [`LiveView::replace`] updates the local value immediately after
//! writing.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::notifier::NotifyError;
use crate::store::Tab;

pub struct LiveView<T> {
    tab: Tab,
    key: String,
    tx: Arc<watch::Sender<T>>,
    rx: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T> LiveView<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Mount a view of `key`. Must be called inside a Tokio runtime.
    pub fn mount(tab: &Tab, key: &str, default: T) -> Self {
        let mut sub = tab.subscribe(&[key]);
        let initial = tab.get_items(key, default.clone());
        let (tx, rx) = watch::channel(initial);
        let tx = Arc::new(tx);

        let task = tokio::spawn({
            let tab = tab.clone();
            let key = key.to_string();
            let tx = Arc::clone(&tx);
            async move {
                loop {
                    match sub.recv().await {
                        // A lagged listener may have missed the latest write.
                        Ok(_) | Err(NotifyError::Lagged(_)) => {
                            let fresh = tab.get_items(&key, default.clone());
                            tx.send_replace(fresh);
                        }
                        Err(NotifyError::Closed) => break,
                    }
                }
            }
        });

        tracing::debug!(key, context = %tab.context().short(), "live view mounted");

        Self {
            tab: tab.clone(),
            key: key.to_string(),
            tx,
            rx,
            task,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Snapshot of the current value.
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Wait until the value changes. Returns `false` once the view can no
    /// longer change.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }

    /// Write `value` and show it locally right away.
    pub fn replace(&self, value: T) {
        self.tab.save_items(&self.key, &value);
        self.tx.send_replace(value);
    }
}

impl<T> Drop for LiveView<T> {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!(key = %self.key, "live view unmounted");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::LocalStore;

    #[tokio::test]
    async fn follows_foreign_writes() {
        let store = LocalStore::in_memory().unwrap();
        let viewer = store.open_tab();
        let writer = store.open_tab();

        let mut view = LiveView::mount(&viewer, "faqData", Vec::<String>::new());
        assert!(view.current().is_empty());

        writer.save_items("faqData", &vec!["How do I apply?".to_string()]);

        tokio::time::timeout(Duration::from_secs(1), view.changed())
            .await
            .expect("view refreshed");
        assert_eq!(view.current(), vec!["How do I apply?".to_string()]);
    }

    #[tokio::test]
    async fn replace_updates_locally_and_other_views() {
        let store = LocalStore::in_memory().unwrap();
        let a = store.open_tab();
        let b = store.open_tab();

        let view_a = LiveView::mount(&a, "banners", 0u32);
        let mut view_b = LiveView::mount(&b, "banners", 0u32);

        view_a.replace(7);
        assert_eq!(view_a.current(), 7);

        tokio::time::timeout(Duration::from_secs(1), view_b.changed())
            .await
            .expect("other view refreshed");
        assert_eq!(view_b.current(), 7);
    }

    #[tokio::test]
    async fn unmount_releases_listener() {
        let store = LocalStore::in_memory().unwrap();
        let tab = store.open_tab();
        let view = LiveView::mount(&tab, "students", Vec::<u8>::new());
        assert_eq!(store.bus().listener_count(), 1);

        drop(view);
        // The aborted task drops its subscription once it is polled again.
        for _ in 0..50 {
            if store.bus().listener_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.bus().listener_count(), 0);
    }
}
