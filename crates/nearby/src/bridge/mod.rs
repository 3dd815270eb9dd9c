//! The boundary between the engine and whatever draws the map and the list.
//!
//! The map renderer implements [`MapSurface`] and is handed an
//! [`ActivationPort`] to report marker clicks back. The list view watches a
//! [`ListView`] snapshot. Both are fed from the same [`SyncBridge`] so a result
//! set reaches markers and list in one step.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use ahash::AHashMap as HashMap;
use itertools::Itertools;
use nearby_content::{ArticleId, Coordinate};
use tokio::sync::watch;
use tracing::{debug, trace};

use crate::{
    coordinator::SessionState,
    error::ErrorKind,
    pipeline::{Article, ResultSet},
};

/// Capabilities the engine needs from a map renderer.
pub trait MapSurface {
    /// Move the viewport.
    fn set_center(&self, center: Coordinate, zoom: u8);
    /// Replace every marker with one per article in `results`.
    fn render_markers(&self, results: &ResultSet);
    /// Open the callout of a marker and pan to it.
    fn focus_marker(&self, id: ArticleId);
}

impl<T: MapSurface + ?Sized> MapSurface for Arc<T> {
    fn set_center(&self, center: Coordinate, zoom: u8) {
        (**self).set_center(center, zoom);
    }

    fn render_markers(&self, results: &ResultSet) {
        (**self).render_markers(results);
    }

    fn focus_marker(&self, id: ArticleId) {
        (**self).focus_marker(id);
    }
}

/// Order the list view presents articles in. Markers are unaffected.
///
/// Defaults to [`ListOrder::Distance`] so the list matches the result set
/// as ranked; [`ListOrder::Name`] is opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    /// Nearest first, the order of the result set.
    #[default]
    Distance,
    /// Alphabetical by title, ignoring case.
    Name,
    /// Titles containing the text filter first, then by distance.
    Relevance,
}

/// A user-visible condition attached to the list, such as a failed search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: ErrorKind,
    pub message: String,
}

/// What the list view renders.
#[derive(Debug, Clone, Default)]
pub struct ListView {
    pub status: SessionState,
    pub results: Option<Arc<ResultSet>>,
    pub selected: Option<ArticleId>,
    pub notice: Option<Notice>,
    pub order: ListOrder,
}

impl ListView {
    /// Articles in presentation order.
    pub fn entries(&self) -> Vec<&Article> {
        let Some(results) = self.results.as_deref() else {
            return Vec::new();
        };
        match self.order {
            ListOrder::Distance => results.iter().collect(),
            ListOrder::Name => results
                .iter()
                .sorted_by_cached_key(|a| a.title.to_lowercase())
                .collect(),
            ListOrder::Relevance => match results.params().filter_needle() {
                Some(needle) => results
                    .iter()
                    .sorted_by_key(|a| !a.title.to_lowercase().contains(&needle))
                    .collect(),
                None => results.iter().collect(),
            },
        }
    }

    pub fn is_selected(&self, id: ArticleId) -> bool {
        self.selected == Some(id)
    }
}

/// Where a selection came from; decides which side has to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOrigin {
    /// Clicked in the list: the map focuses the marker.
    List,
    /// Clicked on the map: the list highlights the entry.
    Marker,
}

type Listener = Arc<dyn Fn(ArticleId) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: HashMap<u64, Listener>,
}

type SharedListeners = Arc<Mutex<Listeners>>;

fn lock(listeners: &Mutex<Listeners>) -> std::sync::MutexGuard<'_, Listeners> {
    listeners.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle the map renderer calls when the user activates a marker.
///
/// Outlives the bridge safely: once the bridge is gone activations are
/// dropped.
#[derive(Clone)]
pub struct ActivationPort {
    listeners: Weak<Mutex<Listeners>>,
}

impl ActivationPort {
    /// Notify every live subscription. Returns how many were notified.
    pub fn marker_activated(&self, id: ArticleId) -> usize {
        let Some(listeners) = self.listeners.upgrade() else {
            debug!(id, "Marker activated after bridge teardown, ignoring");
            return 0;
        };
        // Call outside the lock so a listener may subscribe or unsubscribe.
        let snapshot = lock(&listeners).entries.values().cloned().collect_vec();
        for listener in &snapshot {
            listener(id);
        }
        trace!(id, listeners = snapshot.len(), "Marker activation delivered");
        snapshot.len()
    }
}

/// A registered activation callback. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            lock(&listeners).entries.remove(&self.id);
        }
    }
}

/// Publishes engine state to the map surface and the list view, and routes
/// marker activations back.
pub struct SyncBridge<M> {
    surface: M,
    listeners: SharedListeners,
    list_tx: watch::Sender<ListView>,
}

impl<M: MapSurface> SyncBridge<M> {
    pub fn new(surface: M) -> Self {
        let (list_tx, _) = watch::channel(ListView::default());
        Self {
            surface,
            listeners: SharedListeners::default(),
            list_tx,
        }
    }

    pub fn surface(&self) -> &M {
        &self.surface
    }

    /// Handle for the renderer to report marker activations with.
    pub fn activation_port(&self) -> ActivationPort {
        ActivationPort {
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(ArticleId) + Send + Sync + 'static,
    {
        let mut guard = lock(&self.listeners);
        let id = guard.next_id;
        guard.next_id += 1;
        guard.entries.insert(id, Arc::new(listener));
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.listeners).entries.len()
    }

    /// A fresh receiver of list snapshots, starting at the current one.
    pub fn list_view(&self) -> watch::Receiver<ListView> {
        self.list_tx.subscribe()
    }

    /// The snapshot the list view currently shows.
    pub fn current_view(&self) -> ListView {
        self.list_tx.borrow().clone()
    }

    pub fn set_center(&self, center: Coordinate, zoom: u8) {
        debug!(%center, zoom, "Centering map");
        self.surface.set_center(center, zoom);
    }

    /// Replace markers and list contents with `results`.
    pub fn publish_results(&self, results: Arc<ResultSet>, selected: Option<ArticleId>) {
        self.surface.render_markers(&results);
        self.list_tx.send_modify(|view| {
            view.status = SessionState::Ready;
            view.results = Some(results);
            view.selected = selected;
            view.notice = None;
        });
    }

    /// Remove every marker and empty the list.
    pub fn clear_results(&self, empty: &ResultSet) {
        self.surface.render_markers(empty);
        self.list_tx.send_modify(|view| {
            view.status = SessionState::Idle;
            view.results = None;
            view.selected = None;
            view.notice = None;
        });
    }

    pub fn publish_status(&self, status: SessionState) {
        self.list_tx.send_if_modified(|view| {
            let changed = view.status != status;
            view.status = status;
            changed
        });
    }

    /// Attach (or with `None`, clear) a notice; the result set is left alone.
    pub fn publish_notice(&self, notice: Option<Notice>, status: SessionState) {
        self.list_tx.send_modify(|view| {
            view.notice = notice;
            view.status = status;
        });
    }

    pub fn publish_selection(&self, id: ArticleId, origin: SelectionOrigin) {
        if origin == SelectionOrigin::List {
            self.surface.focus_marker(id);
        }
        self.list_tx.send_modify(|view| view.selected = Some(id));
    }

    pub fn publish_order(&self, order: ListOrder) {
        self.list_tx.send_if_modified(|view| {
            let changed = view.order != order;
            view.order = order;
            changed
        });
    }
}
