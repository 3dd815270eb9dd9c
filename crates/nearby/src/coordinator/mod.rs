//! Session state and the search lifecycle.
//!
//! [`SearchCoordinator`] owns the current location and filters, starts a
//! pipeline run whenever they change, and applies run completions strictly in
//! start order: every run gets a sequence number and only the latest one may
//! touch the displayed results. Runs themselves execute as tokio tasks and
//! report back through a channel the coordinator drains in
//! [`next_update`](SearchCoordinator::next_update) or
//! [`settle`](SearchCoordinator::settle).

use std::sync::Arc;

use async_trait::async_trait;
use nearby_content::{
    ArticleId, Category, ContentError, ContentSource, Coordinate, Suggestion,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

use crate::{
    bridge::{
        ActivationPort, ListOrder, ListView, MapSurface, Notice, SelectionOrigin, Subscription,
        SyncBridge,
    },
    config::DiscoveryConfig,
    error::{ErrorKind, NearbyError, Result},
    pipeline::{ResultPipeline, ResultSet, SearchParameters},
};

mod debounce;

pub use debounce::Debouncer;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No location yet, or the location was cleared.
    #[default]
    Idle,
    /// The latest run has not completed.
    Loading,
    /// The latest run's results are displayed.
    Ready,
}

/// Which article, if any, is highlighted in both list and map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionState {
    pub selected: Option<ArticleId>,
}

/// Source of the device's own position.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self) -> anyhow::Result<Coordinate>;
}

/// What applying one inbound event changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    ResultsApplied { seq: u64, articles: usize },
    /// A superseded run completed; its results were dropped.
    RunDiscarded { seq: u64 },
    RunFailed { seq: u64, kind: ErrorKind },
    SelectionChanged {
        id: ArticleId,
        origin: SelectionOrigin,
    },
    /// A marker reported an article that is not in the current results.
    SelectionIgnored { id: ArticleId },
    SuggestionsUpdated { query: String, count: usize },
    LookupFailed { query: String, kind: ErrorKind },
    /// A lookup finished after a newer keystroke replaced it.
    LookupDiscarded { query: String },
}

enum Event {
    RunFinished {
        seq: u64,
        outcome: std::result::Result<ResultSet, ContentError>,
    },
    MarkerActivated(ArticleId),
    SuggestionsReady {
        generation: u64,
        query: String,
        outcome: std::result::Result<Vec<Suggestion>, ContentError>,
    },
}

/// Drives searches for one user session.
///
/// All methods take `&mut self`; the coordinator is the single writer of the
/// session state. Methods that start work spawn tokio tasks, so they must be
/// called from within a runtime.
pub struct SearchCoordinator<C: ?Sized, M> {
    config: DiscoveryConfig,
    pipeline: ResultPipeline<C>,
    bridge: SyncBridge<M>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    _activations: Subscription,

    params: SearchParameters,
    located: bool,
    state: SessionState,
    results: Option<Arc<ResultSet>>,
    selection: SelectionState,
    list_order: ListOrder,

    latest_run: u64,
    pending_runs: usize,

    lookup: Debouncer,
    lookup_pending: Option<u64>,
    suggestions: Vec<Suggestion>,
}

impl<C, M> SearchCoordinator<C, M>
where
    C: ContentSource + ?Sized + 'static,
    M: MapSurface,
{
    /// Wire a coordinator to its content source and map surface, and move the
    /// map to the configured initial centre.
    pub fn new(content: Arc<C>, surface: M, config: DiscoveryConfig) -> Self {
        let pipeline = ResultPipeline::new(content, &config);
        let bridge = SyncBridge::new(surface);
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let forward = events_tx.clone();
        let activations = bridge.subscribe(move |id| {
            if forward.send(Event::MarkerActivated(id)).is_err() {
                debug!(id, "Coordinator gone, dropping marker activation");
            }
        });

        bridge.set_center(config.initial_center, config.map_zoom);

        Self {
            params: SearchParameters::new(config.initial_center, &config),
            lookup: Debouncer::new(config.lookup_debounce),
            config,
            pipeline,
            bridge,
            events_tx,
            events_rx,
            _activations: activations,
            located: false,
            state: SessionState::Idle,
            results: None,
            selection: SelectionState::default(),
            list_order: ListOrder::default(),
            latest_run: 0,
            pending_runs: 0,
            lookup_pending: None,
            suggestions: Vec::new(),
        }
    }

    // Accessors

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn params(&self) -> &SearchParameters {
        &self.params
    }

    pub fn location(&self) -> Option<Coordinate> {
        self.located.then(|| self.params.center())
    }

    pub fn results(&self) -> Option<&Arc<ResultSet>> {
        self.results.as_ref()
    }

    pub fn selection(&self) -> SelectionState {
        self.selection
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn bridge(&self) -> &SyncBridge<M> {
        &self.bridge
    }

    pub fn list_view(&self) -> watch::Receiver<ListView> {
        self.bridge.list_view()
    }

    /// Hand this to the map renderer so marker clicks reach the session.
    pub fn activation_port(&self) -> ActivationPort {
        self.bridge.activation_port()
    }

    /// Sequence number of the most recently started run.
    pub fn latest_run(&self) -> u64 {
        self.latest_run
    }

    /// Whether a run or a debounced lookup has yet to report back.
    pub fn has_pending_work(&self) -> bool {
        self.pending_runs > 0 || self.lookup_pending.is_some()
    }

    // Location

    /// Search around `center`. Returns the sequence number of the run.
    pub fn set_location(&mut self, center: Coordinate) -> u64 {
        info!(%center, "Location set");
        self.located = true;
        self.params = self.params.clone().with_center(center);
        self.bridge.set_center(center, self.config.map_zoom);
        self.start_run()
    }

    pub fn set_location_by_coordinate(&mut self, latitude: f64, longitude: f64) -> Result<u64> {
        let center = Coordinate::new(latitude, longitude)?;
        Ok(self.set_location(center))
    }

    pub async fn set_location_by_device<G>(&mut self, provider: &G) -> Result<u64>
    where
        G: GeolocationProvider + ?Sized,
    {
        match provider.current_position().await {
            Ok(center) => Ok(self.set_location(center)),
            Err(e) => {
                let err = NearbyError::Geolocation(e.to_string());
                self.surface_failure("Could not determine your location", &err);
                Err(err)
            }
        }
    }

    /// Geocode `name` and search around the best match.
    ///
    /// A name the geocoder does not know yields [`NearbyError::NoCoordinate`]
    /// and leaves the current results and selection as they are.
    #[instrument(name = "Locate place", skip(self), level = "info")]
    pub async fn set_location_by_place_name(&mut self, name: &str) -> Result<u64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ContentError::EmptyQuery.into());
        }
        let resolved = self.pipeline.content().geocode(name).await;
        self.resolve_location(name, resolved)
    }

    /// Search around the coordinates of the article titled `title`.
    ///
    /// An article without coordinates yields [`NearbyError::NoCoordinate`]
    /// and leaves the current results and selection as they are.
    #[instrument(name = "Locate article", skip(self), level = "info")]
    pub async fn set_location_by_article_title(&mut self, title: &str) -> Result<u64> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ContentError::EmptyQuery.into());
        }
        let resolved = self.pipeline.content().locate_article(title).await;
        self.resolve_location(title, resolved)
    }

    fn resolve_location(
        &mut self,
        subject: &str,
        resolved: std::result::Result<Option<Coordinate>, ContentError>,
    ) -> Result<u64> {
        match resolved {
            Ok(Some(center)) => Ok(self.set_location(center)),
            Ok(None) => {
                info!(subject, "No coordinates available");
                self.bridge.publish_notice(
                    Some(Notice {
                        kind: ErrorKind::NoCoordinate,
                        message: format!(
                            "\"{subject}\" has no location on the map. Try a nearby place name instead."
                        ),
                    }),
                    self.state,
                );
                Err(NearbyError::NoCoordinate {
                    subject: subject.to_string(),
                })
            }
            Err(e) => {
                let err = NearbyError::from(e);
                self.surface_failure(&format!("Could not look up \"{subject}\""), &err);
                Err(err)
            }
        }
    }

    /// Forget the location: back to `Idle`, markers and list emptied. Runs
    /// still in flight are discarded when they report back.
    pub fn clear_location(&mut self) {
        info!("Location cleared");
        self.located = false;
        self.latest_run += 1;
        self.results = None;
        self.selection = SelectionState::default();
        self.state = SessionState::Idle;
        self.bridge
            .clear_results(&ResultSet::empty(self.params.clone()));
    }

    /// Run the current search again. `None` without a location.
    pub fn refresh(&mut self) -> Option<u64> {
        self.located.then(|| self.start_run())
    }

    // Parameters

    pub fn set_radius(&mut self, meters: u32) -> Option<u64> {
        let next = self.params.clone().with_radius(meters);
        self.update_params(next)
    }

    pub fn set_category(&mut self, category: impl Into<Category>) -> Option<u64> {
        let next = self.params.clone().with_category(category.into());
        self.update_params(next)
    }

    pub fn set_limit(&mut self, limit: usize) -> Option<u64> {
        let next = self.params.clone().with_limit(limit);
        self.update_params(next)
    }

    pub fn set_text_filter(&mut self, filter: impl Into<String>) -> Option<u64> {
        let next = self.params.clone().with_text_filter(filter);
        self.update_params(next)
    }

    /// Presentation order of the list; markers and results are unaffected.
    pub fn set_list_order(&mut self, order: ListOrder) {
        self.list_order = order;
        self.bridge.publish_order(order);
    }

    fn update_params(&mut self, next: SearchParameters) -> Option<u64> {
        if next == self.params {
            return None;
        }
        debug!(?next, "Search parameters changed");
        self.params = next;
        self.refresh()
    }

    // Selection

    /// The user picked an article in the list. Returns `false` for an id that
    /// is not in the current results.
    pub fn select_article(&mut self, id: ArticleId) -> bool {
        if !self.results.as_ref().is_some_and(|r| r.contains(id)) {
            warn!(id, "Ignoring selection of unknown article");
            return false;
        }
        self.selection.selected = Some(id);
        self.bridge.publish_selection(id, SelectionOrigin::List);
        true
    }

    // Free-text lookup

    /// Debounced article lookup for the search box. Only the last query of a
    /// burst is sent; a blank query cancels the pending lookup and clears the
    /// suggestions.
    pub fn lookup_articles(&mut self, query: &str) {
        let query = query.trim().to_string();
        if query.is_empty() {
            self.lookup.cancel();
            self.lookup_pending = None;
            self.suggestions.clear();
            return;
        }

        let content = Arc::clone(self.pipeline.content());
        let tx = self.events_tx.clone();
        let limit = self.config.lookup_limit;
        let generation = self.lookup.schedule(move |generation| async move {
            let outcome = content.text_search(&query, limit).await;
            if tx
                .send(Event::SuggestionsReady {
                    generation,
                    query,
                    outcome,
                })
                .is_err()
            {
                debug!(generation, "Coordinator gone, dropping suggestions");
            }
        });
        self.lookup_pending = Some(generation);
    }

    // Event loop

    /// Wait for the next inbound event (run completion, marker activation,
    /// lookup result) and apply it.
    pub async fn next_update(&mut self) -> Option<Update> {
        let event = self.events_rx.recv().await?;
        Some(self.apply(event))
    }

    /// Apply events until no run or lookup is outstanding, then apply
    /// whatever else is already queued.
    pub async fn settle(&mut self) -> Vec<Update> {
        let mut updates = Vec::new();
        while self.has_pending_work() {
            let Some(event) = self.events_rx.recv().await else {
                break;
            };
            updates.push(self.apply(event));
        }
        while let Ok(event) = self.events_rx.try_recv() {
            updates.push(self.apply(event));
        }
        updates
    }

    fn start_run(&mut self) -> u64 {
        self.latest_run += 1;
        self.pending_runs += 1;
        let seq = self.latest_run;

        self.state = SessionState::Loading;
        self.bridge.publish_status(SessionState::Loading);

        let pipeline = self.pipeline.clone();
        let params = self.params.clone();
        let tx = self.events_tx.clone();
        info!(seq, radius = params.radius_meters(), category = %params.category(), "Starting run");
        tokio::spawn(async move {
            let outcome = pipeline.run(&params).await;
            if tx.send(Event::RunFinished { seq, outcome }).is_err() {
                debug!(seq, "Coordinator gone, dropping run result");
            }
        });
        seq
    }

    fn apply(&mut self, event: Event) -> Update {
        match event {
            Event::RunFinished { seq, outcome } => self.apply_run(seq, outcome),
            Event::MarkerActivated(id) => {
                if !self.results.as_ref().is_some_and(|r| r.contains(id)) {
                    debug!(id, "Marker activation for unknown article");
                    return Update::SelectionIgnored { id };
                }
                self.selection.selected = Some(id);
                self.bridge.publish_selection(id, SelectionOrigin::Marker);
                Update::SelectionChanged {
                    id,
                    origin: SelectionOrigin::Marker,
                }
            }
            Event::SuggestionsReady {
                generation,
                query,
                outcome,
            } => self.apply_suggestions(generation, query, outcome),
        }
    }

    fn apply_run(
        &mut self,
        seq: u64,
        outcome: std::result::Result<ResultSet, ContentError>,
    ) -> Update {
        self.pending_runs = self.pending_runs.saturating_sub(1);
        if seq != self.latest_run {
            debug!(seq, latest = self.latest_run, "Discarding stale run");
            return Update::RunDiscarded { seq };
        }

        match outcome {
            Ok(results) => {
                let results = Arc::new(results);
                let articles = results.len();
                if let Some(id) = self.selection.selected
                    && !results.contains(id)
                {
                    self.selection.selected = None;
                }
                self.state = SessionState::Ready;
                self.bridge
                    .publish_results(Arc::clone(&results), self.selection.selected);
                self.results = Some(results);
                info!(seq, articles, "Results applied");
                Update::ResultsApplied { seq, articles }
            }
            Err(e) => {
                let err = NearbyError::from(e);
                let kind = err.kind();
                self.state = if self.results.is_some() {
                    SessionState::Ready
                } else {
                    SessionState::Idle
                };
                self.surface_failure("Could not load nearby articles", &err);
                Update::RunFailed { seq, kind }
            }
        }
    }

    fn apply_suggestions(
        &mut self,
        generation: u64,
        query: String,
        outcome: std::result::Result<Vec<Suggestion>, ContentError>,
    ) -> Update {
        if self.lookup_pending != Some(generation) {
            return Update::LookupDiscarded { query };
        }
        self.lookup_pending = None;
        match outcome {
            Ok(suggestions) => {
                let count = suggestions.len();
                self.suggestions = suggestions;
                Update::SuggestionsUpdated { query, count }
            }
            Err(e) => {
                let err = NearbyError::from(e);
                self.surface_failure("Article search failed", &err);
                Update::LookupFailed {
                    query,
                    kind: err.kind(),
                }
            }
        }
    }

    /// Report a failure on the list without touching results or selection.
    fn surface_failure(&self, context: &str, err: &NearbyError) {
        warn!(error = %err, kind = ?err.kind(), "{context}");
        self.bridge.publish_notice(
            Some(Notice {
                kind: err.kind(),
                message: format!("{context}: {err}"),
            }),
            self.state,
        );
    }
}
