use crate::config::AppConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

/// The platform's location authorization state, observed by the locator.
///
/// `Denied` and `Restricted` are terminal until the user changes the
/// permission outside the app; they are status, not errors.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionStatus {
    #[default]
    NotDetermined,
    Authorized,
    Denied,
    Restricted,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A nearby-store search result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub coordinate: Coordinate,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub url: Option<String>,
}

/// Stable identity for list rendering and deduplication.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PlaceIdentity(String);

impl PlaceIdentity {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Place {
    /// Derives the place's identity.
    ///
    /// Priority: canonical URL, then phone number, then name plus
    /// coordinate, then bare coordinate. The bare-coordinate fallback can
    /// collide for distinct entities at the same point; that limitation is
    /// accepted, not worked around.
    pub fn identity(&self) -> PlaceIdentity {
        if let Some(url) = self.url.as_deref().filter(|u| !u.is_empty()) {
            return PlaceIdentity(format!("url:{}", url));
        }
        if let Some(phone) = self.phone.as_deref().filter(|p| !p.is_empty()) {
            return PlaceIdentity(format!("phone:{}", phone));
        }
        if !self.name.is_empty() {
            return PlaceIdentity(format!(
                "name:{}@{:.6},{:.6}",
                self.name, self.coordinate.latitude, self.coordinate.longitude
            ));
        }
        PlaceIdentity(format!(
            "coord:{:.6},{:.6}",
            self.coordinate.latitude, self.coordinate.longitude
        ))
    }
}

/// External map-search collaborator.
///
/// The one asynchronous call in the core; its own timeout governs, the
/// locator configures none.
#[async_trait]
pub trait StoreSearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        center: Coordinate,
        span_degrees: f64,
    ) -> anyhow::Result<Vec<Place>>;
}

/// Observable locator state.
///
/// Published through a watch channel so any number of observers can read
/// or await changes without the locator knowing about a rendering layer.
#[derive(Clone, Debug, Default)]
pub struct LocatorSnapshot {
    pub permission: PermissionStatus,
    pub user_location: Option<Coordinate>,
    pub results: Vec<Place>,
    pub error_message: Option<String>,
    pub searching: bool,
}

struct LocatorState {
    permission: PermissionStatus,
    user_location: Option<Coordinate>,
    has_searched: bool,
    results: Vec<Place>,
    error_message: Option<String>,
    // Sequence guard: completions are applied only for the most recently
    // issued request, so a slow early search cannot overwrite a later one.
    next_seq: u64,
    latest_seq: u64,
    searching: bool,
}

impl LocatorState {
    fn snapshot(&self) -> LocatorSnapshot {
        LocatorSnapshot {
            permission: self.permission,
            user_location: self.user_location,
            results: self.results.clone(),
            error_message: self.error_message.clone(),
            searching: self.searching,
        }
    }
}

struct Inner {
    provider: Arc<dyn StoreSearchProvider>,
    config: Arc<AppConfig>,
    state: Mutex<LocatorState>,
    watch_tx: watch::Sender<LocatorSnapshot>,
}

/// Nearby-store locator.
///
/// Drives an asynchronous store search off permission changes, position
/// fixes, and explicit queries. Searches never block the caller; a failed
/// search is recoverable and reported through the snapshot's
/// `error_message`, never as a panic or fatal error.
#[derive(Clone)]
pub struct StoreLocator {
    inner: Arc<Inner>,
}

impl StoreLocator {
    pub fn new(provider: Arc<dyn StoreSearchProvider>, config: Arc<AppConfig>) -> Self {
        let state = LocatorState {
            permission: PermissionStatus::NotDetermined,
            user_location: None,
            has_searched: false,
            results: Vec::new(),
            error_message: None,
            next_seq: 0,
            latest_seq: 0,
            searching: false,
        };
        let (watch_tx, _) = watch::channel(state.snapshot());
        Self {
            inner: Arc::new(Inner {
                provider,
                config,
                state: Mutex::new(state),
                watch_tx,
            }),
        }
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<LocatorSnapshot> {
        self.inner.watch_tx.subscribe()
    }

    /// Current state.
    pub fn snapshot(&self) -> LocatorSnapshot {
        self.inner.watch_tx.borrow().clone()
    }

    /// Records a platform-driven permission change.
    #[instrument(skip(self))]
    pub fn permission_changed(&self, status: PermissionStatus) {
        {
            let mut state = self.lock_state();
            state.permission = status;
            self.publish(&state);
        }
        info!("Location permission changed: {:?}", status);
    }

    /// Records a position fix from the platform's location producer.
    ///
    /// Only the latest fix is held. The first fix while authorized, before
    /// any search has run, triggers the default search centred on it.
    pub fn position_update(&self, fix: Coordinate) {
        let auto_search = {
            let mut state = self.lock_state();
            state.user_location = Some(fix);
            let trigger =
                state.permission == PermissionStatus::Authorized && !state.has_searched;
            self.publish(&state);
            trigger
        };

        if auto_search {
            debug!("First position fix received; running default store search");
            self.search("", fix);
        }
    }

    /// Starts a store search and returns its sequence number.
    ///
    /// The search centres on the last known position, falling back to
    /// `fallback_center` (the current map centre) when no fix has arrived.
    /// An empty query searches for the configured default ("grocery
    /// store"). The provider call runs on a spawned task; the result is
    /// applied to the locator state when it completes, unless a newer
    /// search has been issued in the meantime.
    #[instrument(skip(self))]
    pub fn search(&self, query: &str, fallback_center: Coordinate) -> u64 {
        let trimmed = query.trim();
        let effective_query = if trimmed.is_empty() {
            self.inner.config.default_search_query.clone()
        } else {
            trimmed.to_string()
        };

        let (seq, center) = {
            let mut state = self.lock_state();
            let seq = state.next_seq;
            state.next_seq += 1;
            state.latest_seq = seq;
            state.has_searched = true;
            state.searching = true;
            let center = state.user_location.unwrap_or(fallback_center);
            self.publish(&state);
            (seq, center)
        };

        let locator = self.clone();
        let span = self.inner.config.default_search_span_degrees;
        tokio::spawn(async move {
            let outcome = locator
                .inner
                .provider
                .search(&effective_query, center, span)
                .await;
            locator.complete_search(seq, outcome);
        });

        seq
    }

    /// Applies a search completion.
    ///
    /// Stale completions (a newer search was issued after this one) are
    /// discarded; the most recent request always wins regardless of
    /// completion order.
    fn complete_search(&self, seq: u64, outcome: anyhow::Result<Vec<Place>>) {
        let mut state = self.lock_state();
        if seq != state.latest_seq {
            debug!(
                "Discarding stale search completion (seq {}, latest {})",
                seq, state.latest_seq
            );
            return;
        }

        state.searching = false;
        match outcome {
            Ok(places) => {
                state.results = dedup_by_identity(places);
                state.error_message = None;
                info!("Store search returned {} results", state.results.len());
            }
            Err(e) => {
                state.results.clear();
                state.error_message = Some(format!("Failed to search for stores: {}", e));
                warn!("Store search failed: {}", e);
            }
        }
        self.publish(&state);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, LocatorState> {
        // Lock poisoning cannot happen: no panic occurs while holding it.
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &LocatorState) {
        let _ = self.inner.watch_tx.send_replace(state.snapshot());
    }
}

/// Drops later results whose identity duplicates an earlier one.
fn dedup_by_identity(places: Vec<Place>) -> Vec<Place> {
    let mut seen = HashSet::new();
    places
        .into_iter()
        .filter(|place| seen.insert(place.identity()))
        .collect()
}
