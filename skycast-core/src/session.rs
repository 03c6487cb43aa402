//! The weather session controller: turns a free-text location query into an
//! observable `Loading -> Success | Error` state by running a two-step
//! geocode-then-forecast fetch sequence.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tokio::sync::watch;

use crate::client::{ForecastClient, GeocodingClient};
use crate::model::{FetchState, ForecastData, TemperatureUnit};

/// Shown when `search` is called with a blank query.
pub const BLANK_QUERY_MESSAGE: &str = "Please enter a city or country name.";

/// Shown when geocoding returns no candidate matching the query.
pub const NOT_FOUND_MESSAGE: &str =
    "City or country not found. Please check the spelling and try again.";

/// Shown for any transport or parse failure during a fetch sequence.
pub const FETCH_FAILED_MESSAGE: &str =
    "Something went wrong. Please check your internet connection or try again.";

/// Everything a presentation layer needs to render one session.
///
/// `envelope == None` means "never searched" (or cleared); `error_message`
/// is non-empty only when `envelope` is `None` or `Error`.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub query: String,
    pub unit: TemperatureUnit,
    pub envelope: Option<FetchState<ForecastData>>,
    pub error_message: String,
}

impl SessionState {
    /// True once no fetch is in flight, i.e. the envelope is anything but
    /// `Loading`. Callers waiting for a result can
    /// `receiver.wait_for(SessionState::is_settled)`.
    pub fn is_settled(&self) -> bool {
        !matches!(self.envelope, Some(FetchState::Loading))
    }
}

/// Internal outcome of one fetch sequence. The controller maps these to the
/// fixed user-facing messages; the transport detail only goes to the log.
#[derive(Debug, Error)]
enum FetchError {
    #[error("no geocoding candidate matched the query")]
    NoMatch,
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Owns the session state and orchestrates fetches against the injected
/// geocoding and forecast clients.
///
/// All mutation goes through the four public operations; observers hold
/// [`watch::Receiver`]s and only ever read. Each fetch-triggering call sets
/// `Loading` synchronously before any network work starts, so readers never
/// see a stale result while a new search is in flight.
///
/// Superseded fetches are not cancelled, but each sequence carries a ticket
/// number and only the most recently issued sequence may write its result
/// back. A slow old fetch that loses the race is discarded, not applied.
#[derive(Debug)]
pub struct WeatherSession {
    geocoder: Arc<dyn GeocodingClient>,
    forecaster: Arc<dyn ForecastClient>,
    tx: Arc<watch::Sender<SessionState>>,
    fetch_seq: Arc<AtomicU64>,
}

impl WeatherSession {
    pub fn new(geocoder: Arc<dyn GeocodingClient>, forecaster: Arc<dyn ForecastClient>) -> Self {
        Self::with_unit(geocoder, forecaster, TemperatureUnit::default())
    }

    /// Start the session with a preconfigured display unit instead of the
    /// Celsius default.
    pub fn with_unit(
        geocoder: Arc<dyn GeocodingClient>,
        forecaster: Arc<dyn ForecastClient>,
        unit: TemperatureUnit,
    ) -> Self {
        let (tx, _rx) = watch::channel(SessionState {
            unit,
            ..SessionState::default()
        });
        Self {
            geocoder,
            forecaster,
            tx: Arc::new(tx),
            fetch_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Accept a location query and start a fetch sequence for it.
    ///
    /// Blank input (after trimming) short-circuits with a validation
    /// message and never touches the network. Must be called from within a
    /// tokio runtime; the fetch runs as a spawned task and this method
    /// returns immediately.
    pub fn search(&self, name: &str) {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            self.invalidate_in_flight();
            self.tx.send_modify(|state| {
                state.envelope = None;
                state.error_message = BLANK_QUERY_MESSAGE.to_string();
            });
            return;
        }

        // Claim the ticket before publishing Loading: from the first
        // observable transition onwards, no older sequence can write.
        let seq = self.claim_ticket();
        let query = trimmed.to_string();
        self.tx.send_modify(|state| {
            state.query = query;
            state.error_message.clear();
            state.envelope = Some(FetchState::Loading);
        });
        self.spawn_fetch(seq);
    }

    /// Switch the display unit and re-fetch for the current query.
    ///
    /// With no query yet accepted there is nothing to fetch; this surfaces
    /// the same validation message as a blank search, without any network
    /// call. The unit itself is always updated.
    pub fn set_unit(&self, unit: TemperatureUnit) {
        if self.tx.borrow().query.is_empty() {
            self.invalidate_in_flight();
            self.tx.send_modify(|state| {
                state.unit = unit;
                state.envelope = None;
                state.error_message = BLANK_QUERY_MESSAGE.to_string();
            });
            return;
        }

        let seq = self.claim_ticket();
        self.tx.send_modify(|state| {
            state.unit = unit;
            state.error_message.clear();
            state.envelope = Some(FetchState::Loading);
        });
        self.spawn_fetch(seq);
    }

    /// Drop the query, envelope and error message. Keeps the unit. Any
    /// in-flight fetch is invalidated so its late result cannot resurface.
    pub fn clear(&self) {
        self.invalidate_in_flight();
        self.tx.send_modify(|state| {
            state.query.clear();
            state.envelope = None;
            state.error_message.clear();
        });
    }

    /// Observe every state transition. Receivers are cheap to clone and
    /// independent of each other.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn query(&self) -> String {
        self.tx.borrow().query.clone()
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.tx.borrow().unit
    }

    pub fn envelope(&self) -> Option<FetchState<ForecastData>> {
        self.tx.borrow().envelope.clone()
    }

    pub fn error_message(&self) -> String {
        self.tx.borrow().error_message.clone()
    }

    /// Bump the ticket counter so any fetch already in flight can no longer
    /// write its result back.
    fn invalidate_in_flight(&self) {
        self.fetch_seq.fetch_add(1, Ordering::SeqCst);
    }

    /// Take the next ticket, making it the only one allowed to write.
    fn claim_ticket(&self) -> u64 {
        self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn spawn_fetch(&self, seq: u64) {
        let latest = Arc::clone(&self.fetch_seq);
        let tx = Arc::clone(&self.tx);
        let geocoder = Arc::clone(&self.geocoder);
        let forecaster = Arc::clone(&self.forecaster);
        let (query, unit) = {
            let state = self.tx.borrow();
            (state.query.clone(), state.unit)
        };

        tokio::spawn(async move {
            run_fetch(geocoder, forecaster, query, unit, seq, latest, tx).await;
        });
    }
}

/// One full geocode-then-forecast sequence. The forecast call never starts
/// until geocoding has resolved a matching candidate.
async fn run_fetch(
    geocoder: Arc<dyn GeocodingClient>,
    forecaster: Arc<dyn ForecastClient>,
    query: String,
    unit: TemperatureUnit,
    seq: u64,
    latest: Arc<AtomicU64>,
    tx: Arc<watch::Sender<SessionState>>,
) {
    let outcome: Result<ForecastData, FetchError> = async {
        let candidates = geocoder.resolve(&query).await?;

        let folded = query.to_lowercase();
        let candidate = candidates
            .into_iter()
            .find(|c| c.name.to_lowercase() == folded)
            .ok_or(FetchError::NoMatch)?;

        // The canonical name replaces the raw input so a later unit change
        // re-fetches the resolved place, not whatever the user typed.
        let canonical = candidate.name.clone();
        apply_if_current(&tx, &latest, seq, |state| state.query = canonical);

        let data = forecaster
            .fetch(candidate.latitude, candidate.longitude, unit)
            .await?;
        Ok(data)
    }
    .await;

    let applied = match outcome {
        Ok(data) => apply_if_current(&tx, &latest, seq, |state| {
            state.envelope = Some(FetchState::Success(data));
            state.error_message.clear();
        }),
        Err(FetchError::NoMatch) => apply_if_current(&tx, &latest, seq, |state| {
            state.envelope = None;
            state.error_message = NOT_FOUND_MESSAGE.to_string();
        }),
        Err(FetchError::Transport(err)) => {
            tracing::warn!(error = %err, %query, "fetch sequence failed");
            apply_if_current(&tx, &latest, seq, |state| {
                state.envelope = Some(FetchState::Error(FETCH_FAILED_MESSAGE.to_string()));
            })
        }
    };

    if !applied {
        tracing::debug!(seq, %query, "dropped result of superseded fetch");
    }
}

/// Write through only if `seq` is still the most recently issued ticket.
/// Observers are notified only when the update actually happens.
fn apply_if_current(
    tx: &watch::Sender<SessionState>,
    latest: &AtomicU64,
    seq: u64,
    update: impl FnOnce(&mut SessionState),
) -> bool {
    tx.send_if_modified(|state| {
        if latest.load(Ordering::SeqCst) != seq {
            return false;
        }
        update(state);
        true
    })
}
