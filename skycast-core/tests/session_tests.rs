//! State-machine tests for the weather session controller, driven through
//! stub clients so no network is involved.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use skycast_core::{
    BLANK_QUERY_MESSAGE, CurrentReading, DailySeries, FETCH_FAILED_MESSAGE, FetchState,
    ForecastClient, ForecastData, GeoCandidate, GeocodingClient, HourlySeries, NOT_FOUND_MESSAGE,
    SessionState, TemperatureUnit, WeatherSession,
};

fn sample_forecast(temperature: f64) -> ForecastData {
    ForecastData {
        current: CurrentReading {
            temperature,
            wind_speed: 11.2,
            weather_code: 2,
            timestamp: "2025-05-28T13:00".to_string(),
        },
        hourly: HourlySeries {
            timestamps: vec!["2025-05-28T14:00".into(), "2025-05-28T15:00".into()],
            temperature: vec![21.3, 22.1],
            humidity: vec![40.0, 38.0],
            wind_speed: vec![3.2, 4.0],
            precipitation_probability: vec![5.0, 10.0],
            weather_code: vec![0, 2],
        },
        daily: DailySeries {
            dates: vec!["2025-05-28".into()],
            max_temp: vec![24.0],
            min_temp: vec![12.0],
            sunrise: vec!["2025-05-28T05:12".into()],
            sunset: vec!["2025-05-28T21:03".into()],
            weather_code: vec![3],
            max_wind_speed: vec![8.5],
        },
    }
}

/// Geocoder stub: optionally sleeps, then returns a fixed candidate list or
/// an error. Counts calls.
#[derive(Debug)]
struct StubGeocoder {
    candidates: Vec<GeoCandidate>,
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubGeocoder {
    fn returning(candidates: Vec<GeoCandidate>) -> Arc<Self> {
        Arc::new(Self {
            candidates,
            fail: false,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            candidates: Vec::new(),
            fail: true,
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeocodingClient for StubGeocoder {
    async fn resolve(&self, _name: &str) -> anyhow::Result<Vec<GeoCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            anyhow::bail!("connection refused");
        }
        Ok(self.candidates.clone())
    }
}

/// Geocoder stub for race tests: echoes the query back as a matching
/// candidate after a per-query delay, with the latitude drawn from the
/// delay table so results are distinguishable downstream.
#[derive(Debug)]
struct EchoGeocoder {
    delays: Vec<(&'static str, u64, f64)>,
}

#[async_trait]
impl GeocodingClient for EchoGeocoder {
    async fn resolve(&self, name: &str) -> anyhow::Result<Vec<GeoCandidate>> {
        let (_, delay_ms, latitude) = self
            .delays
            .iter()
            .find(|(n, _, _)| *n == name)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unexpected query {name}"))?;
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Ok(vec![GeoCandidate {
            name: name.to_string(),
            latitude,
            longitude: 0.0,
        }])
    }
}

/// Forecaster stub: returns a payload whose current temperature equals the
/// requested latitude, so tests can tell which coordinates were fetched.
/// Records the units it was asked for.
#[derive(Debug)]
struct StubForecaster {
    fail: bool,
    calls: AtomicUsize,
    units: Mutex<Vec<TemperatureUnit>>,
}

impl StubForecaster {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: AtomicUsize::new(0),
            units: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: AtomicUsize::new(0),
            units: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn units_seen(&self) -> Vec<TemperatureUnit> {
        self.units.lock().expect("units lock").clone()
    }
}

#[async_trait]
impl ForecastClient for StubForecaster {
    async fn fetch(
        &self,
        latitude: f64,
        _longitude: f64,
        unit: TemperatureUnit,
    ) -> anyhow::Result<ForecastData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.units.lock().expect("units lock").push(unit);
        if self.fail {
            anyhow::bail!("502 from upstream");
        }
        Ok(sample_forecast(latitude))
    }
}

fn paris() -> GeoCandidate {
    GeoCandidate {
        name: "Paris".to_string(),
        latitude: 48.85,
        longitude: 2.35,
    }
}

async fn settle(session: &WeatherSession) -> SessionState {
    let mut rx = session.subscribe();
    rx.wait_for(SessionState::is_settled)
        .await
        .expect("session dropped")
        .clone()
}

#[tokio::test]
async fn blank_search_sets_validation_error_without_network() {
    let geocoder = StubGeocoder::returning(vec![paris()]);
    let forecaster = StubForecaster::ok();
    let session = WeatherSession::new(geocoder.clone(), forecaster.clone());

    session.search("   \t ");

    let state = session.snapshot();
    assert!(state.envelope.is_none());
    assert_eq!(state.error_message, BLANK_QUERY_MESSAGE);
    assert_eq!(geocoder.call_count(), 0);
    assert_eq!(forecaster.call_count(), 0);
}

#[tokio::test]
async fn search_sets_loading_before_yielding() {
    let session = WeatherSession::new(StubGeocoder::returning(vec![paris()]), StubForecaster::ok());

    session.search("paris");

    // The spawned fetch has not run yet on this single-threaded runtime:
    // the synchronous transition to Loading is already visible.
    assert_eq!(session.envelope(), Some(FetchState::Loading));
    assert_eq!(session.error_message(), "");
}

#[tokio::test]
async fn successful_search_canonicalizes_query() {
    let geocoder = StubGeocoder::returning(vec![paris()]);
    let forecaster = StubForecaster::ok();
    let session = WeatherSession::new(geocoder.clone(), forecaster.clone());

    session.search("paRIs");
    let state = settle(&session).await;

    assert_eq!(state.query, "Paris");
    assert_eq!(state.error_message, "");
    match state.envelope {
        Some(FetchState::Success(data)) => assert_eq!(data.current.temperature, 48.85),
        other => panic!("expected Success, got {other:?}"),
    }
    assert_eq!(forecaster.units_seen(), vec![TemperatureUnit::Celsius]);
}

#[tokio::test]
async fn non_matching_candidates_yield_not_found() {
    let geocoder = StubGeocoder::returning(vec![GeoCandidate {
        name: "Parisville".to_string(),
        latitude: 0.0,
        longitude: 0.0,
    }]);
    let forecaster = StubForecaster::ok();
    let session = WeatherSession::new(geocoder, forecaster.clone());

    session.search("Paris");
    let state = settle(&session).await;

    assert!(state.envelope.is_none());
    assert_eq!(state.error_message, NOT_FOUND_MESSAGE);
    assert_eq!(forecaster.call_count(), 0);
}

#[tokio::test]
async fn empty_candidate_list_yields_not_found() {
    let session = WeatherSession::new(StubGeocoder::returning(Vec::new()), StubForecaster::ok());

    session.search("Atlantis");
    let state = settle(&session).await;

    assert!(state.envelope.is_none());
    assert_eq!(state.error_message, NOT_FOUND_MESSAGE);
    assert_eq!(state.query, "Atlantis");
}

#[tokio::test]
async fn geocoder_failure_becomes_generic_error() {
    let session = WeatherSession::new(StubGeocoder::failing(), StubForecaster::ok());

    session.search("Paris");
    let state = settle(&session).await;

    assert_eq!(
        state.envelope,
        Some(FetchState::Error(FETCH_FAILED_MESSAGE.to_string()))
    );
}

#[tokio::test]
async fn forecaster_failure_becomes_generic_error() {
    let session = WeatherSession::new(
        StubGeocoder::returning(vec![paris()]),
        StubForecaster::failing(),
    );

    session.search("Paris");
    let state = settle(&session).await;

    assert_eq!(
        state.envelope,
        Some(FetchState::Error(FETCH_FAILED_MESSAGE.to_string()))
    );
    // The candidate still resolved, so the canonical name stuck.
    assert_eq!(state.query, "Paris");
}

#[tokio::test]
async fn set_unit_refetches_with_existing_query() {
    let geocoder = StubGeocoder::returning(vec![paris()]);
    let forecaster = StubForecaster::ok();
    let session = WeatherSession::new(geocoder.clone(), forecaster.clone());

    session.search("paris");
    settle(&session).await;

    session.set_unit(TemperatureUnit::Fahrenheit);
    assert_eq!(session.envelope(), Some(FetchState::Loading));
    let state = settle(&session).await;

    assert_eq!(state.unit, TemperatureUnit::Fahrenheit);
    assert_eq!(state.query, "Paris");
    assert!(matches!(state.envelope, Some(FetchState::Success(_))));
    assert_eq!(geocoder.call_count(), 2);
    assert_eq!(
        forecaster.units_seen(),
        vec![TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit]
    );
}

#[tokio::test]
async fn set_unit_without_query_is_guarded() {
    let geocoder = StubGeocoder::returning(vec![paris()]);
    let forecaster = StubForecaster::ok();
    let session = WeatherSession::new(geocoder.clone(), forecaster.clone());

    session.set_unit(TemperatureUnit::Fahrenheit);

    let state = session.snapshot();
    assert_eq!(state.unit, TemperatureUnit::Fahrenheit);
    assert!(state.envelope.is_none());
    assert_eq!(state.error_message, BLANK_QUERY_MESSAGE);
    assert_eq!(geocoder.call_count(), 0);
    assert_eq!(forecaster.call_count(), 0);
}

#[tokio::test]
async fn clear_resets_everything_but_the_unit() {
    let session = WeatherSession::new(StubGeocoder::returning(vec![paris()]), StubForecaster::ok());

    session.search("paris");
    settle(&session).await;
    session.set_unit(TemperatureUnit::Fahrenheit);
    settle(&session).await;

    session.clear();

    let state = session.snapshot();
    assert_eq!(state.query, "");
    assert!(state.envelope.is_none());
    assert_eq!(state.error_message, "");
    assert_eq!(state.unit, TemperatureUnit::Fahrenheit);
}

#[tokio::test(start_paused = true)]
async fn clear_discards_an_in_flight_fetch() {
    let geocoder = Arc::new(StubGeocoder {
        candidates: vec![paris()],
        fail: false,
        delay: Some(Duration::from_millis(100)),
        calls: AtomicUsize::new(0),
    });
    let session = WeatherSession::new(geocoder, StubForecaster::ok());

    session.search("paris");
    session.clear();

    // Let the superseded fetch run to completion; it must not resurface.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let state = session.snapshot();
    assert_eq!(state.query, "");
    assert!(state.envelope.is_none());
    assert_eq!(state.error_message, "");
}

#[tokio::test(start_paused = true)]
async fn slow_old_fetch_does_not_overwrite_newer_result() {
    let geocoder = Arc::new(EchoGeocoder {
        delays: vec![("Slowville", 500, 10.0), ("Fastburg", 10, 20.0)],
    });
    let forecaster = StubForecaster::ok();
    let session = WeatherSession::new(geocoder, forecaster.clone());

    session.search("Slowville");
    session.search("Fastburg");

    let state = settle(&session).await;
    assert_eq!(state.query, "Fastburg");

    // The first sequence finishes long after the second; its result and its
    // canonical-name update are both dropped.
    tokio::time::sleep(Duration::from_millis(1000)).await;

    let state = session.snapshot();
    assert_eq!(state.query, "Fastburg");
    match state.envelope {
        Some(FetchState::Success(data)) => assert_eq!(data.current.temperature, 20.0),
        other => panic!("expected Success, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn old_fetch_finishing_mid_flight_cannot_replace_loading() {
    let geocoder = Arc::new(EchoGeocoder {
        delays: vec![("Oldtown", 50, 10.0), ("Newtown", 500, 20.0)],
    });
    let session = WeatherSession::new(geocoder, StubForecaster::ok());

    session.search("Oldtown");
    session.search("Newtown");

    // The Oldtown sequence resolves well before Newtown does; observers
    // must keep seeing Loading, not Oldtown's stale terminal state.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let state = session.snapshot();
    assert_eq!(state.query, "Newtown");
    assert_eq!(state.envelope, Some(FetchState::Loading));

    let state = settle(&session).await;
    match state.envelope {
        Some(FetchState::Success(data)) => assert_eq!(data.current.temperature, 20.0),
        other => panic!("expected Success, got {other:?}"),
    }
}

#[tokio::test]
async fn every_subscriber_sees_the_terminal_state() {
    let session = WeatherSession::new(StubGeocoder::returning(vec![paris()]), StubForecaster::ok());

    let mut first = session.subscribe();
    let mut second = session.subscribe();

    session.search("paris");

    let a = first
        .wait_for(SessionState::is_settled)
        .await
        .expect("session dropped")
        .clone();
    let b = second
        .wait_for(SessionState::is_settled)
        .await
        .expect("session dropped")
        .clone();

    assert_eq!(a.query, b.query);
    assert!(matches!(a.envelope, Some(FetchState::Success(_))));
    assert_eq!(a.envelope, b.envelope);
}
