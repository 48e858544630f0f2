use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::model::{Band, DaySchedule, SetpointType, ThermostatState, Weekday, Zone};
use crate::protocol;
use crate::schedule;
use crate::{Error, Result};

pub const DEFAULT_POLLING_INTERVAL_MIN: u64 = 10;
pub const MIN_POLLING_INTERVAL_MIN: u64 = 5;

/// Zone whose atHome flag stands in for whole-unit presence.
pub const DEFAULT_ZONE_ID: &str = "1";

pub struct MonetaClientBuilder {
    access_token: String,
    base_url: String,
    polling_interval_min: u64,
    zone_names: Vec<String>,
}

impl MonetaClientBuilder {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: protocol::API_BASE_URL.to_string(),
            polling_interval_min: DEFAULT_POLLING_INTERVAL_MIN,
            zone_names: Vec::new(),
        }
    }

    /// Override the API base URL (tests point this at a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Cache TTL in minutes. Values below the hard floor of 5 are raised to it.
    pub fn polling_interval_minutes(mut self, minutes: u64) -> Self {
        self.polling_interval_min = minutes;
        self
    }

    /// Optional display names, matched to zones by snapshot position.
    pub fn zone_names(mut self, names: Vec<String>) -> Self {
        self.zone_names = names;
        self
    }

    pub fn build(self) -> MonetaClient {
        let minutes = self.polling_interval_min.max(MIN_POLLING_INTERVAL_MIN);
        let mut base = self.base_url;
        if !base.ends_with('/') {
            base.push('/');
        }
        MonetaClient {
            http: reqwest::Client::new(),
            endpoint: format!("{base}{}", protocol::API_ENDPOINT),
            access_token: self.access_token,
            polling_interval: Duration::from_secs(minutes * 60),
            zone_names: self.zone_names,
            cache: Mutex::new(CacheSlot::default()),
        }
    }
}

/// The one piece of shared mutable state: the cached snapshot, its TTL
/// deadline, and the in-flight flag guarding against duplicate fetches.
/// Always accessed under the mutex; never held across an await point.
#[derive(Default)]
struct CacheSlot {
    snapshot: Option<Arc<ThermostatState>>,
    expires_at: Option<Instant>,
    in_flight: bool,
    last_refresh_ok: bool,
}

impl CacheSlot {
    fn fresh(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| now < deadline)
    }

    /// True when the caller should return the cached snapshot instead of
    /// fetching: either the TTL has not elapsed or another fetch is already
    /// on the wire.
    fn serve_cached(&self, now: Instant) -> bool {
        self.in_flight || self.fresh(now)
    }
}

/// Client for the PlanetSmartCity cloud thermostat API.
///
/// Single owner of the cached [`ThermostatState`] and sole issuer of vendor
/// calls. All read and write operations fail soft: transport and protocol
/// failures are logged and surface as `None`/`false`, never as panics or
/// errors the caller must catch.
pub struct MonetaClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: String,
    polling_interval: Duration,
    zone_names: Vec<String>,
    cache: Mutex<CacheSlot>,
}

impl MonetaClient {
    pub fn builder(access_token: impl Into<String>) -> MonetaClientBuilder {
        MonetaClientBuilder::new(access_token)
    }

    // -- Read API --

    /// Current thermostat state. Serves the cached snapshot while it is
    /// fresh or while another fetch is in flight; otherwise fetches. On
    /// failure the previous snapshot (or None) is returned — the scheduler
    /// treats a None result as a failed refresh.
    pub async fn get_state(&self) -> Option<Arc<ThermostatState>> {
        {
            let mut cache = self.cache.lock();
            if cache.serve_cached(Instant::now()) {
                return cache.snapshot.clone();
            }
            cache.in_flight = true;
        }

        info!("fetching thermostat state");
        let fetched = self.fetch_state().await;

        let mut cache = self.cache.lock();
        cache.in_flight = false;
        cache.last_refresh_ok = fetched.is_some();
        if let Some(state) = fetched {
            let until = Utc::now()
                + chrono::Duration::from_std(self.polling_interval)
                    .unwrap_or_else(|_| chrono::Duration::zero());
            info!(
                zones = state.zones.len(),
                cached_until = %until.format("%H:%M:%S"),
                "thermostat state fetched"
            );
            cache.snapshot = Some(Arc::new(state));
            cache.expires_at = Some(Instant::now() + self.polling_interval);
        }
        cache.snapshot.clone()
    }

    /// Last cached snapshot regardless of freshness. No network access.
    pub fn cached_state(&self) -> Option<Arc<ThermostatState>> {
        self.cache.lock().snapshot.clone()
    }

    /// Whether the most recent fetch attempt succeeded.
    pub fn last_refresh_ok(&self) -> bool {
        self.cache.lock().last_refresh_ok
    }

    /// A zone is available only while it appears in the latest successful
    /// snapshot: season-dependent zones drop out of the payload entirely and
    /// must not be shown with stale or default values.
    pub fn is_zone_available(&self, zone_id: &str) -> bool {
        let cache = self.cache.lock();
        cache.last_refresh_ok
            && cache
                .snapshot
                .as_ref()
                .is_some_and(|s| s.zone(zone_id).is_some())
    }

    pub fn zone_by_id(&self, zone_id: &str) -> Option<Zone> {
        self.cached_state()?.zone(zone_id).cloned()
    }

    /// Cached setpoint temperature for one zone, if both exist.
    pub fn setpoint_temperature(&self, zone_id: &str, kind: SetpointType) -> Option<f64> {
        self.zone_by_id(zone_id)?.setpoint(kind)
    }

    /// atHome flag of the default zone, used as whole-unit presence.
    pub fn presence(&self) -> bool {
        self.zone_by_id(DEFAULT_ZONE_ID).is_some_and(|z| z.at_home)
    }

    /// Configured display name for the zone at the given snapshot position.
    pub fn zone_display_name(&self, index: usize, zone_id: &str) -> String {
        self.zone_names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("Thermostat Zone {zone_id}"))
    }

    /// Expire the cache so the next [`get_state`](Self::get_state) call
    /// fetches fresh data.
    pub fn invalidate_cache(&self) {
        self.cache.lock().expires_at = None;
        debug!("cache invalidated");
    }

    /// Bypass the TTL: expire the cache and refresh immediately.
    pub async fn force_refresh(&self) -> Option<Arc<ThermostatState>> {
        self.invalidate_cache();
        self.get_state().await
    }

    /// Probe the endpoint for setup validation. Distinguishes an unreachable
    /// or rejecting endpoint ([`Error::CannotConnect`]) from a reachable one
    /// answering with an unexpected shape ([`Error::Decode`]).
    pub async fn verify_connection(&self) -> Result<String> {
        let first = self
            .api_post(&protocol::full_state_request())
            .await
            .ok_or(Error::CannotConnect)?;
        let state: ThermostatState =
            serde_path_to_error::deserialize(first).map_err(|e| Error::Decode(e.to_string()))?;
        Ok(state.unit_code)
    }

    // -- Write API --
    // Every write builds its payload from the cached snapshot, POSTs, and on
    // a structurally successful response expires the cache so the next read
    // re-derives truth from the server. Writes are never reflected locally.

    /// Park every zone: the unit shares one mode, so off applies everywhere.
    pub async fn set_off(&self) -> bool {
        let Some(state) = self.cached_state() else {
            warn!("set_off: no cached state");
            return false;
        };
        let zones = state.zones.iter().map(protocol::off_zone).collect();
        self.send_setpoint(&state, zones).await
    }

    /// Return every zone to schedule-following auto mode.
    pub async fn set_auto(&self) -> bool {
        let Some(state) = self.cached_state() else {
            warn!("set_auto: no cached state");
            return false;
        };
        let zones = state.zones.iter().map(|z| protocol::auto_zone(&z.id)).collect();
        self.send_setpoint(&state, zones).await
    }

    /// Switch every zone to manual mode seeded from its present setpoint.
    pub async fn set_heat_cool(&self) -> bool {
        let Some(state) = self.cached_state() else {
            warn!("set_heat_cool: no cached state");
            return false;
        };
        let zones = state.zones.iter().map(protocol::manual_zone).collect();
        self.send_setpoint(&state, zones).await
    }

    /// Boost one zone (or all zones when `zone_id` is None) to its comfort
    /// setpoint for the fixed party duration.
    pub async fn set_party(&self, zone_id: Option<&str>) -> bool {
        let Some(state) = self.cached_state() else {
            warn!("set_party: no cached state");
            return false;
        };
        let expiration = protocol::party_expiration(Utc::now());
        let zones: Vec<Value> = state
            .zones
            .iter()
            .filter(|z| zone_id.is_none_or(|id| z.id == id))
            .map(|z| protocol::party_zone(z, expiration))
            .collect();
        if zones.is_empty() {
            warn!(zone_id = ?zone_id, "set_party: zone not in snapshot");
            return false;
        }
        self.send_setpoint(&state, zones).await
    }

    /// Hold every zone at its absent setpoint with the unit off.
    pub async fn set_frost_protection(&self) -> bool {
        let Some(state) = self.cached_state() else {
            warn!("set_frost_protection: no cached state");
            return false;
        };
        let zones = state.zones.iter().map(protocol::frost_zone).collect();
        self.send_setpoint(&state, zones).await
    }

    /// Long-duration away override for all zones.
    pub async fn set_holiday(&self) -> bool {
        let Some(state) = self.cached_state() else {
            warn!("set_holiday: no cached state");
            return false;
        };
        let expiration = protocol::holiday_expiration(Utc::now());
        let zones = state
            .zones
            .iter()
            .map(|z| protocol::holiday_zone(&z.id, expiration))
            .collect();
        self.send_setpoint(&state, zones).await
    }

    pub async fn set_manual_temperature(&self, zone_id: &str, temperature: f64) -> bool {
        let Some(state) = self.cached_state() else {
            warn!("set_manual_temperature: no cached state");
            return false;
        };
        if state.zone(zone_id).is_none() {
            warn!(zone_id, "set_manual_temperature: zone not in snapshot");
            return false;
        }
        let zones = vec![protocol::manual_temperature_zone(zone_id, temperature)];
        self.send_setpoint(&state, zones).await
    }

    /// Update the present and/or absent setpoint for one zone. Values equal
    /// to the zone's current cached setpoint are dropped; when nothing is
    /// left to write the network call is skipped entirely and the call
    /// reports success.
    pub async fn set_present_absent_temperature(
        &self,
        zone_id: &str,
        present: Option<f64>,
        absent: Option<f64>,
    ) -> bool {
        let Some(state) = self.cached_state() else {
            warn!("set_present_absent_temperature: no cached state");
            return false;
        };
        let Some(zone) = state.zone(zone_id) else {
            warn!(zone_id, "set_present_absent_temperature: zone not in snapshot");
            return false;
        };

        let writes = pending_setpoint_writes(zone, present, absent);
        if writes.is_empty() {
            debug!(zone_id, "setpoints unchanged, skipping write");
            return true;
        }

        let zones = vec![protocol::setpoints_zone(zone_id, &writes)];
        self.send_setpoint(&state, zones).await
    }

    /// Replace one zone's full 7-day calendar.
    pub async fn set_schedule_by_zone_id(
        &self,
        zone_id: &str,
        weekly: &[DaySchedule],
        step: u32,
    ) -> bool {
        let Some(state) = self.cached_state() else {
            warn!("set_schedule_by_zone_id: no cached state");
            return false;
        };
        if state.zone(zone_id).is_none() {
            warn!(zone_id, "set_schedule_by_zone_id: zone not in snapshot");
            return false;
        }
        let zones = vec![protocol::calendar_zone(zone_id, step, weekly)];
        self.send_setpoint(&state, zones).await
    }

    /// Apply a single-day schedule edit: merge the day into the canonical
    /// calendar and push the reassembled week to every zone, since the
    /// protocol stores a copy per zone even though schedules are shared.
    pub async fn set_schedule_day(&self, day: Weekday, bands: Vec<Band>) -> bool {
        let Some(state) = self.cached_state() else {
            warn!("set_schedule_day: no cached state");
            return false;
        };
        let calendar = schedule::canonical_calendar(&state);
        let step = calendar.map_or(schedule::DEFAULT_STEP_MINUTES, |c| c.step);
        let weekly = schedule::merge_day(calendar, day, bands);

        let mut all_ok = true;
        for zone in &state.zones {
            if !self.set_schedule_by_zone_id(&zone.id, &weekly, step).await {
                error!(zone_id = %zone.id, day = %day, "schedule push failed");
                all_ok = false;
            }
        }
        all_ok
    }

    // -- Helpers --

    async fn fetch_state(&self) -> Option<ThermostatState> {
        let first = self.api_post(&protocol::full_state_request()).await?;
        match serde_path_to_error::deserialize(first) {
            Ok(state) => Some(state),
            Err(e) => {
                error!(path = %e.path(), error = %e, "malformed thermostat payload");
                None
            }
        }
    }

    async fn send_setpoint(&self, state: &ThermostatState, zones: Vec<Value>) -> bool {
        let payload = protocol::setpoint_request(&state.unit_code, state.category, zones);
        match self.api_post(&payload).await {
            Some(first) if protocol::command_accepted(&first) => {
                self.invalidate_cache();
                true
            }
            Some(first) => {
                error!(response = %first, "thermostat command rejected");
                false
            }
            None => false,
        }
    }

    /// POST one request and return the validated first response element.
    /// All failure classes (transport, non-200, malformed or error-flagged
    /// envelope) are logged here and collapse to None.
    async fn api_post(&self, payload: &Value) -> Option<Value> {
        debug!(request = %payload, "thermostat API request");
        let response = match self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .header("x-planet-source", protocol::SOURCE_HEADER)
            .header("timezone-offset", protocol::TIMEZONE_OFFSET)
            .json(payload)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, "thermostat API transport failure");
                return None;
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            error!(%status, "thermostat API returned non-200");
            return None;
        }

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "thermostat API body is not JSON");
                return None;
            }
        };
        debug!(response = %body, "thermostat API response");

        match protocol::parse_envelope(&body) {
            Some(first) => Some(first.clone()),
            None => {
                error!(body = %body, "thermostat API error envelope");
                None
            }
        }
    }
}

/// Setpoint writes that would actually change the zone: requested values
/// matching the cached setpoint are dropped so redundant writes (and their
/// server-side side effects) are avoided.
fn pending_setpoint_writes(
    zone: &Zone,
    present: Option<f64>,
    absent: Option<f64>,
) -> Vec<(SetpointType, f64)> {
    let mut writes = Vec::new();
    if let Some(temp) = present
        && zone.setpoint(SetpointType::Present) != Some(temp)
    {
        writes.push((SetpointType::Present, temp));
    }
    if let Some(temp) = absent
        && zone.setpoint(SetpointType::Absent) != Some(temp)
    {
        writes.push((SetpointType::Absent, temp));
    }
    writes
}
