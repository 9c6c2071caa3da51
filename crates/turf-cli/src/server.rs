use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, extract};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use turf_core::{
    DisplayIdentity, GeoPoint, Tunables, UserId, constants::DEFAULT_PROFILE_COLOR, issue_token,
    now_unix_secs, unix_to_iso8601, valid_color, valid_name,
};
use turf_store::{DiscoveryEngine, ProfileRecord, ScoreLedger, Store, StoreError, TerritoryEngine};

/// The HTTP surface. All game state sits behind one async mutex: the
/// scheduling model is one logical operation per request against a
/// shared store, and the revision check in the store is the backstop
/// for anything reaching the database from outside this process.
#[derive(Clone)]
pub struct TurfServer {
    state: Arc<Mutex<ServerState>>,
}

struct ServerState {
    store: Store,
    rng: SmallRng,
    tunables: Tunables,
    admin_key: String,
    endpoint: String,
}

/// Transport-level failures. Engine rejections (cooldown, self-capture)
/// are not errors and never pass through here.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(&'static str),
    NotFound(&'static str),
    BadRequest(&'static str),
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        tracing::error!("store failure: {e}");
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

impl TurfServer {
    pub fn new(store: Store, tunables: Tunables, admin_key: String, endpoint: String) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState {
                store,
                rng: SmallRng::from_os_rng(),
                tunables,
                admin_key,
                endpoint,
            })),
        }
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(version))
            .route("/register", get(register))
            .route("/profile", get(own_profile))
            .route("/profile/{id}", get(profile_by_id))
            .route("/settings/name", get(settings_name))
            .route("/settings/color", get(settings_color))
            .route("/nearby/{latitude}/{longitude}", get(nearby))
            .route("/hotspot/setup", get(hotspot_setup))
            .route("/hotspot/capture/{ssid}", get(hotspot_capture))
            .route("/hotspot/update", get(hotspot_update))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self)
    }

    // --- Operations, one per endpoint ---

    async fn version_doc(&self) -> Value {
        let state = self.state.lock().await;
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "endpoint": state.endpoint,
        })
    }

    /// Register a device, or hand back the existing credential when the
    /// device has been here before.
    async fn register(&self, device: &str, name: &str) -> Result<Value, ApiError> {
        let mut state = self.state.lock().await;
        let ServerState { store, rng, .. } = &mut *state;

        if let Some((id, token)) = store.account_by_device(device)? {
            return Ok(json!({ "token": token, "id": id.0 }));
        }

        let token = issue_token(rng);
        let id = store.create_account(device, &token, name, DEFAULT_PROFILE_COLOR)?;
        tracing::info!("registered profile {} for new device", id.0);
        Ok(json!({ "token": token, "id": id.0 }))
    }

    async fn own_profile(&self, token: &str) -> Result<Value, ApiError> {
        let state = self.state.lock().await;
        let user = resolve(&state.store, token)?;
        let record = state
            .store
            .profile_by_id(user)?
            .ok_or_else(|| ApiError::Internal(format!("account {} has no profile", user.0)))?;
        profile_json(&state.store, record)
    }

    async fn profile_by_id(&self, token: &str, id: i64) -> Result<Value, ApiError> {
        let state = self.state.lock().await;
        resolve(&state.store, token)?;
        let record = state
            .store
            .profile_by_id(UserId(id))?
            .ok_or(ApiError::NotFound("profile not found"))?;
        profile_json(&state.store, record)
    }

    async fn settings_name(&self, token: &str, name: &str) -> Result<Value, ApiError> {
        let state = self.state.lock().await;
        let user = resolve(&state.store, token)?;
        if !valid_name(name) {
            return Err(ApiError::BadRequest("invalid user name"));
        }
        state.store.set_profile_name(user, name)?;
        let record = state
            .store
            .profile_by_id(user)?
            .ok_or_else(|| ApiError::Internal(format!("account {} has no profile", user.0)))?;
        profile_json(&state.store, record)
    }

    async fn settings_color(&self, token: &str, color: &str) -> Result<Value, ApiError> {
        let state = self.state.lock().await;
        let user = resolve(&state.store, token)?;
        if !valid_color(color) {
            return Err(ApiError::BadRequest("invalid color code"));
        }
        state.store.set_profile_color(user, color)?;
        let record = state
            .store
            .profile_by_id(user)?
            .ok_or_else(|| ApiError::Internal(format!("account {} has no profile", user.0)))?;
        profile_json(&state.store, record)
    }

    /// Record the caller's position, then answer who else is close.
    async fn nearby(&self, token: &str, lat: f64, lon: f64) -> Result<Value, ApiError> {
        let state = self.state.lock().await;
        let user = resolve(&state.store, token)?;
        let discovery = DiscoveryEngine::new(&state.store, state.tunables);
        let now = now_unix_secs();
        let origin = GeoPoint::new(lat, lon);

        discovery.record_position(user, origin, now)?;
        discovery.prune_stale(now)?;
        let entries: Vec<Value> = discovery
            .find_nearby(user, origin, now)?
            .into_iter()
            .map(|e| {
                json!({
                    "id": e.id.0,
                    "distance": e.distance,
                    "date": unix_to_iso8601(e.observed_at),
                    "device": e.device,
                })
            })
            .collect();

        Ok(json!({ "nearby": entries }))
    }

    /// Install a new hotspot. Gated by the admin key, not a player token.
    async fn hotspot_setup(&self, secret: &str) -> Result<Value, ApiError> {
        let mut state = self.state.lock().await;
        if secret != state.admin_key {
            return Err(ApiError::Unauthorized("invalid admin key"));
        }
        let ServerState {
            store,
            rng,
            tunables,
            ..
        } = &mut *state;

        let territory = TerritoryEngine::new(store, *tunables);
        let hotspot = territory.create(rng, now_unix_secs())?;
        Ok(json!({ "token": hotspot.token, "ssid": hotspot.ssid }))
    }

    async fn hotspot_capture(&self, token: &str, ssid: &str) -> Result<Value, ApiError> {
        let state = self.state.lock().await;
        let user = resolve(&state.store, token)?;
        let territory = TerritoryEngine::new(&state.store, state.tunables);

        let hotspot = territory
            .by_ssid(ssid)?
            .ok_or(ApiError::NotFound("unknown hotspot ssid"))?;
        let outcome = territory.capture(&hotspot, user, now_unix_secs())?;
        Ok(json!({ "accepted": outcome.accepted }))
    }

    /// Administrative refresh: rotate the advertised identifier and
    /// report who currently holds the beacon.
    async fn hotspot_update(&self, token: &str) -> Result<Value, ApiError> {
        let state = self.state.lock().await;
        let territory = TerritoryEngine::new(&state.store, state.tunables);

        let hotspot = territory
            .by_token(token)?
            .ok_or(ApiError::Unauthorized("invalid hotspot token"))?;
        let ssid = territory.rotate(&hotspot)?;

        let identity = match hotspot.conqueror {
            Some(user) => state
                .store
                .profile_by_id(user)?
                .map(|p| DisplayIdentity {
                    name: p.name,
                    color: p.color,
                })
                .unwrap_or_else(DisplayIdentity::unclaimed),
            None => DisplayIdentity::unclaimed(),
        };

        Ok(json!({
            "ssid": ssid,
            "name": identity.name,
            "color": identity.color,
            "capture": hotspot.last_capture_at,
        }))
    }
}

fn resolve(store: &Store, token: &str) -> Result<UserId, ApiError> {
    store
        .account_by_token(token)?
        .ok_or(ApiError::Unauthorized("invalid access token"))
}

fn profile_json(store: &Store, record: ProfileRecord) -> Result<Value, ApiError> {
    let points = ScoreLedger::new(store).total_of(record.id)?;
    let friends: Vec<i64> = store.friend_ids(record.id)?.iter().map(|u| u.0).collect();
    Ok(json!({
        "id": record.id.0,
        "name": record.name,
        "points": points,
        "friends": friends,
        "picture": "",
        "color": record.color,
    }))
}

// --- Axum plumbing ---

#[derive(Deserialize)]
struct TokenQuery {
    token: String,
}

#[derive(Deserialize)]
struct RegisterQuery {
    device: String,
    name: String,
}

#[derive(Deserialize)]
struct NameQuery {
    token: String,
    name: String,
}

#[derive(Deserialize)]
struct ColorQuery {
    token: String,
    color: String,
}

#[derive(Deserialize)]
struct SecretQuery {
    secret: String,
}

async fn version(extract::State(server): extract::State<TurfServer>) -> Json<Value> {
    Json(server.version_doc().await)
}

async fn register(
    extract::State(server): extract::State<TurfServer>,
    extract::Query(q): extract::Query<RegisterQuery>,
) -> Result<Json<Value>, ApiError> {
    server.register(&q.device, &q.name).await.map(Json)
}

async fn own_profile(
    extract::State(server): extract::State<TurfServer>,
    extract::Query(q): extract::Query<TokenQuery>,
) -> Result<Json<Value>, ApiError> {
    server.own_profile(&q.token).await.map(Json)
}

async fn profile_by_id(
    extract::State(server): extract::State<TurfServer>,
    extract::Path(id): extract::Path<i64>,
    extract::Query(q): extract::Query<TokenQuery>,
) -> Result<Json<Value>, ApiError> {
    server.profile_by_id(&q.token, id).await.map(Json)
}

async fn settings_name(
    extract::State(server): extract::State<TurfServer>,
    extract::Query(q): extract::Query<NameQuery>,
) -> Result<Json<Value>, ApiError> {
    server.settings_name(&q.token, &q.name).await.map(Json)
}

async fn settings_color(
    extract::State(server): extract::State<TurfServer>,
    extract::Query(q): extract::Query<ColorQuery>,
) -> Result<Json<Value>, ApiError> {
    server.settings_color(&q.token, &q.color).await.map(Json)
}

async fn nearby(
    extract::State(server): extract::State<TurfServer>,
    extract::Path((latitude, longitude)): extract::Path<(f64, f64)>,
    extract::Query(q): extract::Query<TokenQuery>,
) -> Result<Json<Value>, ApiError> {
    server.nearby(&q.token, latitude, longitude).await.map(Json)
}

async fn hotspot_setup(
    extract::State(server): extract::State<TurfServer>,
    extract::Query(q): extract::Query<SecretQuery>,
) -> Result<Json<Value>, ApiError> {
    server.hotspot_setup(&q.secret).await.map(Json)
}

async fn hotspot_capture(
    extract::State(server): extract::State<TurfServer>,
    extract::Path(ssid): extract::Path<String>,
    extract::Query(q): extract::Query<TokenQuery>,
) -> Result<Json<Value>, ApiError> {
    server.hotspot_capture(&q.token, &ssid).await.map(Json)
}

async fn hotspot_update(
    extract::State(server): extract::State<TurfServer>,
    extract::Query(q): extract::Query<TokenQuery>,
) -> Result<Json<Value>, ApiError> {
    server.hotspot_update(&q.token).await.map(Json)
}
