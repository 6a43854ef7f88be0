use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::extract::State;
use axum::http::Uri;
use axum::routing::get;
use serde::Serialize;
use serde::ser::SerializeMap;
use strum::IntoEnumIterator;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::state::Characteristic;
use crate::state::ThermostatState;
use crate::state::Update;

/// Query string as ordered key/value pairs
type QueryPairs = Vec<(String, String)>;

/// Shared application state
struct AppState {
    thermostat: Mutex<ThermostatState>,
}

impl AppState {
    fn snapshot(&self) -> ThermostatState {
        self.thermostat
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn apply(&self, update: Update) {
        self.thermostat
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(update);
    }
}

/// Response for a successful mutation: `{"result": "ok", "<characteristic>": <value>}`
struct Ack(Update);

impl Serialize for Ack {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("result", "ok")?;
        map.serialize_entry(self.0.characteristic().as_ref(), &self.0.value())?;
        map.end()
    }
}

/// Handler for GET /status
#[tracing::instrument(skip(state))]
async fn status(State(state): State<Arc<AppState>>) -> Json<ThermostatState> {
    tracing::debug!("Handling /status request");
    Json(state.snapshot())
}

/// Handler shared by every characteristic route
#[tracing::instrument(skip(state))]
async fn set_characteristic(
    characteristic: Characteristic,
    state: Arc<AppState>,
    params: QueryPairs,
) -> Result<Json<Ack>, ApiError> {
    let raw = query_value(&params).ok_or(ApiError::MissingValue)?;
    let update = Update::parse(characteristic, raw)?;

    state.apply(update);
    tracing::info!("{}", update);

    Ok(Json(Ack(update)))
}

async fn not_found(uri: Uri) -> ApiError {
    tracing::warn!("Invalid request: {}", uri);
    ApiError::NotFound
}

/// First non-empty `value` parameter. Blank values count as absent.
fn query_value(params: &[(String, String)]) -> Option<&str> {
    params
        .iter()
        .find(|(key, value)| key == "value" && !value.is_empty())
        .map(|(_, value)| value.as_str())
}

/// Create the API router with all endpoints
fn create_router(state: Arc<AppState>) -> Router {
    let mut router: Router<Arc<AppState>> = Router::new().route("/status", get(status));

    for characteristic in Characteristic::iter() {
        router = router.route(
            &characteristic.path(),
            get(
                move |State(state): State<Arc<AppState>>, Query(params): Query<QueryPairs>| {
                    set_characteristic(characteristic, state, params)
                },
            ),
        );
    }

    router
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Build a router serving `thermostat` as its initial state
pub fn router(thermostat: ThermostatState) -> Router {
    create_router(Arc::new(AppState {
        thermostat: Mutex::new(thermostat),
    }))
}

/// Start the mock thermostat server
///
/// Binds to `listen:port` and serves until `shutdown_rx` fires.
///
/// # Arguments
/// * `listen` - The IP address to listen on (e.g., "0.0.0.0")
/// * `port` - The port to listen on (e.g., 8000)
/// * `thermostat` - Initial thermostat state
/// * `shutdown_rx` - A oneshot receiver that will trigger graceful shutdown
pub async fn serve(
    listen: &str,
    port: u16,
    thermostat: ThermostatState,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = format!("{}:{}", listen, port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    serve_on(listener, thermostat, shutdown_rx).await
}

/// Serve on an already bound listener
///
/// Useful when binding port 0 and reading the assigned port back from the listener.
pub async fn serve_on(
    listener: TcpListener,
    thermostat: ThermostatState,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Serving on {}...", listener.local_addr()?);

    axum::serve(listener, router(thermostat))
        .with_graceful_shutdown(async {
            shutdown_rx.await.ok();
            tracing::info!("Thermostat server shutting down gracefully");
        })
        .await?;

    Ok(())
}
