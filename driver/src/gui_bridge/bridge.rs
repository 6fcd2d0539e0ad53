use crate::generator::profile::{build_snapshot_from_config, GeneratorConfig};
use crate::gui_bridge::model::VisualizationModel;
use crate::workflow::fetch::fetch_snapshot;
use crate::workflow::runner::{Runner, WorkflowResult};
use anyhow::Result;
use log::{error, info, warn};
use serde_json::json;
use skyplotcore::feed::StateSnapshot;
use std::{
    net::SocketAddr,
    sync::{Arc, PoisonError, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{
    http::StatusCode,
    reply::{Json, WithStatus},
    Filter,
};

const MAX_SNAPSHOT_BYTES: u64 = 64 * 1024 * 1024;

type SharedModel = Arc<RwLock<VisualizationModel>>;

fn store(state: &SharedModel, result: &WorkflowResult) {
    let mut guard = state.write().unwrap_or_else(PoisonError::into_inner);
    *guard = VisualizationModel::from_result(result);
}

fn pass_reply(result: &WorkflowResult) -> WithStatus<Json> {
    warp::reply::with_status(
        warp::reply::json(&json!({
            "status": "ok",
            "empty": result.marker_count() == 0,
            "markers": result.marker_count(),
            "total": result.diagnostics.total,
        })),
        StatusCode::OK,
    )
}

fn error_reply(status: StatusCode, err: &anyhow::Error) -> WithStatus<Json> {
    warp::reply::with_status(
        warp::reply::json(&json!({
            "status": "error",
            "message": format!("{err:#}"),
        })),
        status,
    )
}

/// Builds the bridge's HTTP surface over the shared model and pipeline runner.
fn routes(
    state: SharedModel,
    runner: Arc<Runner>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());
    let runner_filter = warp::any().map(move || runner.clone());

    let get_route = warp::path("payload")
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: SharedModel| {
            let guard = state.read().unwrap_or_else(PoisonError::into_inner);
            warp::reply::json(&*guard)
        });

    let metrics_route = warp::path("metrics")
        .and(warp::get())
        .and(runner_filter.clone())
        .map(|runner: Arc<Runner>| warp::reply::json(&runner.metrics()));

    let ingest_route = warp::path("ingest")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_SNAPSHOT_BYTES))
        .and(warp::body::json())
        .and(state_filter.clone())
        .and(runner_filter.clone())
        .and_then(
            |snapshot: StateSnapshot, state: SharedModel, runner: Arc<Runner>| async move {
                let reply = match runner.execute(snapshot) {
                    Ok(result) => {
                        store(&state, &result);
                        pass_reply(&result)
                    }
                    Err(err) => {
                        error!("ingest error: {:#}", err);
                        error_reply(StatusCode::UNPROCESSABLE_ENTITY, &err)
                    }
                };
                Ok::<_, warp::Rejection>(reply)
            },
        );

    let generator_route = warp::path("ingest-config")
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter.clone())
        .and(runner_filter.clone())
        .and_then(
            |config: GeneratorConfig, state: SharedModel, runner: Arc<Runner>| async move {
                let reply = match build_snapshot_from_config(&config)
                    .and_then(|snapshot| runner.execute(snapshot))
                {
                    Ok(result) => {
                        store(&state, &result);
                        if let Some(name) = config.scenario.as_ref() {
                            info!(
                                "Scenario {} ({}) -> markers {}",
                                name,
                                config.description.as_deref().unwrap_or("no description"),
                                result.marker_count()
                            );
                        }
                        pass_reply(&result)
                    }
                    Err(err) => {
                        error!("ingest-config error: {:#}", err);
                        error_reply(StatusCode::BAD_REQUEST, &err)
                    }
                };
                Ok::<_, warp::Rejection>(reply)
            },
        );

    let refresh_route = warp::path("refresh")
        .and(warp::post())
        .and(state_filter)
        .and(runner_filter)
        .and_then(|state: SharedModel, runner: Arc<Runner>| async move {
            let snapshot = match fetch_snapshot(&runner.config().source_url).await {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    runner.record_upstream_failure();
                    warn!("refresh failed: {:#}", err);
                    return Ok::<_, warp::Rejection>(error_reply(StatusCode::BAD_GATEWAY, &err));
                }
            };
            let reply = match runner.execute(snapshot) {
                Ok(result) => {
                    store(&state, &result);
                    pass_reply(&result)
                }
                Err(err) => {
                    error!("refresh error: {:#}", err);
                    error_reply(StatusCode::INTERNAL_SERVER_ERROR, &err)
                }
            };
            Ok(reply)
        });

    get_route
        .or(metrics_route)
        .or(ingest_route)
        .or(generator_route)
        .or(refresh_route)
}

/// Bridge that hosts the render-pass HTTP endpoint for the visualizer.
pub struct GuiBridge {
    state: SharedModel,
}

impl GuiBridge {
    pub fn new(runner: Arc<Runner>, address: SocketAddr) -> Self {
        let state: SharedModel = Arc::new(RwLock::new(VisualizationModel::default()));
        let filter = routes(state.clone(), runner);

        thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {}", err);
                    return;
                }
            };
            runtime.block_on(async move {
                match warp::serve(filter).try_bind_ephemeral(address) {
                    Ok((bound, server)) => {
                        info!("bridge listening on http://{}", bound);
                        server.await;
                    }
                    Err(err) => error!("bridge could not bind {}: {}", address, err),
                }
            });
        });

        Self { state }
    }

    pub fn publish(&self, model: &VisualizationModel) -> Result<()> {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *guard = model.clone();
        info!(
            "published markers: {}, accepted {} of {}",
            guard.markers.len(),
            guard.diagnostics.accepted,
            guard.diagnostics.total
        );
        Ok(())
    }

    pub fn publish_status(&self, message: &str) {
        info!("[GUI] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> VisualizationModel {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::profile::build_snapshot;
    use crate::workflow::config::WorkflowConfig;

    fn ephemeral() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    #[test]
    fn gui_bridge_updates_state() {
        let runner = Arc::new(Runner::new(WorkflowConfig::default()));
        let gui = GuiBridge::new(runner.clone(), ephemeral());
        let snapshot = build_snapshot(48, 5).unwrap();
        let result = runner.execute(snapshot).unwrap();
        let model = VisualizationModel::from_result(&result);
        gui.publish(&model).unwrap();

        let published = gui.snapshot();
        assert_eq!(published.markers.len(), result.marker_count());
        assert_eq!(published.diagnostics.total, 48);
    }

    #[test]
    fn store_replaces_previous_pass() {
        let state: SharedModel = Arc::new(RwLock::new(VisualizationModel::default()));
        let runner = Runner::new(WorkflowConfig::default());

        let rendered = runner.execute(build_snapshot(16, 4).unwrap()).unwrap();
        store(&state, &rendered);
        assert!(!state.read().unwrap().markers.is_empty());

        let empty = runner.execute(StateSnapshot::default()).unwrap();
        store(&state, &empty);
        let model = state.read().unwrap();
        assert!(model.empty);
        assert!(model.markers.is_empty());
    }

    fn shared() -> SharedModel {
        Arc::new(RwLock::new(VisualizationModel::default()))
    }

    fn body(bytes: &[u8]) -> serde_json::Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn ingest_stores_empty_pass_for_grounded_snapshot() {
        let state = shared();
        let runner = Arc::new(Runner::new(WorkflowConfig::default()));
        let filter = routes(state.clone(), runner.clone());
        let snapshot = json!({
            "time": 1_700_000_000,
            "states": [[
                "3c6444", "DLH4AB  ", "Germany", 1_700_000_000, 1_700_000_000,
                8.56, 50.03, 120.0, true, 8.0, 90.0, null, null, 130.0, null, false, 0
            ]]
        });

        let response = warp::test::request()
            .method("POST")
            .path("/ingest")
            .json(&snapshot)
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let reply = body(response.body());
        assert_eq!(reply["empty"], true);
        assert_eq!(reply["total"], 1);

        let model = state.read().unwrap().clone();
        assert!(model.empty);
        assert_eq!(model.snapshot_time, Some(1_700_000_000));
        assert_eq!(model.diagnostics.grounded, 1);
        assert_eq!(runner.metrics().empty, 1);
    }

    #[tokio::test]
    async fn payload_and_metrics_follow_ingested_pass() {
        let runner = Arc::new(Runner::new(WorkflowConfig::default()));
        let filter = routes(shared(), runner);
        let snapshot = build_snapshot_from_config(&GeneratorConfig {
            flights: 24,
            seed: 3,
            grounded_fraction: 0.0,
            missing_fraction: 0.0,
            ..Default::default()
        })
        .unwrap();

        let response = warp::test::request()
            .method("POST")
            .path("/ingest")
            .json(&snapshot)
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let markers = body(response.body())["markers"].as_u64().unwrap();

        let response = warp::test::request()
            .method("GET")
            .path("/payload")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let model: VisualizationModel = serde_json::from_slice(response.body()).unwrap();
        assert_eq!(markers, 24);
        assert_eq!(model.markers.len(), 24);
        assert_eq!(model.diagnostics.total, 24);

        let response = warp::test::request()
            .method("GET")
            .path("/metrics")
            .reply(&filter)
            .await;
        assert_eq!(body(response.body())["rendered"], 1);
    }

    #[tokio::test]
    async fn ingest_config_rejects_bad_fraction() {
        let state = shared();
        let runner = Arc::new(Runner::new(WorkflowConfig::default()));
        let filter = routes(state.clone(), runner.clone());

        let response = warp::test::request()
            .method("POST")
            .path("/ingest-config")
            .json(&json!({ "flights": 10, "missing_fraction": 1.5 }))
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let reply = body(response.body());
        assert_eq!(reply["status"], "error");
        assert!(reply["message"]
            .as_str()
            .unwrap()
            .contains("missing_fraction"));
        assert_eq!(state.read().unwrap().diagnostics.total, 0);
        assert_eq!(runner.metrics().failed, 0);
    }

    #[tokio::test]
    async fn refresh_reports_unreachable_upstream() {
        let mut config = WorkflowConfig::default();
        config.source_url = "http://127.0.0.1:1/api/states/all".into();
        let state = shared();
        let runner = Arc::new(Runner::new(config));
        let filter = routes(state.clone(), runner.clone());

        let response = warp::test::request()
            .method("POST")
            .path("/refresh")
            .reply(&filter)
            .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body(response.body())["status"], "error");
        assert_eq!(runner.metrics().failed, 1);
        assert_eq!(runner.metrics().rendered, 0);
        assert!(!state.read().unwrap().empty);
    }
}
