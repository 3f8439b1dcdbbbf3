use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{api, config::Config, loops::vessel_sync_loop::initial_load, state::AppState};
use harbor_core::{RouteAcceptance, RoutePlan, RoutePlanRequest, Simulation};
use harbor_sdk::{PlanningClient, VesselLoader};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/vessels.json");

async fn setup_app(planner: Option<PlanningClient>) -> (Router, Arc<AppState>) {
    let config = Config::from_env();
    let simulation = Simulation::new(config.simulation_config()).expect("grid");
    let state = Arc::new(AppState::new(simulation, planner.clone()));

    let loader = VesselLoader::from_path(FIXTURE, planner);
    initial_load(&state, &loader).await;

    let app = api::routes().with_state(state.clone());
    (app, state)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn send_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Planning service stand-in. Recommends departing 15 minutes out.
async fn spawn_planning_service(fail_accept: Arc<AtomicBool>) -> PlanningClient {
    async fn plan(Json(request): Json<RoutePlanRequest>) -> Json<RoutePlan> {
        Json(unit_plan(&request.ship_id))
    }

    async fn accept(
        State(fail): State<Arc<AtomicBool>>,
        Json(acceptance): Json<RouteAcceptance>,
    ) -> Result<Json<RoutePlan>, (StatusCode, &'static str)> {
        if fail.load(Ordering::SeqCst) {
            return Err((StatusCode::INTERNAL_SERVER_ERROR, "accept failed"));
        }
        Ok(Json(unit_plan(&acceptance.ship_id)))
    }

    fn unit_plan(ship_id: &str) -> RoutePlan {
        RoutePlan {
            ship_id: ship_id.to_string(),
            recommended_departure: 15.0,
            arrival_time: 50.0,
            path_points: vec![[1000.0, 700.0], [1100.0, 650.0], [1200.0, 600.0]],
            segments: Vec::new(),
            total_distance_nm: 1.2,
            total_duration_minutes: 35.0,
            optimization_type: "time".to_string(),
            time_saved_minutes: None,
            detour_distance_nm: None,
        }
    }

    let app = Router::new()
        .route("/api/route/plan", post(plan))
        .route("/api/route/accept", post(accept))
        .with_state(fail_accept);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    PlanningClient::new(format!("http://{}/api", addr))
}

#[tokio::test]
async fn health_check() {
    let (app, _state) = setup_app(None).await;
    let res = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn vessels_unavailable_until_first_load() {
    let config = Config::from_env();
    let state = Arc::new(AppState::new(
        Simulation::new(config.simulation_config()).unwrap(),
        None,
    ));
    let app = api::routes().with_state(state.clone());

    let res = app.clone().oneshot(get("/v1/vessels")).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    state.replace_vessels(Vec::new());
    let res = app.oneshot(get("/v1/vessels")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_json(res).await, json!([]));
}

#[tokio::test]
async fn list_and_fetch_vessels() {
    let (app, _state) = setup_app(None).await;

    let res = app.clone().oneshot(get("/v1/vessels")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let vessels = read_json(res).await;
    assert_eq!(vessels.as_array().unwrap().len(), 8);

    let res = app.clone().oneshot(get("/v1/vessels/ship-004")).await.unwrap();
    let vessel = read_json(res).await;
    assert_eq!(vessel["destinationCoords"], json!([129.5038, 35.8915]));

    let res = app.oneshot(get("/v1/vessels/ghost")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn position_at_zero_is_base_position() {
    let (app, _state) = setup_app(None).await;

    let res = app
        .clone()
        .oneshot(get("/v1/vessels/ship-001/position?t=0"))
        .await
        .unwrap();
    let body = read_json(res).await;
    assert_eq!(body["position"], json!([129.5801, 36.0102]));
    assert!(body["arrival_minutes"].as_f64().unwrap() > 0.0);

    // Past arrival the vessel sits on its destination.
    let res = app
        .oneshot(get("/v1/vessels/ship-001/position?t=600"))
        .await
        .unwrap();
    let body = read_json(res).await;
    assert_eq!(body["position"], json!([129.5554, 35.9896]));
}

#[tokio::test]
async fn clock_control_round_trip() {
    let (app, state) = setup_app(None).await;

    let res = app.clone().oneshot(empty("POST", "/v1/clock/start")).await.unwrap();
    assert_eq!(read_json(res).await["running"], json!(true));
    let res = app.clone().oneshot(empty("POST", "/v1/clock/start")).await.unwrap();
    assert_eq!(read_json(res).await["running"], json!(true));

    let res = app
        .clone()
        .oneshot(send_json("PUT", "/v1/clock/speed", json!({ "speed": -2.0 })))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = app
        .clone()
        .oneshot(send_json("PUT", "/v1/clock/speed", json!({ "speed": 2.0 })))
        .await
        .unwrap();
    assert_eq!(read_json(res).await["speed"], json!(2.0));

    let res = app
        .clone()
        .oneshot(send_json("PUT", "/v1/clock/seek", json!({ "time_offset": 30.0 })))
        .await
        .unwrap();
    assert_eq!(read_json(res).await["time_offset"], json!(30.0));
    assert_eq!(state.latest_snapshot().snapshot.time_offset, 30.0);

    let res = app.clone().oneshot(empty("POST", "/v1/clock/stop")).await.unwrap();
    assert_eq!(read_json(res).await["running"], json!(false));

    let res = app.oneshot(empty("POST", "/v1/clock/reset")).await.unwrap();
    assert_eq!(read_json(res).await["time_offset"], json!(0.0));
    assert_eq!(state.latest_snapshot().snapshot.time_offset, 0.0);
}

#[tokio::test]
async fn snapshot_and_congestion_agree() {
    let (app, _state) = setup_app(None).await;

    let res = app.clone().oneshot(get("/v1/snapshot")).await.unwrap();
    let snapshot = read_json(res).await;
    assert_eq!(snapshot["vessel_count"], json!(8));
    assert_eq!(snapshot["positions"].as_array().unwrap().len(), 8);
    assert_eq!(snapshot["heatmap"].as_array().unwrap().len(), 8);

    let res = app
        .clone()
        .oneshot(get("/v1/congestion?occupied=true"))
        .await
        .unwrap();
    let cells = read_json(res).await;
    let cells = cells.as_array().unwrap();
    assert!(!cells.is_empty());
    for cell in cells {
        let count = cell["shipCount"].as_u64().unwrap();
        let expected = (count * 20).min(100);
        assert_eq!(cell["congestionLevel"].as_u64().unwrap(), expected);
    }

    let res = app.oneshot(get("/v1/heatmap")).await.unwrap();
    let heatmap = read_json(res).await;
    let emergency = heatmap
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["vessel_id"] == "ship-007")
        .unwrap();
    assert_eq!(emergency["weight"], json!(1.0));
}

#[tokio::test]
async fn bounds_congestion_counts_parked_vessel() {
    let (app, _state) = setup_app(None).await;

    let res = app
        .oneshot(get(
            "/v1/congestion/bounds?sw_lon=129.557&sw_lat=35.984&ne_lon=129.559&ne_lat=35.986&t=60",
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["congestion_level"], json!(20));
}

#[tokio::test]
async fn clusters_cover_every_vessel() {
    let (app, _state) = setup_app(None).await;

    for uri in ["/v1/clusters", "/v1/clusters?t=30&max_distance=0.05"] {
        let res = app.clone().oneshot(get(uri)).await.unwrap();
        let clusters = read_json(res).await;
        let members: usize = clusters
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["members"].as_array().unwrap().len())
            .sum();
        assert_eq!(members, 8, "{uri}");
    }
}

#[tokio::test]
async fn planning_disabled_without_service() {
    let (app, _state) = setup_app(None).await;
    let res = app
        .oneshot(send_json(
            "POST",
            "/v1/routes/plan",
            json!({ "ship_id": "ship-001", "departure_time": 0.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(read_json(res).await["error"].is_string());
}

#[tokio::test]
async fn plan_then_accept_commits_route() {
    let client = spawn_planning_service(Arc::new(AtomicBool::new(false))).await;
    let (app, state) = setup_app(Some(client)).await;

    let res = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/routes/plan",
            json!({ "ship_id": "ship-001", "departure_time": 0.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_json(res).await["recommended_departure"], json!(15.0));

    let res = app.clone().oneshot(get("/v1/routes/ship-001")).await.unwrap();
    assert_eq!(read_json(res).await["phase"], json!("proposed"));

    let res = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/routes/accept",
            json!({ "ship_id": "ship-001", "accept": true }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = read_json(res).await;
    assert_eq!(body["negotiation"]["phase"], json!("committed"));
    assert_eq!(body["negotiation"]["departure"], json!(15.0));
    assert_eq!(body["negotiation"]["mode"], json!("flexible"));
    assert_eq!(body["vessel"]["optimizationMode"], json!("flexible"));

    let vessel = state.get_vessel("ship-001").unwrap();
    assert_eq!(vessel.route.map(|r| r.len()), Some(3));
}

#[tokio::test]
async fn failed_accept_keeps_proposal() {
    let fail = Arc::new(AtomicBool::new(false));
    let client = spawn_planning_service(fail.clone()).await;
    let (app, state) = setup_app(Some(client)).await;
    let before = state.get_vessel("ship-002").unwrap();

    let res = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/routes/plan",
            json!({ "ship_id": "ship-002", "departure_time": 10.0 }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    fail.store(true, Ordering::SeqCst);
    let res = app
        .clone()
        .oneshot(send_json(
            "POST",
            "/v1/routes/accept",
            json!({ "ship_id": "ship-002", "accept": false }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    let res = app.oneshot(get("/v1/routes/ship-002")).await.unwrap();
    assert_eq!(read_json(res).await["phase"], json!("proposed"));
    assert_eq!(state.get_vessel("ship-002").unwrap(), before);
}

#[tokio::test]
async fn accept_without_proposal_conflicts() {
    let client = spawn_planning_service(Arc::new(AtomicBool::new(false))).await;
    let (app, _state) = setup_app(Some(client)).await;

    let res = app
        .oneshot(send_json(
            "POST",
            "/v1/routes/accept",
            json!({ "ship_id": "ship-003", "accept": true }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn delete_vessel_removes_it() {
    let (app, state) = setup_app(None).await;

    let res = app
        .clone()
        .oneshot(empty("DELETE", "/v1/vessels/ship-005"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(state.get_vessel("ship-005").is_none());
    assert_eq!(state.latest_snapshot().vessel_count, 7);

    let res = app
        .oneshot(empty("DELETE", "/v1/vessels/ship-005"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleted_vessel_stays_deleted_after_sync() {
    let (app, state) = setup_app(None).await;

    let res = app
        .clone()
        .oneshot(empty("DELETE", "/v1/vessels/ship-005"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let loader = VesselLoader::from_path(FIXTURE, None);
    initial_load(&state, &loader).await;

    assert!(state.get_vessel("ship-005").is_none());
    assert_eq!(state.latest_snapshot().vessel_count, 7);
    let res = app.oneshot(get("/v1/vessels/ship-005")).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
