use async_trait::async_trait;
use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use vieclam::core::Database;
use vieclam::recommend::{MatchingClient, SearchRadius};
use vieclam::routing::{RoutePlanner, RoutingClient};
use vieclam::types::{MatchCandidate, MatchScore};
use vieclam::web::{build_rocket, ServerConfig};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

struct NearestFirst;

#[async_trait]
impl MatchingClient for NearestFirst {
    async fn rank(
        &self,
        _profile: &str,
        candidates: &[MatchCandidate],
    ) -> anyhow::Result<Vec<MatchScore>> {
        Ok(candidates
            .iter()
            .enumerate()
            .map(|(i, c)| MatchScore {
                job_id: c.job_id.clone(),
                score: 90.0 - i as f64,
                reason: Some("gần nhà".to_string()),
            })
            .collect())
    }
}

struct Broken;

#[async_trait]
impl MatchingClient for Broken {
    async fn rank(&self, _: &str, _: &[MatchCandidate]) -> anyhow::Result<Vec<MatchScore>> {
        anyhow::bail!("upstream timeout")
    }
}

struct TestApp {
    _dir: TempDir,
    client: Client,
}

async fn app_with(routing_url: &str, matcher: Arc<dyn MatchingClient>) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::new(&dir.path().join("api.db")).await.unwrap();
    let planner = RoutePlanner::new(RoutingClient::with_timeout(routing_url, 2).unwrap());
    let server_config = ServerConfig {
        page_size: 2,
        default_radius: SearchRadius::default(),
    };
    let client = Client::tracked(build_rocket(db, planner, matcher, server_config))
        .await
        .unwrap();
    TestApp { _dir: dir, client }
}

async fn app() -> TestApp {
    app_with("http://127.0.0.1:9", Arc::new(NearestFirst)).await
}

async fn post_job(client: &Client, employer: &str, body: Value) -> (Status, Value) {
    let response = client
        .post("/api/jobs")
        .header(ContentType::JSON)
        .header(Header::new("X-User-Id", employer.to_string()))
        .body(body.to_string())
        .dispatch()
        .await;
    let status = response.status();
    let json: Value = response.into_json().await.unwrap();
    (status, json)
}

async fn seed(client: &Client) -> Vec<String> {
    let postings = [
        json!({
            "title": "Xa",
            "address": "Thủ Đức",
            "lat": 10.85,
            "lng": 106.77,
            "job_type": "full-time"
        }),
        json!({
            "title": "Gần",
            "address": "Quận 1",
            "lat": 10.7779,
            "lng": 106.7009,
            "job_type": "part-time"
        }),
        json!({
            "title": "Không rõ",
            "address": "Quận 1",
            "location": "hẻm 12",
            "job_type": "part-time"
        }),
        json!({
            "title": "Vừa",
            "address": "Quận 3",
            "location": "[10.7800° N, 106.6900° E]",
            "job_type": "daily"
        }),
    ];
    let mut ids = Vec::new();
    for posting in postings {
        let (status, body) = post_job(client, "emp-1", posting).await;
        assert_eq!(status, Status::Created);
        ids.push(body["data"]["id"].as_str().unwrap().to_string());
    }
    ids
}

fn titles(body: &Value) -> Vec<String> {
    body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|j| j["title"].as_str().unwrap().to_string())
        .collect()
}

#[rocket::async_test]
async fn test_health() {
    let app = app().await;
    let response = app.client.get("/api/health").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["type"], "text");
}

#[rocket::async_test]
async fn test_nearby_sorted_by_distance_with_unparsable_last() {
    let app = app().await;
    seed(&app.client).await;

    let response = app
        .client
        .get("/api/jobs/nearby?lat=10.7769&lng=106.7009&page_size=10")
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(titles(&body), vec!["Gần", "Vừa", "Xa", "Không rõ"]);
    assert_eq!(body["data"]["total"], 4);
    assert!(body["data"]["items"][0]["distance_km"].as_f64().unwrap() < 0.2);
    assert_eq!(body["data"]["items"][0]["distance_text"], "111 m");
    assert!(body["data"]["items"][3]["distance_km"].is_null());
}

#[rocket::async_test]
async fn test_nearby_pagination_uses_configured_page_size() {
    let app = app().await;
    seed(&app.client).await;

    let page2: Value = app
        .client
        .get("/api/jobs/nearby?lat=10.7769&lng=106.7009&page=2")
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(titles(&page2), vec!["Xa", "Không rõ"]);
    assert_eq!(page2["data"]["page"], 2);
    assert_eq!(page2["data"]["total_pages"], 2);

    let beyond: Value = app
        .client
        .get("/api/jobs/nearby?lat=10.7769&lng=106.7009&page=9")
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert!(titles(&beyond).is_empty());
    assert_eq!(beyond["data"]["total"], 4);
}

#[rocket::async_test]
async fn test_nearby_filters_are_case_insensitive() {
    let app = app().await;
    seed(&app.client).await;

    let body: Value = app
        .client
        .get("/api/jobs/nearby?lat=10.7769&lng=106.7009&location=qu%E1%BA%ADn%201&job_type=PART-TIME")
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(titles(&body), vec!["Gần", "Không rõ"]);
}

#[rocket::async_test]
async fn test_nearby_job_type_filter_accepts_vietnamese_synonym() {
    let app = app().await;
    seed(&app.client).await;
    let (status, _) = post_job(
        &app.client,
        "emp-2",
        json!({
            "title": "Rửa bát",
            "address": "Quận 5",
            "lat": 10.755,
            "lng": 106.667,
            "job_type": "Bán thời gian"
        }),
    )
    .await;
    assert_eq!(status, Status::Created);

    // "Bán thời gian", percent-encoded
    let body: Value = app
        .client
        .get("/api/jobs/nearby?lat=10.7769&lng=106.7009&page_size=10&job_type=B%C3%A1n%20th%E1%BB%9Di%20gian")
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(titles(&body), vec!["Gần", "Rửa bát", "Không rõ"]);
}

#[rocket::async_test]
async fn test_nearby_without_location_keeps_listing_order() {
    let app = app().await;
    seed(&app.client).await;

    let body: Value = app
        .client
        .get("/api/jobs/nearby?page_size=10")
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(body["data"]["total"], 4);
    assert!(body["data"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .all(|j| j["distance_km"].is_null()));
}

#[rocket::async_test]
async fn test_nearby_rejects_half_coordinates() {
    let app = app().await;
    let response = app.client.get("/api/jobs/nearby?lat=10.7").dispatch().await;
    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["error_code"], "INVALID_COORDINATES");
    assert_eq!(body["success"], false);
}

#[rocket::async_test]
async fn test_create_job_requires_caller_identity() {
    let app = app().await;
    let response = app
        .client
        .post("/api/jobs")
        .header(ContentType::JSON)
        .body(json!({"title": "A", "address": "B", "lat": 1.0, "lng": 2.0}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["error_code"], "UNAUTHORIZED");
}

#[rocket::async_test]
async fn test_create_job_validation_error() {
    let app = app().await;
    let (status, body) = post_job(
        &app.client,
        "emp-1",
        json!({"title": "A", "address": "B", "lat": 95.0, "lng": 2.0}),
    )
    .await;
    assert_eq!(status, Status::BadRequest);
    assert_eq!(body["error_code"], "INVALID_JOB");
}

#[rocket::async_test]
async fn test_get_job_and_not_found() {
    let app = app().await;
    let ids = seed(&app.client).await;

    let response = app.client.get(format!("/api/jobs/{}", ids[1])).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["data"]["title"], "Gần");
    assert_eq!(body["data"]["location"], "[10.777900° N, 106.700900° E]");

    let response = app.client.get("/api/jobs/nope").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn test_close_job_owner_only_and_hidden_from_nearby() {
    let app = app().await;
    let ids = seed(&app.client).await;
    let url = format!("/api/jobs/{}/status", ids[1]);

    let response = app
        .client
        .patch(url.clone())
        .header(ContentType::JSON)
        .header(Header::new("X-User-Id", "emp-2"))
        .body(json!({"status": "closed"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = app
        .client
        .patch(url)
        .header(ContentType::JSON)
        .header(Header::new("X-User-Id", "emp-1"))
        .body(json!({"status": "closed"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let body: Value = app
        .client
        .get("/api/jobs/nearby?lat=10.7769&lng=106.7009&page_size=10")
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert!(!titles(&body).contains(&"Gần".to_string()));

    let all: Value = app
        .client
        .get("/api/jobs/nearby?lat=10.7769&lng=106.7009&page_size=10&open_only=false")
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(all["data"]["total"], 4);
}

#[rocket::async_test]
async fn test_route_to_job() {
    let osrm = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": "Ok",
            "routes": [{
                "distance": 1500.0,
                "duration": 300.0,
                "geometry": {
                    "type": "LineString",
                    "coordinates": [[106.7009, 10.7769], [106.69, 10.78]]
                }
            }]
        })))
        .mount(&osrm)
        .await;

    let app = app_with(&osrm.uri(), Arc::new(NearestFirst)).await;
    let ids = seed(&app.client).await;

    let response = app
        .client
        .post("/api/route")
        .header(ContentType::JSON)
        .body(
            json!({
                "from": {"lat": 10.7769, "lng": 106.7009},
                "job_id": ids[3],
                "conversation_id": "c-1"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["conversation_id"], "c-1");
    assert_eq!(body["data"]["plan"]["kind"], "routed");
    assert_eq!(body["data"]["plan"]["distance_text"], "1.5 km");
    assert_eq!(body["data"]["plan"]["duration_text"], "5 phút");
}

#[rocket::async_test]
async fn test_route_falls_back_to_center_and_rejects_unknown_location() {
    let app = app().await;
    let ids = seed(&app.client).await;

    let body: Value = app
        .client
        .post("/api/route")
        .header(ContentType::JSON)
        .body(json!({"from": {"lat": 10.7769, "lng": 106.7009}, "job_id": ids[0]}).to_string())
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(body["data"]["plan"]["kind"], "centered");
    assert_eq!(body["data"]["plan"]["center"]["lat"], 10.85);

    let response = app
        .client
        .post("/api/route")
        .header(ContentType::JSON)
        .body(json!({"from": {"lat": 10.7769, "lng": 106.7009}, "job_id": ids[2]}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::UnprocessableEntity);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["error_code"], "JOB_LOCATION_UNKNOWN");
}

#[rocket::async_test]
async fn test_recommendations_round_trip() {
    let app = app().await;
    seed(&app.client).await;

    let response = app
        .client
        .post("/api/recommendations")
        .header(ContentType::JSON)
        .header(Header::new("X-User-Id", "worker-1"))
        .body(
            json!({
                "lat": 10.7769,
                "lng": 106.7009,
                "radius_km": 3.0,
                "profile": "Phục vụ, ca tối"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    let titles: Vec<&str> = items.iter().map(|i| i["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Gần", "Vừa"]);
    assert_eq!(body["data"]["radius_km"], 3.0);

    let cached: Value = app
        .client
        .get("/api/recommendations")
        .header(Header::new("X-User-Id", "worker-1"))
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert_eq!(cached["data"]["items"].as_array().unwrap().len(), 2);

    let other: Value = app
        .client
        .get("/api/recommendations")
        .header(Header::new("X-User-Id", "worker-2"))
        .dispatch()
        .await
        .into_json()
        .await
        .unwrap();
    assert!(other["data"].is_null());
}

#[rocket::async_test]
async fn test_recommendations_reject_radius_out_of_range() {
    let app = app().await;
    for radius in [0.2, 12.0] {
        let response = app
            .client
            .post("/api/recommendations")
            .header(ContentType::JSON)
            .header(Header::new("X-User-Id", "worker-1"))
            .body(
                json!({"lat": 10.7769, "lng": 106.7009, "radius_km": radius, "profile": "p"})
                    .to_string(),
            )
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error_code"], "INVALID_RADIUS");
    }
}

#[rocket::async_test]
async fn test_recommendations_matching_failure_is_bad_gateway() {
    let app = app_with("http://127.0.0.1:9", Arc::new(Broken)).await;
    seed(&app.client).await;

    let response = app
        .client
        .post("/api/recommendations")
        .header(ContentType::JSON)
        .header(Header::new("X-User-Id", "worker-1"))
        .body(json!({"lat": 10.7769, "lng": 106.7009, "profile": "p"}).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadGateway);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["error_code"], "MATCHING_FAILED");
}
