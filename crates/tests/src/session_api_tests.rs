use crate::fixtures::test_app::TestApp;

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::spawn().await;
    let json: serde_json::Value = app
        .http
        .get(app.url("/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn session_list_starts_empty() {
    let app = TestApp::spawn().await;
    let json: serde_json::Value = app
        .http
        .get(app.url("/api/session"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn connected_participant_shows_up_in_the_session_list() {
    let app = TestApp::spawn().await;
    let mut ws = app.ws_connect("s9", "patient").await;
    TestApp::recv_json(&mut ws).await; // connected frame: join is complete

    let json: serde_json::Value = app
        .http
        .get(app.url("/api/session/s9"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(json["session_id"], "s9");
    assert_eq!(json["participants"], serde_json::json!(["patient"]));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = TestApp::spawn().await;
    let resp = app
        .http
        .get(app.url("/api/session/ghost"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}
