use futures::SinkExt;
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::fixtures::test_app::{TestApp, pcm_chunk};

#[tokio::test]
async fn connect_confirms_session_and_role() {
    let app = TestApp::spawn().await;
    let mut ws = app.ws_connect("s1", "doctor").await;

    let frame = TestApp::recv_json(&mut ws).await;
    assert_eq!(frame["type"], "connected");
    assert_eq!(frame["session_id"], "s1");
    assert_eq!(frame["user_type"], "doctor");
}

#[tokio::test]
async fn invalid_role_is_rejected_with_400() {
    let app = TestApp::spawn().await;
    let err = app
        .try_ws_connect("s1", "nurse")
        .await
        .err()
        .expect("handshake must fail");
    match err {
        tokio_tungstenite::tungstenite::Error::Http(response) => {
            assert_eq!(response.status().as_u16(), 400);
        }
        other => panic!("unexpected handshake error: {other:?}"),
    }
}

#[tokio::test]
async fn join_notifies_both_participants() {
    let app = TestApp::spawn().await;
    let mut doctor = app.ws_connect("s1", "doctor").await;
    TestApp::recv_json(&mut doctor).await; // connected

    let mut patient = app.ws_connect("s1", "patient").await;
    TestApp::recv_json(&mut patient).await; // connected

    let to_patient = TestApp::recv_json(&mut patient).await;
    assert_eq!(to_patient["type"], "participant_joined");
    assert_eq!(to_patient["user_type"], "doctor");

    let to_doctor = TestApp::recv_json(&mut doctor).await;
    assert_eq!(to_doctor["type"], "participant_joined");
    assert_eq!(to_doctor["user_type"], "patient");
}

#[tokio::test]
async fn ping_control_is_answered_with_pong() {
    let app = TestApp::spawn().await;
    let mut ws = app.ws_connect("s1", "doctor").await;
    TestApp::recv_json(&mut ws).await;

    ws.send(Message::text(r#"{"type":"ping"}"#)).await.unwrap();
    let frame = TestApp::recv_json(&mut ws).await;
    assert_eq!(frame["type"], "pong");
}

#[tokio::test]
async fn unrecognized_control_is_ignored() {
    let app = TestApp::spawn().await;
    let mut ws = app.ws_connect("s1", "doctor").await;
    TestApp::recv_json(&mut ws).await;

    ws.send(Message::text(r#"{"type":"selfie"}"#)).await.unwrap();
    ws.send(Message::text("not even json")).await.unwrap();
    // Connection survives both and still answers pings.
    ws.send(Message::text(r#"{"type":"ping"}"#)).await.unwrap();
    let frame = TestApp::recv_json(&mut ws).await;
    assert_eq!(frame["type"], "pong");
}

#[tokio::test]
async fn caption_reaches_both_sides_including_the_speaker() {
    let app = TestApp::spawn().await;
    let mut doctor = app.ws_connect("s2", "doctor").await;
    TestApp::recv_json(&mut doctor).await;
    let mut patient = app.ws_connect("s2", "patient").await;
    TestApp::recv_json(&mut patient).await;
    TestApp::recv_json(&mut patient).await; // participant_joined
    TestApp::recv_json(&mut doctor).await; // participant_joined

    doctor
        .send(Message::Binary(pcm_chunk().into()))
        .await
        .unwrap();

    // Scripted ASR hears "sir dard"; the lexicon rewrites it to
    // "head pain" before translation, but the caption keeps the raw text.
    for ws in [&mut doctor, &mut patient] {
        let frame = TestApp::recv_json(ws).await;
        assert_eq!(frame["type"], "caption");
        assert_eq!(frame["speaker"], "doctor");
        assert_eq!(frame["original_text"], "sir dard");
        assert_eq!(frame["translated_text"], "head pain (hi)");
        assert!(frame["timestamp"].is_i64());
    }

    assert_eq!(app.transcripts.entries("s2"), vec!["[DOCTOR]: head pain"]);
}

#[tokio::test]
async fn tiny_chunk_produces_no_caption() {
    let app = TestApp::spawn().await;
    let mut ws = app.ws_connect("s3", "doctor").await;
    TestApp::recv_json(&mut ws).await;

    ws.send(Message::Binary(vec![0u8; 40].into())).await.unwrap();
    ws.send(Message::text(r#"{"type":"ping"}"#)).await.unwrap();

    // The pong arrives without any caption in between.
    let frame = TestApp::recv_json(&mut ws).await;
    assert_eq!(frame["type"], "pong");
    assert!(app.transcripts.entries("s3").is_empty());
}

#[tokio::test]
async fn silence_produces_no_caption() {
    let app = TestApp::spawn_with_asr(None).await;
    let mut ws = app.ws_connect("s4", "patient").await;
    TestApp::recv_json(&mut ws).await;

    ws.send(Message::Binary(pcm_chunk().into())).await.unwrap();
    ws.send(Message::text(r#"{"type":"ping"}"#)).await.unwrap();

    let frame = TestApp::recv_json(&mut ws).await;
    assert_eq!(frame["type"], "pong");
    assert!(app.transcripts.entries("s4").is_empty());
}

#[tokio::test]
async fn rejoin_supersedes_the_previous_connection() {
    let app = TestApp::spawn().await;
    let mut first = app.ws_connect("s5", "doctor").await;
    TestApp::recv_json(&mut first).await;

    let mut second = app.ws_connect("s5", "doctor").await;
    TestApp::recv_json(&mut second).await;

    // Membership stays at one doctor.
    let summary: serde_json::Value = app
        .http
        .get(app.url("/api/session/s5"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["participants"], serde_json::json!(["doctor"]));

    // The replacement connection is live.
    second
        .send(Message::text(r#"{"type":"ping"}"#))
        .await
        .unwrap();
    let frame = TestApp::recv_json(&mut second).await;
    assert_eq!(frame["type"], "pong");
}
