use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::time::Duration;

use regulations_client::{
    ClientSettings, EngineEvent, EngineHandle, FailureKind, ReqwestBackend, UploadRequest,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INTERVAL: Duration = Duration::from_millis(20);

fn engine_for(server: &MockServer) -> EngineHandle {
    let backend = ReqwestBackend::new(ClientSettings::with_base_url(&server.uri()).unwrap()).unwrap();
    EngineHandle::with_backend(Arc::new(backend), INTERVAL).unwrap()
}

/// Collects events until `done` matches one or the timeout passes.
async fn collect_until(
    engine: &EngineHandle,
    timeout: Duration,
    done: fn(&EngineEvent) -> bool,
) -> Vec<EngineEvent> {
    let engine = engine.clone();
    tokio::task::spawn_blocking(move || {
        let deadline = std::time::Instant::now() + timeout;
        let mut events = Vec::new();
        while std::time::Instant::now() < deadline {
            match engine.recv_timeout(Duration::from_millis(10)) {
                Ok(event) => {
                    let finished = done(&event);
                    events.push(event);
                    if finished {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        events
    })
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn submit_reports_task_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/create/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": 9})))
        .mount(&server)
        .await;

    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("scan.png");
    std::fs::write(&file, b"png").unwrap();

    let engine = engine_for(&server);
    engine.submit_upload(UploadRequest {
        metadata: Vec::new(),
        files: vec![file],
    });

    let events = collect_until(&engine, Duration::from_secs(5), |event| {
        matches!(event, EngineEvent::TaskCreated(_))
    })
    .await;
    assert_eq!(events.last(), Some(&EngineEvent::TaskCreated(Ok(9))));
    engine.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_backend_reports_failure_instead_of_hanging() {
    let settings = ClientSettings {
        connect_timeout: Duration::from_millis(200),
        request_timeout: Duration::from_millis(500),
        // Port 9 (discard) is not expected to accept HTTP.
        ..ClientSettings::with_base_url("http://127.0.0.1:9/").unwrap()
    };
    let engine = EngineHandle::new(settings).unwrap();
    engine.search(vec![("text".to_string(), "Koch".to_string())]);

    let events = collect_until(&engine, Duration::from_secs(5), |event| {
        matches!(event, EngineEvent::SearchCompleted(_))
    })
    .await;
    match events.last() {
        Some(EngineEvent::SearchCompleted(Err(err))) => {
            assert!(matches!(err.kind, FailureKind::Network | FailureKind::Timeout));
        }
        other => panic!("unexpected event: {other:?}"),
    }
    engine.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn polling_runs_to_completion() {
    let server = MockServer::start().await;
    for value in [0, 40] {
        Mock::given(method("GET"))
            .and(path("/task_progress/5"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"progress": value, "content": {"message": "läuft"}})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/task_progress/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "progress": 100,
            "content": {"message": "Fertig!"}
        })))
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.start_polling(5);

    let events = collect_until(&engine, Duration::from_secs(5), |event| {
        matches!(event, EngineEvent::TaskProgress { status, .. } if status.progress >= 100)
    })
    .await;
    let values: Vec<i64> = events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::TaskProgress { task_id: 5, status } => Some(status.progress),
            _ => None,
        })
        .collect();
    assert_eq!(values, vec![0, 40, 100]);

    // The loop ends on its own after completion.
    let seen = server.received_requests().await.unwrap().len();
    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(server.received_requests().await.unwrap().len(), seen);
    engine.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn stop_and_replace_release_previous_poll_loop() {
    let server = MockServer::start().await;
    for task_id in [6, 7] {
        Mock::given(method("GET"))
            .and(path(format!("/task_progress/{task_id}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"progress": 10, "content": {"message": "läuft"}})),
            )
            .mount(&server)
            .await;
    }

    let engine = engine_for(&server);
    engine.start_polling(6);
    collect_until(&engine, Duration::from_secs(5), |event| {
        matches!(event, EngineEvent::TaskProgress { task_id: 6, .. })
    })
    .await;

    // Starting another task replaces the first loop.
    engine.start_polling(7);
    collect_until(&engine, Duration::from_secs(5), |event| {
        matches!(event, EngineEvent::TaskProgress { task_id: 7, .. })
    })
    .await;
    let polled_six = |requests: &[wiremock::Request]| {
        requests
            .iter()
            .filter(|request| request.url.path() == "/task_progress/6")
            .count()
    };
    let six_before = polled_six(&server.received_requests().await.unwrap());
    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(polled_six(&server.received_requests().await.unwrap()), six_before);

    engine.stop_polling(7);
    tokio::time::sleep(INTERVAL * 3).await;
    let total = server.received_requests().await.unwrap().len();
    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(server.received_requests().await.unwrap().len(), total);
    engine.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn editor_requests_round_trip_through_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/update/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "message": "ok"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/regulations/koch.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "regulation": "<TEI>v0</TEI>",
            "revisions": [{"version": 1}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/delete/koch.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "nein"})),
        )
        .mount(&server)
        .await;

    let engine = engine_for(&server);
    engine.save("koch.xml", "<TEI/>");
    let events = collect_until(&engine, Duration::from_secs(5), |event| {
        matches!(event, EngineEvent::Saved { .. })
    })
    .await;
    assert!(matches!(
        events.last(),
        Some(EngineEvent::Saved { exist_name, result: Ok(outcome) })
            if exist_name == "koch.xml" && outcome.success
    ));

    engine.fetch_revision("koch.xml", 0);
    let events = collect_until(&engine, Duration::from_secs(5), |event| {
        matches!(event, EngineEvent::RevisionLoaded { .. })
    })
    .await;
    match events.last() {
        Some(EngineEvent::RevisionLoaded {
            exist_name,
            version: 0,
            result: Ok(found),
        }) => {
            assert_eq!(exist_name, "koch.xml");
            assert_eq!(found.regulation, "<TEI>v0</TEI>");
        }
        other => panic!("unexpected event: {other:?}"),
    }

    engine.delete("koch.xml");
    let events = collect_until(&engine, Duration::from_secs(5), |event| {
        matches!(event, EngineEvent::Deleted { .. })
    })
    .await;
    assert!(matches!(
        events.last(),
        Some(EngineEvent::Deleted { exist_name, result: Ok(outcome) })
            if exist_name == "koch.xml" && !outcome.success
    ));
    engine.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_disconnects_event_stream() {
    let server = MockServer::start().await;
    let engine = engine_for(&server);
    engine.shutdown();

    let last = tokio::task::spawn_blocking(move || {
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        loop {
            match engine.recv_timeout(Duration::from_millis(10)) {
                Err(RecvTimeoutError::Timeout) if std::time::Instant::now() < deadline => {}
                other => return other,
            }
        }
    })
    .await
    .unwrap();
    assert!(matches!(last, Err(RecvTimeoutError::Disconnected)));
}
