//! Integration tests for the detection ingest server

#[cfg(feature = "server")]
mod server_tests {
    use emosense_agent::detector::{EmotionLabel, SampleSource};
    use emosense_agent::server::{run, ServerConfig};
    use std::time::Duration;

    #[tokio::test]
    async fn test_health_endpoint() {
        // Start server on a random port
        let (addr, shutdown_tx, _source) = run(ServerConfig::new(0))
            .await
            .expect("Failed to start server");

        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert!(body["version"].as_str().is_some());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_sample_endpoint_feeds_source() {
        let (addr, shutdown_tx, mut source) = run(ServerConfig::new(0))
            .await
            .expect("Failed to start server");

        tokio::time::sleep(Duration::from_millis(100)).await;

        let payload = serde_json::json!({
            "faces": [
                {
                    "expressions": {
                        "happy": 0.91,
                        "neutral": 0.05,
                        "sad": 0.04
                    },
                    "score": 0.98
                }
            ]
        });

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/sample", addr))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["queued"], 1);

        // The posted batch is what the scheduler would sample next tick.
        let sample = source
            .next_sample()
            .await
            .expect("source errored")
            .expect("no sample queued");
        assert_eq!(sample.get(EmotionLabel::Happy), Some(0.91));

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_face_tick() {
        let (addr, shutdown_tx, mut source) = run(ServerConfig::new(0))
            .await
            .expect("Failed to start server");

        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/sample", addr))
            .json(&serde_json::json!({ "faces": [] }))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        assert_eq!(source.next_sample().await.unwrap(), None);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_malformed_payload_is_rejected() {
        let (addr, shutdown_tx, _source) = run(ServerConfig::new(0))
            .await
            .expect("Failed to start server");

        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/sample", addr))
            .header("Content-Type", "application/json")
            .body("{\"faces\": \"not-a-list\"}")
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_client_error());

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let (addr, shutdown_tx, _source) = run(ServerConfig::new(0))
            .await
            .expect("Failed to start server");

        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .request(reqwest::Method::OPTIONS, format!("http://{}/sample", addr))
            .header("Origin", "http://localhost:5173")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .expect("Failed to send request");

        assert!(
            response.status().is_success()
                || response.status() == reqwest::StatusCode::NO_CONTENT,
            "CORS preflight failed: {}",
            response.status()
        );

        let _ = shutdown_tx.send(());
    }
}
