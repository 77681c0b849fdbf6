use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::routing::get;
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use dumpwatch::analysis::{AnalysisInvoker, InferenceClient, InferenceError, RetryPolicy};
use dumpwatch::capture::{
    ClusterConnector, ClusterExecClient, ExecCapture, HttpIntrospectionCapture, PodExecutor,
    TaskAddressResolver,
};
use dumpwatch::constants::INTROSPECTION_PATH;
use dumpwatch::error::{DumpwatchError, Result};
use dumpwatch::pipeline::{
    BasicAuthGate, PipelineOrchestrator, TriggerHandler, WebhookCredentialSource,
    WebhookCredentials,
};
use dumpwatch::server::get_app;
use dumpwatch::storage::{ArtifactStore, ObjectStore};

const DUMP: &str = "2025-06-01 10:00:00\nFull thread dump OpenJDK 64-Bit Server VM:\n\"main\" RUNNABLE\n";

struct Pods;

#[async_trait]
impl PodExecutor for Pods {
    async fn running_pod_names(&self, _namespace: &str) -> Result<Vec<String>> {
        Ok(vec!["api-1".into()])
    }

    async fn container_names(&self, _namespace: &str, _pod: &str) -> Result<Vec<String>> {
        Ok(vec!["app".into()])
    }

    async fn exec(&self, _ns: &str, _pod: &str, _container: &str, cmd: Vec<String>) -> Result<String> {
        if cmd.iter().any(|part| part.contains("GC.heap_dump")) {
            return Ok("Heap dump created at /tmp/heapdump.hprof\n".to_string());
        }
        Ok(DUMP.to_string())
    }

    async fn read_file(&self, _ns: &str, _pod: &str, _container: &str, _path: &str) -> Result<Vec<u8>> {
        Ok(b"JAVA PROFILE 1.0.2\0".to_vec())
    }
}

#[derive(Default)]
struct Clusters {
    connects: AtomicUsize,
}

#[async_trait]
impl ClusterConnector for Clusters {
    async fn connect(&self, _cluster: &str) -> Result<Arc<dyn PodExecutor>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(Pods))
    }
}

struct NoLookup;

#[async_trait]
impl TaskAddressResolver for NoLookup {
    async fn resolve_task_address(&self, _cluster: &str, task_id: &str) -> Result<String> {
        Err(DumpwatchError::NotFound(format!("no address for {task_id}")))
    }
}

struct CannedModel;

#[async_trait]
impl InferenceClient for CannedModel {
    async fn complete(&self, _prompt: &str) -> std::result::Result<String, InferenceError> {
        Ok("No deadlocks found.".to_string())
    }
}

#[derive(Default)]
struct Objects {
    keys: Mutex<Vec<String>>,
}

#[async_trait]
impl ObjectStore for Objects {
    async fn put(&self, _bucket: &str, key: &str, _body: Vec<u8>, _content_type: &str) -> Result<()> {
        self.keys.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

struct FixedCredentials;

#[async_trait]
impl WebhookCredentialSource for FixedCredentials {
    async fn webhook_credentials(&self) -> anyhow::Result<WebhookCredentials> {
        Ok(WebhookCredentials {
            username: "grafana".into(),
            password: "s3cret".into(),
        })
    }
}

struct Harness {
    app: Router,
    clusters: Arc<Clusters>,
    objects: Arc<Objects>,
}

fn harness() -> Harness {
    let clusters = Arc::new(Clusters::default());
    let objects = Arc::new(Objects::default());

    let exec = ExecCapture::new(clusters.clone(), Duration::from_secs(5));
    let http = HttpIntrospectionCapture::new(
        Arc::new(NoLookup),
        8080,
        INTROSPECTION_PATH,
        Duration::from_secs(5),
    )
    .unwrap();
    let analyzer = AnalysisInvoker::new(
        Arc::new(CannedModel),
        RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(5)),
    );
    let orchestrator = PipelineOrchestrator::new(
        Arc::new(ClusterExecClient::new(exec, http)),
        analyzer,
        ArtifactStore::new(objects.clone(), "dumps", "thread-dumps/"),
        None,
    );
    let handler = TriggerHandler::new(
        Arc::new(orchestrator),
        BasicAuthGate::new(Arc::new(FixedCredentials)),
    );

    Harness {
        app: get_app(Arc::new(handler), CancellationToken::new()),
        clusters,
        objects,
    }
}

fn basic(user: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

async fn post_webhook(app: Router, authorization: &str, body: String) -> (StatusCode, Value, Option<String>) {
    let request = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::AUTHORIZATION, authorization)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let challenge = response
        .headers()
        .get(header::WWW_AUTHENTICATE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body, challenge)
}

/// Serves the introspection path with a fixed status and counts requests.
async fn introspection_server(status: StatusCode, body: &'static str) -> (SocketAddr, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            INTROSPECTION_PATH,
            get(move |State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (status, body)
            }),
        )
        .with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

#[tokio::test]
async fn test_webhook_with_structured_and_text_alerts() {
    let (addr, hits) = introspection_server(StatusCode::OK, DUMP).await;
    let harness = harness();

    let payload = json!({
        "alerts": [
            {
                "status": "firing",
                "labels": {
                    "cluster_type": "eks",
                    "cluster": "prod-eks",
                    "task_pod_id": "api-1",
                    "container_name": "app",
                    "namespace": "shop"
                }
            },
            {
                "status": "firing",
                "labels": {"alertname": "HighCpu", "cluster_type": "[no value]"},
                "valueString": format!(
                    "[ var='A' labels={{cluster=prod-ecs, cluster_type=ecs, container_name=app, \
                     task_pod_id=task-9, container_ip={addr}}} value=0.93 ]"
                )
            }
        ]
    });

    let (status, body, _) =
        post_webhook(harness.app, &basic("grafana", "s3cret"), payload.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Success");
    assert_eq!(body["message"], "Processed 2 alerts");

    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["taskPodId"], "api-1");
    assert_eq!(results[1]["taskPodId"], "task-9");
    assert_ne!(results[0]["threadDumpUrl"], results[1]["threadDumpUrl"]);
    assert_ne!(results[0]["threadDumpUrl"], results[0]["analysisUrl"]);

    assert_eq!(harness.clusters.connects.load(Ordering::SeqCst), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(harness.objects.keys.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn test_heap_dump_label_stores_hprof_only() {
    let harness = harness();
    let payload = json!({
        "alerts": [{
            "status": "firing",
            "labels": {
                "cluster_type": "eks",
                "cluster": "prod-eks",
                "task_pod_id": "api-*",
                "namespace": "shop",
                "dump_kind": "heap"
            }
        }]
    });

    let (status, body, _) =
        post_webhook(harness.app, &basic("grafana", "s3cret"), payload.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Success");
    assert_eq!(body["results"][0]["dumpKind"], "heap");
    assert!(body["results"][0]["analysisUrl"].is_null());
    let keys = harness.objects.keys.lock().unwrap();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("thread-dumps/api-*/"));
    assert!(keys[0].ends_with(".hprof"));
}

#[tokio::test]
async fn test_resolved_alert_captures_nothing() {
    let harness = harness();
    let payload = json!({
        "alerts": [{
            "status": "resolved",
            "labels": {
                "cluster_type": "eks",
                "cluster": "prod-eks",
                "task_pod_id": "api-1",
                "container_name": "app"
            }
        }]
    });

    let (status, body, _) =
        post_webhook(harness.app, &basic("grafana", "s3cret"), payload.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "NoValidItems");
    assert!(body["results"].as_array().unwrap().is_empty());
    assert_eq!(harness.clusters.connects.load(Ordering::SeqCst), 0);
    assert!(harness.objects.keys.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failing_introspection_endpoint_is_not_retried() {
    let (addr, hits) = introspection_server(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;
    let harness = harness();
    let payload = json!({
        "alerts": [{
            "status": "firing",
            "labels": {
                "cluster_type": "ecs",
                "cluster": "prod-ecs",
                "task_pod_id": "task-9",
                "container_name": "app",
                "instance": addr.to_string()
            }
        }]
    });

    let (status, body, _) =
        post_webhook(harness.app, &basic("grafana", "s3cret"), payload.to_string()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "NoValidItems");
    assert_eq!(body["failures"][0]["taskPodId"], "task-9");
    assert_eq!(body["failures"][0]["code"], "CAPTURE_FAILED");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(harness.objects.keys.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_credentials_are_rejected_before_parsing() {
    let harness = harness();

    let (status, _, challenge) =
        post_webhook(harness.app, &basic("grafana", "wrong"), "not json at all".to_string()).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(challenge.unwrap().starts_with("Basic"));
    assert_eq!(harness.clusters.connects.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_health_endpoint() {
    let harness = harness();
    let response = harness
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
