//! End-to-end render lifecycle tests with transport and runtime doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use frag_client::{
    FragmentOrchestrator, FragmentRequest, PayloadTransport, RenderPhase, RuntimeAdapter,
};
use frag_core::{RenderContext, RenderError, RenderOptions};
use frag_streaming::{accumulate, ByteStream};
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::oneshot;

/// Runtime for a host without a document: renders a payload by collecting
/// its bytes into a string.
struct HeadlessRuntime;

#[async_trait]
impl RuntimeAdapter for HeadlessRuntime {
    type Content = String;

    fn embedded_payload(&self, _key: &str) -> Option<ByteStream> {
        None
    }

    async fn render_payload(
        &self,
        payload: ByteStream,
        _options: RenderOptions,
    ) -> Result<String, RenderError> {
        let bytes = accumulate(payload).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Runtime whose document has payloads embedded under known keys.
struct DocumentRuntime {
    embedded: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl RuntimeAdapter for DocumentRuntime {
    type Content = String;

    fn embedded_payload(&self, key: &str) -> Option<ByteStream> {
        self.embedded.get(key).cloned().map(ByteStream::from_bytes)
    }

    async fn render_payload(
        &self,
        payload: ByteStream,
        _options: RenderOptions,
    ) -> Result<String, RenderError> {
        let bytes = accumulate(payload).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Runtime that rejects every payload.
struct RejectingRuntime;

#[async_trait]
impl RuntimeAdapter for RejectingRuntime {
    type Content = String;

    fn embedded_payload(&self, _key: &str) -> Option<ByteStream> {
        None
    }

    async fn render_payload(
        &self,
        _payload: ByteStream,
        _options: RenderOptions,
    ) -> Result<String, RenderError> {
        Err(RenderError::Decoding("unsupported payload tag".to_string()))
    }
}

/// Transport double that counts calls and replays canned bodies.
#[derive(Default)]
struct RecordingTransport {
    calls: AtomicUsize,
    bodies: Mutex<HashMap<String, Vec<u8>>>,
}

impl RecordingTransport {
    fn respond(&self, body: &str, bytes: Vec<u8>) {
        self.bodies.lock().insert(body.to_string(), bytes);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PayloadTransport for RecordingTransport {
    async fn post(&self, _endpoint: &str, body: &str) -> Result<ByteStream, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let bytes = self
            .bodies
            .lock()
            .get(body)
            .cloned()
            .ok_or_else(|| RenderError::Transport(format!("no canned response for {body}")))?;
        Ok(ByteStream::from_bytes(bytes))
    }
}

/// Transport double whose responses are released by the test.
#[derive(Default)]
struct GatedTransport {
    calls: AtomicUsize,
    gates: Mutex<HashMap<String, oneshot::Receiver<Vec<u8>>>>,
}

impl GatedTransport {
    fn gate(&self, body: &str) -> oneshot::Sender<Vec<u8>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().insert(body.to_string(), rx);
        tx
    }
}

#[async_trait]
impl PayloadTransport for GatedTransport {
    async fn post(&self, _endpoint: &str, body: &str) -> Result<ByteStream, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self
            .gates
            .lock()
            .remove(body)
            .ok_or_else(|| RenderError::Transport(format!("no gate for {body}")))?;
        let bytes = gate
            .await
            .map_err(|e| RenderError::Transport(e.to_string()))?;
        Ok(ByteStream::from_bytes(bytes))
    }
}

#[tokio::test]
async fn test_network_render_populates_cache_and_remount_replays() -> anyhow::Result<()> {
    let context = RenderContext::with_endpoint("https://edge.example/render");
    let runtime = Arc::new(HeadlessRuntime);
    let transport = Arc::new(RecordingTransport::default());

    let request = FragmentRequest::new("Profile").with_props(&json!({ "id": 42 }))?;
    let key = request.encode().await?;
    transport.respond(&key, vec![1, 2, 3]);

    let orchestrator = FragmentOrchestrator::mount(
        request.clone(),
        context.clone(),
        Arc::clone(&runtime),
        Arc::clone(&transport),
    );
    let output = orchestrator.output().await?;

    assert_eq!(output.key, key);
    assert_eq!(output.bytes.as_ref(), &[1, 2, 3]);
    assert_eq!(transport.calls(), 1);
    assert_eq!(orchestrator.phase(), RenderPhase::Ready);
    // The cache now holds exactly the bytes the renderer consumed.
    assert_eq!(context.cache.get(&key).as_deref(), Some(&[1u8, 2, 3][..]));

    // Same inputs again: replayed from cache, no further transport call.
    let remount = FragmentOrchestrator::mount(request, context.clone(), runtime, transport.clone());
    let replay = remount.output().await?;
    assert_eq!(replay.key, key);
    assert_eq!(replay.bytes.as_ref(), &[1, 2, 3]);
    assert_eq!(transport.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_embedded_payload_renders_without_network() -> anyhow::Result<()> {
    let context = RenderContext::with_endpoint("https://edge.example/render");
    let request = FragmentRequest::new("Banner");
    let key = request.encode().await?;

    let runtime = Arc::new(DocumentRuntime {
        embedded: HashMap::from([(key.clone(), b"inline".to_vec())]),
    });
    let transport = Arc::new(RecordingTransport::default());

    let orchestrator =
        FragmentOrchestrator::mount(request, context.clone(), runtime, Arc::clone(&transport));
    let output = orchestrator.output().await?;

    assert_eq!(output.content, "inline");
    assert_eq!(transport.calls(), 0);
    assert!(context.cache.contains(&key));
    Ok(())
}

#[tokio::test]
async fn test_superseded_attempt_is_discarded_but_still_caches() -> anyhow::Result<()> {
    let context = RenderContext::with_endpoint("https://edge.example/render");
    let runtime = Arc::new(HeadlessRuntime);
    let transport = Arc::new(GatedTransport::default());

    let first = FragmentRequest::new("Profile").with_props(&json!({ "id": 1 }))?;
    let second = FragmentRequest::new("Profile").with_props(&json!({ "id": 2 }))?;
    let first_key = first.encode().await?;
    let second_key = second.encode().await?;
    let first_gate = transport.gate(&first_key);
    let second_gate = transport.gate(&second_key);

    let mut orchestrator =
        FragmentOrchestrator::mount(first, context.clone(), runtime, Arc::clone(&transport));
    let stale = orchestrator.output();

    // New inputs arrive before the first response; the second attempt
    // completes first.
    orchestrator.update(second);
    second_gate.send(b"second".to_vec()).unwrap();
    let current = orchestrator.output().await?;
    assert_eq!(current.content, "second");
    assert_eq!(orchestrator.ready().unwrap().key, second_key);

    // The first attempt settles afterwards: its promise still resolves for
    // anyone holding it, but the published output stays the newer one. Its
    // cache write lands under its own key.
    first_gate.send(b"first".to_vec()).unwrap();
    let stale_output = stale.await?;
    assert_eq!(stale_output.content, "first");
    assert_eq!(orchestrator.ready().unwrap().key, second_key);
    assert_eq!(orchestrator.phase(), RenderPhase::Ready);
    assert!(context.cache.contains(&first_key));
    assert!(context.cache.contains(&second_key));
    Ok(())
}

#[tokio::test]
async fn test_update_with_equal_inputs_keeps_current_attempt() -> anyhow::Result<()> {
    let context = RenderContext::with_endpoint("https://edge.example/render");
    let runtime = Arc::new(HeadlessRuntime);
    let transport = Arc::new(RecordingTransport::default());

    let request = FragmentRequest::new("Profile").with_props(&json!({ "id": 42 }))?;
    transport.respond(&request.encode().await?, b"body".to_vec());

    let mut orchestrator = FragmentOrchestrator::mount(
        request.clone(),
        context,
        runtime,
        Arc::clone(&transport),
    );
    orchestrator.output().await?;

    // Structurally equal inputs: no new attempt, no new request.
    orchestrator.update(request);
    orchestrator.output().await?;
    assert_eq!(transport.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_previous_output_stays_visible_while_refetching() -> anyhow::Result<()> {
    let context = RenderContext::with_endpoint("https://edge.example/render");
    let runtime = Arc::new(HeadlessRuntime);
    let transport = Arc::new(GatedTransport::default());

    let first = FragmentRequest::new("Feed").with_props(&json!({ "page": 1 }))?;
    let second = FragmentRequest::new("Feed").with_props(&json!({ "page": 2 }))?;
    let first_gate = transport.gate(&first.encode().await?);
    let second_gate = transport.gate(&second.encode().await?);

    let mut orchestrator =
        FragmentOrchestrator::mount(first, context, runtime, Arc::clone(&transport));
    first_gate.send(b"page one".to_vec()).unwrap();
    orchestrator.output().await?;

    orchestrator.update(second);
    // The replacement attempt is still in flight; the published output is
    // untouched while the mount resolves the new inputs.
    assert_eq!(orchestrator.ready().unwrap().content, "page one");
    assert_eq!(orchestrator.phase(), RenderPhase::Resolving);

    second_gate.send(b"page two".to_vec()).unwrap();
    let output = orchestrator.output().await?;
    assert_eq!(output.content, "page two");
    assert_eq!(orchestrator.ready().unwrap().content, "page two");
    Ok(())
}

#[tokio::test]
async fn test_empty_endpoint_fails_fast() {
    let transport = Arc::new(RecordingTransport::default());
    let orchestrator = FragmentOrchestrator::mount(
        FragmentRequest::new("Profile"),
        RenderContext::root(),
        Arc::new(HeadlessRuntime),
        Arc::clone(&transport),
    );

    let err = orchestrator.output().await.unwrap_err();
    assert!(matches!(err, RenderError::Configuration(_)));
    assert!(matches!(orchestrator.phase(), RenderPhase::Failed(_)));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn test_render_failure_propagates_and_skips_cache() -> anyhow::Result<()> {
    let context = RenderContext::with_endpoint("https://edge.example/render");
    let transport = Arc::new(RecordingTransport::default());

    let request = FragmentRequest::new("Profile");
    let key = request.encode().await?;
    transport.respond(&key, vec![1, 2, 3]);

    let orchestrator = FragmentOrchestrator::mount(
        request,
        context.clone(),
        Arc::new(RejectingRuntime),
        transport,
    );

    let err = orchestrator.output().await.unwrap_err();
    assert!(matches!(err, RenderError::Decoding(_)));
    assert!(matches!(orchestrator.phase(), RenderPhase::Failed(_)));
    // Population happens only after a successful render.
    assert!(!context.cache.contains(&key));
    Ok(())
}

#[tokio::test]
async fn test_transport_failure_propagates() {
    let context = RenderContext::with_endpoint("https://edge.example/render");
    // No canned response registered: the transport double rejects.
    let transport = Arc::new(RecordingTransport::default());

    let orchestrator = FragmentOrchestrator::mount(
        FragmentRequest::new("Profile"),
        context,
        Arc::new(HeadlessRuntime),
        transport,
    );

    let err = orchestrator.output().await.unwrap_err();
    assert!(matches!(err, RenderError::Transport(_)));
}
