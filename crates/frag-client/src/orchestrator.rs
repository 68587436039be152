//! Mount lifecycle orchestration.

use std::sync::Arc;

use frag_core::{RenderContext, RenderError};
use frag_streaming::{accumulate, tee};
use futures::future::{self, BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;

use crate::request::FragmentRequest;
use crate::resolver::PayloadResolver;
use crate::runtime::RuntimeAdapter;
use crate::transport::PayloadTransport;

/// Result published by a successful render attempt.
#[derive(Debug)]
pub struct RenderOutput<C> {
    /// Renderable content produced by the runtime.
    pub content: C,
    /// The attempt's identity: request body and cache key.
    pub key: String,
    /// The payload bytes the renderer consumed, as stored in the cache.
    pub bytes: Arc<[u8]>,
}

/// Settled value of a render attempt.
pub type AttemptResult<C> = Result<Arc<RenderOutput<C>>, RenderError>;

/// Cloneable future for an in-flight attempt. Awaiting a clone suspends the
/// caller until the attempt settles with content or the propagated failure.
pub type AttemptFuture<C> = Shared<BoxFuture<'static, AttemptResult<C>>>;

/// Lifecycle phase of a mounted fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderPhase {
    /// Mounted, no attempt started yet.
    Idle,
    /// Resolving a payload stream for the current inputs.
    Resolving,
    /// Streaming the payload into the renderer and the cache buffer.
    Rendering,
    /// The latest attempt published its output.
    Ready,
    /// The latest attempt failed.
    Failed(String),
}

/// Drives the render lifecycle for one mounted fragment.
///
/// Mounting synchronously starts the first attempt. Updating the inputs
/// starts a replacement attempt whenever they differ by value; the
/// previously published output stays visible through [`ready`] until the
/// replacement publishes, so consumers keep showing current content while
/// the next render is in flight. Superseded attempts are not cancelled:
/// they run to completion in the background (their cache writes land under
/// their own keys) but their results are discarded.
///
/// [`ready`]: FragmentOrchestrator::ready
pub struct FragmentOrchestrator<R: RuntimeAdapter, T> {
    context: RenderContext,
    runtime: Arc<R>,
    transport: Arc<T>,
    request: FragmentRequest,
    state: Arc<MountState<R::Content>>,
    current: AttemptFuture<R::Content>,
}

impl<R, T> FragmentOrchestrator<R, T>
where
    R: RuntimeAdapter + 'static,
    T: PayloadTransport + 'static,
{
    /// Mount a fragment and begin its first render attempt.
    ///
    /// Must be called on a tokio runtime: attempts are spawned so they keep
    /// running after being superseded.
    pub fn mount(
        request: FragmentRequest,
        context: RenderContext,
        runtime: Arc<R>,
        transport: Arc<T>,
    ) -> Self {
        let state = Arc::new(MountState::new());
        let current = begin_attempt(&request, &context, &runtime, &transport, &state);
        Self {
            context,
            runtime,
            transport,
            request,
            state,
            current,
        }
    }

    /// Replace the inputs. A new attempt starts only when they differ by
    /// value from the current ones.
    pub fn update(&mut self, request: FragmentRequest) {
        if request == self.request {
            return;
        }
        self.request = request;
        self.current = begin_attempt(
            &self.request,
            &self.context,
            &self.runtime,
            &self.transport,
            &self.state,
        );
    }

    /// The current attempt's future.
    pub fn output(&self) -> AttemptFuture<R::Content> {
        self.current.clone()
    }

    /// The most recently published output, if any attempt has succeeded.
    pub fn ready(&self) -> Option<Arc<RenderOutput<R::Content>>> {
        self.state.latest()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> RenderPhase {
        self.state.phase()
    }

    /// Inputs of the current attempt.
    pub fn request(&self) -> &FragmentRequest {
        &self.request
    }

    /// The context this mount renders against.
    pub fn context(&self) -> &RenderContext {
        &self.context
    }
}

fn begin_attempt<R, T>(
    request: &FragmentRequest,
    context: &RenderContext,
    runtime: &Arc<R>,
    transport: &Arc<T>,
    state: &Arc<MountState<R::Content>>,
) -> AttemptFuture<R::Content>
where
    R: RuntimeAdapter + 'static,
    T: PayloadTransport + 'static,
{
    let generation = state.begin();
    let request = request.clone();
    let context = context.clone();
    let runtime = Arc::clone(runtime);
    let transport = Arc::clone(transport);
    let state = Arc::clone(state);

    let attempt = async move {
        let result =
            render_attempt(&request, &context, &runtime, &transport, &state, generation).await;
        match &result {
            Ok(output) => state.publish(generation, Arc::clone(output)),
            Err(error) => state.fail(generation, error),
        }
        result
    };

    let shared = attempt.boxed().shared();
    // Superseded attempts are abandoned, not cancelled: a background driver
    // keeps polling so their cache writes still land.
    tokio::spawn(shared.clone().map(|_| ()));
    shared
}

async fn render_attempt<R, T>(
    request: &FragmentRequest,
    context: &RenderContext,
    runtime: &Arc<R>,
    transport: &Arc<T>,
    state: &MountState<R::Content>,
    generation: u64,
) -> AttemptResult<R::Content>
where
    R: RuntimeAdapter,
    T: PayloadTransport,
{
    let endpoint = context.require_endpoint()?.to_string();
    let key = request.encode().await?;
    tracing::debug!(key = %key, generation, "render attempt started");

    let resolver = PayloadResolver::new(
        context.cache.clone(),
        Arc::clone(runtime),
        Arc::clone(transport),
        endpoint,
    );
    let payload = resolver.resolve(&key).await?;

    let (render_half, capture_half) = tee(payload);
    state.advance(generation, RenderPhase::Rendering);

    let (content, bytes) = future::try_join(
        runtime.render_payload(render_half, context.render_options()),
        accumulate(capture_half),
    )
    .await?;

    let bytes: Arc<[u8]> = bytes.into();
    context.cache.insert(key.clone(), Arc::clone(&bytes));

    Ok(Arc::new(RenderOutput {
        content,
        key,
        bytes,
    }))
}

/// Mount state guarded by an attempt-generation counter.
struct MountState<C> {
    inner: Mutex<MountStateInner<C>>,
}

struct MountStateInner<C> {
    generation: u64,
    phase: RenderPhase,
    latest: Option<Arc<RenderOutput<C>>>,
}

impl<C> MountState<C> {
    fn new() -> Self {
        Self {
            inner: Mutex::new(MountStateInner {
                generation: 0,
                phase: RenderPhase::Idle,
                latest: None,
            }),
        }
    }

    /// Register a new attempt and return its generation.
    fn begin(&self) -> u64 {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.phase = RenderPhase::Resolving;
        inner.generation
    }

    fn advance(&self, generation: u64, phase: RenderPhase) {
        let mut inner = self.inner.lock();
        if inner.generation == generation {
            inner.phase = phase;
        }
    }

    fn publish(&self, generation: u64, output: Arc<RenderOutput<C>>) {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            tracing::debug!(generation, "stale attempt result discarded");
            return;
        }
        tracing::debug!(generation, key = %output.key, "render output published");
        inner.phase = RenderPhase::Ready;
        inner.latest = Some(output);
    }

    fn fail(&self, generation: u64, error: &RenderError) {
        let mut inner = self.inner.lock();
        if inner.generation == generation {
            inner.phase = RenderPhase::Failed(error.to_string());
        }
    }

    fn phase(&self) -> RenderPhase {
        self.inner.lock().phase.clone()
    }

    fn latest(&self) -> Option<Arc<RenderOutput<C>>> {
        self.inner.lock().latest.clone()
    }
}
