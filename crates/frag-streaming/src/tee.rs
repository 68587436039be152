//! Stream splitting.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use frag_core::RenderError;
use futures::stream::Stream;
use futures::task::{self, ArcWake};
use parking_lot::Mutex;

use crate::stream::{ByteStream, Chunk};

/// Split a single-consumption stream into two branches that each see the
/// identical chunk sequence in the identical order.
///
/// Chunks stay in a shared window only until both branches have consumed
/// them, so retained memory is bounded by the slower consumer's lag rather
/// than the whole payload; a dropped branch stops contributing to
/// retention. Backpressure on one branch never blocks the other: whichever
/// branch needs data pulls the source on behalf of both. A source failure
/// is delivered to each branch exactly once, after any chunks that preceded
/// it.
pub fn tee(stream: ByteStream) -> (ByteStream, ByteStream) {
    let state = Arc::new(Mutex::new(TeeState::new(stream)));
    let left = TeeBranch {
        state: Arc::clone(&state),
        index: 0,
    };
    let right = TeeBranch { state, index: 1 };
    (ByteStream::new(left), ByteStream::new(right))
}

struct TeeState {
    /// Taken out while a branch polls it so the lock is not held across
    /// the poll.
    source: Option<ByteStream>,
    window: VecDeque<Vec<u8>>,
    /// Sequence number of `window[0]`.
    head: u64,
    /// Next sequence number each branch will read; `u64::MAX` marks a
    /// dropped branch.
    cursor: [u64; 2],
    finished: bool,
    failure: Option<RenderError>,
    failure_seen: [bool; 2],
    parked: [Option<Waker>; 2],
    /// Set by the source waker; catches readiness signalled while a branch
    /// was mid-poll and had not parked yet.
    notified: bool,
}

impl TeeState {
    fn new(source: ByteStream) -> Self {
        Self {
            source: Some(source),
            window: VecDeque::new(),
            head: 0,
            cursor: [0; 2],
            finished: false,
            failure: None,
            failure_seen: [false; 2],
            parked: [None, None],
            notified: false,
        }
    }

    fn tail(&self) -> u64 {
        self.head + self.window.len() as u64
    }

    /// Drop window chunks both branches have consumed.
    fn release(&mut self) {
        let consumed = self.cursor[0].min(self.cursor[1]);
        while self.head < consumed && !self.window.is_empty() {
            self.window.pop_front();
            self.head += 1;
        }
    }

    fn wake_other(&mut self, index: usize) {
        if let Some(waker) = self.parked[1 - index].take() {
            waker.wake();
        }
    }
}

struct TeeBranch {
    state: Arc<Mutex<TeeState>>,
    index: usize,
}

impl Stream for TeeBranch {
    type Item = Chunk;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            let mut state = this.state.lock();

            let pos = state.cursor[this.index];
            if pos < state.tail() {
                let chunk = state.window[(pos - state.head) as usize].clone();
                state.cursor[this.index] = pos + 1;
                state.release();
                return Poll::Ready(Some(Ok(chunk)));
            }

            if state.finished {
                if let Some(failure) = state.failure.clone() {
                    if !state.failure_seen[this.index] {
                        state.failure_seen[this.index] = true;
                        return Poll::Ready(Some(Err(failure)));
                    }
                }
                return Poll::Ready(None);
            }

            let Some(mut source) = state.source.take() else {
                // The other branch is pulling from the source right now.
                state.parked[this.index] = Some(cx.waker().clone());
                return Poll::Pending;
            };
            state.notified = false;
            drop(state);

            // Poll with a waker that rouses both branches: the source may
            // signal readiness long after this branch stopped listening.
            let waker = task::waker(Arc::new(TeeWaker {
                state: Arc::clone(&this.state),
            }));
            let mut source_cx = Context::from_waker(&waker);
            let polled = Pin::new(&mut source).poll_next(&mut source_cx);

            let mut state = this.state.lock();
            state.source = Some(source);
            match polled {
                Poll::Ready(Some(Ok(chunk))) => {
                    state.window.push_back(chunk);
                    state.wake_other(this.index);
                }
                Poll::Ready(Some(Err(error))) => {
                    state.finished = true;
                    state.failure = Some(error);
                    state.wake_other(this.index);
                }
                Poll::Ready(None) => {
                    state.finished = true;
                    state.wake_other(this.index);
                }
                Poll::Pending => {
                    if !state.notified {
                        state.parked[this.index] = Some(cx.waker().clone());
                        return Poll::Pending;
                    }
                    // Readiness arrived while we were polling; go again.
                }
            }
        }
    }
}

impl Drop for TeeBranch {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.cursor[self.index] = u64::MAX;
        state.failure_seen[self.index] = true;
        state.parked[self.index] = None;
        state.release();
        state.wake_other(self.index);
    }
}

struct TeeWaker {
    state: Arc<Mutex<TeeState>>,
}

impl ArcWake for TeeWaker {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        let wakers = {
            let mut state = arc_self.state.lock();
            state.notified = true;
            [state.parked[0].take(), state.parked[1].take()]
        };
        for waker in wakers.into_iter().flatten() {
            waker.wake();
        }
    }
}
