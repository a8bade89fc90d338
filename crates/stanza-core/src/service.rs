//! Render off the caller's thread on a bounded worker pool
//!
//! [`RenderService::submit`] checks a request right away and hands back a
//! [`RenderTicket`]; the render itself runs on a rayon pool through the
//! [`ContentCache`], so duplicate submissions share one render. Dropping a
//! ticket abandons only that caller's interest: the render finishes and lands
//! in the cache for everyone else.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::{
    cache::{ContentCache, ImageBytes},
    error::{RenderError, Result, StanzaError},
    fingerprint::Fingerprint,
    traits::Renderer,
    RenderRequest,
};

/// Worker pool plus cache plus renderer
pub struct RenderService {
    pool: ThreadPool,
    cache: Arc<ContentCache>,
    renderer: Arc<dyn Renderer>,
}

impl RenderService {
    /// Spin up `workers` render threads (0 lets rayon pick one per core)
    pub fn new(renderer: Arc<dyn Renderer>, cache: ContentCache, workers: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("stanza-render-{i}"))
            .panic_handler(|_| log::error!("A render worker panicked outside the pipeline"))
            .build()
            .map_err(|e| StanzaError::Config(format!("cannot start render workers: {e}")))?;

        log::debug!(
            "Render service ready: {} workers, renderer {}",
            pool.current_num_threads(),
            renderer.name()
        );

        Ok(Self {
            pool,
            cache: Arc::new(cache),
            renderer,
        })
    }

    /// Queue a render and return immediately
    ///
    /// Requests that can never render (empty text, unknown ids) fail here,
    /// before anything is queued.
    pub fn submit(&self, request: RenderRequest) -> Result<RenderTicket> {
        let request = request.normalized()?;
        self.renderer.validate(&request)?;
        let fingerprint = Fingerprint::of_normalized(&request);

        let (tx, rx) = mpsc::sync_channel(1);
        let cache = Arc::clone(&self.cache);
        let renderer = Arc::clone(&self.renderer);

        self.pool.spawn(move || {
            let result = cache.get_or_render(&request, renderer.as_ref());
            // Nobody listening is fine, the cache already has the result
            let _ = tx.send(result);
        });

        Ok(RenderTicket { fingerprint, rx })
    }

    /// Submit and wait
    pub fn render(&self, request: RenderRequest) -> Result<ImageBytes> {
        self.submit(request)?.wait()
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }
}

/// A claim on one submitted render
#[derive(Debug)]
pub struct RenderTicket {
    fingerprint: Fingerprint,
    rx: Receiver<Result<ImageBytes>>,
}

impl RenderTicket {
    /// Id the finished image will be cached under
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Block until the render finishes
    pub fn wait(self) -> Result<ImageBytes> {
        self.rx.recv().unwrap_or_else(|_| Err(worker_vanished()))
    }

    /// Block for at most `timeout`; the render keeps going if we give up
    pub fn wait_timeout(self, timeout: Duration) -> Result<ImageBytes> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(StanzaError::TimedOut(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(worker_vanished()),
        }
    }
}

fn worker_vanished() -> StanzaError {
    RenderError::Panicked("render worker exited without a result".into()).into()
}
