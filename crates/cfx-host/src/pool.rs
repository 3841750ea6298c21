//! Worker pool of filter hosts.
//!
//! The pool owns a set of threads, each running one [`FilterHost`], fed by
//! a shared job channel. Threads are started lazily: a submit spawns a new
//! host only when none is idle and the configured cap allows it; past the
//! cap, jobs wait in the channel for the next free host.
//!
//! # Example
//!
//! ```rust
//! use cfx_core::ImageBuffer;
//! use cfx_host::{FilterPool, Packet};
//! use cfx_ops::FilterDescriptor;
//!
//! let pool = FilterPool::builder().max_hosts(2).build().unwrap();
//! let image = ImageBuffer::filled(2, 1, [0, 0, 0, 255]).unwrap();
//! let ticket = pool.submit(Packet::new(image, vec![FilterDescriptor::new("invert")])).unwrap();
//! let response = ticket.wait().unwrap();
//! assert_eq!(response.packet.image.unwrap().data, vec![255, 255, 255, 255, 255, 255, 255, 255]);
//! ```

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use cfx_ops::FilterCatalog;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, info, trace, warn};

use crate::config::PoolConfig;
use crate::host::FilterHost;
use crate::packet::{Packet, Response};
use crate::{HostError, HostResult};

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`FilterPool`].
#[derive(Debug, Clone, Default)]
pub struct PoolBuilder {
    config: PoolConfig,
    catalog: Option<Arc<FilterCatalog>>,
}

impl PoolBuilder {
    /// Builder with default settings and the standard catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: PoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Caps the number of host threads.
    pub fn max_hosts(mut self, max: usize) -> Self {
        self.config.max_hosts = Some(max);
        self
    }

    /// Starts `count` hosts when the pool is built.
    pub fn prewarm(mut self, count: usize) -> Self {
        self.config.prewarm = count;
        self
    }

    /// Sets each host's workstore TTL.
    pub fn workstore_ttl(mut self, ttl: Duration) -> Self {
        self.config.workstore_ttl_ms = ttl.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    /// Sets the worker thread name prefix.
    pub fn thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.config.thread_name = prefix.into();
        self
    }

    /// Uses a custom catalog.
    pub fn catalog(mut self, catalog: Arc<FilterCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Builds the pool, starting any prewarmed hosts.
    pub fn build(self) -> HostResult<FilterPool> {
        let catalog = self.catalog.unwrap_or_else(|| Arc::new(FilterCatalog::standard()));
        let (jobs, queue) = crossbeam_channel::unbounded();
        let pool = FilterPool {
            config: self.config,
            catalog,
            jobs: Some(jobs),
            queue,
            workers: Mutex::new(Vec::new()),
            idle: Arc::new(AtomicUsize::new(0)),
            next_id: AtomicU64::new(1),
        };
        {
            let mut workers = pool.workers.lock().unwrap_or_else(PoisonError::into_inner);
            while workers.len() < pool.config.prewarm && pool.config.allows_another(workers.len()) {
                pool.spawn_host(&mut workers)?;
            }
        }
        info!(prewarmed = pool.hosts(), max_hosts = ?pool.config.max_hosts, "filter pool ready");
        Ok(pool)
    }
}

// ============================================================================
// Tickets
// ============================================================================

/// Handle to one submitted packet.
///
/// Dropping the ticket discards the result; the chain still runs.
#[derive(Debug)]
pub struct FilterTicket {
    id: u64,
    rx: Receiver<Response>,
}

impl FilterTicket {
    /// Request id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Blocks until the response arrives.
    pub fn wait(self) -> HostResult<Response> {
        self.rx.recv().map_err(|_| HostError::Disconnected)
    }

    /// Returns the response if it has already arrived.
    pub fn try_wait(&self) -> HostResult<Option<Response>> {
        match self.rx.try_recv() {
            Ok(r) => Ok(Some(r)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(HostError::Disconnected),
        }
    }

    /// Blocks for at most `timeout`.
    pub fn wait_timeout(&self, timeout: Duration) -> HostResult<Response> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => HostError::Timeout(timeout),
            RecvTimeoutError::Disconnected => HostError::Disconnected,
        })
    }
}

// ============================================================================
// Pool
// ============================================================================

struct Job {
    id: u64,
    packet: Packet,
    reply: Sender<Response>,
}

/// Lazily grown pool of filter host threads.
pub struct FilterPool {
    config: PoolConfig,
    catalog: Arc<FilterCatalog>,
    jobs: Option<Sender<Job>>,
    queue: Receiver<Job>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    idle: Arc<AtomicUsize>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for FilterPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterPool")
            .field("config", &self.config)
            .field("hosts", &self.hosts())
            .field("idle", &self.idle_hosts())
            .finish()
    }
}

impl FilterPool {
    /// Starts a builder.
    pub fn builder() -> PoolBuilder {
        PoolBuilder::new()
    }

    /// Pool with default settings and the standard catalog.
    pub fn new() -> HostResult<Self> {
        PoolBuilder::new().build()
    }

    /// Pool from a configuration and the standard catalog.
    pub fn with_config(config: PoolConfig) -> HostResult<Self> {
        PoolBuilder::new().config(config).build()
    }

    /// The pool's configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Number of host threads started so far.
    pub fn hosts(&self) -> usize {
        self.workers.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Hosts currently waiting for work.
    pub fn idle_hosts(&self) -> usize {
        self.idle.load(Ordering::Acquire)
    }

    /// Jobs waiting for a free host.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Submits a packet; the response is delivered to the returned ticket.
    pub fn submit(&self, packet: Packet) -> HostResult<FilterTicket> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let id = self.submit_with(packet, &tx)?;
        Ok(FilterTicket { id, rx })
    }

    /// Submits a packet whose response goes to `reply`.
    ///
    /// Responses to packets submitted this way may arrive in any order;
    /// match them up by [`Response::id`]. Returns the assigned id.
    pub fn submit_with(&self, packet: Packet, reply: &Sender<Response>) -> HostResult<u64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!(id, name = ?packet.name, "FilterPool::submit");
        self.ensure_host()?;
        let jobs = self.jobs.as_ref().ok_or(HostError::Disconnected)?;
        jobs.send(Job { id, packet, reply: reply.clone() })
            .map_err(|_| HostError::Disconnected)?;
        Ok(id)
    }

    /// Submits a packet and blocks for its result.
    pub fn run(&self, packet: Packet) -> HostResult<Packet> {
        Ok(self.submit(packet)?.wait()?.packet)
    }

    fn ensure_host(&self) -> HostResult<()> {
        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        let waiting = self.queue.len();
        if self.idle.load(Ordering::Acquire) > waiting {
            return Ok(());
        }
        if !self.config.allows_another(workers.len()) {
            trace!(hosts = workers.len(), queued = waiting, "host cap reached, queueing");
            return Ok(());
        }
        self.spawn_host(&mut workers)
    }

    fn spawn_host(&self, workers: &mut Vec<JoinHandle<()>>) -> HostResult<()> {
        let index = workers.len();
        let name = format!("{}-{}", self.config.thread_name, index);
        let queue = self.queue.clone();
        let catalog = Arc::clone(&self.catalog);
        let ttl = self.config.workstore_ttl();
        let idle = Arc::clone(&self.idle);

        idle.fetch_add(1, Ordering::AcqRel);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || host_loop(FilterHost::with_ttl(catalog, ttl), queue, idle))
            .map_err(|e| {
                self.idle.fetch_sub(1, Ordering::AcqRel);
                HostError::Spawn(e)
            })?;
        debug!(thread = %name, "host started");
        workers.push(handle);
        Ok(())
    }
}

fn host_loop(mut host: FilterHost, queue: Receiver<Job>, idle: Arc<AtomicUsize>) {
    while let Ok(job) = queue.recv() {
        idle.fetch_sub(1, Ordering::AcqRel);
        let name = job.packet.name.clone();
        let packet = host.process(job.packet);
        if job.reply.send(Response { id: job.id, name, packet }).is_err() {
            debug!(id = job.id, "requester gone, response dropped");
        }
        idle.fetch_add(1, Ordering::AcqRel);
    }
    idle.fetch_sub(1, Ordering::AcqRel);
    trace!(processed = host.processed(), "host loop exiting");
}

impl Drop for FilterPool {
    fn drop(&mut self) {
        self.jobs.take();
        let workers = std::mem::take(self.workers.get_mut().unwrap_or_else(PoisonError::into_inner));
        for handle in workers {
            if handle.join().is_err() {
                warn!("host thread panicked during shutdown");
            }
        }
    }
}
