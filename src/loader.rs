/*
 * Asset Loader Module
 *
 * Fetches scene assets for incoming descriptors without blocking the frame
 * loop. Each uncached path is fetched on its own worker thread, shared by
 * every request for that path while it is in flight, and reports back
 * through a channel that the environment polls between frames. A fetch still
 * outstanding after the timeout is reported as a LoadError and its late
 * result is dropped. There is no cancellation: clearing the environment only
 * moves the loader to a new epoch, and results requested before that are
 * discarded when they arrive.
 */

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::asset::{AssetCache, AssetSource, SceneAsset};
use crate::descriptor::CreatureDescriptor;
use crate::error::{LoadError, SpawnError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(u64);

// A finished request, ready to become a creature or an error report
#[derive(Debug)]
pub struct LoadOutcome {
    pub ticket: LoadTicket,
    pub descriptor: CreatureDescriptor,
    pub result: Result<SceneAsset, SpawnError>,
}

struct PendingLoad {
    ticket: LoadTicket,
    // Ticket of the worker fetch this request waits on
    fetch: LoadTicket,
    descriptor: CreatureDescriptor,
    requested_at: Instant,
    epoch: u64,
}

struct Completed {
    ticket: LoadTicket,
    path: String,
    result: Result<SceneAsset, SpawnError>,
}

pub struct AssetLoader {
    source: Arc<dyn AssetSource>,
    cache: AssetCache,
    timeout: Duration,
    pending: Vec<PendingLoad>,
    in_flight: HashMap<String, (LoadTicket, Instant)>,
    ready: Vec<LoadOutcome>,
    sender: Sender<Completed>,
    receiver: Receiver<Completed>,
    next_ticket: u64,
    epoch: u64,
}

impl AssetLoader {
    pub fn new(source: Arc<dyn AssetSource>, cache_capacity: usize, timeout: Duration) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            source,
            cache: AssetCache::new(cache_capacity),
            timeout,
            pending: Vec::new(),
            in_flight: HashMap::new(),
            ready: Vec::new(),
            sender,
            receiver,
            next_ticket: 0,
            epoch: 0,
        }
    }

    // Start loading the asset a descriptor needs
    pub fn request(&mut self, descriptor: CreatureDescriptor, now: Instant) -> LoadTicket {
        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;

        // Cached assets are cloned straight away, no fetch
        if let Some(asset) = self.cache.get(&descriptor.model_path) {
            debug!("Asset cache hit for {}", descriptor.model_path);
            self.ready.push(LoadOutcome {
                ticket,
                descriptor,
                result: Ok(asset),
            });
            return ticket;
        }

        // A fetch for this path is already running and still within its time
        if let Some(&(fetch, started)) = self.in_flight.get(&descriptor.model_path) {
            if now.saturating_duration_since(started) < self.timeout {
                debug!("Joining in-flight fetch of {}", descriptor.model_path);
                self.pending.push(PendingLoad {
                    ticket,
                    fetch,
                    descriptor,
                    requested_at: now,
                    epoch: self.epoch,
                });
                return ticket;
            }
        }

        let path = descriptor.model_path.clone();
        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        let worker_path = path.clone();

        let spawned = thread::Builder::new()
            .name(format!("asset-fetch-{}", ticket.0))
            .spawn(move || {
                let result = source.fetch(&worker_path);
                // The loader may be gone by now; nothing left to report to
                let _ = sender.send(Completed {
                    ticket,
                    path: worker_path,
                    result,
                });
            });

        match spawned {
            Ok(_) => {
                self.in_flight.insert(path, (ticket, now));
                self.pending.push(PendingLoad {
                    ticket,
                    fetch: ticket,
                    descriptor,
                    requested_at: now,
                    epoch: self.epoch,
                });
            }
            Err(source) => self.ready.push(LoadOutcome {
                ticket,
                descriptor,
                result: Err(LoadError::Worker { path, source }.into()),
            }),
        }

        ticket
    }

    // Collect finished and timed-out requests
    pub fn poll(&mut self, now: Instant) -> Vec<LoadOutcome> {
        let mut outcomes = std::mem::take(&mut self.ready);

        while let Ok(completed) = self.receiver.try_recv() {
            if self.in_flight.get(&completed.path).map(|&(fetch, _)| fetch) == Some(completed.ticket) {
                self.in_flight.remove(&completed.path);
            }
            if let Ok(asset) = &completed.result {
                self.cache.insert(asset.clone());
            }

            let (waiting, rest): (Vec<PendingLoad>, Vec<PendingLoad>) = std::mem::take(&mut self.pending)
                .into_iter()
                .partition(|p| p.fetch == completed.ticket);
            self.pending = rest;

            if waiting.is_empty() {
                // Already reported as a timeout
                debug!("Dropping late result for {}", completed.path);
                continue;
            }

            for pending in waiting {
                if pending.epoch != self.epoch {
                    warn!(
                        "Discarding asset {} requested before the environment was cleared",
                        completed.path
                    );
                    continue;
                }

                let result = match &completed.result {
                    Ok(asset) => Ok(asset.clone()),
                    Err(err) => Err(err.replicate()),
                };
                outcomes.push(LoadOutcome {
                    ticket: pending.ticket,
                    descriptor: pending.descriptor,
                    result,
                });
            }
        }

        let timeout = self.timeout;
        let epoch = self.epoch;
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for pending in self.pending.drain(..) {
            if now.saturating_duration_since(pending.requested_at) < timeout {
                still_pending.push(pending);
                continue;
            }
            if pending.epoch != epoch {
                continue;
            }
            let path = pending.descriptor.model_path.clone();
            outcomes.push(LoadOutcome {
                ticket: pending.ticket,
                descriptor: pending.descriptor,
                result: Err(LoadError::Timeout { path, after: timeout }.into()),
            });
        }
        self.pending = still_pending;

        outcomes
    }

    // Forget every request made so far; in-flight fetches finish unobserved
    pub fn discard_pending(&mut self) {
        self.epoch += 1;
        self.ready.clear();
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn set_cache_capacity(&mut self, capacity: usize) {
        self.cache.set_capacity(capacity);
    }

    pub fn cached_assets(&self) -> usize {
        self.cache.len()
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.contains(path)
    }

    // Distinct paths currently being fetched
    pub fn fetches_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    // Requests still waiting on a worker, stale epochs included
    pub fn pending_loads(&self) -> usize {
        self.pending.len()
    }
}
