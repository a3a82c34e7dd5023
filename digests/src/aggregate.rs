//! Fan-out of one chunk stream to a fixed pool of checksum workers.
//!
//! Each algorithm owns one long-lived thread and its engine. For every chunk
//! the aggregator hands the same shared buffer to all workers and then waits
//! for exactly one reply per worker before reading the next chunk, so no
//! engine can fold chunk `k + 1` before every engine has folded chunk `k`.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, warn};

use crate::algorithm::{Algorithm, Digest, DigestSet};
use crate::chunker::{ChunkSource, StreamChunker};
use crate::engine::ChecksumEngine;
use crate::error::{DigestError, Result};

/// Where the pool is in its current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    Idle,
    /// Chunks are being read and dispatched
    Chunking,
    /// All chunks folded, digests being collected
    Aggregating,
    Finalized,
    /// The last run aborted; the reason is kept for inspection
    Failed(String),
}

#[derive(Clone)]
enum Job {
    Update(Arc<[u8]>),
    Finalize,
    Reset,
}

enum Reply {
    Updated,
    Finished(usize, Digest),
    Failed(DigestError),
    Lost(usize),
}

/// Reports a worker whose thread unwinds, so the barrier never waits on it.
///
/// The job queue is closed before the report goes out: once the aggregator
/// sees `Lost`, any later send to this worker fails instead of queueing a
/// job nobody will answer.
struct LostGuard {
    slot: usize,
    jobs: Option<Receiver<Job>>,
    replies: Sender<Reply>,
}

impl Drop for LostGuard {
    fn drop(&mut self) {
        drop(self.jobs.take());
        if thread::panicking() {
            let _ = self.replies.send(Reply::Lost(self.slot));
        }
    }
}

struct Worker {
    algorithm: Algorithm,
    jobs: Option<Sender<Job>>,
    handle: Option<JoinHandle<()>>,
}

fn worker_loop(
    slot: usize,
    mut engine: Box<dyn ChecksumEngine>,
    jobs: Receiver<Job>,
    replies: Sender<Reply>,
) {
    let guard = LostGuard {
        slot,
        jobs: Some(jobs),
        replies: replies.clone(),
    };
    let Some(jobs) = guard.jobs.as_ref() else {
        return;
    };

    for job in jobs.iter() {
        let reply = match job {
            Job::Update(data) => match engine.update(&data) {
                Ok(()) => Reply::Updated,
                Err(e) => Reply::Failed(e),
            },
            Job::Finalize => {
                let result = engine.finalize();
                engine.reset();
                match result {
                    Ok(digest) => Reply::Finished(slot, digest),
                    Err(e) => Reply::Failed(e),
                }
            }
            Job::Reset => {
                engine.reset();
                continue;
            }
        };
        if replies.send(reply).is_err() {
            break;
        }
    }
}

/// A reusable pool computing several digests over the same byte stream.
pub struct MultiDigest {
    workers: Vec<Worker>,
    replies: Receiver<Reply>,
    state: RunState,
}

impl MultiDigest {
    /// Start one worker per algorithm, in the given order.
    pub fn new(algorithms: &[Algorithm]) -> Result<Self> {
        Self::from_engines(algorithms.iter().map(|a| a.engine()).collect())
    }

    /// Start a pool over caller-supplied engines. The digest set follows the
    /// order of `engines`.
    pub fn from_engines(engines: Vec<Box<dyn ChecksumEngine>>) -> Result<Self> {
        if engines.is_empty() {
            return Err(DigestError::NoAlgorithms);
        }
        for (i, engine) in engines.iter().enumerate() {
            let algorithm = engine.algorithm();
            if engines[..i].iter().any(|e| e.algorithm() == algorithm) {
                return Err(DigestError::DuplicateAlgorithm(algorithm));
            }
        }

        let (reply_tx, replies) = unbounded();
        let mut workers = Vec::with_capacity(engines.len());

        for (slot, engine) in engines.into_iter().enumerate() {
            let algorithm = engine.algorithm();
            let (job_tx, job_rx) = unbounded();
            let reply_tx = reply_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("digest-{}", algorithm.key()))
                .spawn(move || worker_loop(slot, engine, job_rx, reply_tx))
                .map_err(DigestError::Spawn)?;
            workers.push(Worker {
                algorithm,
                jobs: Some(job_tx),
                handle: Some(handle),
            });
        }

        debug!(workers = workers.len(), "digest pool started");

        Ok(MultiDigest {
            workers,
            replies,
            state: RunState::Idle,
        })
    }

    pub fn algorithms(&self) -> impl Iterator<Item = Algorithm> + '_ {
        self.workers.iter().map(|w| w.algorithm)
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Hash every chunk of `chunks` with every algorithm.
    ///
    /// `progress` receives `(bytes_done, bytes_total)` after each chunk
    /// barrier. Any read error, engine error or lost worker aborts the run
    /// and no digests are returned; the engines are reset either way.
    pub fn run<S, F>(&mut self, chunks: StreamChunker<S>, mut progress: F) -> Result<DigestSet>
    where
        S: ChunkSource,
        F: FnMut(u64, u64),
    {
        self.state = RunState::Chunking;
        let total = chunks.total_len();
        debug!(total, chunk_size = chunks.chunk_size(), "digest run started");

        match self.drive(chunks, total, &mut progress) {
            Ok(set) => {
                self.state = RunState::Finalized;
                debug!(total, digests = set.len(), "digest run finalized");
                Ok(set)
            }
            Err(e) => {
                warn!(error = %e, "digest run aborted");
                self.broadcast_reset();
                self.state = RunState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn drive<S: ChunkSource>(
        &mut self,
        chunks: StreamChunker<S>,
        total: u64,
        progress: &mut dyn FnMut(u64, u64),
    ) -> Result<DigestSet> {
        let mut done = 0u64;
        for chunk in chunks {
            let chunk = chunk?;
            self.dispatch(Job::Update(Arc::clone(&chunk.data)))?;
            done += chunk.len() as u64;
            progress(done, total);
        }

        self.state = RunState::Aggregating;
        let digests = self.dispatch(Job::Finalize)?;
        let ordered = digests
            .into_iter()
            .zip(&self.workers)
            .map(|(digest, worker)| digest.ok_or(DigestError::WorkerLost(worker.algorithm)))
            .collect::<Result<Vec<_>>>()?;
        DigestSet::from_digests(ordered)
    }

    /// Send `job` to every worker and wait for all of their replies.
    ///
    /// Replies from every worker that accepted the job are drained even
    /// after a failure, so no stale reply can leak into the next step.
    fn dispatch(&self, job: Job) -> Result<Vec<Option<Digest>>> {
        let mut first_error = None;
        let mut expected = 0usize;

        for worker in &self.workers {
            let sent = worker
                .jobs
                .as_ref()
                .map(|tx| tx.send(job.clone()).is_ok())
                .unwrap_or(false);
            if sent {
                expected += 1;
            } else if first_error.is_none() {
                first_error = Some(DigestError::WorkerLost(worker.algorithm));
            }
        }

        let mut digests: Vec<Option<Digest>> = vec![None; self.workers.len()];
        for _ in 0..expected {
            match self.replies.recv() {
                Ok(Reply::Updated) => {}
                Ok(Reply::Finished(slot, digest)) => digests[slot] = Some(digest),
                Ok(Reply::Failed(e)) => {
                    first_error.get_or_insert(e);
                }
                Ok(Reply::Lost(slot)) => {
                    first_error.get_or_insert(DigestError::WorkerLost(self.workers[slot].algorithm));
                }
                Err(_) => {
                    let algorithm = self.workers[0].algorithm;
                    return Err(first_error.unwrap_or(DigestError::WorkerLost(algorithm)));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(digests),
        }
    }

    fn broadcast_reset(&self) {
        for tx in self.workers.iter().filter_map(|w| w.jobs.as_ref()) {
            let _ = tx.send(Job::Reset);
        }
    }
}

impl Drop for MultiDigest {
    fn drop(&mut self) {
        for worker in &mut self.workers {
            worker.jobs.take();
        }
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    debug!(algorithm = %worker.algorithm, "digest worker had panicked");
                }
            }
        }
    }
}
