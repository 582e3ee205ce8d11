//! Worker pool for the per-source ray pass.
//!
//! Sources are published on one shared channel, so each is claimed by
//! exactly one worker. Workers trace into a private canvas and only merge
//! it into the shared frame grid when told to flush; the controller sends
//! all trace jobs before any flush, and a flushing worker first drains
//! whatever is still queued, so every claimed source is merged before the
//! controller sees the last acknowledgement. Channel disconnect is the
//! shutdown signal: workers then exit without merging.

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, unbounded};
use lumen_light::LightCell;
use rand::Rng;

use crate::rays::{self, Frame};

type TraceJob = (usize, Arc<Frame>);

struct Flush {
    out: Arc<Mutex<Vec<LightCell>>>,
    done: Sender<()>,
}

pub(crate) struct LightPool {
    // Senders drop before the pool so workers disconnect and exit first.
    job_tx: Sender<TraceJob>,
    ctrl_txs: Vec<Sender<Flush>>,
    _pool: rayon::ThreadPool,
}

impl LightPool {
    pub(crate) fn new(threads: usize) -> Result<Self, Box<dyn Error>> {
        let threads = if threads == 0 {
            std::thread::available_parallelism().map_or(1, |n| n.get())
        } else {
            threads
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("lumen-light-{i}"))
            .panic_handler(|_| log::error!("light worker panicked; frame may be incomplete"))
            .build()?;
        let (job_tx, job_rx) = unbounded::<TraceJob>();
        let mut ctrl_txs = Vec::with_capacity(threads);
        for _ in 0..threads {
            let (ctrl_tx, ctrl_rx) = unbounded::<Flush>();
            ctrl_txs.push(ctrl_tx);
            let jobs = job_rx.clone();
            pool.spawn(move || worker(jobs, ctrl_rx));
        }
        Ok(Self {
            job_tx,
            ctrl_txs,
            _pool: pool,
        })
    }

    /// Traces every active source in `frame` across the pool and returns
    /// `canvas` with the results max-blended in.
    pub(crate) fn run_frame(&self, frame: Arc<Frame>, canvas: Vec<LightCell>) -> Vec<LightCell> {
        let out = Arc::new(Mutex::new(canvas));
        for (idx, source) in frame.lights.iter().enumerate() {
            if source.is_active() && self.job_tx.send((idx, frame.clone())).is_err() {
                break;
            }
        }
        let (done_tx, done_rx) = bounded(self.ctrl_txs.len());
        for ctrl in &self.ctrl_txs {
            let _ = ctrl.send(Flush {
                out: out.clone(),
                done: done_tx.clone(),
            });
        }
        drop(done_tx);
        let mut pending = self.ctrl_txs.len();
        while pending > 0 {
            match done_rx.recv_timeout(Duration::from_secs(10)) {
                Ok(()) => pending -= 1,
                Err(RecvTimeoutError::Timeout) => {
                    log::error!("light worker missed its flush deadline; frame is partial");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        match Arc::try_unwrap(out) {
            Ok(m) => m.into_inner().unwrap_or_else(|p| p.into_inner()),
            Err(arc) => arc.lock().unwrap_or_else(|p| p.into_inner()).clone(),
        }
    }
}

fn worker(jobs: Receiver<TraceJob>, ctrl: Receiver<Flush>) {
    let mut rng = rand::thread_rng();
    let mut current: Option<(Arc<Frame>, Vec<LightCell>)> = None;
    loop {
        crossbeam_channel::select! {
            recv(jobs) -> msg => match msg {
                Ok((idx, frame)) => trace(&mut current, &mut rng, idx, frame),
                Err(_) => break,
            },
            recv(ctrl) -> msg => match msg {
                Ok(flush) => {
                    // Claim what is still queued first; no trace jobs are
                    // published after the flushes.
                    while let Ok((idx, frame)) = jobs.try_recv() {
                        trace(&mut current, &mut rng, idx, frame);
                    }
                    if let Some((_, canvas)) = current.take() {
                        let mut shared = flush.out.lock().unwrap_or_else(|p| p.into_inner());
                        rays::merge_max(&mut shared, &canvas);
                    }
                    let _ = flush.done.send(());
                }
                Err(_) => break,
            },
        }
    }
}

fn trace(
    current: &mut Option<(Arc<Frame>, Vec<LightCell>)>,
    rng: &mut impl Rng,
    idx: usize,
    frame: Arc<Frame>,
) {
    let fresh = !matches!(current, Some((held, _)) if Arc::ptr_eq(held, &frame));
    if fresh {
        let canvas = vec![LightCell::DARK; frame.len()];
        *current = Some((frame, canvas));
    }
    if let Some((held, canvas)) = current {
        rays::do_light(held, canvas, rng, idx);
    }
}
