//! Publish/subscribe with deferred dispatch.
//!
//! `Emitter::emit` never runs handlers itself. Every registered handler is
//! queued as a job on the shared [`EventQueue`], so a handler can not observe
//! or re-enter the emitting call before it returns. Jobs run in the order they
//! were queued, across all emitters sharing the queue.

use std::{fmt, sync::Arc};

use tokio::sync::mpsc;
use tracing::{trace, warn};

type Job = Box<dyn FnOnce() + Send>;

pub type Handler<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Creates a connected scheduler / queue pair.
pub fn channel() -> (Scheduler, EventQueue) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (Scheduler { sender }, EventQueue { receiver })
}

/// Cloneable handle emitters use to queue handler invocations.
#[derive(Clone)]
pub struct Scheduler {
    sender: mpsc::UnboundedSender<Job>,
}

impl Scheduler {
    fn schedule(&self, job: Job) {
        if self.sender.send(job).is_err() {
            warn!("Event queue closed, dropping handler invocation");
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

/// Receiving side of the deferred handler queue.
pub struct EventQueue {
    receiver: mpsc::UnboundedReceiver<Job>,
}

impl EventQueue {
    /// Runs every queued handler, including ones queued by handlers during
    /// the drain, and returns how many ran.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job();
            ran += 1;
        }
        ran
    }

    /// Runs handlers as they are queued until every [`Scheduler`] is dropped.
    pub async fn run(mut self) {
        while let Some(job) = self.receiver.recv().await {
            job();
        }
        trace!("All schedulers dropped, event queue finished");
    }
}

pub struct Emitter<T> {
    name: &'static str,
    handlers: Vec<Handler<T>>,
    scheduler: Scheduler,
}

impl<T> Emitter<T>
where
    T: Clone + Send + 'static,
{
    pub fn new(name: &'static str, scheduler: &Scheduler) -> Self {
        Self {
            name,
            handlers: Vec::new(),
            scheduler: scheduler.clone(),
        }
    }

    /// Appends a handler. Handlers are never de-duplicated or removed.
    pub fn register<F>(&mut self, handler: F)
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(handler));
    }

    pub fn emit(&self, value: T) {
        trace!(
            "Emitting {} to {} handler(s)",
            self.name,
            self.handlers.len()
        );

        for handler in &self.handlers {
            let handler = Arc::clone(handler);
            let value = value.clone();
            self.scheduler.schedule(Box::new(move || handler(value)));
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("name", &self.name)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
