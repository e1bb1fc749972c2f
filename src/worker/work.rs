// src/worker/work.rs

//! The client-facing work contract.
//!
//! A [`Work`] implementation is arbitrary client code. The scheduler only
//! needs three things from it:
//! - a work routine (required),
//! - an optional stop routine (only needed for cancellation support),
//! - optional hooks that run on the owner thread when a signal is delivered.

use std::fmt;

use crate::errors::Unsupported;
use crate::worker::Notifier;

/// A unit of work that can be executed by a [`crate::worker::Worker`].
///
/// `work` runs on a pool thread. The hooks run on the thread that drains the
/// worker's signals (normally the thread owning the manager), so they never
/// race with each other.
pub trait Work: Send + Sync + 'static {
    /// Do the work.
    ///
    /// In automatic notify mode, returning `Ok` raises a completion signal and
    /// returning `Err` raises an error signal. In manual mode the routine
    /// raises its own signals through `notifier`; an `Err` return still raises
    /// an error signal.
    fn work(&self, notifier: &Notifier) -> anyhow::Result<()>;

    /// Ask an in-flight work routine to stop.
    ///
    /// The default refuses, which surfaces as
    /// [`crate::errors::ForemanError::StopUnsupported`] to whoever asked.
    fn stop(&self) -> Result<(), Unsupported> {
        Err(Unsupported)
    }

    fn on_complete(&self) {}

    fn on_progress(&self) {}

    fn on_error(&self, _reason: &str) {}
}

/// Work routine backed by a closure.
pub struct FnWork<F> {
    f: F,
}

impl<F> FnWork<F>
where
    F: Fn(&Notifier) -> anyhow::Result<()> + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> fmt::Debug for FnWork<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnWork").finish_non_exhaustive()
    }
}

impl<F> Work for FnWork<F>
where
    F: Fn(&Notifier) -> anyhow::Result<()> + Send + Sync + 'static,
{
    fn work(&self, notifier: &Notifier) -> anyhow::Result<()> {
        (self.f)(notifier)
    }
}

/// Convenience constructor for [`FnWork`].
pub fn work_fn<F>(f: F) -> FnWork<F>
where
    F: Fn(&Notifier) -> anyhow::Result<()> + Send + Sync + 'static,
{
    FnWork::new(f)
}

/// Runs several work routines one after another on the same pool thread.
///
/// The chain stops at the first failing link. Only use it with routines that
/// finish their work before returning; a link that merely launches something
/// asynchronous lets the chain complete before that activity does.
#[derive(Default)]
pub struct ChainWork {
    links: Vec<Box<dyn Work>>,
}

impl ChainWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, link: impl Work) -> Self {
        self.links.push(Box::new(link));
        self
    }

    pub fn push(&mut self, link: impl Work) {
        self.links.push(Box::new(link));
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl fmt::Debug for ChainWork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainWork")
            .field("links", &self.links.len())
            .finish()
    }
}

impl Work for ChainWork {
    fn work(&self, notifier: &Notifier) -> anyhow::Result<()> {
        for (index, link) in self.links.iter().enumerate() {
            link.work(notifier).map_err(|err| {
                err.context(format!("chain link #{index} of worker '{}'", notifier.worker_id()))
            })?;
        }
        Ok(())
    }

    /// Every link is asked to stop; the chain only counts as stoppable if all
    /// of them are.
    fn stop(&self) -> Result<(), Unsupported> {
        let mut result = Ok(());
        for link in &self.links {
            if link.stop().is_err() {
                result = Err(Unsupported);
            }
        }
        result
    }
}
