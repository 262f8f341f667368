//! Backend-to-engine thread bridge
//!
//! The engine core is single-threaded: all collection mutation happens
//! synchronously inside the notification that triggered it. Backends,
//! however, hear about the world on their own threads (SIP stacks,
//! LDAP lookups). The bridge is how they re-enter the engine's
//! control-flow context: a [`Dispatcher`] accepts closures from any
//! thread and the engine loop drains them through its [`EnginePump`].
//!
//! # Example
//!
//! ```ignore
//! let (dispatcher, mut pump) = bridge::channel();
//!
//! // On a backend thread:
//! dispatcher.dispatch(move || bank.add_account(account))?;
//!
//! // In the engine loop:
//! pump.drain();
//! ```

use tokio::sync::mpsc;
use tracing::{debug, trace};

type EngineTask = Box<dyn FnOnce() + Send + 'static>;

/// Create a connected dispatcher/pump pair.
pub fn channel() -> (Dispatcher, EnginePump) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Dispatcher { tx }, EnginePump { rx })
}

/// Cheap, clonable, `Send` handle backends use to run closures on the
/// engine thread.
#[derive(Clone)]
pub struct Dispatcher {
    tx: mpsc::UnboundedSender<EngineTask>,
}

impl Dispatcher {
    /// Queue `task` for execution on the engine thread. Fails only if
    /// the engine loop is gone.
    pub fn dispatch(&self, task: impl FnOnce() + Send + 'static) -> Result<(), DispatchError> {
        trace!("queueing engine task");
        self.tx.send(Box::new(task)).map_err(|_| DispatchError)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// The engine side of the bridge. Owned by the single engine loop.
pub struct EnginePump {
    rx: mpsc::UnboundedReceiver<EngineTask>,
}

impl EnginePump {
    /// Run every task queued so far, synchronously, in dispatch order.
    /// Returns the number of tasks executed.
    pub fn drain(&mut self) -> usize {
        let mut executed = 0;
        while let Ok(task) = self.rx.try_recv() {
            task();
            executed += 1;
        }
        if executed > 0 {
            debug!(tasks = executed, "drained engine tasks");
        }
        executed
    }

    /// Run tasks as they arrive until every dispatcher is dropped.
    pub async fn run(&mut self) {
        while let Some(task) = self.rx.recv().await {
            task();
        }
        debug!("all dispatchers dropped, engine pump stopping");
    }
}

impl std::fmt::Debug for EnginePump {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnginePump").finish()
    }
}

/// The engine loop has shut down; the task was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchError;

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "engine loop is gone, task dropped")
    }
}

impl std::error::Error for DispatchError {}
