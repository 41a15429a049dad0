use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::ConfigError;
use crate::failure::{Failure, TestResult};
use crate::report::Path;
use crate::suite::SuiteInner;
use crate::tree::{Limit, NodeId, Resolve, Setting};

/// Handle passed to every test body and hook.
///
/// Gives access to the node being run and nothing else. Changing the timeout
/// from inside a body takes effect for that same body, since the deadline is
/// resolved after the body returns control.
#[derive(Clone)]
pub struct TestContext {
    suite: Arc<SuiteInner>,
    node: NodeId,
    path: Path,
}

impl TestContext {
    pub(crate) fn new(suite: Arc<SuiteInner>, node: NodeId, path: Path) -> Self {
        Self { suite, node, path }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the node, empty for the root.
    pub fn name(&self) -> &str {
        self.path
            .segments()
            .last()
            .map(|s| s.name.as_str())
            .unwrap_or_default()
    }

    pub fn timeout(&self) -> Limit {
        self.suite.tree.read().effective_timeout(self.node)
    }

    pub fn own_timeout(&self) -> Option<Limit> {
        self.suite
            .tree
            .read()
            .resolve(self.node, Setting::Timeout, Resolve::Own)
    }

    pub fn set_timeout(&self, limit: impl Into<Limit>) -> Result<(), ConfigError> {
        self.suite
            .tree
            .write()
            .set(self.node, Setting::Timeout, limit.into())
    }

    pub fn slow(&self) -> Limit {
        self.suite.tree.read().effective_slow(self.node)
    }

    pub fn own_slow(&self) -> Option<Limit> {
        self.suite
            .tree
            .read()
            .resolve(self.node, Setting::Slow, Resolve::Own)
    }

    pub fn set_slow(&self, limit: impl Into<Limit>) -> Result<(), ConfigError> {
        self.suite
            .tree
            .write()
            .set(self.node, Setting::Slow, limit.into())
    }
}

impl fmt::Debug for TestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestContext")
            .field("node", &self.node)
            .field("path", &self.path.to_string())
            .finish()
    }
}

/// Completion handle for callback-style bodies.
///
/// The first signal settles the node. Every later signal, including one that
/// arrives after a timeout, is reported as an `extra` event. Dropping every
/// clone without signalling fails the node.
#[derive(Debug, Clone)]
pub struct Done {
    tx: mpsc::UnboundedSender<TestResult>,
}

impl Done {
    pub(crate) fn new(tx: mpsc::UnboundedSender<TestResult>) -> Self {
        Self { tx }
    }

    pub fn pass(&self) {
        self.finish(Ok(()));
    }

    pub fn fail(&self, failure: impl Into<Failure>) {
        self.finish(Err(failure.into()));
    }

    pub fn finish(&self, result: TestResult) {
        // The run may already be over; nobody is listening then.
        let _ = self.tx.send(result);
    }
}
