//! The root handle.

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::Instrument;

use crate::config::RunnerConfig;
use crate::error::{ConfigError, RunError};
use crate::loader::{LoadError, Loader};
use crate::report::{Path, Reporter, RunSummary, TracingReporter};
use crate::runner::Runner;
use crate::tree::{Declare, Defaults, Limit, NodeId, Resolve, Setting, Tree};

/// State shared between the suite handle, the scheduler and test contexts.
pub(crate) struct SuiteInner {
    pub(crate) tree: RwLock<Tree>,
    reporter: Mutex<Option<Box<dyn Reporter>>>,
    has_reporter: AtomicBool,
    running: AtomicBool,
    config: RunnerConfig,
}

impl SuiteInner {
    /// Stores the reporter built by `make`. Only one may be registered.
    pub(crate) fn install_reporter<F>(&self, make: F) -> Result<(), ConfigError>
    where
        F: FnOnce() -> Box<dyn Reporter>,
    {
        let mut slot = self.reporter.lock();
        if slot.is_some() || self.has_reporter.load(Ordering::Acquire) {
            return Err(ConfigError::ReporterExists);
        }
        *slot = Some(make());
        self.has_reporter.store(true, Ordering::Release);
        Ok(())
    }

    pub(crate) fn ensure_idle(&self) -> Result<(), ConfigError> {
        if self.running.load(Ordering::Acquire) {
            return Err(ConfigError::Locked);
        }
        Ok(())
    }
}

/// A test suite: the root of a test tree plus its reporter.
///
/// Cloning is cheap and every clone refers to the same suite.
///
/// ```ignore
/// let suite = Suite::new();
/// suite.declare(|t| {
///     t.group("math", |t| {
///         t.test("adds", |_| async { assert::equal(1 + 1, 2)?; Ok(()) })?;
///         Ok(())
///     })?;
///     Ok(())
/// })?;
/// let summary = suite.run().await?;
/// ```
#[derive(Clone)]
pub struct Suite {
    inner: Arc<SuiteInner>,
}

impl Suite {
    /// Creates a suite using the built-in defaults.
    pub fn new() -> Self {
        Self::with_config(RunnerConfig::default())
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        let tree = Tree::new(Defaults::from(&config.timing));
        Self {
            inner: Arc::new(SuiteInner {
                tree: RwLock::new(tree),
                reporter: Mutex::new(None),
                has_reporter: AtomicBool::new(false),
                running: AtomicBool::new(false),
                config,
            }),
        }
    }

    /// Creates a suite from `trellis.toml`, the user config or the defaults.
    pub fn from_config_files() -> Result<Self, ConfigError> {
        Ok(Self::with_config(RunnerConfig::load()?))
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.inner.config
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Declares tests, starting at the root.
    pub fn declare<F>(&self, declare: F) -> Result<(), ConfigError>
    where
        F: FnOnce(&mut Declare<'_>) -> Result<(), ConfigError>,
    {
        self.inner.ensure_idle()?;
        let mut cx = Declare::new(&self.inner);
        declare(&mut cx)
    }

    /// Registers the reporter, built by `factory` from `options`.
    pub fn reporter<F, O, R>(&self, factory: F, options: Option<O>) -> Result<(), ConfigError>
    where
        F: FnOnce(Option<O>) -> R,
        R: Reporter + 'static,
    {
        self.inner.ensure_idle()?;
        self.inner.install_reporter(|| Box::new(factory(options)))
    }

    /// Registers an already built reporter.
    pub fn use_reporter(&self, reporter: impl Reporter + 'static) -> Result<(), ConfigError> {
        self.reporter(|_: Option<()>| reporter, None)
    }

    pub fn has_reporter(&self) -> bool {
        self.inner.has_reporter.load(Ordering::Acquire)
    }

    /// Removes the registered reporter so another can be installed.
    pub fn clear_reporter(&self) -> Result<(), ConfigError> {
        self.inner.ensure_idle()?;
        *self.inner.reporter.lock() = None;
        self.inner.has_reporter.store(false, Ordering::Release);
        Ok(())
    }

    /// Reads the tree.
    pub fn inspect<R>(&self, f: impl FnOnce(&Tree) -> R) -> R {
        f(&self.inner.tree.read())
    }

    pub fn path(&self, node: NodeId) -> Path {
        self.inner.tree.read().path(node)
    }

    /// Effective timeout of `node`.
    pub fn timeout(&self, node: NodeId) -> Limit {
        self.inner.tree.read().effective_timeout(node)
    }

    pub fn own_timeout(&self, node: NodeId) -> Option<Limit> {
        self.inner
            .tree
            .read()
            .resolve(node, Setting::Timeout, Resolve::Own)
    }

    /// Overrides the timeout of `node`. Visible to any part of a run that
    /// has not started yet.
    pub fn set_timeout(&self, node: NodeId, limit: impl Into<Limit>) -> Result<(), ConfigError> {
        self.inner
            .tree
            .write()
            .set(node, Setting::Timeout, limit.into())
    }

    /// Effective slow threshold of `node`.
    pub fn slow(&self, node: NodeId) -> Limit {
        self.inner.tree.read().effective_slow(node)
    }

    pub fn own_slow(&self, node: NodeId) -> Option<Limit> {
        self.inner
            .tree
            .read()
            .resolve(node, Setting::Slow, Resolve::Own)
    }

    pub fn set_slow(&self, node: NodeId, limit: impl Into<Limit>) -> Result<(), ConfigError> {
        self.inner.tree.write().set(node, Setting::Slow, limit.into())
    }

    /// Resolves each pattern through `loader` and declares the modules in the
    /// order they are returned. Returns how many modules were declared.
    pub async fn load(&self, loader: &dyn Loader, patterns: &[&str]) -> Result<usize, RunError> {
        self.inner.ensure_idle()?;

        let mut loaded = 0;
        for pattern in patterns {
            let modules = loader.resolve(pattern).await?;
            tracing::debug!(pattern, count = modules.len(), "resolved modules");

            for module in modules {
                self.declare(|cx| (module.declare)(cx))
                    .map_err(|source| match source {
                        ConfigError::Locked => RunError::Config(source),
                        source => RunError::Load(LoadError::Declare {
                            module: module.name.clone(),
                            source,
                        }),
                    })?;
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Runs every test and reports the events to the registered reporter,
    /// or to a [`TracingReporter`] when none is registered.
    ///
    /// Test failures are reported as events, never returned. Fails with
    /// [`RunError::Concurrency`] while another run of this suite is active.
    pub async fn run(&self) -> Result<RunSummary, RunError> {
        if self
            .inner
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("run rejected, suite is already running");
            return Err(RunError::Concurrency);
        }

        let mut guard = RunGuard::new(&self.inner);
        let mut fallback = TracingReporter::new(self.inner.config.reporter.clone());
        let reporter: &mut dyn Reporter = match guard.reporter.as_deref_mut() {
            Some(reporter) => reporter,
            None => &mut fallback,
        };

        let runner = Runner::new(self.inner.clone(), reporter);
        let span = tracing::info_span!("run", id = %runner.id());
        Ok(runner.run().instrument(span).await)
    }
}

impl Default for Suite {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Suite")
            .field("nodes", &self.inner.tree.read().len())
            .field("has_reporter", &self.has_reporter())
            .field("running", &self.is_running())
            .finish()
    }
}

/// Holds the reporter for the duration of a run and releases the suite when
/// dropped, including when the run future is cancelled.
struct RunGuard<'a> {
    suite: &'a SuiteInner,
    reporter: Option<Box<dyn Reporter>>,
}

impl<'a> RunGuard<'a> {
    fn new(suite: &'a SuiteInner) -> Self {
        let reporter = suite.reporter.lock().take();
        Self { suite, reporter }
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if let Some(reporter) = self.reporter.take() {
            *self.suite.reporter.lock() = Some(reporter);
        }
        self.suite.running.store(false, Ordering::Release);
    }
}
