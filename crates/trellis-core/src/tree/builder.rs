use std::future::Future;
use std::sync::Arc;

use parking_lot::RwLockWriteGuard;

use super::{test_fn, Body, HookKind, Limit, NodeId, NodeKind, Resolve, Selector, Setting, Tree};
use crate::error::ConfigError;
use crate::failure::TestResult;
use crate::report::Reporter;
use crate::runner::{Done, TestContext};
use crate::suite::SuiteInner;

/// Declaration context for one pass over the tree.
///
/// Holds a cursor to the group currently being declared. Nested
/// [`group`](Declare::group) calls move the cursor into the new group for the
/// duration of their closure and restore it afterwards.
///
/// The tree lock is taken per call, never across a user closure, so the
/// [`Suite`](crate::Suite) accessors stay usable while declaring.
pub struct Declare<'a> {
    suite: &'a SuiteInner,
    cursor: NodeId,
}

impl<'a> Declare<'a> {
    pub(crate) fn new(suite: &'a SuiteInner) -> Self {
        Self {
            suite,
            cursor: Tree::ROOT,
        }
    }

    fn tree(&self) -> Result<RwLockWriteGuard<'a, Tree>, ConfigError> {
        self.suite.ensure_idle()?;
        Ok(self.suite.tree.write())
    }

    /// The group new tests are added to.
    pub fn cursor(&self) -> NodeId {
        self.cursor
    }

    pub fn is_root(&self) -> bool {
        self.cursor == Tree::ROOT
    }

    /// Adds an async test.
    pub fn test<F, Fut>(&mut self, name: impl Into<String>, body: F) -> Result<NodeId, ConfigError>
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.tree()?.add_node(
            self.cursor,
            name,
            Some(Body::Future(test_fn(body))),
            NodeKind::Normal,
        )
    }

    /// Adds a callback-style test that settles on the first [`Done`] call.
    pub fn test_callback<F>(
        &mut self,
        name: impl Into<String>,
        body: F,
    ) -> Result<NodeId, ConfigError>
    where
        F: Fn(TestContext, Done) + Send + Sync + 'static,
    {
        self.tree()?.add_node(
            self.cursor,
            name,
            Some(Body::Callback(Arc::new(body))),
            NodeKind::Normal,
        )
    }

    /// Adds a test that is reported as skipped and never executed.
    pub fn test_skip<F, Fut>(
        &mut self,
        name: impl Into<String>,
        body: F,
    ) -> Result<NodeId, ConfigError>
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.tree()?.add_node(
            self.cursor,
            name,
            Some(Body::Future(test_fn(body))),
            NodeKind::Skipped,
        )
    }

    /// Adds a group and declares its contents.
    pub fn group<F>(&mut self, name: impl Into<String>, declare: F) -> Result<NodeId, ConfigError>
    where
        F: FnOnce(&mut Declare<'_>) -> Result<(), ConfigError>,
    {
        self.add_group(name, NodeKind::Normal, declare)
    }

    /// Adds a group whose tests are all reported as skipped.
    pub fn group_skip<F>(
        &mut self,
        name: impl Into<String>,
        declare: F,
    ) -> Result<NodeId, ConfigError>
    where
        F: FnOnce(&mut Declare<'_>) -> Result<(), ConfigError>,
    {
        self.add_group(name, NodeKind::Skipped, declare)
    }

    fn add_group<F>(
        &mut self,
        name: impl Into<String>,
        kind: NodeKind,
        declare: F,
    ) -> Result<NodeId, ConfigError>
    where
        F: FnOnce(&mut Declare<'_>) -> Result<(), ConfigError>,
    {
        let id = self.tree()?.add_node(self.cursor, name, None, kind)?;
        let parent = std::mem::replace(&mut self.cursor, id);
        let result = declare(self);
        self.cursor = parent;
        result.map(|()| id)
    }

    fn hook<F, Fut>(&mut self, kind: HookKind, hook: F) -> Result<(), ConfigError>
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.tree()?.add_hook(self.cursor, kind, test_fn(hook))
    }

    /// Runs before each test in this group, outer groups first.
    pub fn before<F, Fut>(&mut self, hook: F) -> Result<(), ConfigError>
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.hook(HookKind::BeforeEach, hook)
    }

    /// Runs after each test in this group, inner groups first.
    pub fn after<F, Fut>(&mut self, hook: F) -> Result<(), ConfigError>
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.hook(HookKind::AfterEach, hook)
    }

    /// Runs once before any test in this group.
    pub fn before_all<F, Fut>(&mut self, hook: F) -> Result<(), ConfigError>
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.hook(HookKind::BeforeAll, hook)
    }

    /// Runs once after every test in this group.
    pub fn after_all<F, Fut>(&mut self, hook: F) -> Result<(), ConfigError>
    where
        F: Fn(TestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = TestResult> + Send + 'static,
    {
        self.hook(HookKind::AfterAll, hook)
    }

    /// Effective timeout of the current group.
    pub fn timeout(&self) -> Limit {
        self.suite.tree.read().effective_timeout(self.cursor)
    }

    pub fn own_timeout(&self) -> Option<Limit> {
        self.suite
            .tree
            .read()
            .resolve(self.cursor, Setting::Timeout, Resolve::Own)
    }

    /// Overrides the timeout of the current group. `0` restores inheritance.
    pub fn set_timeout(&mut self, limit: impl Into<Limit>) -> Result<(), ConfigError> {
        self.tree()?.set(self.cursor, Setting::Timeout, limit.into())
    }

    /// Effective slow threshold of the current group.
    pub fn slow(&self) -> Limit {
        self.suite.tree.read().effective_slow(self.cursor)
    }

    pub fn own_slow(&self) -> Option<Limit> {
        self.suite
            .tree
            .read()
            .resolve(self.cursor, Setting::Slow, Resolve::Own)
    }

    /// Overrides the slow threshold of the current group. `0` restores
    /// inheritance.
    pub fn set_slow(&mut self, limit: impl Into<Limit>) -> Result<(), ConfigError> {
        self.tree()?.set(self.cursor, Setting::Slow, limit.into())
    }

    /// Restricts the current group's run to tests matching `path`.
    ///
    /// May be called repeatedly; a test runs when any registered path
    /// matches it.
    pub fn only<I, S>(&mut self, path: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Selector>,
    {
        let selectors = path.into_iter().map(Into::into).collect();
        self.tree()?.set_only(self.cursor, selectors)
    }

    /// Registers the suite's reporter. Only allowed at the root.
    pub fn reporter<F, O, R>(&mut self, factory: F, options: Option<O>) -> Result<(), ConfigError>
    where
        F: FnOnce(Option<O>) -> R,
        R: Reporter + 'static,
    {
        if !self.is_root() {
            return Err(ConfigError::ReporterNotRoot);
        }
        self.suite.install_reporter(|| Box::new(factory(options)))
    }
}
