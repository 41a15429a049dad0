use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

use crate::failure::TestResult;
use crate::runner::{Done, TestContext};

/// An async test body or hook.
pub type TestFn = Arc<dyn Fn(TestContext) -> BoxFuture<'static, TestResult> + Send + Sync>;

/// A callback-style test body that settles through its [`Done`] handle.
pub type DoneFn = Arc<dyn Fn(TestContext, Done) + Send + Sync>;

/// Boxes an async closure into a [`TestFn`].
pub fn test_fn<F, Fut>(f: F) -> TestFn
where
    F: Fn(TestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = TestResult> + Send + 'static,
{
    Arc::new(move |cx| f(cx).boxed())
}

/// What a leaf executes.
#[derive(Clone)]
pub enum Body {
    /// Settles when the returned future resolves.
    Future(TestFn),
    /// Settles on the first call to its `Done` handle; later calls are extra.
    Callback(DoneFn),
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::Future(_) => write!(f, "Body::Future"),
            Body::Callback(_) => write!(f, "Body::Callback"),
        }
    }
}

/// An append-only sequence of hooks.
///
/// Appending returns a new chain and leaves the original untouched, so a
/// chain can be shared between nodes without one registration leaking into
/// another.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Arc<Vec<TestFn>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new chain with `hook` run after the existing ones.
    pub fn append(&self, hook: TestFn) -> Self {
        let mut hooks = Vec::with_capacity(self.hooks.len() + 1);
        hooks.extend(self.hooks.iter().cloned());
        hooks.push(hook);
        Self {
            hooks: Arc::new(hooks),
        }
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &TestFn> {
        self.hooks.iter()
    }
}

impl std::fmt::Debug for HookChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HookChain({})", self.hooks.len())
    }
}

/// The four hook chains of a node.
#[derive(Debug, Clone, Default)]
pub struct Hooks {
    pub before_all: HookChain,
    pub before_each: HookChain,
    pub after_each: HookChain,
    pub after_all: HookChain,
}

/// Which chain a hook is registered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    BeforeAll,
    BeforeEach,
    AfterEach,
    AfterAll,
}

impl Hooks {
    pub fn chain(&self, kind: HookKind) -> &HookChain {
        match kind {
            HookKind::BeforeAll => &self.before_all,
            HookKind::BeforeEach => &self.before_each,
            HookKind::AfterEach => &self.after_each,
            HookKind::AfterAll => &self.after_all,
        }
    }

    pub(crate) fn add(&mut self, kind: HookKind, hook: TestFn) {
        let chain = match kind {
            HookKind::BeforeAll => &mut self.before_all,
            HookKind::BeforeEach => &mut self.before_each,
            HookKind::AfterEach => &mut self.after_each,
            HookKind::AfterAll => &mut self.after_all,
        };
        *chain = chain.append(hook);
    }
}
