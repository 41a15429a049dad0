//! The scheduler.
//!
//! Walks the tree depth first, one node at a time. Every body and hook gets a
//! fresh completion channel; the first signal on it settles the node and the
//! channel is then parked until the run ends so later signals can be
//! reported as `extra` events.

mod context;

pub use context::{Done, TestContext};

use futures::future::{BoxFuture, FutureExt};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::task::Poll;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use tokio::time::Instant;

use crate::failure::{Failure, TestResult};
use crate::report::{Event, ExtraCall, Path, Reporter, RunSummary, Timing};
use crate::suite::SuiteInner;
use crate::tree::{Body, Filter, HookChain, Limit, NodeId, NodeKind, SelectorPath, TestFn, Tree};

/// Whether a subtree executes or is only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Run,
    Skip,
}

/// A settled body or hook whose completion channel is still open.
struct Pending {
    path: Path,
    rx: UnboundedReceiver<TestResult>,
    count: usize,
}

/// Group data copied out of the tree, so no lock is held across awaits.
struct GroupPlan {
    kind: NodeKind,
    before_all: HookChain,
    after_all: HookChain,
    only: Vec<SelectorPath>,
    children: Vec<NodeId>,
}

struct LeafPlan {
    body: Body,
    before: Vec<TestFn>,
    after: Vec<TestFn>,
}

struct ChildInfo {
    name: String,
    index: usize,
    kind: NodeKind,
    is_group: bool,
}

/// State of one run.
pub(crate) struct Runner<'r> {
    suite: Arc<SuiteInner>,
    reporter: &'r mut dyn Reporter,
    summary: RunSummary,
    pending: Vec<Pending>,
}

impl<'r> Runner<'r> {
    pub(crate) fn new(suite: Arc<SuiteInner>, reporter: &'r mut dyn Reporter) -> Self {
        Self {
            suite,
            reporter,
            summary: RunSummary::new(),
            pending: Vec::new(),
        }
    }

    pub(crate) fn id(&self) -> uuid::Uuid {
        self.summary.id
    }

    /// Runs the whole tree and returns the totals.
    pub(crate) async fn run(mut self) -> RunSummary {
        let started = Instant::now();
        tracing::info!("run started");
        self.emit(Event::Start);

        self.group(Tree::ROOT, Path::default(), Vec::new(), Mode::Run)
            .await;

        // Give bodies that finished during the last node a chance to signal.
        tokio::task::yield_now().await;
        self.sweep();
        self.emit(Event::End);

        self.summary.duration = started.elapsed();
        tracing::info!(
            passed = self.summary.passed,
            failed = self.summary.failed,
            hook_failures = self.summary.hook_failures,
            skipped = self.summary.skipped,
            ms = self.summary.duration.as_millis() as u64,
            "run finished"
        );
        self.summary
    }

    fn emit(&mut self, event: Event) {
        tracing::debug!(event = %event.kind(), "emit");
        self.summary.record(&event);
        self.reporter.report(&event);
    }

    fn group<'a>(
        &'a mut self,
        id: NodeId,
        path: Path,
        mut filters: Vec<Filter>,
        mode: Mode,
    ) -> BoxFuture<'a, ()> {
        async move {
            let Some(plan) = self.group_plan(id) else {
                return;
            };
            let is_root = path.is_empty();
            let mode = if plan.kind == NodeKind::Skipped {
                Mode::Skip
            } else {
                mode
            };

            if mode == Mode::Skip {
                if !is_root {
                    let data = Timing::new(Duration::ZERO, self.slow(id));
                    self.emit(Event::Enter { path: path.clone(), data });
                }
                for child in plan.children {
                    self.child(child, &path, &filters, Mode::Skip).await;
                }
                if !is_root {
                    self.emit(Event::Leave { path });
                }
                return;
            }

            if !plan.only.is_empty() {
                filters.push(Filter {
                    depth: path.len(),
                    paths: plan.only,
                });
            }

            let cx = self.context(id, &path);
            let started = Instant::now();
            let before = self.hooks(&plan.before_all, &cx, id, &path).await;
            let data = Timing::new(started.elapsed(), self.slow(id));
            if !is_root {
                tracing::debug!(%path, "enter");
                self.emit(Event::Enter {
                    path: path.clone(),
                    data,
                });
            }

            let children_mode = match before {
                Ok(()) => Mode::Run,
                Err(failure) => {
                    self.group_failure(&path, failure, data);
                    Mode::Skip
                }
            };
            for child in plan.children {
                self.child(child, &path, &filters, children_mode).await;
            }

            let started = Instant::now();
            if let Err(failure) = self.hooks(&plan.after_all, &cx, id, &path).await {
                let data = Timing::new(started.elapsed(), self.slow(id));
                self.group_failure(&path, failure, data);
            }

            if !is_root {
                tracing::debug!(%path, "leave");
                self.emit(Event::Leave { path });
            }
            self.sweep();
        }
        .boxed()
    }

    async fn child(&mut self, id: NodeId, parent: &Path, filters: &[Filter], mode: Mode) {
        let Some(info) = self.child_info(id) else {
            return;
        };
        let path = parent.child(info.name, info.index);
        let admitted = {
            let names: Vec<&str> = path.names().collect();
            filters.iter().all(|f| f.admits(&names, !info.is_group))
        };
        let mode = if admitted { mode } else { Mode::Skip };

        if info.is_group {
            self.group(id, path, filters.to_vec(), mode).await;
        } else if mode == Mode::Skip || info.kind == NodeKind::Skipped {
            tracing::debug!(%path, "skip");
            self.emit(Event::Skip { path });
        } else {
            self.leaf(id, path).await;
        }
    }

    async fn leaf(&mut self, id: NodeId, path: Path) {
        let Some(plan) = self.leaf_plan(id) else {
            return;
        };
        let cx = self.context(id, &path);
        let started = Instant::now();

        let mut result = Ok(());
        for hook in plan.before {
            result = self.settle(Body::Future(hook), cx.clone(), id, &path).await;
            if result.is_err() {
                break;
            }
        }
        if result.is_ok() {
            result = self.settle(plan.body, cx.clone(), id, &path).await;
        }
        for hook in plan.after {
            let after = self.settle(Body::Future(hook), cx.clone(), id, &path).await;
            if result.is_ok() {
                result = after;
            }
        }

        let data = Timing::new(started.elapsed(), self.slow(id));
        match result {
            Ok(()) => self.emit(Event::Pass { path, data }),
            Err(value) => self.emit(Event::Fail { path, value, data }),
        }
        self.sweep();
    }

    /// Runs a hook chain in order, stopping at the first failure.
    async fn hooks(
        &mut self,
        chain: &HookChain,
        cx: &TestContext,
        id: NodeId,
        path: &Path,
    ) -> TestResult {
        for hook in chain.iter() {
            self.settle(Body::Future(hook.clone()), cx.clone(), id, path)
                .await?;
        }
        Ok(())
    }

    /// Starts a body and waits for its first signal or its deadline.
    async fn settle(
        &mut self,
        body: Body,
        cx: TestContext,
        id: NodeId,
        path: &Path,
    ) -> TestResult {
        let (tx, mut rx) = mpsc::unbounded_channel();
        start(body, cx, Done::new(tx)).await;

        // Resolved only now so the body's synchronous part can change it.
        let limit = self.timeout(id);
        let received = match limit.as_duration() {
            Some(deadline) => tokio::time::timeout(deadline, rx.recv())
                .await
                .map_err(|_| deadline),
            None => Ok(rx.recv().await),
        };

        let (result, count) = match received {
            Ok(Some(result)) => (result, 1),
            Ok(None) => return Err(Failure::Dropped),
            Err(deadline) => {
                tracing::warn!(%path, ms = deadline.as_millis() as u64, "timed out");
                (Err(Failure::Timeout(deadline)), 0)
            }
        };
        self.pending.push(Pending {
            path: path.clone(),
            rx,
            count,
        });
        result
    }

    /// Reports every signal received since the last sweep as `extra`.
    fn sweep(&mut self) {
        let mut extras = Vec::new();
        self.pending.retain_mut(|pending| loop {
            match pending.rx.try_recv() {
                Ok(result) => {
                    pending.count += 1;
                    extras.push(Event::Extra {
                        path: pending.path.clone(),
                        value: ExtraCall {
                            count: pending.count,
                            value: result.err(),
                        },
                    });
                }
                Err(TryRecvError::Empty) => break true,
                Err(TryRecvError::Disconnected) => break false,
            }
        });

        for event in extras {
            tracing::warn!(path = ?event.path(), "extra completion signal");
            self.emit(event);
        }
    }

    fn group_failure(&mut self, path: &Path, value: Failure, data: Timing) {
        if path.is_empty() {
            self.emit(Event::Error {
                path: path.clone(),
                value,
            });
        } else {
            self.emit(Event::Fail {
                path: path.clone(),
                value,
                data,
            });
        }
    }

    fn context(&self, id: NodeId, path: &Path) -> TestContext {
        TestContext::new(self.suite.clone(), id, path.clone())
    }

    fn timeout(&self, id: NodeId) -> Limit {
        self.suite.tree.read().effective_timeout(id)
    }

    fn slow(&self, id: NodeId) -> Limit {
        self.suite.tree.read().effective_slow(id)
    }

    fn group_plan(&self, id: NodeId) -> Option<GroupPlan> {
        let tree = self.suite.tree.read();
        let node = tree.get(id)?;
        Some(GroupPlan {
            kind: node.kind,
            before_all: node.hooks.before_all.clone(),
            after_all: node.hooks.after_all.clone(),
            only: node.only.clone(),
            children: node.children.clone(),
        })
    }

    fn child_info(&self, id: NodeId) -> Option<ChildInfo> {
        let tree = self.suite.tree.read();
        let node = tree.get(id)?;
        Some(ChildInfo {
            name: node.name.clone(),
            index: node.index,
            kind: node.kind,
            is_group: node.is_group(),
        })
    }

    /// Collects the body plus the inherited `before`/`after` hooks:
    /// `before` outermost group first, `after` innermost group first.
    fn leaf_plan(&self, id: NodeId) -> Option<LeafPlan> {
        let tree = self.suite.tree.read();
        let body = tree.get(id)?.body.clone()?;
        let ancestry: Vec<_> = tree
            .ancestry(id)
            .into_iter()
            .filter_map(|a| tree.get(a))
            .collect();

        let before = ancestry
            .iter()
            .rev()
            .flat_map(|node| node.hooks.before_each.iter().cloned())
            .collect();
        let after = ancestry
            .iter()
            .flat_map(|node| node.hooks.after_each.iter().cloned())
            .collect();

        Some(LeafPlan {
            body,
            before,
            after,
        })
    }
}

/// Calls a body and hands its outcome to `done`.
///
/// Async bodies are polled once in place so their synchronous prefix runs
/// before the deadline is resolved. If they are still pending after that
/// they continue on their own task, which keeps running past a timeout.
async fn start(body: Body, cx: TestContext, done: Done) {
    match body {
        Body::Future(f) => {
            let fut = match panic::catch_unwind(AssertUnwindSafe(|| f(cx))) {
                Ok(fut) => fut,
                Err(payload) => {
                    done.fail(Failure::from_panic(payload));
                    return;
                }
            };
            let mut fut = AssertUnwindSafe(fut).catch_unwind().map(flatten_panic).boxed();
            match futures::poll!(&mut fut) {
                Poll::Ready(result) => done.finish(result),
                Poll::Pending => {
                    tokio::spawn(async move { done.finish(fut.await) });
                }
            }
        }
        Body::Callback(f) => {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(cx, done.clone()))) {
                done.fail(Failure::from_panic(payload));
            }
        }
    }
}

fn flatten_panic(outcome: Result<TestResult, Box<dyn Any + Send>>) -> TestResult {
    outcome.unwrap_or_else(|payload| Err(Failure::from_panic(payload)))
}
