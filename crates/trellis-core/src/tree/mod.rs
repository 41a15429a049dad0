//! The test tree.
//!
//! Nodes live in an arena owned by [`Tree`] and refer to each other by
//! [`NodeId`]. Parent links exist only for inheritance lookups; children are
//! stored in declaration order, which is also execution order.

mod builder;
mod hooks;
mod only;

pub use builder::Declare;
pub use hooks::{test_fn, Body, DoneFn, HookChain, HookKind, Hooks, TestFn};
pub use only::{Selector, SelectorPath};

pub(crate) use only::Filter;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::TimingConfig;
use crate::error::ConfigError;
use crate::report::{Path, Segment};

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Normal,
    Skipped,
}

/// A timeout or slow threshold.
///
/// `Millis(0)` passed to a setter clears the override so the value is
/// inherited again. `Unlimited` disables the limit for the whole subtree
/// unless a descendant overrides it.
///
/// Serializes as a plain millisecond number, or `null` when unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<u64>", into = "Option<u64>")]
pub enum Limit {
    Millis(u64),
    Unlimited,
}

impl Limit {
    /// Returns the limit as a duration, or `None` when unlimited.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Limit::Millis(ms) => Some(Duration::from_millis(*ms)),
            Limit::Unlimited => None,
        }
    }

    /// Returns the limit in milliseconds, or `None` when unlimited.
    pub fn as_millis(&self) -> Option<u64> {
        match self {
            Limit::Millis(ms) => Some(*ms),
            Limit::Unlimited => None,
        }
    }

    /// Converts a configured millisecond value, where 0 means disabled.
    pub fn from_config(ms: u64) -> Self {
        if ms == 0 {
            Limit::Unlimited
        } else {
            Limit::Millis(ms)
        }
    }

    fn as_override(self) -> Option<Limit> {
        match self {
            Limit::Millis(0) => None,
            other => Some(other),
        }
    }
}

impl From<u64> for Limit {
    fn from(ms: u64) -> Self {
        Limit::Millis(ms)
    }
}

impl From<Option<u64>> for Limit {
    fn from(ms: Option<u64>) -> Self {
        ms.map_or(Limit::Unlimited, Limit::Millis)
    }
}

impl From<Limit> for Option<u64> {
    fn from(limit: Limit) -> Self {
        limit.as_millis()
    }
}

impl From<Duration> for Limit {
    fn from(duration: Duration) -> Self {
        Limit::Millis(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Millis(ms) => write!(f, "{}ms", ms),
            Limit::Unlimited => write!(f, "unlimited"),
        }
    }
}

/// The inheritable settings of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Timeout,
    Slow,
}

/// Whether a lookup reads only the node's own override or walks ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolve {
    Own,
    Effective,
}

/// A test or group.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) kind: NodeKind,
    pub(crate) index: usize,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) body: Option<Body>,
    pub(crate) hooks: Hooks,
    pub(crate) timeout: Option<Limit>,
    pub(crate) slow: Option<Limit>,
    pub(crate) only: Vec<SelectorPath>,
}

impl Node {
    fn new(
        name: String,
        kind: NodeKind,
        index: usize,
        parent: Option<NodeId>,
        body: Option<Body>,
    ) -> Self {
        Self {
            name,
            kind,
            index,
            parent,
            children: Vec::new(),
            body,
            hooks: Hooks::default(),
            timeout: None,
            slow: None,
            only: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Position among siblings.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    /// Nodes without a body are groups.
    pub fn is_group(&self) -> bool {
        self.body.is_none()
    }

    fn setting(&self, setting: Setting) -> Option<Limit> {
        match setting {
            Setting::Timeout => self.timeout,
            Setting::Slow => self.slow,
        }
    }
}

/// Fallback values used when no ancestor overrides a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defaults {
    pub timeout: Limit,
    pub slow: Limit,
}

impl From<&TimingConfig> for Defaults {
    fn from(config: &TimingConfig) -> Self {
        Self {
            timeout: Limit::from_config(config.timeout_ms),
            slow: Limit::from_config(config.slow_ms),
        }
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self::from(&TimingConfig::default())
    }
}

/// Arena holding every node of one suite. The root is always present.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    defaults: Defaults,
}

impl Tree {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new(defaults: Defaults) -> Self {
        Self {
            nodes: vec![Node::new(String::new(), NodeKind::Normal, 0, None, None)],
            defaults,
        }
    }

    pub fn defaults(&self) -> Defaults {
        self.defaults
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node, ConfigError> {
        self.nodes.get(id.0).ok_or(ConfigError::UnknownNode(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, ConfigError> {
        self.nodes.get_mut(id.0).ok_or(ConfigError::UnknownNode(id))
    }

    /// Appends a child to `parent`.
    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        body: Option<Body>,
        kind: NodeKind,
    ) -> Result<NodeId, ConfigError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ConfigError::EmptyName);
        }

        let id = NodeId(self.nodes.len());
        let index = self.node(parent)?.children.len();
        self.nodes.push(Node::new(name, kind, index, Some(parent), body));
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Registers a hook on `node`.
    pub fn add_hook(
        &mut self,
        node: NodeId,
        kind: HookKind,
        hook: TestFn,
    ) -> Result<(), ConfigError> {
        self.node_mut(node)?.hooks.add(kind, hook);
        Ok(())
    }

    /// Adds one `only` selector path to `node`.
    pub fn set_only(&mut self, node: NodeId, selectors: Vec<Selector>) -> Result<(), ConfigError> {
        if selectors.is_empty() {
            return Err(ConfigError::EmptySelector);
        }
        self.node_mut(node)?.only.push(SelectorPath::new(selectors));
        Ok(())
    }

    /// Sets or clears an override. `Millis(0)` clears it.
    pub fn set(&mut self, node: NodeId, setting: Setting, limit: Limit) -> Result<(), ConfigError> {
        let node = self.node_mut(node)?;
        let value = limit.as_override();
        match setting {
            Setting::Timeout => node.timeout = value,
            Setting::Slow => node.slow = value,
        }
        Ok(())
    }

    /// Reads a setting.
    ///
    /// With [`Resolve::Own`] only the node's override is returned. With
    /// [`Resolve::Effective`] the nearest ancestor override wins, falling
    /// back to the tree defaults, so the result is always `Some`.
    pub fn resolve(&self, node: NodeId, setting: Setting, mode: Resolve) -> Option<Limit> {
        match mode {
            Resolve::Own => self.get(node).and_then(|n| n.setting(setting)),
            Resolve::Effective => {
                let mut current = Some(node);
                while let Some(id) = current {
                    let Some(n) = self.get(id) else { break };
                    if let Some(limit) = n.setting(setting) {
                        return Some(limit);
                    }
                    current = n.parent;
                }
                Some(match setting {
                    Setting::Timeout => self.defaults.timeout,
                    Setting::Slow => self.defaults.slow,
                })
            }
        }
    }

    pub fn effective_timeout(&self, node: NodeId) -> Limit {
        self.resolve(node, Setting::Timeout, Resolve::Effective)
            .unwrap_or(self.defaults.timeout)
    }

    pub fn effective_slow(&self, node: NodeId) -> Limit {
        self.resolve(node, Setting::Slow, Resolve::Effective)
            .unwrap_or(self.defaults.slow)
    }

    /// Returns `node` and its ancestors, innermost first.
    pub fn ancestry(&self, node: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(id) = current {
            let Some(n) = self.get(id) else { break };
            chain.push(id);
            current = n.parent;
        }
        chain
    }

    /// Builds the event path of a node. The root has an empty path.
    pub fn path(&self, node: NodeId) -> Path {
        let mut segments: Vec<Segment> = self
            .ancestry(node)
            .into_iter()
            .filter(|id| *id != Self::ROOT)
            .filter_map(|id| self.get(id))
            .map(|n| Segment::new(n.name.clone(), n.index))
            .collect();
        segments.reverse();
        Path::from(segments)
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new(Defaults::default())
    }
}
