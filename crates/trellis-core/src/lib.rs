pub mod assert;
pub mod compare;
pub mod config;
pub mod error;
pub mod failure;
pub mod loader;
pub mod report;
pub mod runner;
pub mod suite;
pub mod tree;
pub mod value;

pub use config::RunnerConfig;
pub use error::{ConfigError, RunError};
pub use failure::{Failure, TestResult};
pub use loader::{LoadError, Loader, Module, ModuleRegistry};
pub use report::{Collector, Event, EventKind, Reporter, RunSummary};
pub use runner::{Done, TestContext};
pub use suite::Suite;
pub use tree::{Declare, Limit, NodeId};
pub use value::Value;
