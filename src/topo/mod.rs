//! 拓扑描述与构建

pub mod canned;
pub mod spec;

pub use spec::{BuildOpts, ChangeKind, ChangeSpec, ChangeTarget, LinkSpec, NetworkSpec};
