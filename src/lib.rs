//! Policy enforcement hook library shared by `block-guard` and
//! `subagent-tracker`: the pattern compiler, policy parser and mergers,
//! decision engine, agent-scoping layer, shell dissector, tool-invocation
//! model, and sub-agent registry I/O.

pub mod agent;
pub mod decide;
pub mod logging;
pub mod merge;
pub mod pattern;
pub mod policy;
pub mod registry;
pub mod resolve;
pub mod shell;
pub mod tool;
