//! Skillbox core library: skill definitions, validation, repositories, argument binding for
//! function scripts, and the agent-facing skill tool, shared by the CLI and embedding hosts.

pub mod binder;
pub mod config;
pub mod init;
pub mod repository;
pub mod skills;
pub mod tools;
