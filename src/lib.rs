//! HAInstaller - TeamSpen's HammerAddons installer
//!
//! Library crate for the config-patching engine and release handling,
//! shared between the CLI binary and tests.

pub mod archive;
pub mod cmdseq;
pub mod games;
pub mod github;
pub mod install;
pub mod lineconf;
pub mod logging;
pub mod version;
