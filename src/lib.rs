// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod apply;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod constants;
pub mod deploy_key;
pub mod error;
pub mod exec;
pub mod guards;
pub mod install;
pub mod kubernetes;
pub mod readiness;
pub mod sync;
pub mod types;

#[cfg(test)]
pub mod test_utils;

pub use bootstrap::{BootstrapReport, Bootstrapper};
pub use error::{BootstrapError, Result};
