// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::path::PathBuf;
use thiserror::Error;

use crate::apply::CommandError;
use crate::install::RenderError;
use crate::readiness::PollError;

/// How a failed cluster read should be interpreted by an existence check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadErrorKind {
    /// The object does not exist
    NotFound,
    /// The credentials in use may not read the object
    PermissionDenied,
    /// Anything else: connectivity, server errors, throttling
    Transient,
}

impl ReadErrorKind {
    pub fn classify(error: &kube::Error) -> Self {
        match error {
            kube::Error::Api(response) if response.code == 404 => ReadErrorKind::NotFound,
            kube::Error::Api(response) if response.code == 401 || response.code == 403 => {
                ReadErrorKind::PermissionDenied
            }
            _ => ReadErrorKind::Transient,
        }
    }
}

impl std::fmt::Display for ReadErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadErrorKind::NotFound => f.write_str("not found"),
            ReadErrorKind::PermissionDenied => f.write_str("permission denied"),
            ReadErrorKind::Transient => f.write_str("transient failure"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("arch {arch} is not supported, can be {supported:?}")]
    UnsupportedArch {
        arch: String,
        supported: &'static [&'static str],
    },

    #[error("log level {level} is not supported, can be {supported:?}")]
    UnsupportedLogLevel {
        level: String,
        supported: &'static [&'static str],
    },

    #[error("component {0} is required")]
    MissingComponent(String),

    #[error("creating manifests dir failed: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("generating install manifests failed: {0}")]
    Render(#[source] RenderError),

    #[error("writing manifest {} failed: {source}", .path.display())]
    WriteManifest {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serializing {kind} failed: {source}")]
    Serialize {
        kind: &'static str,
        #[source]
        source: serde_yaml::Error,
    },

    /// Stable message for apply and rollout failures; the command diagnostic stays reachable via `source()`
    #[error("install failed")]
    InstallFailed(#[source] CommandError),

    #[error(transparent)]
    Apply(#[from] CommandError),

    #[error("{kind} {namespace}/{name} did not become ready: {source}")]
    Readiness {
        kind: &'static str,
        namespace: String,
        name: String,
        #[source]
        source: PollError,
    },

    #[error("reading {kind} {namespace}/{name} failed ({class}): {source}")]
    ClusterRead {
        kind: &'static str,
        namespace: String,
        name: String,
        class: ReadErrorKind,
        #[source]
        source: kube::Error,
    },

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Failed to load kubeconfig: {0}")]
    Kubeconfig(String),

    #[error("deploy key generation failed: {0}")]
    DeployKey(String),

    #[error("invalid repository URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("bootstrap cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
