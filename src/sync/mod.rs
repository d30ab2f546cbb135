// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sync manifests pointing the installed controllers at the Git repository.

pub mod aggregate;
pub mod manifests;

pub use aggregate::write_kustomization_file;
pub use manifests::{
    build_git_repository, build_kustomization, generate_sync_manifests, SyncManifests,
};
