// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed toolkit custom resources and their wire formats.

pub mod condition;
pub mod duration;
pub mod git_repository;
pub mod kustomization;

pub use condition::{Condition, Readiness};
pub use duration::{format_duration, parse_duration};
pub use git_repository::{GitRepository, GitRepositoryRef, GitRepositorySpec, LocalObjectReference};
pub use kustomization::{CrossNamespaceSourceReference, Kustomization, KustomizationSpec};
