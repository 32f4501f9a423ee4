//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into procedure-level APIs.
//! - Keep transport layers (HTTP, CLI) decoupled from storage details.

pub mod task_service;
