//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate vault mutations, session lifecycle and repository
//!   persistence into use-case level APIs.
//! - Keep UI layers decoupled from storage details.

pub mod vault_service;
