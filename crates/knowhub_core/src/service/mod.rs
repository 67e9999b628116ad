//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the API/transport layer decoupled from storage details.

pub mod document_service;
pub mod person_service;
pub mod validation_service;
