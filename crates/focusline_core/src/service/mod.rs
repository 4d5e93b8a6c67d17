//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate engines and repository calls into use-case level APIs.
//! - Keep CLI and projection layers decoupled from storage details.

pub mod item_service;
pub mod zone_service;
