//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the document sync core:
//! - Logging and tracing infrastructure
//! - Event bus system
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the sync engine depends on. It
//! establishes the logging conventions and event broadcasting mechanisms
//! used throughout the system; the upload orchestrator publishes its
//! attempt lifecycle through [`events::EventBus`] and any UI process
//! subscribes for display.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
