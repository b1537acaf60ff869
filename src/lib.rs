//! Soil beacon firmware library.
//!
//! Exposes the pure-logic modules for integration testing and for the
//! firmware binary. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod fsm;
pub mod identity;
pub mod payload;
pub mod pins;
pub mod power;

// Hardware-facing layers; host builds get the simulation paths.
pub mod adapters;
pub mod drivers;
pub mod sensors;
