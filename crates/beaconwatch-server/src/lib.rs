//! # beaconwatch-server
//!
//! HTTP server library for the beaconwatch beacon discovery system.
//!
//! This library provides the API handlers and state management around
//! the [`beaconwatch_core`] scan engine.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

pub mod api;
pub mod logging;
pub mod state;
