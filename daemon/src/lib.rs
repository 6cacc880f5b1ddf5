//! MemAlert daemon: watches selected desktop applications and alerts when
//! their resident memory crosses configured thresholds.

pub mod autostart;
pub mod collector;
pub mod config;
pub mod db;
pub mod detector;
pub mod engine;
pub mod error;
pub mod handler;
pub mod notifier;
pub mod protocol;
pub mod service;
pub mod shutdown;
pub mod socket;
pub mod target;
pub mod threshold;
