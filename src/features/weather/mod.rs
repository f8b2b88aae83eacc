//! # Feature: Weather
//!
//! Current conditions for the morning briefing. Falls back to a placeholder
//! reading so the briefing never fails on weather.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod client;

pub use client::{Weather, WeatherClient};
