//! Data models for case documents and configuration.

pub mod case;
pub mod config;
