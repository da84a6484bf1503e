//! # tracker-rs
//!
//! Postgres-backed search and daily work queue for a backlog tracker.
//!
//! Provides access-filtered search over backlogs, stories, tasks and users
//! ([`search::SearchService`]), a per-user work queue fronted by
//! [`action::DailyWorkAction`], and OpenTelemetry observability.

pub mod action;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod repository;
pub mod search;
pub mod telemetry;
