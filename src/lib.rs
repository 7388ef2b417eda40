//! Weighted grade aggregation for the SIGE-Móvil school dashboards.
//!
//! [`grades`] holds the pure aggregator; everything else feeds it entries or
//! presents its results.

pub mod alerts;
pub mod db;
pub mod error;
pub mod grades;
pub mod logging;
pub mod models;
pub mod report;
pub mod repository;
