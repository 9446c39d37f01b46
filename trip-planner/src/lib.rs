//! Multimodal trip planner.
//!
//! Answers "how do I get from this city to that one on this date?" over a
//! versioned graph of flights, trains, buses, ferries, winter roads and
//! taxis, returning a scheduled, priced, drawn and reality-checked route.

pub mod cache;
pub mod config;
pub mod connectivity;
pub mod dataset;
pub mod domain;
pub mod geometry;
pub mod graph;
pub mod planner;
pub mod pricing;
pub mod repository;
pub mod validate;
