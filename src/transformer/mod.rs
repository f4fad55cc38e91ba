//! Record transformation module
//!
//! This module provides the pieces that turn management API records into
//! Zabbix input:
//! - Filter predicates selecting which records are reported
//! - Metric line generation in zabbix_sender format
//! - Low-level discovery documents

pub mod discovery;
pub mod filter;
pub mod formatter;

pub use discovery::{DiscoveryElement, DiscoveryList};
pub use filter::{matches, Fields, FilterSet, Predicate};
pub use formatter::{exchange_lines, queue_lines, render, shovel_lines, MetricLine};
