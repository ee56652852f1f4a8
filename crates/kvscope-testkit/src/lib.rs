//! # kvscope Testkit
//!
//! Testing utilities for kvscope.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: Pre-wired stores over in-memory persistence channels
//! - **Probes**: Ordered recorders for delivery assertions
//! - **Generators**: Proptest strategies for keys, JSON values, and options
//!
//! ## Fixtures
//!
//! ```rust
//! use kvscope_testkit::fixtures::TestBench;
//!
//! let bench = TestBench::new();
//! let counter = bench.mounted("count", 1);
//! assert_eq!(counter.value(), serde_json::json!(1));
//! ```
//!
//! ## Probes
//!
//! ```rust
//! use kvscope_testkit::fixtures::TestBench;
//! use kvscope_testkit::probe::Probe;
//!
//! let bench = TestBench::new();
//! let counter = bench.mounted("count", 0);
//! let probe = Probe::new();
//! counter.watch(probe.watcher());
//!
//! counter.set(5).unwrap();
//! assert_eq!(probe.seen(), vec![serde_json::json!(5)]);
//! ```
//!
//! ## Property Testing
//!
//! Use the generators with proptest:
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use kvscope_testkit::generators::{json_value, logical_key};
//!
//! proptest! {
//!     #[test]
//!     fn values_round_trip(key in logical_key(), value in json_value()) {
//!         // ...
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod probe;

pub use fixtures::{init_test_logging, mounted_followers, SqliteBench, TestBench};
pub use generators::{json_value, logical_key, store_options};
pub use probe::Probe;
