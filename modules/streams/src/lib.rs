#![deny(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone))]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![deny(clippy::redundant_field_names)]
#![deny(clippy::needless_borrow)]
#![deny(clippy::manual_let_else)]
#![deny(clippy::unused_self)]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::print_stdout)]
#![deny(clippy::dbg_macro)]
#![deny(clippy::must_use_candidate)]
#![cfg_attr(not(any(test, feature = "std")), no_std)]

//! Single-subscriber stream messages.
//!
//! A stream message moves an ordered sequence of elements from one producer to exactly one
//! subscriber with explicit demand, a completion handle and leak-free handling of pooled buffers.
//! On top of the subscription protocol the crate provides fixed producers, a writable producer,
//! an adapter for foreign publishers, fused `filter`/`map` operators, concatenation and a
//! duplicator that fans one stream out into independently paced copies.
//!
//! The `core` module is `no_std` + `alloc`. The `std` module (behind the `std` feature) adds a
//! Tokio-backed serial executor.

extern crate alloc;

/// Runtime-agnostic stream message implementation.
pub mod core;
/// Standard library bindings.
#[cfg(feature = "std")]
pub mod std;
