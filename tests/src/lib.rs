//! # Fluxone Test Suite
//!
//! Unified test crate for flows that cross crate boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── flows.rs          # Action → bus → store → listener dispatch
//! │   ├── hydration.rs      # Server state carried into a client application
//! │   └── subscriptions.rs  # Grouped store listeners
//! │
//! └── benches/
//!     └── container_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p fluxone-tests
//! cargo test -p fluxone-tests integration::hydration
//!
//! # Benchmarks
//! cargo bench -p fluxone-tests
//! ```

pub mod integration;
