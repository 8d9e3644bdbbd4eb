// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Conduit integration tests.
//!
//! Provides mock handlers and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without external services.
//!
//! # Components
//!
//! - [`MockHealthHandler`], [`MockResourceHandler`], [`MockQueryHandler`],
//!   [`MockStreamHandler`] - handlers with configurable outcomes
//! - [`RecordingResourceSender`], [`RecordingPacketSender`] - capture sent data
//! - [`FailingStore`] - settings store that always errors
//! - [`TestHarness`] - registry, store, live node and bridge services wired together

pub mod fixtures;
pub mod harness;
pub mod mock_handlers;
pub mod recording;

pub use fixtures::{FailingStore, test_data_source, test_query, test_user};
pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_handlers::{MockHealthHandler, MockQueryHandler, MockResourceHandler, MockStreamHandler};
pub use recording::{RecordingPacketSender, RecordingResourceSender};
