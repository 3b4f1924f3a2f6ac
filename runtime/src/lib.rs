// Copyright 2026 Filings Contributors
// SPDX-License-Identifier: Apache-2.0

//! Filings runtime library: session-bootstrapped harvesting of exchange
//! disclosure feeds.
//!
//! A run drives one browser context through bootstrap, fetch, extraction,
//! normalization and persistence, leaving raw, canonical and summary
//! artifacts behind. This library crate exposes the core modules for the
//! `filings` binary and for integration testing.

pub mod acquisition;
pub mod artifacts;
pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod feeds;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod renderer;
