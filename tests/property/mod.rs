// Copyright (c) 2025 - Cowboy AI, Inc.

//! Property-Based Tests Module
//!
//! Loads run against the in-memory store; async code is driven with
//! `tokio_test::block_on` inside each proptest case.

mod load_properties;
mod merge_properties;
