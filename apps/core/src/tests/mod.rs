//! Test Module
//!
//! Scenario suites for the RSV Assistant core.
//!
//! ## Test Categories
//! - `fixtures`: shared catalogs and the scripted `MockBackend`
//! - `response_bank_tests`: catalog indexing, validation and loading
//! - `classifier_tests`: safety override, gating and backend failure handling
//! - `preflight_tests`: backend status checks
//! - `assistant_tests`: guided and free-text conversation flows
//! - `integration_tests`: classifier and status check against a mock HTTP backend

pub mod classifier_tests;
