//! Integration tests for Listing-Sweep
//!
//! These tests use wiremock to stand in for a listing site and exercise the
//! fetch client and the full sweep end-to-end.

mod common;
mod crawl_tests;
mod fetch_tests;
