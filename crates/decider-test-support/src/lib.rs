#![forbid(unsafe_code)]
#![deny(
    unused_must_use,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Shared test helpers used across integration suites.
//! Layout: fixtures.rs (canned contexts and metadata), mocks.rs (recording
//! collaborators), assert.rs (call-order assertions).

pub mod assert;
pub mod fixtures;
pub mod mocks;
