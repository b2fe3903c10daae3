//! Shared HTTP constants (headers, problem URIs).

pub(crate) const HEADER_REQUEST_ID: &str = "x-request-id";

pub(crate) const PROBLEM_INTERNAL: &str = "https://compute-decider.dev/problems/internal";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://compute-decider.dev/problems/bad-request";
