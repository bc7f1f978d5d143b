/// Router Module Index
///
/// Page routes and API routes are kept apart: page requests go through the
/// navigation guard, API requests answer for themselves.

/// Health check and the guarded page fallback.
pub mod public;

/// Session bootstrap and logout endpoints.
pub mod session;
