#![doc(test(attr(deny(warnings))))]

//! License Portal models a firearms-licensing authority's administrative
//! portal: a reusable step wizard with the renewal and dealer-registration
//! flows built on it, demo authentication with a role-gated route guard, and
//! the in-memory license registry behind the admin views. The `cli` module
//! drives all of it from a terminal shell.

pub mod auth;
pub mod backend;
pub mod cli;
pub mod config;
pub mod errors;
pub mod flows;
pub mod registry;
pub mod utils;
pub mod wizard;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("License portal tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
