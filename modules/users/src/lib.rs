// === PUBLIC CONTRACT ===
pub mod contract;

pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod module;
pub use module::UsersModule;

pub mod config;
pub use config::UsersConfig;

// === INTERNAL MODULES ===
// Exposed for the binary and for comprehensive testing; in-process
// consumers should go through `contract`.
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
