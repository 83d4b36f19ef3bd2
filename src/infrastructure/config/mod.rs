//! Infrastructure configuration modules.

pub mod abuse;
pub mod logging;
pub mod pool;
pub mod server;
pub mod settings;

pub use settings::Config;
