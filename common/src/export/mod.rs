//! Export core modules shared by the CLI and the proxy.

#[cfg(feature = "excel")]
pub mod excel_core;
