//! Katari Kernel Library
//!
//! Menu selection and script dependency resolution. The `katari` binary is a
//! thin command line front end over these modules.

pub mod config;
pub mod error;
pub mod jsmodule;
pub mod menu;
