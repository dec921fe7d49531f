//! Configuration for jsonpb-codegen

pub mod defaults;
mod settings;

pub use settings::*;
