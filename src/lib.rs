pub mod bits;
pub mod codetables;
mod config;
mod context;
mod datatypes;
pub mod decoder;
pub mod encoder;
mod error;
mod helpers;
pub mod ieee;
pub mod locator;
mod message;
mod parser;
mod reader;
pub mod template;

pub use crate::{
    config::CodecConfig, context::*, datatypes::*, error::*, message::*, reader::*,
};
