//! Region-aware budget plans: a three-step session that asks a generative
//! model for a plan, with an in-process cache in front of the model.

pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod key;
pub mod log;
pub mod pipeline;
pub mod prompt;
pub mod provider;
pub mod reference;
pub mod session;
pub mod ux;
pub mod wire;
