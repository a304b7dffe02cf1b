//! chainverify-core — types and pure logic for reconstructing contract
//! verification inputs.
//!
//! # Overview
//!
//! Verifying an already-deployed contract on a block explorer needs the
//! ABI-encoded constructor arguments it was deployed with. This crate holds
//! everything that does not touch the network:
//!
//! - [`VerificationInput`] — the record handed to a verification submitter
//! - [`ExplorerFamily`] / [`ChainExplorerConfig`] — explorer API dialects
//! - [`ChainRegistry`] — per-chain RPC and explorer configuration
//! - [`decoder`] — bytecode-prefix stripping and `create(...)` call decoding
//! - [`dedup`] — the four-field duplicate filter
//! - [`policy`] — request pacing (fixed delay, token bucket)
//! - [`VerifyError`] — structured error type
//!
//! The network-facing half lives in `chainverify-explorer`.

pub mod builder;
pub mod config;
pub mod dedup;
pub mod decoder;
pub mod error;
pub mod logging;
pub mod policy;
pub mod proxy;
pub mod types;

pub use builder::build_verification_input;
pub use config::{ChainMetadata, ChainRegistry, ExplorerSettings, Pacing, RpcUrl};
pub use dedup::{add_verification_input, should_add_verification_input, ChainMap};
pub use error::VerifyError;
pub use policy::Throttle;
pub use types::{ChainExplorerConfig, ExplorerFamily, RawCreationTx, VerificationInput};
