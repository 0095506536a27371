//! # unit0-sender
//!
//! Sends batches of tiny transfers from funded accounts to freshly generated
//! addresses on the Unit Zero testnet, reporting balances and settlement
//! outcomes as it goes.
//!
//! - [`driver`] - per-account transfer lifecycle
//! - [`monitor`] - background balance reporting
//! - [`poller`] - receipt polling state machine
//! - [`transfer`] - transfer drafts and sampling
//! - [`ledger`] - network access (ethers-rs JSON-RPC)

pub mod config;
pub mod driver;
pub mod ledger;
pub mod monitor;
pub mod poller;
pub mod report;
pub mod transfer;
