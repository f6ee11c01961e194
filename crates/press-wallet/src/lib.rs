//! Wallet boundary for CipherPress.
//!
//! The wallet is the publisher's identity: it yields the address that
//! authors articles and signs registry appends. This crate provides:
//! - [`WalletProvider`], the injected provider interface
//! - [`Wallet`], connection state with bounded retry on pending requests
//! - [`Network`], the supported chains and their ids
//! - [`StaticProvider`], a scriptable provider for local use and tests

pub mod error;
pub mod network;
pub mod provider;
pub mod wallet;

pub use error::{WalletError, WalletResult};
pub use network::Network;
pub use provider::{StaticProvider, WalletProvider};
pub use wallet::{RetryPolicy, Wallet, WalletEvent};
