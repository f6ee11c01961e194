//! Foundation types for CipherPress.
//!
//! Every other CipherPress crate depends on `press-types`. It defines the
//! identifiers that flow between the content store, the local cache, and the
//! on-chain registry, plus the article model itself.
//!
//! # Key Types
//!
//! - [`ContentId`] -- Content-derived identifier (BLAKE3 hash of the payload)
//! - [`Address`] -- Fixed-length chain address of a publisher
//! - [`Timestamp`] -- Client-side creation time, the feed ordering key
//! - [`Article`] / [`ArticleDraft`] -- The published unit and its submission form
//! - [`Tags`] -- Ordered, deduplicated article labels
//! - [`InitCell`] -- Single-flight lazy initialization for service handles

pub mod address;
pub mod article;
pub mod cid;
pub mod error;
pub mod lifecycle;
pub mod timestamp;

pub use address::Address;
pub use article::{Article, ArticleDraft, Tags};
pub use cid::ContentId;
pub use error::TypeError;
pub use lifecycle::{InitCell, InitError, InitPhase};
pub use timestamp::Timestamp;
