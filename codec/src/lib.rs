//! # codec
//!
//! Core conversion traits for the certctx crates.
//!
//! Every representation change in the workspace goes through one of the two
//! traits defined here:
//!
//! ```text
//! text ⇄ Vec<u8> ⇄ Der ⇄ CrlInfo / CtlInfo
//! ```
//!
//! `Decoder` walks the chain left to right, `Encoder` walks it back. Both are
//! guarded by a marker trait so a conversion exists only where a crate has
//! explicitly declared it.
//!
//! ## Example
//!
//! ```ignore
//! use codec::decoder::Decoder;
//! use codec::encoder::Encoder;
//! use der::Der;
//!
//! let bytes = vec![0x30, 0x00];
//! let der: Der = bytes.decode().unwrap();
//! let again: Vec<u8> = der.encode().unwrap();
//! assert_eq!(bytes, again);
//! ```

#![forbid(unsafe_code)]

pub mod decoder;
pub mod encoder;
