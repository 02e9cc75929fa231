//! # cryptowrappers
//!
//! Owning wrappers for certificate revocation list and certificate trust
//! list contexts, and the two-pass buffer helpers for converting between
//! binary and text.
//!
//! A [`Context`] owns at most one handle from a [`CertServices`]
//! implementation and frees it on drop. [`Crl`] and [`Ctl`] add the
//! operations specific to each kind.
//!
//! ```
//! use certsvc::{EncodingType, MemoryServices, fixtures};
//! use cryptowrappers::Crl;
//!
//! let services = MemoryServices::new();
//! let encoded = fixtures::empty_crl();
//! let crl = Crl::decode(&services, EncodingType::X509_ASN, &encoded).unwrap();
//!
//! let copy = crl.duplicate().unwrap();
//! assert_eq!(encoded, copy.serialize().unwrap());
//! ```

pub mod context;
pub mod crl;
pub mod ctl;
pub mod error;
pub mod helpers;
pub mod property;
pub mod store;

pub use certsvc::CertServices;
pub use context::{Context, ContextKind, CrlKind, CtlKind, PropertyIds};
pub use crl::Crl;
pub use ctl::{Ctl, SortedSubjects};
pub use der::ObjectIdentifier;
pub use error::{Error, Result};
pub use helpers::{
    TextToBinary, binary_to_text, format_object, query_then_fill, query_then_fill_with,
    text_to_binary,
};
pub use property::{AccessState, Archived, FriendlyName, Property, Sha1Hash, Sha256Hash};
pub use store::{StoreContexts, store_contexts};
