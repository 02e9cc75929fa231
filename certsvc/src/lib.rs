//! # certsvc
//!
//! The certificate services layer the context wrappers forward to.
//!
//! [`CertServices`] mirrors the surface of the platform certificate library
//! for revocation lists and trust lists: contexts are referred to by opaque
//! [`RawContext`] values, failures carry native error codes, and every
//! variable-length result uses the two-pass convention:
//!
//! ```text
//! let mut len = 0;
//! services.encoded_context(ctx, None, &mut len)?;          // len = required
//! let mut buf = vec![0; len];
//! services.encoded_context(ctx, Some(&mut buf[..]), &mut len)?; // len = written
//! ```
//!
//! A buffer shorter than required fails with [`Error::MoreData`].
//!
//! [`MemoryServices`] is a portable implementation backed by an in-memory
//! store. It walks the DER structure of what it is given and verifies
//! nothing.

pub mod crl;
pub mod ctl;
mod element;
pub mod error;
mod fields;
pub mod format;
pub mod memory;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod fixtures;

pub use crl::{CrlEntry, CrlInfo};
pub use ctl::{Attribute, CtlEntry, CtlInfo, SortedSubject};
pub use error::{Error, Result};
pub use fields::Extension;
pub use memory::MemoryServices;
pub use pem::{Encoding, StringFormat};
pub use types::{
    AddDisposition, ContextType, EncodingType, FormatFlags, PropId, RawContext, SortedCursor,
    StringToBinary, Subject,
};

/// Operations of the platform certificate library used by the context
/// wrappers.
pub trait CertServices {
    /// Decodes `encoded` into a new context that belongs to no store.
    fn create_context(
        &self,
        kind: ContextType,
        encoding: EncodingType,
        encoded: &[u8],
    ) -> Result<RawContext>;

    /// Decodes `encoded` and adds it to the store. Returns a handle to the
    /// context that ends up in the store.
    fn add_encoded_context_to_store(
        &self,
        kind: ContextType,
        encoding: EncodingType,
        encoded: &[u8],
        disposition: AddDisposition,
    ) -> Result<RawContext>;

    /// Adds a serialized store element, properties included. With
    /// [`AddDisposition::UseExisting`] the element's properties are added to
    /// the existing entry where it does not already have them.
    fn add_serialized_element(
        &self,
        element: &[u8],
        disposition: AddDisposition,
    ) -> Result<(ContextType, RawContext)>;

    /// Returns a new handle to the same context.
    fn duplicate_context(&self, ctx: RawContext) -> Result<RawContext>;

    fn free_context(&self, ctx: RawContext) -> Result<()>;

    /// Removes the context from its store. `ctx` is freed even on failure.
    fn delete_context_from_store(&self, ctx: RawContext) -> Result<()>;

    /// Returns the store entry after `previous` (the first one for `None`),
    /// freeing `previous`. `previous` may have been deleted from the store
    /// meanwhile. Fails with `NoMoreItems` past the end.
    fn enum_store(&self, kind: ContextType, previous: Option<RawContext>) -> Result<RawContext>;

    fn context_type(&self, ctx: RawContext) -> Result<ContextType>;

    /// The encoded bytes the context was created from.
    fn encoded_context(
        &self,
        ctx: RawContext,
        out: Option<&mut [u8]>,
        len: &mut usize,
    ) -> Result<()>;

    fn serialize_store_element(
        &self,
        ctx: RawContext,
        out: Option<&mut [u8]>,
        len: &mut usize,
    ) -> Result<()>;

    /// The next set property after `after`; `PropId::NONE` starts.
    fn enum_properties(&self, ctx: RawContext, after: PropId) -> Result<PropId>;

    fn get_property(
        &self,
        ctx: RawContext,
        id: PropId,
        out: Option<&mut [u8]>,
        len: &mut usize,
    ) -> Result<()>;

    /// Sets or, with `None`, deletes a property.
    fn set_property(
        &self,
        ctx: RawContext,
        id: PropId,
        flags: u32,
        value: Option<&[u8]>,
    ) -> Result<()>;

    fn crl_info(&self, crl: RawContext) -> Result<CrlInfo>;

    /// The entry revoking `certificate`, if any.
    fn find_certificate_in_crl(&self, crl: RawContext, certificate: &[u8]) -> Result<Option<CrlEntry>>;

    fn ctl_info(&self, ctl: RawContext) -> Result<CtlInfo>;

    fn find_subject_in_ctl(
        &self,
        ctl: RawContext,
        encoding: EncodingType,
        subject: &Subject<'_>,
    ) -> Result<CtlEntry>;

    /// Writes the encoded attributes of the subject with `identifier`.
    fn find_subject_in_sorted_ctl(
        &self,
        ctl: RawContext,
        identifier: &[u8],
        out: Option<&mut [u8]>,
        len: &mut usize,
    ) -> Result<()>;

    fn enum_subject_in_sorted_ctl(
        &self,
        ctl: RawContext,
        cursor: SortedCursor,
    ) -> Result<(SortedSubject, SortedCursor)>;

    /// Encodes `data` as text; `out` receives UTF-8 bytes.
    fn binary_to_string(
        &self,
        data: &[u8],
        format: StringFormat,
        out: Option<&mut [u8]>,
        len: &mut usize,
    ) -> Result<()>;

    fn string_to_binary(
        &self,
        text: &str,
        format: StringFormat,
        out: Option<&mut [u8]>,
        len: &mut usize,
    ) -> Result<StringToBinary>;

    /// Renders `encoded` as `struct_type` (an OID string); `out` receives
    /// UTF-16 code units.
    fn format_object(
        &self,
        encoding: EncodingType,
        flags: FormatFlags,
        struct_type: Option<&str>,
        encoded: &[u8],
        out: Option<&mut [u16]>,
        len: &mut usize,
    ) -> Result<()>;
}

/// Writes `value` following the two-pass convention.
pub(crate) fn fill<T: Copy>(value: &[T], out: Option<&mut [T]>, len: &mut usize) -> Result<()> {
    match out {
        None => {
            *len = value.len();
            Ok(())
        }
        Some(buf) if buf.len() < value.len() => {
            *len = value.len();
            Err(Error::MoreData {
                required: value.len(),
            })
        }
        Some(buf) => {
            buf[..value.len()].copy_from_slice(value);
            *len = value.len();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, fill};

    #[test]
    fn test_fill_two_pass() {
        let value = [1u8, 2, 3];
        let mut len = 0;
        fill(&value, None, &mut len).unwrap();
        assert_eq!(3, len);

        let mut short = [0u8; 2];
        assert_eq!(
            Err(Error::MoreData { required: 3 }),
            fill(&value, Some(&mut short[..]), &mut len)
        );

        let mut buf = [0u8; 4];
        fill(&value, Some(&mut buf[..]), &mut len).unwrap();
        assert_eq!(3, len);
        assert_eq!([1, 2, 3, 0], buf);
    }
}
