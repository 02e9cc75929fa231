//! In-memory certificate services.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::rc::Rc;

use sha1::Sha1;
use sha2::{Digest, Sha256};
use tracing::{debug, trace, warn};

use crate::crl::{self, CrlEntry, CrlInfo};
use crate::ctl::{self, CtlEntry, CtlInfo, SortedSubject};
use crate::element;
use crate::error::{Error, Result};
use crate::format;
use crate::types::{
    AddDisposition, ContextType, EncodingType, FormatFlags, PropId, RawContext, SortedCursor,
    StringToBinary, Subject,
};
use crate::{CertServices, StringFormat, fill};

enum Decoded {
    Crl(CrlInfo),
    Ctl {
        info: CtlInfo,
        // entry indices ordered by subject identifier
        sorted: Vec<usize>,
    },
}

struct Entry {
    kind: ContextType,
    encoding: EncodingType,
    encoded: Vec<u8>,
    decoded: Decoded,
    // shared by every handle to this entry
    properties: RefCell<BTreeMap<u32, Vec<u8>>>,
    // store position, kept after deletion so enumeration can resume; 0 when never stored
    sequence: Cell<u64>,
}

impl Entry {
    fn decode(kind: ContextType, encoding: EncodingType, encoded: &[u8]) -> Result<Self> {
        if !encoding.contains(kind.required_encoding()) {
            return Err(Error::InvalidParameter(format!(
                "{} requires encoding {:#x}, got {:#x}",
                kind,
                kind.required_encoding().bits(),
                encoding.bits()
            )));
        }
        let decoded = match kind {
            ContextType::Crl => Decoded::Crl(CrlInfo::parse(encoded)?),
            ContextType::Ctl => {
                let info = CtlInfo::parse(encoded)?;
                let sorted = info.sorted_order();
                Decoded::Ctl { info, sorted }
            }
        };
        Ok(Entry {
            kind,
            encoding,
            encoded: encoded.to_vec(),
            decoded,
            properties: RefCell::new(BTreeMap::new()),
            sequence: Cell::new(0),
        })
    }

    /// Whether a store holding `self` already holds the same object:
    /// revocation lists match on issuer, trust lists on usage and list
    /// identifier.
    fn matches(&self, other: &Entry) -> bool {
        match (&self.decoded, &other.decoded) {
            (Decoded::Crl(a), Decoded::Crl(b)) => a.issuer == b.issuer,
            (Decoded::Ctl { info: a, .. }, Decoded::Ctl { info: b, .. }) => {
                a.subject_usage == b.subject_usage && a.list_identifier == b.list_identifier
            }
            _ => false,
        }
    }

    fn crl(&self) -> Result<&CrlInfo> {
        match &self.decoded {
            Decoded::Crl(info) => Ok(info),
            Decoded::Ctl { .. } => Err(Error::InvalidParameter("context is not a CRL".to_string())),
        }
    }

    fn ctl(&self) -> Result<(&CtlInfo, &[usize])> {
        match &self.decoded {
            Decoded::Ctl { info, sorted } => Ok((info, sorted)),
            Decoded::Crl(_) => Err(Error::InvalidParameter("context is not a CTL".to_string())),
        }
    }

    fn hash_property(&self, id: PropId) -> Option<Vec<u8>> {
        match id {
            PropId::SHA1_HASH => Some(Sha1::digest(&self.encoded).to_vec()),
            PropId::SHA256_HASH => Some(Sha256::digest(&self.encoded).to_vec()),
            _ => None,
        }
    }
}

#[derive(Default)]
struct State {
    last_handle: u64,
    handles: HashMap<RawContext, Rc<Entry>>,
    last_sequence: u64,
    // keyed by sequence; insertion order is enumeration order
    store: BTreeMap<u64, Rc<Entry>>,
}

impl State {
    fn allocate(&mut self, entry: Rc<Entry>) -> Result<RawContext> {
        self.last_handle = self
            .last_handle
            .checked_add(1)
            .ok_or_else(|| Error::InvalidParameter("context handles exhausted".to_string()))?;
        let raw = RawContext::new(self.last_handle)
            .ok_or_else(|| Error::InvalidParameter("context handles exhausted".to_string()))?;
        self.handles.insert(raw, entry);
        Ok(raw)
    }

    /// Sequence of `entry` if it is still in the store.
    fn stored_sequence(&self, entry: &Rc<Entry>) -> Option<u64> {
        let sequence = entry.sequence.get();
        self.store
            .get(&sequence)
            .filter(|stored| Rc::ptr_eq(stored, entry))
            .map(|_| sequence)
    }

    fn add(&mut self, entry: Entry, disposition: AddDisposition) -> Result<RawContext> {
        let existing = match disposition {
            AddDisposition::Always => None,
            _ => self
                .store
                .iter()
                .find(|(_, e)| e.matches(&entry))
                .map(|(&sequence, _)| sequence),
        };
        match (disposition, existing) {
            (AddDisposition::New, Some(_)) => return Err(Error::Exists),
            (AddDisposition::UseExisting, Some(sequence)) => {
                let stored = self
                    .store
                    .get(&sequence)
                    .cloned()
                    .ok_or(Error::NotFound)?;
                return self.allocate(stored);
            }
            (AddDisposition::ReplaceExisting, Some(sequence)) => {
                self.store.remove(&sequence);
            }
            _ => {}
        }
        self.last_sequence = self
            .last_sequence
            .checked_add(1)
            .ok_or_else(|| Error::InvalidParameter("store sequence exhausted".to_string()))?;
        entry.sequence.set(self.last_sequence);
        let entry = Rc::new(entry);
        self.store.insert(self.last_sequence, Rc::clone(&entry));
        self.allocate(entry)
    }
}

/// Portable [`CertServices`] implementation holding one in-memory store.
///
/// Handles are reference counted: an entry lives as long as a handle or
/// the store refers to it. Not thread safe.
#[derive(Default)]
pub struct MemoryServices {
    state: RefCell<State>,
}

impl MemoryServices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles not yet freed.
    pub fn open_handles(&self) -> usize {
        self.state.borrow().handles.len()
    }

    /// Number of stored contexts of `kind`.
    pub fn stored(&self, kind: ContextType) -> usize {
        self.state
            .borrow()
            .store
            .values()
            .filter(|e| e.kind == kind)
            .count()
    }

    fn entry(&self, ctx: RawContext) -> Result<Rc<Entry>> {
        self.state
            .borrow()
            .handles
            .get(&ctx)
            .cloned()
            .ok_or(Error::InvalidHandle(ctx.get()))
    }
}

impl Drop for MemoryServices {
    fn drop(&mut self) {
        let open = self.state.get_mut().handles.len();
        if open > 0 {
            warn!(open, "certificate services dropped with open context handles");
        }
    }
}

impl CertServices for MemoryServices {
    fn create_context(
        &self,
        kind: ContextType,
        encoding: EncodingType,
        encoded: &[u8],
    ) -> Result<RawContext> {
        let entry = Entry::decode(kind, encoding, encoded)?;
        let raw = self.state.borrow_mut().allocate(Rc::new(entry))?;
        debug!(%raw, %kind, len = encoded.len(), "created context");
        Ok(raw)
    }

    fn add_encoded_context_to_store(
        &self,
        kind: ContextType,
        encoding: EncodingType,
        encoded: &[u8],
        disposition: AddDisposition,
    ) -> Result<RawContext> {
        let entry = Entry::decode(kind, encoding, encoded)?;
        let raw = self.state.borrow_mut().add(entry, disposition)?;
        debug!(%raw, %kind, ?disposition, "added context to store");
        Ok(raw)
    }

    fn add_serialized_element(
        &self,
        serialized: &[u8],
        disposition: AddDisposition,
    ) -> Result<(ContextType, RawContext)> {
        let element = element::parse(serialized)?;
        let entry = Entry::decode(element.kind, element.encoding, &element.encoded)?;
        *entry.properties.borrow_mut() = element.properties.clone();
        let raw = self.state.borrow_mut().add(entry, disposition)?;
        // an existing entry picks up the element's properties it does not already have
        let stored = self.entry(raw)?;
        let mut properties = stored.properties.borrow_mut();
        for (id, value) in element.properties {
            properties.entry(id).or_insert(value);
        }
        debug!(%raw, kind = %element.kind, ?disposition, "added serialized element to store");
        Ok((element.kind, raw))
    }

    fn duplicate_context(&self, ctx: RawContext) -> Result<RawContext> {
        let entry = self.entry(ctx)?;
        let raw = self.state.borrow_mut().allocate(entry)?;
        trace!(%ctx, %raw, "duplicated context");
        Ok(raw)
    }

    fn free_context(&self, ctx: RawContext) -> Result<()> {
        self.state
            .borrow_mut()
            .handles
            .remove(&ctx)
            .ok_or(Error::InvalidHandle(ctx.get()))?;
        trace!(%ctx, "freed context");
        Ok(())
    }

    fn delete_context_from_store(&self, ctx: RawContext) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let entry = state
            .handles
            .remove(&ctx)
            .ok_or(Error::InvalidHandle(ctx.get()))?;
        let sequence = state.stored_sequence(&entry).ok_or(Error::NotFound)?;
        state.store.remove(&sequence);
        debug!(%ctx, kind = %entry.kind, "deleted context from store");
        Ok(())
    }

    fn enum_store(&self, kind: ContextType, previous: Option<RawContext>) -> Result<RawContext> {
        let mut state = self.state.borrow_mut();
        let after = match previous {
            None => 0,
            Some(prev) => {
                let entry = state
                    .handles
                    .remove(&prev)
                    .ok_or(Error::InvalidHandle(prev.get()))?;
                // a deleted entry keeps its sequence, so enumeration carries on past it
                match entry.sequence.get() {
                    0 => return Err(Error::NotFound),
                    sequence => sequence,
                }
            }
        };
        let next = state
            .store
            .range((Bound::Excluded(after), Bound::Unbounded))
            .map(|(_, e)| e)
            .find(|e| e.kind == kind)
            .cloned()
            .ok_or(Error::NoMoreItems)?;
        let raw = state.allocate(next)?;
        trace!(?previous, %raw, %kind, "enumerated store");
        Ok(raw)
    }

    fn context_type(&self, ctx: RawContext) -> Result<ContextType> {
        Ok(self.entry(ctx)?.kind)
    }

    fn encoded_context(
        &self,
        ctx: RawContext,
        out: Option<&mut [u8]>,
        len: &mut usize,
    ) -> Result<()> {
        fill(&self.entry(ctx)?.encoded, out, len)
    }

    fn serialize_store_element(
        &self,
        ctx: RawContext,
        out: Option<&mut [u8]>,
        len: &mut usize,
    ) -> Result<()> {
        let entry = self.entry(ctx)?;
        let serialized = element::serialize(
            entry.kind,
            entry.encoding,
            &entry.encoded,
            &entry.properties.borrow(),
        )?;
        fill(&serialized, out, len)
    }

    fn enum_properties(&self, ctx: RawContext, after: PropId) -> Result<PropId> {
        let entry = self.entry(ctx)?;
        let properties = entry.properties.borrow();
        properties
            .range((Bound::Excluded(after.0), Bound::Unbounded))
            .next()
            .map(|(&id, _)| PropId(id))
            .ok_or(Error::NoMoreItems)
    }

    fn get_property(
        &self,
        ctx: RawContext,
        id: PropId,
        out: Option<&mut [u8]>,
        len: &mut usize,
    ) -> Result<()> {
        let entry = self.entry(ctx)?;
        trace!(%ctx, %id, "get property");
        if id == PropId::ACCESS_STATE {
            // nothing in a memory store is persisted
            return fill(&0u32.to_le_bytes(), out, len);
        }
        let mut properties = entry.properties.borrow_mut();
        if !properties.contains_key(&id.0) {
            match entry.hash_property(id) {
                // computed hashes are cached like any other property
                Some(hash) => {
                    properties.insert(id.0, hash);
                }
                None if id == PropId::MD5_HASH => {
                    return Err(Error::UnsupportedAlgorithm("MD5".to_string()));
                }
                None => return Err(Error::NotFound),
            }
        }
        let value = properties.get(&id.0).ok_or(Error::NotFound)?;
        fill(value, out, len)
    }

    fn set_property(
        &self,
        ctx: RawContext,
        id: PropId,
        flags: u32,
        value: Option<&[u8]>,
    ) -> Result<()> {
        let entry = self.entry(ctx)?;
        if id == PropId::NONE {
            return Err(Error::InvalidParameter("property id 0".to_string()));
        }
        if id.is_reserved() || id == PropId::ACCESS_STATE {
            return Err(Error::ReadOnlyProperty(id.0));
        }
        trace!(%ctx, %id, flags, delete = value.is_none(), "set property");
        let mut properties = entry.properties.borrow_mut();
        match value {
            Some(v) => {
                properties.insert(id.0, v.to_vec());
            }
            None => {
                properties.remove(&id.0);
            }
        }
        Ok(())
    }

    fn crl_info(&self, crl: RawContext) -> Result<CrlInfo> {
        Ok(self.entry(crl)?.crl()?.clone())
    }

    fn find_certificate_in_crl(&self, crl: RawContext, certificate: &[u8]) -> Result<Option<CrlEntry>> {
        let entry = self.entry(crl)?;
        let info = entry.crl()?;
        let (issuer, serial) = crl::certificate_issuer_and_serial(certificate)?;
        if issuer != info.issuer {
            return Ok(None);
        }
        Ok(info.entries.iter().find(|e| e.serial == serial).cloned())
    }

    fn ctl_info(&self, ctl: RawContext) -> Result<CtlInfo> {
        Ok(self.entry(ctl)?.ctl()?.0.clone())
    }

    fn find_subject_in_ctl(
        &self,
        ctl: RawContext,
        encoding: EncodingType,
        subject: &Subject<'_>,
    ) -> Result<CtlEntry> {
        let entry = self.entry(ctl)?;
        let (info, _) = entry.ctl()?;
        let identifier = match subject {
            Subject::Certificate(certificate) => {
                if !encoding.contains(EncodingType::X509_ASN) {
                    return Err(Error::InvalidParameter(
                        "certificate subjects require X509_ASN encoding".to_string(),
                    ));
                }
                ctl::subject_identifier(&info.subject_algorithm, certificate)
                    .ok_or_else(|| Error::UnsupportedAlgorithm(info.subject_algorithm.clone()))?
            }
            Subject::Identifier {
                algorithm,
                identifier,
            } => {
                if algorithm.to_string() != info.subject_algorithm {
                    return Err(Error::NotFound);
                }
                identifier.to_vec()
            }
        };
        info.entries
            .iter()
            .find(|e| e.subject_identifier == identifier)
            .cloned()
            .ok_or(Error::NotFound)
    }

    fn find_subject_in_sorted_ctl(
        &self,
        ctl: RawContext,
        identifier: &[u8],
        out: Option<&mut [u8]>,
        len: &mut usize,
    ) -> Result<()> {
        let entry = self.entry(ctl)?;
        let (info, sorted) = entry.ctl()?;
        let index = sorted
            .binary_search_by(|&i| info.entries[i].subject_identifier.as_slice().cmp(identifier))
            .map_err(|_| Error::NotFound)?;
        fill(&info.entries[sorted[index]].encoded_attributes, out, len)
    }

    fn enum_subject_in_sorted_ctl(
        &self,
        ctl: RawContext,
        cursor: SortedCursor,
    ) -> Result<(SortedSubject, SortedCursor)> {
        let entry = self.entry(ctl)?;
        let (info, sorted) = entry.ctl()?;
        let index = *sorted.get(cursor.0).ok_or(Error::NoMoreItems)?;
        let subject = &info.entries[index];
        Ok((
            SortedSubject {
                identifier: subject.subject_identifier.clone(),
                encoded_attributes: subject.encoded_attributes.clone(),
            },
            SortedCursor(cursor.0 + 1),
        ))
    }

    fn binary_to_string(
        &self,
        data: &[u8],
        format: StringFormat,
        out: Option<&mut [u8]>,
        len: &mut usize,
    ) -> Result<()> {
        let text = pem::encode(data, format)?;
        trace!(format = format.bits(), len = text.len(), "binary to string");
        fill(text.as_bytes(), out, len)
    }

    fn string_to_binary(
        &self,
        text: &str,
        format: StringFormat,
        out: Option<&mut [u8]>,
        len: &mut usize,
    ) -> Result<StringToBinary> {
        let decoded = pem::decode(text, format)?;
        trace!(format = format.bits(), detected = ?decoded.encoding, "string to binary");
        fill(&decoded.bytes, out, len)?;
        Ok(StringToBinary {
            skipped: decoded.skipped,
            format: decoded.encoding,
        })
    }

    fn format_object(
        &self,
        encoding: EncodingType,
        flags: FormatFlags,
        struct_type: Option<&str>,
        encoded: &[u8],
        out: Option<&mut [u16]>,
        len: &mut usize,
    ) -> Result<()> {
        if encoding.bits() == 0 {
            return Err(Error::InvalidParameter("no encoding type".to_string()));
        }
        let text = format::render(struct_type, flags, encoded)?;
        let units: Vec<u16> = text.encode_utf16().collect();
        fill(&units, out, len)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::MemoryServices;
    use crate::error::Error;
    use crate::fixtures;
    use crate::types::{AddDisposition, ContextType, EncodingType, PropId, SortedCursor, Subject};
    use crate::{CertServices, Encoding, StringFormat};

    const CRL: ContextType = ContextType::Crl;
    const CTL: ContextType = ContextType::Ctl;
    const X509: EncodingType = EncodingType::X509_ASN;
    const PKCS7: EncodingType = EncodingType::PKCS_7_ASN;

    fn read(call: impl Fn(Option<&mut [u8]>, &mut usize) -> crate::Result<()>) -> Vec<u8> {
        let mut len = 0;
        call(None, &mut len).unwrap();
        let mut buf = vec![0; len];
        call(Some(&mut buf[..]), &mut len).unwrap();
        buf.truncate(len);
        buf
    }

    #[test]
    fn test_create_and_free() {
        let services = MemoryServices::new();
        let encoded = fixtures::empty_crl();
        let ctx = services.create_context(CRL, X509, &encoded).unwrap();
        assert_eq!(1, services.open_handles());
        assert_eq!(encoded, read(|out, len| services.encoded_context(ctx, out, len)));
        services.free_context(ctx).unwrap();
        assert_eq!(0, services.open_handles());
        assert!(matches!(services.free_context(ctx), Err(Error::InvalidHandle(_))));
    }

    #[rstest]
    #[case(CRL, PKCS7, fixtures::empty_crl())]
    #[case(CRL, X509, vec![])]
    #[case(CRL, X509, vec![0x30, 0x00])]
    #[case(CTL, PKCS7, fixtures::empty_crl())]
    #[case(CTL, X509, fixtures::ctl(&[]))]
    fn test_create_invalid(
        #[case] kind: ContextType,
        #[case] encoding: EncodingType,
        #[case] encoded: Vec<u8>,
    ) {
        let services = MemoryServices::new();
        assert!(services.create_context(kind, encoding, &encoded).is_err());
        assert_eq!(0, services.open_handles());
    }

    #[test]
    fn test_encoded_context_short_buffer() {
        let services = MemoryServices::new();
        let ctx = services.create_context(CRL, X509, &fixtures::empty_crl()).unwrap();
        let mut len = 0;
        let mut buf = [0u8; 4];
        let err = services.encoded_context(ctx, Some(&mut buf[..]), &mut len).unwrap_err();
        assert_eq!(Error::MoreData { required: fixtures::empty_crl().len() }, err);
        services.free_context(ctx).unwrap();
    }

    #[test]
    fn test_duplicate_shares_properties() {
        let services = MemoryServices::new();
        let ctx = services.create_context(CRL, X509, &fixtures::empty_crl()).unwrap();
        let dup = services.duplicate_context(ctx).unwrap();
        assert_ne!(ctx, dup);
        services.set_property(ctx, PropId::FRIENDLY_NAME, 0, Some(&[0x61, 0x00, 0x00, 0x00])).unwrap();
        services.free_context(ctx).unwrap();
        let name = read(|out, len| services.get_property(dup, PropId::FRIENDLY_NAME, out, len));
        assert_eq!(vec![0x61, 0x00, 0x00, 0x00], name);
        services.free_context(dup).unwrap();
    }

    #[rstest]
    #[case(AddDisposition::UseExisting, 1, true)]
    #[case(AddDisposition::ReplaceExisting, 1, false)]
    #[case(AddDisposition::Always, 2, false)]
    fn test_add_dispositions(
        #[case] disposition: AddDisposition,
        #[case] expected_stored: usize,
        #[case] same_entry: bool,
    ) {
        let services = MemoryServices::new();
        let first = services
            .add_encoded_context_to_store(CRL, X509, &fixtures::empty_crl(), AddDisposition::New)
            .unwrap();
        services.set_property(first, PropId::ARCHIVED, 0, Some(&[])).unwrap();
        let second = services
            .add_encoded_context_to_store(CRL, X509, &fixtures::crl_with_revoked(&[&[1]]), disposition)
            .unwrap();
        assert_eq!(expected_stored, services.stored(CRL));
        let archived = services.get_property(second, PropId::ARCHIVED, None, &mut 0);
        assert_eq!(same_entry, archived.is_ok());
        services.free_context(first).unwrap();
        services.free_context(second).unwrap();
    }

    #[test]
    fn test_add_new_exists() {
        let services = MemoryServices::new();
        let first = services
            .add_encoded_context_to_store(CRL, X509, &fixtures::empty_crl(), AddDisposition::New)
            .unwrap();
        let err = services
            .add_encoded_context_to_store(CRL, X509, &fixtures::empty_crl(), AddDisposition::New)
            .unwrap_err();
        assert_eq!(Error::Exists, err);
        services.free_context(first).unwrap();
    }

    #[test]
    fn test_enum_store_and_delete() {
        let services = MemoryServices::new();
        let crl = services
            .add_encoded_context_to_store(CRL, X509, &fixtures::empty_crl(), AddDisposition::Always)
            .unwrap();
        let ctl = services
            .add_encoded_context_to_store(CTL, PKCS7, &fixtures::ctl(&[&[1; 20]]), AddDisposition::Always)
            .unwrap();
        let crl2 = services
            .add_encoded_context_to_store(CRL, X509, &fixtures::crl_with_revoked(&[&[9]]), AddDisposition::Always)
            .unwrap();
        services.free_context(ctl).unwrap();

        let first = services.enum_store(CRL, None).unwrap();
        let second = services.enum_store(CRL, Some(first)).unwrap();
        assert!(matches!(services.free_context(first), Err(Error::InvalidHandle(_))));
        assert_eq!(
            Err(Error::NoMoreItems),
            services.enum_store(CRL, Some(second))
        );

        services.delete_context_from_store(crl2).unwrap();
        assert_eq!(1, services.stored(CRL));
        assert_eq!(1, services.stored(CTL));
        services.free_context(crl).unwrap();
        assert_eq!(0, services.open_handles());
    }

    #[test]
    fn test_enum_store_past_deleted_entry() {
        let services = MemoryServices::new();
        for serial in [1u8, 2, 3] {
            let ctx = services
                .add_encoded_context_to_store(CRL, X509, &fixtures::crl_with_revoked(&[&[serial]]), AddDisposition::Always)
                .unwrap();
            services.free_context(ctx).unwrap();
        }

        let mut previous = None;
        let mut visited = 0;
        while let Ok(ctx) = services.enum_store(CRL, previous) {
            let copy = services.duplicate_context(ctx).unwrap();
            services.delete_context_from_store(copy).unwrap();
            visited += 1;
            previous = Some(ctx);
        }
        assert_eq!(3, visited);
        assert_eq!(0, services.stored(CRL));
        assert_eq!(0, services.open_handles());
    }

    #[test]
    fn test_use_existing_element_adds_missing_properties() {
        let services = MemoryServices::new();
        let stored = services
            .add_encoded_context_to_store(CRL, X509, &fixtures::empty_crl(), AddDisposition::New)
            .unwrap();
        services.set_property(stored, PropId::FRIENDLY_NAME, 0, Some(&[0x61, 0x00, 0x00, 0x00])).unwrap();

        let other = services.create_context(CRL, X509, &fixtures::empty_crl()).unwrap();
        services.set_property(other, PropId::FRIENDLY_NAME, 0, Some(&[0x62, 0x00, 0x00, 0x00])).unwrap();
        services.set_property(other, PropId::ARCHIVED, 0, Some(&[])).unwrap();
        let element = read(|out, len| services.serialize_store_element(other, out, len));
        services.free_context(other).unwrap();

        let (_, merged) = services.add_serialized_element(&element, AddDisposition::UseExisting).unwrap();
        assert_eq!(1, services.stored(CRL));
        assert_eq!(
            vec![0x61, 0x00, 0x00, 0x00],
            read(|out, len| services.get_property(merged, PropId::FRIENDLY_NAME, out, len))
        );
        assert!(services.get_property(stored, PropId::ARCHIVED, None, &mut 0).is_ok());
        services.free_context(stored).unwrap();
        services.free_context(merged).unwrap();
    }

    #[test]
    fn test_delete_unstored() {
        let services = MemoryServices::new();
        let ctx = services.create_context(CRL, X509, &fixtures::empty_crl()).unwrap();
        assert_eq!(Err(Error::NotFound), services.delete_context_from_store(ctx));
        assert_eq!(0, services.open_handles());
    }

    #[test]
    fn test_properties() {
        let services = MemoryServices::new();
        let ctx = services.create_context(CRL, X509, &fixtures::empty_crl()).unwrap();
        assert_eq!(Err(Error::NoMoreItems), services.enum_properties(ctx, PropId::NONE));
        assert_eq!(
            Err(Error::NotFound),
            services.get_property(ctx, PropId::FRIENDLY_NAME, None, &mut 0)
        );
        assert!(matches!(
            services.get_property(ctx, PropId::MD5_HASH, None, &mut 0),
            Err(Error::UnsupportedAlgorithm(_))
        ));
        assert_eq!(
            Err(Error::ReadOnlyProperty(14)),
            services.set_property(ctx, PropId::ACCESS_STATE, 0, Some(&[0; 4]))
        );

        let sha1 = read(|out, len| services.get_property(ctx, PropId::SHA1_HASH, out, len));
        assert_eq!(20, sha1.len());
        services.set_property(ctx, PropId::ARCHIVED, 0, Some(&[])).unwrap();
        let first = services.enum_properties(ctx, PropId::NONE).unwrap();
        let second = services.enum_properties(ctx, first).unwrap();
        assert_eq!((PropId::SHA1_HASH, PropId::ARCHIVED), (first, second));
        assert_eq!(Err(Error::NoMoreItems), services.enum_properties(ctx, second));

        services.set_property(ctx, PropId::ARCHIVED, 0, None).unwrap();
        assert_eq!(Err(Error::NoMoreItems), services.enum_properties(ctx, first));
        services.free_context(ctx).unwrap();
    }

    #[test]
    fn test_serialized_element_round_trip() {
        let services = MemoryServices::new();
        let ctx = services.create_context(CTL, PKCS7, &fixtures::ctl(&[&[2; 20]])).unwrap();
        services.set_property(ctx, PropId::FRIENDLY_NAME, 0, Some(&[0x78, 0x00, 0x00, 0x00])).unwrap();
        let element = read(|out, len| services.serialize_store_element(ctx, out, len));
        services.free_context(ctx).unwrap();

        let (kind, restored) = services.add_serialized_element(&element, AddDisposition::New).unwrap();
        assert_eq!(CTL, kind);
        assert_eq!(1, services.stored(CTL));
        let name = read(|out, len| services.get_property(restored, PropId::FRIENDLY_NAME, out, len));
        assert_eq!(vec![0x78, 0x00, 0x00, 0x00], name);
        services.free_context(restored).unwrap();
    }

    #[test]
    fn test_find_certificate_in_crl() {
        let services = MemoryServices::new();
        let ctx = services
            .create_context(CRL, X509, &fixtures::crl_with_revoked(&[&[0x05], &[0x2a]]))
            .unwrap();
        let entry = services
            .find_certificate_in_crl(ctx, &fixtures::certificate(&[0x2a]))
            .unwrap()
            .unwrap();
        assert_eq!(vec![0x2a], entry.serial);
        assert_eq!(
            None,
            services.find_certificate_in_crl(ctx, &fixtures::certificate(&[0x07])).unwrap()
        );
        assert!(services.ctl_info(ctx).is_err());
        services.free_context(ctx).unwrap();
    }

    #[test]
    fn test_sorted_ctl() {
        let services = MemoryServices::new();
        let ids: [&[u8]; 3] = [&[0x30; 20], &[0x10; 20], &[0x20; 20]];
        let ctx = services.create_context(CTL, PKCS7, &fixtures::ctl(&ids)).unwrap();

        let mut cursor = SortedCursor::START;
        let mut seen = Vec::new();
        loop {
            match services.enum_subject_in_sorted_ctl(ctx, cursor) {
                Ok((subject, next)) => {
                    seen.push(subject.identifier[0]);
                    cursor = next;
                }
                Err(e) => {
                    assert_eq!(Error::NoMoreItems, e);
                    break;
                }
            }
        }
        assert_eq!(vec![0x10, 0x20, 0x30], seen);

        let attrs = read(|out, len| services.find_subject_in_sorted_ctl(ctx, &[0x20; 20], out, len));
        assert_eq!(0x31, attrs[0]);
        assert_eq!(
            Err(Error::NotFound),
            services.find_subject_in_sorted_ctl(ctx, &[0x40; 20], None, &mut 0)
        );
        services.free_context(ctx).unwrap();
    }

    #[test]
    fn test_find_subject_by_certificate() {
        use sha1::{Digest, Sha1};

        let services = MemoryServices::new();
        let cert = fixtures::certificate(&[0x01]);
        let id = Sha1::digest(&cert).to_vec();
        let ctx = services.create_context(CTL, PKCS7, &fixtures::ctl(&[&[0; 20], id.as_slice()])).unwrap();

        let entry = services
            .find_subject_in_ctl(ctx, X509 | PKCS7, &Subject::Certificate(&cert))
            .unwrap();
        assert_eq!(id, entry.subject_identifier);

        let sha1 = crate::ctl::SHA1_OID.parse().unwrap();
        let by_id = services
            .find_subject_in_ctl(ctx, PKCS7, &Subject::Identifier { algorithm: &sha1, identifier: &[0; 20] })
            .unwrap();
        assert_eq!(vec![0; 20], by_id.subject_identifier);

        let other = fixtures::certificate(&[0x02]);
        assert_eq!(
            Err(Error::NotFound),
            services.find_subject_in_ctl(ctx, X509, &Subject::Certificate(&other))
        );
        services.free_context(ctx).unwrap();
    }

    #[test]
    fn test_string_conversions() {
        let services = MemoryServices::new();
        let text = read(|out, len| {
            services.binary_to_string(&[0x30, 0x00], StringFormat::new(Encoding::Base64), out, len)
        });
        assert_eq!(b"MAA=\r\n".to_vec(), text);

        let mut len = 0;
        let info = services
            .string_to_binary("MAA=", StringFormat::new(Encoding::Any), None, &mut len)
            .unwrap();
        assert_eq!(2, len);
        assert_eq!(Encoding::Base64, info.format);
    }

    #[test]
    fn test_format_object_utf16() {
        let services = MemoryServices::new();
        let mut len = 0;
        services
            .format_object(X509, Default::default(), Some("2.5.29.21"), &[0x0a, 0x01, 0x04], None, &mut len)
            .unwrap();
        let mut buf = vec![0u16; len];
        services
            .format_object(X509, Default::default(), Some("2.5.29.21"), &[0x0a, 0x01, 0x04], Some(&mut buf[..]), &mut len)
            .unwrap();
        assert_eq!("Superseded (4)", String::from_utf16(&buf).unwrap());
    }
}
