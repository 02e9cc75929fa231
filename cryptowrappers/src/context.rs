//! The owning context wrapper shared by revocation lists and trust lists.

use std::fmt;
use std::marker::PhantomData;

use certsvc::{AddDisposition, CertServices, ContextType, EncodingType, PropId, RawContext};
use tracing::{debug, warn};

use crate::error::{Error, Result, classify};
use crate::helpers::query_then_fill;
use crate::property::Property;

/// Marker for the kind of context a [`Context`] owns.
pub trait ContextKind {
    const TYPE: ContextType;
    /// Encoding passed to the services layer when decoding.
    const ENCODING: EncodingType;
}

/// Certificate revocation lists.
#[derive(Debug)]
pub enum CrlKind {}

impl ContextKind for CrlKind {
    const TYPE: ContextType = ContextType::Crl;
    const ENCODING: EncodingType = EncodingType::X509_ASN;
}

/// Certificate trust lists.
#[derive(Debug)]
pub enum CtlKind {}

impl ContextKind for CtlKind {
    const TYPE: ContextType = ContextType::Ctl;
    const ENCODING: EncodingType = EncodingType::PKCS_7_ASN;
}

/// Owns zero or one services-layer context handle.
///
/// The handle is freed when the wrapper is dropped. Wrappers are not
/// `Clone`: a second owner is made with [`Context::duplicate`], which asks
/// the services layer for a new reference to the same decoded object.
pub struct Context<'s, K: ContextKind, S: CertServices + ?Sized> {
    services: &'s S,
    raw: Option<RawContext>,
    kind: PhantomData<K>,
}

impl<'s, K: ContextKind, S: CertServices + ?Sized> Context<'s, K, S> {
    /// An empty wrapper.
    pub fn new(services: &'s S) -> Self {
        Context {
            services,
            raw: None,
            kind: PhantomData,
        }
    }

    /// Decodes `encoded` into a new wrapper.
    pub fn decode(services: &'s S, encoding: EncodingType, encoded: &[u8]) -> Result<Self> {
        let mut context = Self::new(services);
        context.create(encoding, encoded)?;
        Ok(context)
    }

    /// Takes ownership of `raw` without checking it.
    pub fn from_raw(services: &'s S, raw: RawContext) -> Self {
        Context {
            services,
            raw: Some(raw),
            kind: PhantomData,
        }
    }

    /// Decodes `encoded` and adds it to the store; the wrapper owns a handle
    /// to whatever context ends up stored.
    pub fn add_to_store(
        services: &'s S,
        encoding: EncodingType,
        encoded: &[u8],
        disposition: AddDisposition,
    ) -> Result<Self> {
        let raw = services
            .add_encoded_context_to_store(K::TYPE, encoding, encoded, disposition)
            .map_err(|source| match source {
                certsvc::Error::Exists => Error::Store(source),
                source => Error::Decode {
                    kind: K::TYPE,
                    source,
                },
            })?;
        debug!(%raw, kind = %K::TYPE, ?disposition, "context added to store");
        Ok(Self::from_raw(services, raw))
    }

    /// Adds a serialized store element (see [`Context::serialize_store_element`]).
    pub fn from_store_element(
        services: &'s S,
        element: &[u8],
        disposition: AddDisposition,
    ) -> Result<Self> {
        let (kind, raw) = services
            .add_serialized_element(element, disposition)
            .map_err(Error::Store)?;
        let context = Self::from_raw(services, raw);
        if kind != K::TYPE {
            // dropping the wrapper frees the handle
            return Err(Error::Store(certsvc::Error::InvalidParameter(format!(
                "store element holds a {}, expected a {}",
                kind,
                K::TYPE
            ))));
        }
        Ok(context)
    }

    /// Decodes `encoded` into this empty wrapper. On failure the wrapper
    /// stays empty.
    pub fn create(&mut self, encoding: EncodingType, encoded: &[u8]) -> Result<()> {
        if self.raw.is_some() {
            return Err(Error::Occupied);
        }
        let raw = self
            .services
            .create_context(K::TYPE, encoding, encoded)
            .map_err(|source| Error::Decode {
                kind: K::TYPE,
                source,
            })?;
        debug!(%raw, kind = %K::TYPE, len = encoded.len(), "context created");
        self.raw = Some(raw);
        Ok(())
    }

    /// Takes ownership of `raw`. The wrapper must be empty.
    pub fn attach(&mut self, raw: RawContext) -> Result<()> {
        if self.raw.is_some() {
            return Err(Error::Occupied);
        }
        debug!(%raw, kind = %K::TYPE, "context attached");
        self.raw = Some(raw);
        Ok(())
    }

    /// Gives up ownership of the handle; the caller must free it.
    pub fn detach(&mut self) -> Option<RawContext> {
        let raw = self.raw.take();
        if let Some(raw) = raw {
            debug!(%raw, kind = %K::TYPE, "context detached");
        }
        raw
    }

    /// Frees the handle. The wrapper is empty afterwards even when the
    /// services layer fails to free it.
    pub fn release(&mut self) -> Result<()> {
        let raw = self.raw.take().ok_or(Error::Empty)?;
        self.services
            .free_context(raw)
            .map_err(|source| Error::Release {
                kind: K::TYPE,
                source,
            })?;
        debug!(%raw, kind = %K::TYPE, "context released");
        Ok(())
    }

    /// A new wrapper owning another reference to the same context.
    pub fn duplicate(&self) -> Result<Self> {
        let raw = self.handle()?;
        let copy = self
            .services
            .duplicate_context(raw)
            .map_err(|source| Error::Duplication {
                kind: K::TYPE,
                source,
            })?;
        debug!(%raw, %copy, kind = %K::TYPE, "context duplicated");
        Ok(Self::from_raw(self.services, copy))
    }

    /// Duplicates into `target`, which must be empty.
    pub fn duplicate_into(&self, target: &mut Self) -> Result<()> {
        if target.raw.is_some() {
            return Err(Error::Occupied);
        }
        let mut copy = self.duplicate()?;
        target.raw = copy.raw.take();
        Ok(())
    }

    /// Like [`Context::duplicate`], but a failure yields an empty wrapper.
    pub fn duplicate_or_empty(&self) -> Self {
        match self.duplicate() {
            Ok(copy) => copy,
            Err(Error::Empty) => Self::new(self.services),
            Err(e) => {
                warn!(error = %e, kind = %K::TYPE, "duplication failed, using an empty context");
                Self::new(self.services)
            }
        }
    }

    /// Removes the context from its store. The wrapper is empty afterwards
    /// whatever the outcome; other duplicates stay valid.
    pub fn delete_from_store(&mut self) -> Result<()> {
        let raw = self.raw.take().ok_or(Error::Empty)?;
        self.services
            .delete_context_from_store(raw)
            .map_err(|source| classify(source, "stored context", Error::Store))?;
        debug!(%raw, kind = %K::TYPE, "context deleted from store");
        Ok(())
    }

    /// The exact encoded bytes the context was created from.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let raw = self.handle()?;
        query_then_fill(|out, len| self.services.encoded_context(raw, out, len)).map_err(
            |source| Error::Serialization {
                kind: K::TYPE,
                source,
            },
        )
    }

    /// The context and its properties in the store element format, for
    /// [`Context::from_store_element`].
    pub fn serialize_store_element(&self) -> Result<Vec<u8>> {
        let raw = self.handle()?;
        query_then_fill(|out, len| self.services.serialize_store_element(raw, out, len)).map_err(
            |source| Error::Serialization {
                kind: K::TYPE,
                source,
            },
        )
    }

    /// Raw value of property `id`.
    pub fn property(&self, id: PropId) -> Result<Vec<u8>> {
        let raw = self.handle()?;
        query_then_fill(|out, len| self.services.get_property(raw, id, out, len))
            .map_err(|source| classify(source, "property", |source| Error::Property { id, source }))
    }

    /// Sets property `id`, or deletes it when `value` is `None`.
    pub fn set_property(&self, id: PropId, flags: u32, value: Option<&[u8]>) -> Result<()> {
        let raw = self.handle()?;
        self.services
            .set_property(raw, id, flags, value)
            .map_err(|source| Error::Property { id, source })
    }

    /// The first property set after `after`; start with [`PropId::NONE`].
    pub fn next_property(&self, after: PropId) -> Result<PropId> {
        let raw = self.handle()?;
        self.services
            .enum_properties(raw, after)
            .map_err(|source| classify(source, "property", |source| Error::Property { id: after, source }))
    }

    /// Iterates the ids of the properties currently set.
    pub fn property_ids(&self) -> PropertyIds<'_, 's, K, S> {
        PropertyIds {
            context: self,
            last: PropId::NONE,
            done: false,
        }
    }

    pub fn get<P: Property>(&self) -> Result<P::Value> {
        let bytes = self.property(P::ID)?;
        P::decode(&bytes).map_err(|source| Error::Property { id: P::ID, source })
    }

    pub fn set<P: Property>(&self, value: &P::Value) -> Result<()> {
        self.set_property(P::ID, 0, Some(P::encode(value).as_slice()))
    }

    pub fn remove<P: Property>(&self) -> Result<()> {
        self.set_property(P::ID, 0, None)
    }

    /// Moves the handle into a new wrapper, leaving this one empty.
    pub fn take(&mut self) -> Self {
        Context {
            services: self.services,
            raw: self.raw.take(),
            kind: PhantomData,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_none()
    }

    pub fn as_raw(&self) -> Option<RawContext> {
        self.raw
    }

    pub fn services(&self) -> &'s S {
        self.services
    }

    pub(crate) fn handle(&self) -> Result<RawContext> {
        self.raw.ok_or(Error::Empty)
    }
}

impl<K: ContextKind, S: CertServices + ?Sized> Drop for Context<'_, K, S> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            match self.services.free_context(raw) {
                Ok(()) => debug!(%raw, kind = %K::TYPE, "context dropped"),
                Err(e) => warn!(%raw, kind = %K::TYPE, error = %e, "failed to free context"),
            }
        }
    }
}

impl<K: ContextKind, S: CertServices + ?Sized> fmt::Debug for Context<'_, K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("kind", &K::TYPE)
            .field("raw", &self.raw)
            .finish()
    }
}

/// Iterator returned by [`Context::property_ids`].
pub struct PropertyIds<'c, 's, K: ContextKind, S: CertServices + ?Sized> {
    context: &'c Context<'s, K, S>,
    last: PropId,
    done: bool,
}

impl<K: ContextKind, S: CertServices + ?Sized> Iterator for PropertyIds<'_, '_, K, S> {
    type Item = Result<PropId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.context.next_property(self.last) {
            Ok(id) => {
                self.last = id;
                Some(Ok(id))
            }
            Err(Error::NoMoreItems) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
