//! Enumeration of the contexts held in the services store.

use std::marker::PhantomData;

use certsvc::{CertServices, RawContext};
use tracing::warn;

use crate::context::{Context, ContextKind};
use crate::error::{Error, Result};

/// Iterates the stored contexts of kind `K`, each as an owned wrapper.
///
/// ```
/// use certsvc::{AddDisposition, EncodingType, MemoryServices, fixtures};
/// use cryptowrappers::{Crl, CrlKind, store_contexts};
///
/// let services = MemoryServices::new();
/// Crl::add_to_store(&services, EncodingType::X509_ASN, &fixtures::empty_crl(), AddDisposition::Always)
///     .unwrap();
/// let stored: Vec<_> = store_contexts::<CrlKind, _>(&services)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(1, stored.len());
/// ```
pub fn store_contexts<K, S>(services: &S) -> StoreContexts<'_, K, S>
where
    K: ContextKind,
    S: CertServices + ?Sized,
{
    StoreContexts {
        services,
        cursor: None,
        done: false,
        kind: PhantomData,
    }
}

/// Iterator returned by [`store_contexts`].
pub struct StoreContexts<'s, K: ContextKind, S: CertServices + ?Sized> {
    services: &'s S,
    // handle to the last yielded entry, owned by the iterator
    cursor: Option<RawContext>,
    done: bool,
    kind: PhantomData<K>,
}

impl<'s, K: ContextKind, S: CertServices + ?Sized> Iterator for StoreContexts<'s, K, S> {
    type Item = Result<Context<'s, K, S>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        // enum_store frees the previous cursor whatever it returns
        let next = self.services.enum_store(K::TYPE, self.cursor.take());
        let raw = match next {
            Ok(raw) => raw,
            Err(certsvc::Error::NoMoreItems) => {
                self.done = true;
                return None;
            }
            Err(source) => {
                self.done = true;
                return Some(Err(Error::Store(source)));
            }
        };
        self.cursor = Some(raw);
        Some(
            self.services
                .duplicate_context(raw)
                .map(|copy| Context::from_raw(self.services, copy))
                .map_err(|source| Error::Duplication {
                    kind: K::TYPE,
                    source,
                }),
        )
    }
}

impl<K: ContextKind, S: CertServices + ?Sized> Drop for StoreContexts<'_, K, S> {
    fn drop(&mut self) {
        if let Some(raw) = self.cursor.take() {
            if let Err(e) = self.services.free_context(raw) {
                warn!(%raw, error = %e, "failed to free store cursor");
            }
        }
    }
}
