use certsvc::{CertServices, CrlEntry, CrlInfo};

use crate::context::{Context, CrlKind};
use crate::error::{Error, Result, classify};

/// An owned certificate revocation list context.
pub type Crl<'s, S> = Context<'s, CrlKind, S>;

impl<S: CertServices + ?Sized> Crl<'_, S> {
    /// The entry revoking `certificate` (DER). A certificate from another
    /// issuer, or one that is not listed, is `NotFound`; one that does not
    /// parse is reported as it came from the services layer.
    pub fn find_certificate(&self, certificate: &[u8]) -> Result<CrlEntry> {
        let raw = self.handle()?;
        self.services()
            .find_certificate_in_crl(raw, certificate)
            .map_err(|source| match source {
                certsvc::Error::Der(_) => Error::Services(source),
                source => classify(source, "certificate", Error::Store),
            })?
            .ok_or(Error::NotFound("certificate"))
    }

    pub fn info(&self) -> Result<CrlInfo> {
        let raw = self.handle()?;
        Ok(self.services().crl_info(raw)?)
    }
}
