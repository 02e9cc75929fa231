use certsvc::{CertServices, CtlEntry, CtlInfo, EncodingType, SortedCursor, SortedSubject, Subject};

use crate::context::{Context, CtlKind};
use crate::error::{Error, Result, classify};
use crate::helpers::query_then_fill;

/// An owned certificate trust list context.
pub type Ctl<'s, S> = Context<'s, CtlKind, S>;

impl<'s, S: CertServices + ?Sized> Ctl<'s, S> {
    /// Looks `subject` up. A certificate subject is matched by hashing it
    /// with the list's subject algorithm.
    pub fn find_subject(&self, encoding: EncodingType, subject: &Subject<'_>) -> Result<CtlEntry> {
        let raw = self.handle()?;
        self.services()
            .find_subject_in_ctl(raw, encoding, subject)
            .map_err(|source| classify(source, "subject", Error::Store))
    }

    /// Encoded attributes of the subject with `identifier`.
    pub fn find_subject_in_sorted(&self, identifier: &[u8]) -> Result<Vec<u8>> {
        let raw = self.handle()?;
        query_then_fill(|out, len| {
            self.services()
                .find_subject_in_sorted_ctl(raw, identifier, out, len)
        })
        .map_err(|source| classify(source, "subject", Error::Store))
    }

    /// The subject at `cursor` in identifier order, and the cursor of the
    /// next one.
    pub fn enum_subject_in_sorted(
        &self,
        cursor: SortedCursor,
    ) -> Result<(SortedSubject, SortedCursor)> {
        let raw = self.handle()?;
        self.services()
            .enum_subject_in_sorted_ctl(raw, cursor)
            .map_err(|source| classify(source, "subject", Error::Store))
    }

    /// Iterates subjects in identifier order.
    pub fn sorted_subjects(&self) -> SortedSubjects<'_, 's, S> {
        SortedSubjects {
            ctl: self,
            cursor: Some(SortedCursor::START),
        }
    }

    pub fn info(&self) -> Result<CtlInfo> {
        let raw = self.handle()?;
        Ok(self.services().ctl_info(raw)?)
    }
}

/// Iterator returned by [`Ctl::sorted_subjects`].
pub struct SortedSubjects<'c, 's, S: CertServices + ?Sized> {
    ctl: &'c Ctl<'s, S>,
    // None once exhausted
    cursor: Option<SortedCursor>,
}

impl<S: CertServices + ?Sized> Iterator for SortedSubjects<'_, '_, S> {
    type Item = Result<SortedSubject>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.take()?;
        match self.ctl.enum_subject_in_sorted(cursor) {
            Ok((subject, next)) => {
                self.cursor = Some(next);
                Some(Ok(subject))
            }
            Err(Error::NoMoreItems) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use certsvc::{EncodingType, MemoryServices, SortedCursor, fixtures};

    use super::Ctl;
    use crate::error::Error;

    #[test]
    fn test_sorted_subjects_order() {
        let services = MemoryServices::new();
        let ctl = Ctl::decode(
            &services,
            EncodingType::PKCS_7_ASN,
            &fixtures::ctl(&[&[3; 20], &[1; 20], &[2; 20]]),
        )
        .unwrap();
        let ids: Vec<Vec<u8>> = ctl
            .sorted_subjects()
            .map(|s| s.map(|s| s.identifier))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(vec![vec![1; 20], vec![2; 20], vec![3; 20]], ids);
    }

    #[test]
    fn test_enum_past_end() {
        let services = MemoryServices::new();
        let ctl = Ctl::decode(&services, EncodingType::PKCS_7_ASN, &fixtures::ctl(&[&[1; 20]])).unwrap();
        let (_, next) = ctl.enum_subject_in_sorted(SortedCursor::START).unwrap();
        assert!(matches!(ctl.enum_subject_in_sorted(next), Err(Error::NoMoreItems)));
    }

    #[test]
    fn test_empty_list_has_no_subjects() {
        let services = MemoryServices::new();
        let ctl = Ctl::decode(&services, EncodingType::PKCS_7_ASN, &fixtures::ctl(&[])).unwrap();
        assert_eq!(0, ctl.sorted_subjects().count());
        assert!(matches!(
            ctl.find_subject_in_sorted(&[1; 20]),
            Err(Error::NotFound("subject"))
        ));
    }
}
