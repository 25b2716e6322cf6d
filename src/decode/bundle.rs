use log::{debug, warn};

use crate::{
    cert::DecodedCertificate,
    crypto::{CryptoProvider, SafeBag},
    errors::{PrefillError, PrefillErrorKind, PrefillResult},
};

/// Result of the first unpack attempt.
#[derive(Debug)]
pub enum BundleStep<S> {
    Decoded(DecodedCertificate),
    NeedsPassword(LockedBundle<S>),
}

/// A bundle the empty password did not open. Consumed by the single retry.
#[derive(Debug)]
pub struct LockedBundle<S> {
    structure: S,
    first_error: String,
}

/// PKCS#12 / PFX decoder: empty password first, then one caller supplied password.
pub struct BinaryBundleDecoder<P> {
    provider: P,
}

impl<P: CryptoProvider> BinaryBundleDecoder<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn decode(self: &Self, bytes: &[u8]) -> Result<BundleStep<P::Structure>, PrefillError> {
        let structure = self
            .provider
            .decode_der(bytes)
            .map_app_err(PrefillErrorKind::Asn1DecodeFailure)?;

        match self.provider.unpack_pkcs12(&structure, "") {
            Ok(bags) => Ok(BundleStep::Decoded(self.first_certificate(bags)?)),
            Err(err) => {
                debug!("empty password rejected, bundle needs a password: {}", err);
                Ok(BundleStep::NeedsPassword(LockedBundle {
                    structure,
                    first_error: err.to_string(),
                }))
            }
        }
    }

    pub fn resume(
        self: &Self,
        locked: LockedBundle<P::Structure>,
        password: &str,
    ) -> Result<DecodedCertificate, PrefillError> {
        let bags = self
            .provider
            .unpack_pkcs12(&locked.structure, password)
            .map_err(|err| {
                warn!("bundle still locked after supplied password");
                PrefillError {
                    kind: PrefillErrorKind::BundleUnpackFailure,
                    message: format!(
                        "2 attempts failed (empty: {}; supplied: {})",
                        locked.first_error, err
                    ),
                }
            })?;

        self.first_certificate(bags)
    }

    // First certificate bag wins, chain members are not told apart.
    fn first_certificate(
        self: &Self,
        bags: Vec<SafeBag<P::Structure>>,
    ) -> Result<DecodedCertificate, PrefillError> {
        let total = bags.len();
        let first = bags
            .iter()
            .find_map(SafeBag::certificate)
            .ok_or(PrefillError {
                kind: PrefillErrorKind::NoCertificateInBundle,
                message: format!("{} bags, none of them a certificate", total),
            })?;

        self.provider
            .certificate_from_structure(first)
            .map_app_err(PrefillErrorKind::DerDecodeFailure)
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        cert::AttributeKind,
        crypto::fake::{attribute, certificate, FakeProvider},
    };

    use super::*;

    fn unlocked(step: BundleStep<Vec<u8>>) -> DecodedCertificate {
        match step {
            BundleStep::Decoded(cert) => cert,
            BundleStep::NeedsPassword(_) => panic!("bundle unexpectedly locked"),
        }
    }

    fn locked(step: BundleStep<Vec<u8>>) -> LockedBundle<Vec<u8>> {
        match step {
            BundleStep::NeedsPassword(locked) => locked,
            BundleStep::Decoded(_) => panic!("bundle unexpectedly open"),
        }
    }

    fn leaf() -> DecodedCertificate {
        certificate(vec![attribute(AttributeKind::CommonName, "leaf")], 0)
    }

    fn root() -> DecodedCertificate {
        certificate(vec![attribute(AttributeKind::CommonName, "root")], 0)
    }

    #[test]
    fn test_asn1_failure_is_fatal() {
        let provider = FakeProvider::default();
        let err = BinaryBundleDecoder::new(&provider)
            .decode(b"PK\x03\x04")
            .unwrap_err();

        assert_eq!(err.kind, PrefillErrorKind::Asn1DecodeFailure);
        assert!(provider.attempts().is_empty());
    }

    #[test]
    fn test_empty_password_opens_bundle() {
        let provider = FakeProvider::with_bundle(
            None,
            vec![SafeBag::ShroudedKey, SafeBag::Certificate(vec![0x30, 1])],
            vec![(vec![0x30, 1], leaf())],
        );
        let cert = unlocked(BinaryBundleDecoder::new(&provider).decode(&[0x30]).unwrap());

        assert_eq!(cert, leaf());
        assert_eq!(provider.attempts(), vec![String::new()]);
    }

    #[test]
    fn test_first_certificate_bag_wins() {
        let provider = FakeProvider::with_bundle(
            None,
            vec![
                SafeBag::Other,
                SafeBag::Certificate(vec![0x30, 2]),
                SafeBag::Certificate(vec![0x30, 1]),
            ],
            vec![(vec![0x30, 1], leaf()), (vec![0x30, 2], root())],
        );
        let cert = unlocked(BinaryBundleDecoder::new(&provider).decode(&[0x30]).unwrap());

        assert_eq!(cert, root());
    }

    #[test]
    fn test_password_retry() {
        let provider = FakeProvider::with_bundle(
            Some("s3cret"),
            vec![SafeBag::Certificate(vec![0x30, 1])],
            vec![(vec![0x30, 1], leaf())],
        );
        let decoder = BinaryBundleDecoder::new(&provider);
        let pending = locked(decoder.decode(&[0x30]).unwrap());
        let cert = decoder.resume(pending, "s3cret").unwrap();

        assert_eq!(cert, leaf());
        assert_eq!(provider.attempts(), vec!["".to_owned(), "s3cret".to_owned()]);
    }

    #[test]
    fn test_wrong_password_is_terminal() {
        let provider = FakeProvider::with_bundle(Some("s3cret"), vec![], vec![]);
        let decoder = BinaryBundleDecoder::new(&provider);
        let pending = locked(decoder.decode(&[0x30]).unwrap());
        let err = decoder.resume(pending, "guess").unwrap_err();

        assert_eq!(err.kind, PrefillErrorKind::BundleUnpackFailure);
        assert!(err.message.starts_with("2 attempts failed"));
        assert_eq!(provider.attempts().len(), 2);
    }

    #[test]
    fn test_bundle_without_certificate_bags() {
        let provider = FakeProvider::with_bundle(None, vec![SafeBag::ShroudedKey], vec![]);
        let err = BinaryBundleDecoder::new(&provider)
            .decode(&[0x30])
            .unwrap_err();

        assert_eq!(err.kind, PrefillErrorKind::NoCertificateInBundle);
    }

    #[test]
    fn test_real_bundles() {
        use crate::crypto::RustCryptoProvider;

        let decoder = BinaryBundleDecoder::new(RustCryptoProvider);

        let cert = match decoder
            .decode(include_bytes!("../testdata/bundle_chain.p12"))
            .unwrap()
        {
            BundleStep::Decoded(cert) => cert,
            BundleStep::NeedsPassword(_) => panic!("chain bundle has an empty password"),
        };
        assert_eq!(cert.subject.to_string(), "CN=leaf.example.com");

        let pending = match decoder
            .decode(include_bytes!("../testdata/bundle_hunter2.pfx"))
            .unwrap()
        {
            BundleStep::NeedsPassword(pending) => pending,
            BundleStep::Decoded(_) => panic!("protected bundle opened without password"),
        };
        let cert = decoder.resume(pending, "hunter2").unwrap();
        assert_eq!(cert.subject.to_string(), "O=Example Corp, CN=example.com");

        let err = decoder
            .decode(include_bytes!("../testdata/bundle_nocerts.p12"))
            .unwrap_err();
        assert_eq!(err.kind, PrefillErrorKind::NoCertificateInBundle);
    }
}
