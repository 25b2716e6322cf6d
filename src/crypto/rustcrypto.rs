use std::fmt;

use der::{Decode, Document};

use crate::{cert::DecodedCertificate, errors::PrefillError};

use super::{CryptoProvider, SafeBag};

#[derive(Debug)]
pub enum CryptoError {
    /// Malformed DER.
    Der(der::Error),

    /// PFX content uses an unsupported mode or could not be decrypted.
    Pkcs12(String),

    /// Integrity MAC does not match the password.
    MacMismatch,

    /// Certificate structure or PEM block rejected.
    Certificate(PrefillError),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::Der(err) => write!(f, "der: {}", err),
            CryptoError::Pkcs12(message) => write!(f, "pkcs12: {}", message),
            CryptoError::MacMismatch => write!(f, "pkcs12: mac verification failed"),
            CryptoError::Certificate(err) => write!(f, "certificate: {}", err),
        }
    }
}

impl std::error::Error for CryptoError {}

impl From<der::Error> for CryptoError {
    fn from(err: der::Error) -> Self {
        CryptoError::Der(err)
    }
}

impl From<PrefillError> for CryptoError {
    fn from(err: PrefillError) -> Self {
        CryptoError::Certificate(err)
    }
}

/// Pure Rust provider: `der` documents, `pkcs12`/`pkcs5` bags, `x509-cert` certificates.
#[derive(Clone, Copy, Debug, Default)]
pub struct RustCryptoProvider;

impl CryptoProvider for RustCryptoProvider {
    type Structure = Document;
    type Error = CryptoError;

    fn decode_der(&self, bytes: &[u8]) -> Result<Document, CryptoError> {
        Ok(Document::try_from(bytes)?)
    }

    fn unpack_pkcs12(
        &self,
        structure: &Document,
        password: &str,
    ) -> Result<Vec<SafeBag<Document>>, CryptoError> {
        super::pfx::unpack(structure.as_bytes(), password)
    }

    fn certificate_from_structure(
        &self,
        structure: &Document,
    ) -> Result<DecodedCertificate, CryptoError> {
        let cert = x509_cert::Certificate::from_der(structure.as_bytes())?;

        Ok((&cert).into())
    }

    fn certificate_from_pem(&self, text: &str) -> Result<DecodedCertificate, CryptoError> {
        Ok(DecodedCertificate::from_pem(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn certificates(bags: &[SafeBag<Document>]) -> Vec<DecodedCertificate> {
        bags.iter()
            .filter_map(SafeBag::certificate)
            .map(|doc| RustCryptoProvider.certificate_from_structure(doc).unwrap())
            .collect()
    }

    #[test]
    fn test_decode_der_rejects_text() {
        let result = RustCryptoProvider.decode_der(b"definitely not der");

        assert!(matches!(result, Err(CryptoError::Der(_))));
    }

    #[test]
    fn test_unpack_with_empty_password() {
        let doc = RustCryptoProvider
            .decode_der(include_bytes!("../testdata/bundle_nopass.p12"))
            .unwrap();
        let bags = RustCryptoProvider.unpack_pkcs12(&doc, "").unwrap();
        let certs = certificates(&bags);

        assert_eq!(certs.len(), 1);
        assert_eq!(certs[0].subject.to_string(), "O=Example Corp, CN=example.com");
        assert!(bags.iter().any(|bag| matches!(bag, SafeBag::ShroudedKey)));
    }

    #[test]
    fn test_unpack_requires_matching_password() {
        let doc = RustCryptoProvider
            .decode_der(include_bytes!("../testdata/bundle_hunter2.pfx"))
            .unwrap();

        assert!(RustCryptoProvider.unpack_pkcs12(&doc, "").is_err());
        assert!(RustCryptoProvider.unpack_pkcs12(&doc, "hunter3").is_err());

        let bags = RustCryptoProvider.unpack_pkcs12(&doc, "hunter2").unwrap();
        assert_eq!(certificates(&bags).len(), 1);
    }

    #[test]
    fn test_unpack_openssl3_defaults() {
        let doc = RustCryptoProvider
            .decode_der(include_bytes!("../testdata/bundle_aes_nopass.p12"))
            .unwrap();
        let bags = RustCryptoProvider.unpack_pkcs12(&doc, "").unwrap();
        assert_eq!(certificates(&bags)[0].subject.to_string(), "O=Example Corp, CN=example.com");

        let doc = RustCryptoProvider
            .decode_der(include_bytes!("../testdata/bundle_aes_hunter2.pfx"))
            .unwrap();
        assert!(matches!(
            RustCryptoProvider.unpack_pkcs12(&doc, ""),
            Err(CryptoError::MacMismatch)
        ));
        let bags = RustCryptoProvider.unpack_pkcs12(&doc, "hunter2").unwrap();
        assert_eq!(certificates(&bags).len(), 1);
    }

    #[test]
    fn test_unpack_keeps_bag_order() {
        let doc = RustCryptoProvider
            .decode_der(include_bytes!("../testdata/bundle_chain.p12"))
            .unwrap();
        let bags = RustCryptoProvider.unpack_pkcs12(&doc, "").unwrap();
        let certs = certificates(&bags);

        assert_eq!(certs.len(), 2);
        assert_eq!(certs[0].subject.to_string(), "CN=leaf.example.com");
        assert_eq!(certs[1].subject.to_string(), "O=Example Trust, CN=Example Root CA");
    }

    #[test]
    fn test_unpack_bundle_without_certificates() {
        let doc = RustCryptoProvider
            .decode_der(include_bytes!("../testdata/bundle_nocerts.p12"))
            .unwrap();
        let bags = RustCryptoProvider.unpack_pkcs12(&doc, "").unwrap();

        assert!(certificates(&bags).is_empty());
    }

    #[test]
    fn test_plain_certificate_is_not_a_bundle() {
        let doc = RustCryptoProvider
            .decode_der(include_bytes!("../testdata/der_example_net.cer"))
            .unwrap();

        assert!(RustCryptoProvider.unpack_pkcs12(&doc, "").is_err());
        assert!(RustCryptoProvider.certificate_from_structure(&doc).is_ok());
    }
}
