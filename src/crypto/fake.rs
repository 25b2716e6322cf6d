//! In-memory provider for exercising decoders and the pipeline without real bundles.

use std::{cell::RefCell, collections::HashMap, fmt, time::Duration};

use crate::cert::{AttributeKind, DecodedCertificate, SubjectAttribute, SubjectName, Validity};

use super::{CryptoProvider, SafeBag};

#[derive(Debug)]
pub struct FakeError(pub String);

impl fmt::Display for FakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for FakeError {}

/// Structures are plain byte vectors; anything starting with 0x30 is "DER".
#[derive(Default)]
pub struct FakeProvider {
    /// `None` accepts every password.
    pub bundle_password: Option<String>,
    pub bags: Vec<SafeBag<Vec<u8>>>,
    pub certificates: HashMap<Vec<u8>, DecodedCertificate>,
    pub pem_certificate: Option<DecodedCertificate>,
    pub unpack_attempts: RefCell<Vec<String>>,
}

impl FakeProvider {
    pub fn with_bundle(
        password: Option<&str>,
        bags: Vec<SafeBag<Vec<u8>>>,
        certificates: Vec<(Vec<u8>, DecodedCertificate)>,
    ) -> Self {
        Self {
            bundle_password: password.map(str::to_owned),
            bags,
            certificates: certificates.into_iter().collect(),
            ..Default::default()
        }
    }

    pub fn attempts(&self) -> Vec<String> {
        self.unpack_attempts.borrow().clone()
    }
}

impl CryptoProvider for FakeProvider {
    type Structure = Vec<u8>;
    type Error = FakeError;

    fn decode_der(&self, bytes: &[u8]) -> Result<Vec<u8>, FakeError> {
        match bytes.first() {
            Some(0x30) => Ok(bytes.to_vec()),
            _ => Err(FakeError("not a sequence".to_owned())),
        }
    }

    fn unpack_pkcs12(
        &self,
        _structure: &Vec<u8>,
        password: &str,
    ) -> Result<Vec<SafeBag<Vec<u8>>>, FakeError> {
        self.unpack_attempts.borrow_mut().push(password.to_owned());

        match &self.bundle_password {
            Some(expected) if expected != password => Err(FakeError("mac mismatch".to_owned())),
            _ => Ok(self.bags.clone()),
        }
    }

    fn certificate_from_structure(
        &self,
        structure: &Vec<u8>,
    ) -> Result<DecodedCertificate, FakeError> {
        self.certificates
            .get(structure)
            .cloned()
            .ok_or(FakeError("unknown certificate".to_owned()))
    }

    fn certificate_from_pem(&self, _text: &str) -> Result<DecodedCertificate, FakeError> {
        self.pem_certificate
            .clone()
            .ok_or(FakeError("bad pem".to_owned()))
    }
}

pub fn attribute(kind: AttributeKind, value: &str) -> SubjectAttribute {
    let (name, short_name) = match &kind {
        AttributeKind::CommonName => ("commonName", "CN"),
        AttributeKind::OrganizationName => ("organizationName", "O"),
        AttributeKind::Other(_) => ("countryName", "C"),
    };

    SubjectAttribute {
        kind,
        name: name.to_owned(),
        short_name: short_name.to_owned(),
        value: Some(value.to_owned()),
        raw_value: value.as_bytes().to_vec(),
    }
}

pub fn certificate(subject: Vec<SubjectAttribute>, not_after: u64) -> DecodedCertificate {
    DecodedCertificate {
        subject: SubjectName(subject),
        issuer: SubjectName::default(),
        validity: Validity {
            not_before: Duration::from_secs(0),
            not_after: Duration::from_secs(not_after),
        },
    }
}
