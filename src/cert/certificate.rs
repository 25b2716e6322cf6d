use std::{io::Read, time::Duration};

use der::Decode;

use crate::errors::{PrefillError, PrefillErrorKind, PrefillResult};

use super::name::SubjectName;

pub const PEM_BEGIN_MARKER: &str = "-----BEGIN CERTIFICATE-----";
pub const PEM_END_MARKER: &str = "-----END CERTIFICATE-----";

/// The parts of an X.509 certificate the form cares about.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedCertificate {
    pub subject: SubjectName,
    pub issuer: SubjectName,
    pub validity: Validity,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Validity {
    pub not_before: Duration,
    pub not_after: Duration,
}

impl From<&x509_cert::time::Validity> for Validity {
    fn from(value: &x509_cert::time::Validity) -> Self {
        Self {
            not_before: value.not_before.to_unix_duration(),
            not_after: value.not_after.to_unix_duration(),
        }
    }
}

impl From<&x509_cert::Certificate> for DecodedCertificate {
    fn from(value: &x509_cert::Certificate) -> Self {
        Self {
            subject: (&value.tbs_certificate.subject).into(),
            issuer: (&value.tbs_certificate.issuer).into(),
            validity: (&value.tbs_certificate.validity).into(),
        }
    }
}

impl DecodedCertificate {
    pub fn from_der(bytes: &[u8]) -> Result<Self, PrefillError> {
        let cert = x509_cert::Certificate::from_der(bytes)
            .map_app_err(PrefillErrorKind::DerDecodeFailure)?;

        Ok((&cert).into())
    }

    /// Decodes the first CERTIFICATE block found in `input`.
    pub fn from_pem(input: &str) -> Result<Self, PrefillError> {
        let cert_buf = first_pem_block(input.as_bytes()).ok_or(PrefillError {
            kind: PrefillErrorKind::InvalidPem,
            message: "no complete CERTIFICATE block".to_owned(),
        })?;

        // Line width differs between producers, so let the decoder detect it.
        let mut decoder = pem_rfc7468::Decoder::new_detect_wrap(cert_buf)
            .map_app_err(PrefillErrorKind::InvalidPem)?;
        let mut buf = vec![];
        decoder
            .read_to_end(&mut buf)
            .map_app_err(PrefillErrorKind::InvalidPem)?;
        let cert =
            x509_cert::Certificate::from_der(&buf).map_app_err(PrefillErrorKind::InvalidPem)?;

        Ok((&cert).into())
    }
}

fn find_boundary<T>(haystack: &[T], needle: &[T]) -> Option<usize>
where
    for<'a> &'a [T]: PartialEq,
{
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn first_pem_block(input: &[u8]) -> Option<&[u8]> {
    let start_boundary = PEM_BEGIN_MARKER.as_bytes();
    let end_boundary = PEM_END_MARKER.as_bytes();

    let start_pos = find_boundary(input, start_boundary)?;
    let rest = &input[start_pos..];
    let end_pos = find_boundary(rest, end_boundary)? + end_boundary.len();

    Some(&rest[..end_pos])
}
