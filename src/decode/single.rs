use log::debug;

use crate::{
    cert::{DecodedCertificate, PEM_BEGIN_MARKER},
    crypto::CryptoProvider,
    errors::{PrefillError, PrefillErrorKind},
};

use super::PemDecoder;

/// Decoder for `.cer` files, which show up as both DER and PEM.
pub struct SingleCertDecoder<P> {
    provider: P,
}

impl<P: CryptoProvider> SingleCertDecoder<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn decode(self: &Self, bytes: &[u8]) -> Result<DecodedCertificate, PrefillError> {
        let der_error = match self
            .provider
            .decode_der(bytes)
            .and_then(|structure| self.provider.certificate_from_structure(&structure))
        {
            Ok(cert) => return Ok(cert),
            Err(err) => err,
        };

        let text = String::from_utf8_lossy(bytes);
        if text.contains(PEM_BEGIN_MARKER) {
            debug!("DER decode failed, retrying as PEM text: {}", der_error);
            return PemDecoder::new(&self.provider).decode(&text);
        }

        Err(PrefillError {
            kind: PrefillErrorKind::DerDecodeFailure,
            message: der_error.to_string(),
        })
    }
}
