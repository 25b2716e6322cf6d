use crate::{
    cert::{DecodedCertificate, PEM_BEGIN_MARKER},
    crypto::CryptoProvider,
    errors::{PrefillError, PrefillErrorKind, PrefillResult},
};

pub struct PemDecoder<P> {
    provider: P,
}

impl<P: CryptoProvider> PemDecoder<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Text without a certificate begin marker is rejected before any decoding.
    pub fn decode(self: &Self, text: &str) -> Result<DecodedCertificate, PrefillError> {
        if !text.contains(PEM_BEGIN_MARKER) {
            return Err(PrefillError {
                kind: PrefillErrorKind::InvalidPem,
                message: "missing certificate begin marker".to_owned(),
            });
        }

        self.provider
            .certificate_from_pem(text)
            .map_app_err(PrefillErrorKind::InvalidPem)
    }
}
