//! Boundary to the ASN.1 / X.509 / PKCS#12 primitives.
//!
//! Decoders only talk to [`CryptoProvider`], so the pipeline can run against
//! [`RustCryptoProvider`] in production and against fakes in tests.

#[cfg(test)]
pub(crate) mod fake;
mod pfx;
mod rustcrypto;

pub use pfx::MacDigest;
pub use rustcrypto::{CryptoError, RustCryptoProvider};

use crate::cert::DecodedCertificate;

/// One entry of an unpacked PKCS#12 bundle, in bag order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SafeBag<S> {
    /// Certificate bag holding an X.509 certificate structure.
    Certificate(S),

    /// PKCS#8 shrouded key bag.
    ShroudedKey,

    /// Any other bag type.
    Other,
}

impl<S> SafeBag<S> {
    pub fn certificate(self: &Self) -> Option<&S> {
        match self {
            SafeBag::Certificate(structure) => Some(structure),
            _ => None,
        }
    }
}

pub trait CryptoProvider {
    /// Decoded DER structure.
    type Structure;
    type Error: std::error::Error + 'static;

    fn decode_der(&self, bytes: &[u8]) -> Result<Self::Structure, Self::Error>;

    fn unpack_pkcs12(
        &self,
        structure: &Self::Structure,
        password: &str,
    ) -> Result<Vec<SafeBag<Self::Structure>>, Self::Error>;

    fn certificate_from_structure(
        &self,
        structure: &Self::Structure,
    ) -> Result<DecodedCertificate, Self::Error>;

    fn certificate_from_pem(&self, text: &str) -> Result<DecodedCertificate, Self::Error>;
}

impl<P: CryptoProvider + ?Sized> CryptoProvider for &P {
    type Structure = P::Structure;
    type Error = P::Error;

    fn decode_der(&self, bytes: &[u8]) -> Result<Self::Structure, Self::Error> {
        (**self).decode_der(bytes)
    }

    fn unpack_pkcs12(
        &self,
        structure: &Self::Structure,
        password: &str,
    ) -> Result<Vec<SafeBag<Self::Structure>>, Self::Error> {
        (**self).unpack_pkcs12(structure, password)
    }

    fn certificate_from_structure(
        &self,
        structure: &Self::Structure,
    ) -> Result<DecodedCertificate, Self::Error> {
        (**self).certificate_from_structure(structure)
    }

    fn certificate_from_pem(&self, text: &str) -> Result<DecodedCertificate, Self::Error> {
        (**self).certificate_from_pem(text)
    }
}
