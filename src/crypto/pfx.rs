//! PKCS#12 password integrity and privacy modes (RFC 7292) on top of the
//! `pkcs12`/`cms` structures.
//!
//! Integrity: HMAC over the authenticated safe with a SHA-1 or SHA-2 digest,
//! keyed through the PKCS#12 KDF. Privacy: PBES2 (PBKDF2 + AES/DES, what
//! OpenSSL 3 writes by default) and the legacy PKCS#12 PBE schemes
//! (3DES, RC2) older tools still produce.

use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, KeyIvInit};
use cms::{content_info::ContentInfo, encrypted_data::EncryptedData};
use der::{
    asn1::{BmpString, ContextSpecific, OctetString},
    oid::{
        db::{
            rfc5911::{ID_DATA, ID_ENCRYPTED_DATA},
            rfc5912::{ID_SHA_1, ID_SHA_224, ID_SHA_256, ID_SHA_384, ID_SHA_512},
        },
        ObjectIdentifier,
    },
    Decode, Document, Encode,
};
use des::TdesEde3;
use digest::{core_api::BlockSizeUser, Digest, FixedOutputReset};
use hmac::{Mac, SimpleHmac};
use pkcs12::{
    cert_type::CertBag,
    kdf::{derive_key, Pkcs12KeyType},
    mac_data::MacData,
    pbe_params::Pkcs12PbeParams,
    pfx::Pfx,
    safe_bag::SafeContents,
    PKCS_12_CERT_BAG_OID, PKCS_12_PBEWITH_SHAAND40_BIT_RC2_CBC,
    PKCS_12_PBE_WITH_SHAAND128_BIT_RC2_CBC, PKCS_12_PBE_WITH_SHAAND3_KEY_TRIPLE_DES_CBC,
    PKCS_12_PKCS8_KEY_BAG_OID, PKCS_12_SAFE_CONTENTS_BAG_OID, PKCS_12_X509_CERT_OID,
};
use rc2::Rc2;
use sha1::Sha1;
use sha2::{Sha224, Sha256, Sha384, Sha512};
use x509_cert::spki::AlgorithmIdentifierOwned;

use super::{CryptoError, SafeBag};

/// Digest behind the integrity HMAC.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MacDigest {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Unsupported(String),
}

impl From<ObjectIdentifier> for MacDigest {
    fn from(oid: ObjectIdentifier) -> Self {
        match oid {
            ID_SHA_1 => Self::Sha1,
            ID_SHA_224 => Self::Sha224,
            ID_SHA_256 => Self::Sha256,
            ID_SHA_384 => Self::Sha384,
            ID_SHA_512 => Self::Sha512,
            oid => Self::Unsupported(oid.to_string()),
        }
    }
}

impl MacDigest {
    /// `password` is the BMP encoded password including its terminator.
    pub fn verify(
        self: &Self,
        mac_data: &MacData,
        data: &[u8],
        password: &[u8],
    ) -> Result<bool, CryptoError> {
        match self {
            MacDigest::Sha1 => Ok(hmac_matches::<Sha1>(mac_data, data, password)),
            MacDigest::Sha224 => Ok(hmac_matches::<Sha224>(mac_data, data, password)),
            MacDigest::Sha256 => Ok(hmac_matches::<Sha256>(mac_data, data, password)),
            MacDigest::Sha384 => Ok(hmac_matches::<Sha384>(mac_data, data, password)),
            MacDigest::Sha512 => Ok(hmac_matches::<Sha512>(mac_data, data, password)),
            MacDigest::Unsupported(oid) => Err(CryptoError::Pkcs12(format!(
                "unsupported mac digest: {}",
                oid
            ))),
        }
    }
}

fn hmac_matches<D>(mac_data: &MacData, data: &[u8], password: &[u8]) -> bool
where
    D: Digest + FixedOutputReset + BlockSizeUser,
{
    let key = derive_key::<D>(
        password,
        mac_data.mac_salt.as_bytes(),
        Pkcs12KeyType::Mac,
        mac_data.iterations,
        <D as Digest>::output_size(),
    );

    let Ok(mut mac) = <SimpleHmac<D> as Mac>::new_from_slice(&key) else {
        return false;
    };
    Mac::update(&mut mac, data);
    mac.verify_slice(mac_data.mac.digest.as_bytes()).is_ok()
}

/// The two password encodings PKCS#12 needs: UTF-8 for PBES2 and
/// null terminated BMP for the PKCS#12 KDF.
struct Secret<'a> {
    text: &'a str,
    bmp: Vec<u8>,
}

/// Verifies the integrity MAC and returns the BMP password that matched it.
fn integrity_password(
    mac_data: Option<&MacData>,
    data: &[u8],
    password: &str,
) -> Result<Vec<u8>, CryptoError> {
    let mut bmp = Vec::from(BmpString::from_utf8(password)?.into_bytes());
    bmp.extend([0, 0]);

    let Some(mac_data) = mac_data else {
        return Ok(bmp);
    };

    let digest = MacDigest::from(mac_data.mac.algorithm.oid);
    if digest.verify(mac_data, data, &bmp)? {
        return Ok(bmp);
    }
    // Some writers key the empty password with no bytes at all.
    if password.is_empty() && digest.verify(mac_data, data, &[])? {
        return Ok(vec![]);
    }

    Err(CryptoError::MacMismatch)
}

/// Opens a DER encoded PFX with `password` and lists its bags in order.
pub fn unpack(der: &[u8], password: &str) -> Result<Vec<SafeBag<Document>>, CryptoError> {
    let pfx = Pfx::from_der(der)?;

    if pfx.auth_safe.content_type != ID_DATA {
        return Err(CryptoError::Pkcs12(format!(
            "unsupported integrity mode: {}",
            pfx.auth_safe.content_type
        )));
    }

    let data = pfx.auth_safe.content.decode_as::<OctetString>()?;
    let secret = Secret {
        text: password,
        bmp: integrity_password(pfx.mac_data.as_ref(), data.as_bytes(), password)?,
    };

    let mut bags = vec![];
    for content in Vec::<ContentInfo>::from_der(data.as_bytes())? {
        let safe_contents = match content.content_type {
            ID_DATA => content
                .content
                .decode_as::<OctetString>()?
                .as_bytes()
                .to_vec(),
            ID_ENCRYPTED_DATA => {
                let encrypted = content.content.decode_as::<EncryptedData>()?;
                let info = &encrypted.enc_content_info;
                let ciphertext = info
                    .encrypted_content
                    .as_ref()
                    .map(OctetString::as_bytes)
                    .unwrap_or_default();

                decrypt(&info.content_enc_alg, ciphertext, &secret)?
            }
            oid => {
                return Err(CryptoError::Pkcs12(format!(
                    "unsupported safe content type: {}",
                    oid
                )))
            }
        };

        collect_bags(SafeContents::from_der(&safe_contents)?, &mut bags)?;
    }

    Ok(bags)
}

fn collect_bags(
    contents: SafeContents,
    bags: &mut Vec<SafeBag<Document>>,
) -> Result<(), CryptoError> {
    for bag in contents {
        match bag.bag_id {
            PKCS_12_CERT_BAG_OID => {
                let cert_bag = ContextSpecific::<CertBag>::from_der(&bag.bag_value)?.value;

                if cert_bag.cert_id == PKCS_12_X509_CERT_OID {
                    let cert = Document::try_from(cert_bag.cert_value.as_bytes())?;
                    bags.push(SafeBag::Certificate(cert));
                } else {
                    bags.push(SafeBag::Other);
                }
            }
            PKCS_12_PKCS8_KEY_BAG_OID => bags.push(SafeBag::ShroudedKey),
            PKCS_12_SAFE_CONTENTS_BAG_OID => {
                let nested = ContextSpecific::<SafeContents>::from_der(&bag.bag_value)?.value;
                collect_bags(nested, bags)?;
            }
            _ => bags.push(SafeBag::Other),
        }
    }

    Ok(())
}

fn decrypt(
    alg: &AlgorithmIdentifierOwned,
    ciphertext: &[u8],
    secret: &Secret<'_>,
) -> Result<Vec<u8>, CryptoError> {
    match alg.oid {
        pkcs5::pbes2::PBES2_OID => {
            let encoded = alg.to_der()?;
            let scheme = pkcs5::EncryptionScheme::try_from(encoded.as_slice())?;

            scheme
                .decrypt(secret.text, ciphertext)
                .map_err(|err| CryptoError::Pkcs12(format!("pbes2: {}", err)))
        }
        PKCS_12_PBE_WITH_SHAAND3_KEY_TRIPLE_DES_CBC => {
            pkcs12_pbe::<cbc::Decryptor<TdesEde3>>(alg, ciphertext, secret, 24)
        }
        PKCS_12_PBE_WITH_SHAAND128_BIT_RC2_CBC => {
            pkcs12_pbe::<cbc::Decryptor<Rc2>>(alg, ciphertext, secret, 16)
        }
        PKCS_12_PBEWITH_SHAAND40_BIT_RC2_CBC => {
            pkcs12_pbe::<cbc::Decryptor<Rc2>>(alg, ciphertext, secret, 5)
        }
        oid => Err(CryptoError::Pkcs12(format!(
            "unsupported encryption scheme: {}",
            oid
        ))),
    }
}

// Key and IV both come from the SHA-1 PKCS#12 KDF.
fn pkcs12_pbe<C>(
    alg: &AlgorithmIdentifierOwned,
    ciphertext: &[u8],
    secret: &Secret<'_>,
    key_len: usize,
) -> Result<Vec<u8>, CryptoError>
where
    C: KeyIvInit + BlockDecryptMut,
{
    let params = alg
        .parameters
        .as_ref()
        .ok_or(CryptoError::Pkcs12(format!("{}: missing parameters", alg.oid)))?
        .decode_as::<Pkcs12PbeParams>()?;
    let salt = params.salt.as_bytes();

    let key = derive_key::<Sha1>(
        &secret.bmp,
        salt,
        Pkcs12KeyType::EncryptionKey,
        params.iterations,
        key_len,
    );
    let iv = derive_key::<Sha1>(&secret.bmp, salt, Pkcs12KeyType::Iv, params.iterations, 8);

    C::new_from_slices(&key, &iv)
        .map_err(|err| CryptoError::Pkcs12(format!("{}: {}", alg.oid, err)))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::Pkcs12(format!("{}: bad padding", alg.oid)))
}
