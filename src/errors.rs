use std::fmt;

/// Shown for every failure that happens after the file was accepted.
pub const MANUAL_ENTRY_MESSAGE: &str =
    "Couldn't read this certificate. You can still enter details manually.";

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PrefillErrorKind {
    /// Extension outside p12, pfx, cer, pem, crt.
    UnsupportedFormat,

    /// Reported size is above the configured ceiling.
    FileTooLarge,

    /// Content could not be read from the platform.
    IoError,

    /// Bundle bytes are not a DER structure.
    Asn1DecodeFailure,

    /// PKCS#12 unpack failed with the empty and the supplied password.
    BundleUnpackFailure,

    /// Bundle unpacked but held no certificate bag.
    NoCertificateInBundle,

    /// Certificate bytes are not DER and carry no PEM marker.
    DerDecodeFailure,

    /// PEM begin marker missing or PEM block undecodable.
    InvalidPem,

    /// Decoded certificate could not be turned into form values.
    ExtractionFailure,

    /// Unknown Error.
    Unknown,
}

impl PrefillErrorKind {
    /// Text handed to the user; only the gate rejections are specific.
    pub fn user_message(self: &Self) -> &'static str {
        match self {
            PrefillErrorKind::UnsupportedFormat => {
                "Unsupported file type. Please use .p12, .pem, or .cer files."
            }
            PrefillErrorKind::FileTooLarge => "File too large to parse.",
            _ => MANUAL_ENTRY_MESSAGE,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PrefillError {
    pub kind: PrefillErrorKind,
    pub message: String,
}

impl PrefillError {
    pub fn new(kind: PrefillErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn user_message(self: &Self) -> &'static str {
        self.kind.user_message()
    }
}

impl fmt::Display for PrefillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{:?}", self.kind)
        } else {
            write!(f, "{:?}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for PrefillError {}

pub trait PrefillResult<T> {
    fn map_app_err(self: Self, kind: PrefillErrorKind) -> Result<T, PrefillError>;
    fn map_unknown_err(self: Self) -> Result<T, PrefillError>;
}

impl<T, E> PrefillResult<T> for std::result::Result<T, E>
where
    E: std::error::Error + 'static,
{
    fn map_app_err(self: Self, kind: PrefillErrorKind) -> Result<T, PrefillError> {
        self.map_err(|err| PrefillError {
            kind: kind,
            message: err.to_string(),
        })
    }

    fn map_unknown_err(self: Self) -> Result<T, PrefillError> {
        self.map_app_err(PrefillErrorKind::Unknown)
    }
}
