use std::{fmt::Display, fs, path::Path};

use crate::errors::{PrefillError, PrefillErrorKind};

pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["p12", "pfx", "cer", "pem", "crt"];

/// Encoding family expected for a container, chosen from its extension only.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ContainerKind {
    /// PKCS#12 / PFX bundle.
    BinaryBundle,

    /// Single certificate, DER in principle, PEM in practice sometimes.
    BinarySingleCert,

    /// PEM text.
    Pem,
}

/// How the platform should hand over the file content.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadMode {
    Bytes,
    Text,
}

impl Display for ContainerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerKind::BinaryBundle => write!(f, "PKCS#12"),
            ContainerKind::BinarySingleCert => write!(f, "DER"),
            ContainerKind::Pem => write!(f, "PEM"),
        }
    }
}

impl ContainerKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "p12" | "pfx" => Some(Self::BinaryBundle),
            "cer" => Some(Self::BinarySingleCert),
            "pem" | "crt" => Some(Self::Pem),
            _ => None,
        }
    }

    pub fn from_filename(filename: &str) -> Result<Self, PrefillError> {
        let ext = extension_of(filename);

        Self::from_extension(&ext).ok_or(PrefillError {
            kind: PrefillErrorKind::UnsupportedFormat,
            message: format!("extension: {:?}", ext),
        })
    }

    pub fn read_mode(self: &Self) -> ReadMode {
        match self {
            ContainerKind::BinaryBundle | ContainerKind::BinarySingleCert => ReadMode::Bytes,
            ContainerKind::Pem => ReadMode::Text,
        }
    }
}

/// Lowercase text after the last dot, empty when there is none.
pub fn extension_of(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => String::new(),
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FileContent {
    Bytes(Vec<u8>),
    Text(String),
}

impl FileContent {
    /// Wraps raw bytes the way `mode` asks. Text is decoded lossily so a
    /// stray invalid byte still reaches the PEM decoder.
    pub fn with_mode(mode: ReadMode, bytes: Vec<u8>) -> Self {
        match mode {
            ReadMode::Bytes => FileContent::Bytes(bytes),
            ReadMode::Text => match String::from_utf8(bytes) {
                Ok(text) => FileContent::Text(text),
                Err(err) => FileContent::Text(String::from_utf8_lossy(err.as_bytes()).into_owned()),
            },
        }
    }

    pub fn load(path: impl AsRef<Path>, mode: ReadMode) -> std::io::Result<Self> {
        Ok(Self::with_mode(mode, fs::read(path)?))
    }

    pub fn as_bytes(self: &Self) -> &[u8] {
        match self {
            FileContent::Bytes(bytes) => bytes,
            FileContent::Text(text) => text.as_bytes(),
        }
    }

    // Invalid UTF-8 is replaced rather than rejected, PEM markers survive it.
    pub fn to_text(self: &Self) -> String {
        match self {
            FileContent::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            FileContent::Text(text) => text.clone(),
        }
    }
}

/// One user selection. Never mutated, consumed by a single parse.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CertificateFile {
    pub filename: String,
    pub extension: String,
    pub size: u64,
    pub content: FileContent,
}

impl CertificateFile {
    pub fn new(filename: impl Into<String>, size: u64, content: FileContent) -> Self {
        let filename = filename.into();
        let extension = extension_of(&filename);

        Self {
            filename,
            extension,
            size,
            content,
        }
    }

    pub fn from_bytes(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        Self::new(filename, size, FileContent::Bytes(bytes))
    }

    pub fn from_text(filename: impl Into<String>, text: impl Into<String>) -> Self {
        let text = text.into();
        let size = text.len() as u64;
        Self::new(filename, size, FileContent::Text(text))
    }
}
