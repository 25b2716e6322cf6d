//! Reads one certificate container (PKCS#12/PFX, DER or PEM) and extracts the
//! values used to prefill a certificate-expiry form: a display name taken from
//! the subject and the expiry date.
//!
//! ```no_run
//! use certprefill::{CertificateFile, ParsePipeline};
//!
//! let bytes = std::fs::read("store.p12").unwrap();
//! let file = CertificateFile::from_bytes("store.p12", bytes);
//! let pipeline = ParsePipeline::default();
//!
//! match pipeline.parse_with_prompt(&file, &mut |_: &str| Some("changeit".to_owned())) {
//!     Ok(result) => println!("{} expires {}", result.suggested_name, result.expiry_date_input()),
//!     Err(err) => eprintln!("{}", err.user_message()),
//! }
//! ```

pub mod cert;
pub mod crypto;
pub mod decode;
pub mod errors;
pub mod extract;
pub mod format;
pub mod pipeline;
pub mod utils;
pub use der;

pub use errors::{PrefillError, PrefillErrorKind};
pub use extract::{ExpiryZone, ExtractionResult};
pub use format::{CertificateFile, ContainerKind, FileContent, ReadMode};
pub use pipeline::{
    ParseOptions, ParseOutcome, ParsePipeline, ParseStep, PasswordPrompt, PasswordRequest,
    DEFAULT_MAX_FILE_SIZE,
};
