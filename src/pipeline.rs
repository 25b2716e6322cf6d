use log::{debug, warn};

use crate::{
    cert::DecodedCertificate,
    crypto::{CryptoProvider, RustCryptoProvider},
    decode::{BinaryBundleDecoder, BundleStep, LockedBundle, PemDecoder, SingleCertDecoder},
    errors::{PrefillError, PrefillErrorKind, PrefillResult},
    extract::{ExpiryZone, ExtractionResult, MetadataExtractor},
    format::{extension_of, CertificateFile, ContainerKind, FileContent, ReadMode},
};

pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
pub const DEFAULT_PASSWORD_PROMPT: &str = "Enter certificate password (leave blank if none):";

/// Exactly one side is populated: the form values or the reason to fall back to manual entry.
pub type ParseOutcome = Result<ExtractionResult, PrefillError>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ParseOptions {
    pub max_file_size: u64,
    pub expiry_zone: ExpiryZone,
    pub password_prompt: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            expiry_zone: ExpiryZone::default(),
            password_prompt: DEFAULT_PASSWORD_PROMPT.to_owned(),
        }
    }
}

impl ParseOptions {
    pub fn max_file_size(mut self: Self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn expiry_zone(mut self: Self, zone: ExpiryZone) -> Self {
        self.expiry_zone = zone;
        self
    }

    pub fn password_prompt(mut self: Self, message: impl Into<String>) -> Self {
        self.password_prompt = message.into();
        self
    }
}

/// Answers the one password question a locked bundle may raise.
pub trait PasswordPrompt {
    /// `None` means the user gave no answer.
    fn request_password(&mut self, message: &str) -> Option<String>;
}

impl<F> PasswordPrompt for F
where
    F: FnMut(&str) -> Option<String>,
{
    fn request_password(&mut self, message: &str) -> Option<String> {
        self(message)
    }
}

pub enum ParseStep<'p, P: CryptoProvider> {
    Finished(ParseOutcome),
    AwaitingPassword(PasswordRequest<'p, P>),
}

impl<'p, P: CryptoProvider> ParseStep<'p, P> {
    /// Drives a pending password request through `prompt`, asking at most once.
    pub fn resolve(self: Self, prompt: &mut impl PasswordPrompt) -> ParseOutcome {
        match self {
            ParseStep::Finished(outcome) => outcome,
            ParseStep::AwaitingPassword(request) => {
                let answer = prompt.request_password(request.message());
                request.resume(answer.as_deref())
            }
        }
    }
}

/// Paused between the empty-password attempt and the single retry.
pub struct PasswordRequest<'p, P: CryptoProvider> {
    pipeline: &'p ParsePipeline<P>,
    filename: String,
    locked: LockedBundle<P::Structure>,
}

impl<'p, P: CryptoProvider> PasswordRequest<'p, P> {
    pub fn message(self: &Self) -> &str {
        &self.pipeline.options.password_prompt
    }

    pub fn filename(self: &Self) -> &str {
        &self.filename
    }

    /// Second and last unpack attempt. No answer counts as the empty password.
    pub fn resume(self: Self, password: Option<&str>) -> ParseOutcome {
        let decoded = BinaryBundleDecoder::new(&self.pipeline.provider)
            .resume(self.locked, password.unwrap_or(""));

        self.pipeline.finish(&self.filename, decoded)
    }
}

pub struct ParsePipeline<P = RustCryptoProvider> {
    provider: P,
    options: ParseOptions,
}

impl Default for ParsePipeline<RustCryptoProvider> {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}

impl ParsePipeline<RustCryptoProvider> {
    pub fn new(options: ParseOptions) -> Self {
        Self::with_provider(RustCryptoProvider, options)
    }
}

impl<P: CryptoProvider> ParsePipeline<P> {
    pub fn with_provider(provider: P, options: ParseOptions) -> Self {
        Self { provider, options }
    }

    pub fn options(self: &Self) -> &ParseOptions {
        &self.options
    }

    /// Checks that need only the file metadata: extension first, then size.
    pub fn admit(self: &Self, filename: &str, size: u64) -> Result<ContainerKind, PrefillError> {
        let kind = ContainerKind::from_filename(filename)?;

        if size > self.options.max_file_size {
            return Err(PrefillError {
                kind: PrefillErrorKind::FileTooLarge,
                message: format!("{} bytes, limit {}", size, self.options.max_file_size),
            });
        }

        Ok(kind)
    }

    /// Gates on metadata, then asks `load` for the content in the mode the container needs.
    pub fn parse_file<F>(self: &Self, filename: &str, size: u64, load: F) -> ParseStep<'_, P>
    where
        F: FnOnce(ReadMode) -> std::io::Result<FileContent>,
    {
        let kind = match self.admit(filename, size) {
            Ok(kind) => kind,
            Err(err) => return self.fail(filename, err),
        };

        match load(kind.read_mode()).map_app_err(PrefillErrorKind::IoError) {
            Ok(content) => self.decode(kind, filename, &content),
            Err(err) => self.fail(filename, err),
        }
    }

    pub fn parse(self: &Self, file: &CertificateFile) -> ParseStep<'_, P> {
        match self.admit(&file.filename, file.size) {
            Ok(kind) => self.decode(kind, &file.filename, &file.content),
            Err(err) => self.fail(&file.filename, err),
        }
    }

    pub fn parse_with_prompt(
        self: &Self,
        file: &CertificateFile,
        prompt: &mut impl PasswordPrompt,
    ) -> ParseOutcome {
        self.parse(file).resolve(prompt)
    }

    fn decode(
        self: &Self,
        kind: ContainerKind,
        filename: &str,
        content: &FileContent,
    ) -> ParseStep<'_, P> {
        debug!(
            "decoding {} as {} (.{})",
            filename,
            kind,
            extension_of(filename)
        );

        let decoded = match kind {
            ContainerKind::BinaryBundle => {
                match BinaryBundleDecoder::new(&self.provider).decode(content.as_bytes()) {
                    Ok(BundleStep::Decoded(cert)) => Ok(cert),
                    Ok(BundleStep::NeedsPassword(locked)) => {
                        return ParseStep::AwaitingPassword(PasswordRequest {
                            pipeline: self,
                            filename: filename.to_owned(),
                            locked,
                        })
                    }
                    Err(err) => Err(err),
                }
            }
            ContainerKind::BinarySingleCert => {
                SingleCertDecoder::new(&self.provider).decode(content.as_bytes())
            }
            ContainerKind::Pem => PemDecoder::new(&self.provider).decode(&content.to_text()),
        };

        ParseStep::Finished(self.finish(filename, decoded))
    }

    fn finish(
        self: &Self,
        filename: &str,
        decoded: Result<DecodedCertificate, PrefillError>,
    ) -> ParseOutcome {
        let outcome = decoded.and_then(|cert| {
            debug!("{} decoded, extracting form values", filename);
            MetadataExtractor::new(self.options.expiry_zone).extract(&cert, filename)
        });

        if let Err(err) = &outcome {
            warn!("{} could not be read: {}", filename, err);
        }

        outcome
    }

    fn fail(self: &Self, filename: &str, err: PrefillError) -> ParseStep<'_, P> {
        warn!("{} rejected: {}", filename, err);
        ParseStep::Finished(Err(err))
    }
}
