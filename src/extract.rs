use chrono::{DateTime, FixedOffset, Local, NaiveDate, TimeZone, Utc};

use crate::{
    cert::{AttributeKind, DecodedCertificate},
    errors::{PrefillError, PrefillErrorKind},
    utils::strip_extension,
};

/// Zone the expiry instant is converted into before the time of day is dropped.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ExpiryZone {
    #[default]
    Local,
    Utc,
    Fixed(FixedOffset),
}

impl ExpiryZone {
    pub fn calendar_date(self: &Self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            ExpiryZone::Local => Local.from_utc_datetime(&instant.naive_utc()).date_naive(),
            ExpiryZone::Utc => instant.date_naive(),
            ExpiryZone::Fixed(offset) => offset.from_utc_datetime(&instant.naive_utc()).date_naive(),
        }
    }
}

/// Values handed to the form.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExtractionResult {
    pub suggested_name: String,
    pub expiry_date: NaiveDate,
    pub source_filename: String,
    pub note: String,
}

impl ExtractionResult {
    /// `YYYY-MM-DD`, the format date inputs accept.
    pub fn expiry_date_input(self: &Self) -> String {
        self.expiry_date.format("%Y-%m-%d").to_string()
    }
}

pub struct MetadataExtractor {
    zone: ExpiryZone,
}

impl MetadataExtractor {
    pub fn new(zone: ExpiryZone) -> Self {
        Self { zone }
    }

    /// Common name, else organization name, else `None`. Only the first
    /// matching attribute counts; an empty one leaves no hint.
    pub fn identity_hint<'a>(
        self: &Self,
        cert: &'a DecodedCertificate,
    ) -> Result<Option<&'a str>, PrefillError> {
        for kind in [AttributeKind::CommonName, AttributeKind::OrganizationName] {
            if let Some(attr) = cert.subject.first(&kind) {
                return match &attr.value {
                    Some(value) if value.is_empty() => Ok(None),
                    Some(value) => Ok(Some(value.as_str())),
                    None => Err(PrefillError {
                        kind: PrefillErrorKind::ExtractionFailure,
                        message: format!("{} is not a directory string: {}", attr.name, attr),
                    }),
                };
            }
        }

        Ok(None)
    }

    pub fn expiry_date(self: &Self, cert: &DecodedCertificate) -> Result<NaiveDate, PrefillError> {
        let not_after = cert.validity.not_after;
        let instant = i64::try_from(not_after.as_secs())
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .ok_or(PrefillError {
                kind: PrefillErrorKind::ExtractionFailure,
                message: format!("not after out of range: {}s", not_after.as_secs()),
            })?;

        Ok(self.zone.calendar_date(instant))
    }

    pub fn extract(
        self: &Self,
        cert: &DecodedCertificate,
        filename: &str,
    ) -> Result<ExtractionResult, PrefillError> {
        let suggested_name = match self.identity_hint(cert)? {
            Some(hint) => hint.to_owned(),
            None => strip_extension(filename).to_owned(),
        };

        Ok(ExtractionResult {
            suggested_name,
            expiry_date: self.expiry_date(cert)?,
            source_filename: filename.to_owned(),
            note: format!("Imported from {}", filename),
        })
    }
}
