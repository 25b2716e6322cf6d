use der::{
    asn1::{BmpString, Ia5StringRef, PrintableStringRef, TeletexStringRef, Utf8StringRef},
    oid::{
        db::{
            rfc4519::{CN, O},
            DB,
        },
        ObjectIdentifier,
    },
    Any, Tag, Tagged,
};
use std::fmt::Display;

use crate::utils::to_hex_str;

/// Attribute type resolved once at decode time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AttributeKind {
    CommonName,
    OrganizationName,
    Other(ObjectIdentifier),
}

impl From<ObjectIdentifier> for AttributeKind {
    fn from(oid: ObjectIdentifier) -> Self {
        match oid {
            oid if oid == CN => Self::CommonName,
            oid if oid == O => Self::OrganizationName,
            oid => Self::Other(oid),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubjectAttribute {
    pub kind: AttributeKind,
    /// Long form, e.g. `commonName`.
    pub name: String,
    /// Short form, e.g. `CN`.
    pub short_name: String,
    /// `None` when the value is not one of the directory string types.
    pub value: Option<String>,
    pub raw_value: Vec<u8>,
}

impl Display for SubjectAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.short_name, value),
            None => write!(f, "{}=#{}", self.short_name, to_hex_str(&self.raw_value)),
        }
    }
}

impl From<&x509_cert::attr::AttributeTypeAndValue> for SubjectAttribute {
    fn from(tv: &x509_cert::attr::AttributeTypeAndValue) -> Self {
        let kind = AttributeKind::from(tv.oid);
        let (name, short_name) = match &kind {
            AttributeKind::CommonName => ("commonName".to_owned(), "CN".to_owned()),
            AttributeKind::OrganizationName => ("organizationName".to_owned(), "O".to_owned()),
            AttributeKind::Other(oid) => {
                let mut best_match: Option<&str> = None;

                for m in DB.find_names_for_oid(*oid) {
                    if let Some(previous) = best_match {
                        if m.len() < previous.len() {
                            best_match = Some(m);
                        }
                    } else {
                        best_match = Some(m);
                    }
                }

                match best_match {
                    Some(key) => (key.to_owned(), key.to_ascii_uppercase()),
                    None => (oid.to_string(), oid.to_string()),
                }
            }
        };

        Self {
            kind,
            name,
            short_name,
            value: directory_string(&tv.value),
            raw_value: tv.value.value().to_vec(),
        }
    }
}

fn directory_string(value: &Any) -> Option<String> {
    match value.tag() {
        Tag::PrintableString => PrintableStringRef::try_from(value)
            .ok()
            .map(|s| s.to_string()),
        Tag::Utf8String => Utf8StringRef::try_from(value).ok().map(|s| s.to_string()),
        Tag::Ia5String => Ia5StringRef::try_from(value).ok().map(|s| s.to_string()),
        Tag::TeletexString => TeletexStringRef::try_from(value)
            .ok()
            .map(|s| s.to_string()),
        // UTF-16
        Tag::BmpString => value.decode_as::<BmpString>().ok().map(|s| s.to_string()),
        _ => None,
    }
}

/// Subject attributes flattened in declaration order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubjectName(pub Vec<SubjectAttribute>);

impl SubjectName {
    pub fn first(self: &Self, kind: &AttributeKind) -> Option<&SubjectAttribute> {
        self.0.iter().find(|attr| &attr.kind == kind)
    }

    pub fn iter(self: &Self) -> impl Iterator<Item = &SubjectAttribute> {
        self.0.iter()
    }
}

impl Display for SubjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rdn = self
            .0
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}", rdn)
    }
}

impl From<&x509_cert::name::RdnSequence> for SubjectName {
    fn from(value: &x509_cert::name::RdnSequence) -> Self {
        Self(
            value
                .0
                .iter()
                .flat_map(|rdn| rdn.0.iter())
                .map(SubjectAttribute::from)
                .collect(),
        )
    }
}
