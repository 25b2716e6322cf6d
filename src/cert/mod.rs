pub mod name;

mod certificate;

pub use certificate::{DecodedCertificate, Validity, PEM_BEGIN_MARKER, PEM_END_MARKER};
pub use name::{AttributeKind, SubjectAttribute, SubjectName};
