mod bundle;
mod pem;
mod single;

pub use bundle::{BinaryBundleDecoder, BundleStep, LockedBundle};
pub use pem::PemDecoder;
pub use single::SingleCertDecoder;
