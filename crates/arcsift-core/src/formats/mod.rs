//! Filtering readers, one per archive format.

pub mod tar;
pub mod zip;

pub use tar::Reader as TarReader;
pub use zip::Reader as ZipReader;
