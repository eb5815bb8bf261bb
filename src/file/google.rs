use crate::Error;

use super::{File, FileResolver};

/// An implementation of [`FileResolver`] which resolves the well-known import
/// `google/protobuf/descriptor.proto` from a bundled copy, so that custom
/// options compile without a copy of the google include tree on disk.
#[derive(Debug, Default)]
pub struct GoogleFileResolver {
    _priv: (),
}

pub(crate) const DESCRIPTOR: &str = include_str!("google/descriptor.proto");

impl GoogleFileResolver {
    /// Creates a new instance of [`GoogleFileResolver`].
    pub fn new() -> Self {
        Default::default()
    }
}

impl FileResolver for GoogleFileResolver {
    fn open_file(&self, name: &str) -> Result<File, Error> {
        match name {
            "google/protobuf/descriptor.proto" => File::from_source(name, DESCRIPTOR),
            _ => Err(Error::file_not_found(name)),
        }
    }
}
