//! Handling of protobuf source files.

mod chain;
mod google;
mod include;

pub use self::chain::ChainFileResolver;
pub use self::google::GoogleFileResolver;
pub use self::include::IncludeFileResolver;

pub(crate) use self::include::{check_shadow, path_to_file_name};

use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use miette::NamedSource;

use crate::{ast, error::ErrorKind, parse, Error, MAX_FILE_LEN};

/// A strategy for locating protobuf source files. The default implementation
/// is [`IncludeFileResolver`] which uses the file system.
pub trait FileResolver {
    /// Converts a file system path to a unique file name.
    fn resolve_path(&self, _path: &Path) -> Option<String> {
        None
    }

    /// Opens a file by its unique name.
    ///
    /// # Errors
    ///
    /// If the file is not found, the implementation should return
    /// [`Error::file_not_found`].
    fn open_file(&self, name: &str) -> Result<File, Error>;
}

impl<T> FileResolver for Box<T>
where
    T: FileResolver + ?Sized,
{
    fn resolve_path(&self, path: &Path) -> Option<String> {
        (**self).resolve_path(path)
    }

    fn open_file(&self, name: &str) -> Result<File, Error> {
        (**self).open_file(name)
    }
}

/// An opened and parsed protobuf source file, returned by
/// [`FileResolver::open_file`].
#[derive(Debug, Clone)]
pub struct File {
    pub(crate) path: Option<PathBuf>,
    pub(crate) source: String,
    pub(crate) ast: ast::File,
}

impl File {
    /// Reads and parses the file at the given filesystem path.
    ///
    /// `name` is the logical name of the file, as it appears in `import`
    /// statements.
    pub fn open(name: &str, path: &Path) -> Result<Self, Error> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::file_not_found(name))
            }
            Err(err) => {
                return Err(Error::from_kind(ErrorKind::OpenFile {
                    path: path.to_owned(),
                    err,
                }))
            }
        };

        let metadata = file.metadata().map_err(|err| {
            Error::from_kind(ErrorKind::OpenFile {
                path: path.to_owned(),
                err,
            })
        })?;
        if metadata.len() > MAX_FILE_LEN {
            return Err(Error::from_kind(ErrorKind::FileTooLarge {
                path: path.to_owned(),
            }));
        }

        let mut source = String::with_capacity(metadata.len() as usize);
        file.take(MAX_FILE_LEN)
            .read_to_string(&mut source)
            .map_err(|err| {
                Error::from_kind(ErrorKind::OpenFile {
                    path: path.to_owned(),
                    err,
                })
            })?;

        File::parse(name, source, Some(path.to_owned()))
    }

    /// Parses a file from a source string.
    pub fn from_source(name: &str, source: &str) -> Result<Self, Error> {
        File::parse(name, source.to_owned(), None)
    }

    fn parse(name: &str, source: String, path: Option<PathBuf>) -> Result<Self, Error> {
        match parse::parse(&source) {
            Ok(ast) => Ok(File { path, source, ast }),
            Err(errors) => Err(Error::parse_errors(
                errors,
                NamedSource::new(name, source),
            )),
        }
    }

    /// If this is a physical file on the filesystem, returns its path.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The full content of the file.
    pub fn source(&self) -> &str {
        &self.source
    }
}
