use std::{fmt, io, path::PathBuf};

use logos::Span;
use miette::{Diagnostic, MietteError, NamedSource, SourceCode, SourceSpan, SpanContents};
use thiserror::Error;

use crate::{check::CheckError, parse::ParseErrorKind};

/// An error that can occur when compiling protobuf files.
#[derive(Debug, Diagnostic, Error)]
#[error(transparent)]
#[diagnostic(transparent)]
pub struct Error {
    kind: Box<ErrorKind>,
}

#[derive(Debug, Diagnostic, Error)]
pub(crate) enum ErrorKind {
    #[error("{}", err)]
    #[diagnostic(forward(err))]
    Parse {
        err: ParseErrorKind,
        #[source_code]
        src: DynSourceCode,
        #[related]
        errors: Vec<ParseErrorKind>,
    },
    #[error("{}", err)]
    #[diagnostic(forward(err))]
    Check {
        err: CheckError,
        #[source_code]
        src: DynSourceCode,
        #[related]
        errors: Vec<CheckError>,
    },
    #[error("error opening file '{}'", path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        err: io::Error,
    },
    #[error("file '{}' is too large", path.display())]
    FileTooLarge { path: PathBuf },
    #[error("file '{name}' not found")]
    FileNotFound { name: String },
    #[error("import '{name}' not found")]
    ImportNotFound {
        name: String,
        #[source_code]
        src: DynSourceCode,
        #[label("imported here")]
        span: SourceSpan,
    },
    #[error("error opening imported file '{name}'")]
    OpenImport {
        name: String,
        #[source]
        err: io::Error,
        #[source_code]
        src: DynSourceCode,
        #[label("imported here")]
        span: SourceSpan,
    },
    #[error("import cycle detected: {cycle}")]
    CircularImport { cycle: String },
    #[error("path '{}' is not in any include path", path.display())]
    FileNotIncluded { path: PathBuf },
    #[error("path '{}' is shadowed by '{}' in the include paths", path.display(), shadow.display())]
    #[diagnostic(help(
        "either pass the shadowing path as the input file, or re-order the include paths"
    ))]
    FileShadowed { path: PathBuf, shadow: PathBuf },
}

#[derive(Default)]
pub(crate) struct DynSourceCode(Option<Box<dyn SourceCode + Send + Sync>>);

impl fmt::Debug for DynSourceCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("DynSourceCode").finish_non_exhaustive()
    }
}

impl SourceCode for DynSourceCode {
    fn read_span<'a>(
        &'a self,
        span: &SourceSpan,
        context_lines_before: usize,
        context_lines_after: usize,
    ) -> Result<Box<dyn SpanContents<'a> + 'a>, MietteError> {
        match &self.0 {
            Some(src) => src.read_span(span, context_lines_before, context_lines_after),
            None => Err(MietteError::OutOfBounds),
        }
    }
}

impl From<String> for DynSourceCode {
    fn from(source: String) -> Self {
        DynSourceCode(Some(Box::new(source)))
    }
}

impl From<NamedSource> for DynSourceCode {
    fn from(source: NamedSource) -> Self {
        DynSourceCode(Some(Box::new(source)))
    }
}

impl Error {
    pub(crate) fn from_kind(kind: ErrorKind) -> Self {
        Error {
            kind: Box::new(kind),
        }
    }

    pub(crate) fn parse_errors(
        mut errors: Vec<ParseErrorKind>,
        src: impl Into<DynSourceCode>,
    ) -> Self {
        debug_assert!(!errors.is_empty());
        let err = errors.remove(0);
        Error::from_kind(ErrorKind::Parse {
            err,
            src: src.into(),
            errors,
        })
    }

    pub(crate) fn check_errors(mut errors: Vec<CheckError>, src: impl Into<DynSourceCode>) -> Self {
        debug_assert!(!errors.is_empty());
        let err = errors.remove(0);
        Error::from_kind(ErrorKind::Check {
            err,
            src: src.into(),
            errors,
        })
    }

    /// Creates an instance of [`Error`] indicating that an imported file could
    /// not be found.
    ///
    /// This error should be returned by [`FileResolver`](crate::file::FileResolver)
    /// instances if a file is not found.
    pub fn file_not_found(name: &str) -> Self {
        Error::from_kind(ErrorKind::FileNotFound {
            name: name.to_owned(),
        })
    }

    /// Whether this error was created by [`Error::file_not_found`].
    pub fn is_file_not_found(&self) -> bool {
        matches!(&*self.kind, ErrorKind::FileNotFound { .. })
    }

    /// Attaches the location of the import statement that requested the file
    /// this error refers to.
    pub(crate) fn into_import_error(self, src: impl Into<DynSourceCode>, span: Span) -> Self {
        match *self.kind {
            ErrorKind::FileNotFound { name } => Error::from_kind(ErrorKind::ImportNotFound {
                name,
                src: src.into(),
                span: span.into(),
            }),
            ErrorKind::OpenFile { path, err } => Error::from_kind(ErrorKind::OpenImport {
                name: path.display().to_string(),
                err,
                src: src.into(),
                span: span.into(),
            }),
            kind => Error::from_kind(kind),
        }
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}
