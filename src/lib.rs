//! A compiler from protobuf source files to file descriptor sets.
//!
//! The compiler parses `.proto` files, resolves type names across imports,
//! interprets options (including custom options defined through extensions)
//! and produces a [`FileDescriptorSet`](prost_types::FileDescriptorSet) that
//! is byte-compatible with the output of the reference protobuf compiler.
//!
//! For convenient compilation of protobuf source files in a single function,
//! see [`compile()`]. For more options see [`Compiler`].
//!
//! # Examples
//!
//! ```
//! # use std::fs;
//! # use prost_types::{
//! #    DescriptorProto, FieldDescriptorProto, field_descriptor_proto::{Label, Type},
//! #    FileDescriptorSet, FileDescriptorProto,
//! # };
//! # use protoset::compile;
//! # let tempdir = assert_fs::TempDir::new().unwrap();
//! # std::env::set_current_dir(&tempdir).unwrap();
//! fs::write("bar.proto", "
//!     message Bar { }
//! ").unwrap();
//! fs::write("root.proto", "
//!     import 'bar.proto';
//!
//!     message Foo {
//!         optional Bar bar = 1;
//!     }
//! ").unwrap();
//!
//! assert_eq!(compile(&["root.proto"], &["."]).unwrap(), FileDescriptorSet {
//!     file: vec![
//!         FileDescriptorProto {
//!             name: Some("bar.proto".to_owned()),
//!             message_type: vec![DescriptorProto {
//!                 name: Some("Bar".to_owned()),
//!                 ..Default::default()
//!             }],
//!             ..Default::default()
//!         },
//!         FileDescriptorProto {
//!             name: Some("root.proto".to_owned()),
//!             dependency: vec!["bar.proto".to_owned()],
//!             message_type: vec![DescriptorProto {
//!                 name: Some("Foo".to_owned()),
//!                 field: vec![FieldDescriptorProto {
//!                     name: Some("bar".to_owned()),
//!                     number: Some(1),
//!                     label: Some(Label::Optional as _),
//!                     r#type: Some(Type::Message as _),
//!                     type_name: Some(".Bar".to_owned()),
//!                     json_name: Some("bar".to_owned()),
//!                     ..Default::default()
//!                 }],
//!                 ..Default::default()
//!             }],
//!             ..Default::default()
//!         },
//!     ],
//! });
//! ```
#![warn(missing_debug_implementations, missing_docs)]
#![deny(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/protoset/0.1.0/")]

pub mod file;

mod ast;
mod case;
mod check;
mod compile;
mod error;
mod fmt;
mod options;
mod parse;
mod registry;
mod tag;
mod types;

use std::convert::TryInto;
use std::path::Path;

use logos::Span;
use prost::Message;

pub use self::compile::Compiler;
pub use self::error::Error;
pub use self::registry::{DescriptorRef, Registry};

/// Convenience function for compiling a set of protobuf files.
///
/// For more control over how files are compiled, see [`Compiler`]. This
/// function is equivalent to:
/// ```rust
/// # use protoset::Compiler;
/// # fn main() -> Result<(), protoset::Error> {
/// # let files: Vec<std::path::PathBuf> = vec![];
/// # let includes: Vec<std::path::PathBuf> = vec![".".into()];
/// let mut compiler = Compiler::new(includes)?;
/// compiler.include_imports(true);
/// for file in files {
///     compiler.add_file(file)?;
/// }
/// compiler.file_descriptor_set();
/// # Ok(())
/// # }
/// ```
pub fn compile(
    files: impl IntoIterator<Item = impl AsRef<Path>>,
    includes: impl IntoIterator<Item = impl AsRef<Path>>,
) -> Result<prost_types::FileDescriptorSet, Error> {
    let mut compiler = Compiler::new(includes)?;

    compiler.include_imports(true);

    for file in files {
        compiler.add_file(file)?;
    }

    Ok(compiler.file_descriptor_set())
}

/// Parses a single protobuf source file into a
/// [`FileDescriptorProto`](prost_types::FileDescriptorProto).
///
/// This function only looks at the syntax of the file: type names are not
/// resolved, imported files are not read, and custom options are left
/// uninterpreted.
///
/// # Examples
///
/// ```
/// # use protoset::parse;
/// # use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};
/// # use prost_types::field_descriptor_proto::Label;
/// #
/// let source = r#"
///     syntax = "proto3";
///     import "dep.proto";
///
///     message Foo {
///         Bar bar = 1;
///     }
/// "#;
/// let file_descriptor = parse(source).unwrap();
/// assert_eq!(file_descriptor, FileDescriptorProto {
///     syntax: Some("proto3".to_owned()),
///     dependency: vec!["dep.proto".to_owned()],
///     message_type: vec![DescriptorProto {
///         name: Some("Foo".to_owned()),
///         field: vec![FieldDescriptorProto {
///             label: Some(Label::Optional as _),
///             name: Some("bar".to_owned()),
///             number: Some(1),
///             type_name: Some("Bar".to_owned()),
///             json_name: Some("bar".to_owned()),
///             ..Default::default()
///         }],
///         ..Default::default()
///     }],
///     ..Default::default()
/// })
/// ```
pub fn parse(source: &str) -> Result<prost_types::FileDescriptorProto, Error> {
    let ast =
        parse::parse(source).map_err(|errors| Error::parse_errors(errors, source.to_owned()))?;
    match check::generate(&ast, None, None) {
        Ok(descriptor) => Ok(transcode_file(&descriptor)),
        Err(errors) => Err(Error::check_errors(errors, source.to_owned())),
    }
}

const MAX_FILE_LEN: u64 = i32::MAX as u64;

fn index_to_i32(index: usize) -> i32 {
    // We enforce that all files parsed are at most i32::MAX bytes long.
    // Therefore the indices of any definitions in a single file must fit
    // into an i32.
    index.try_into().unwrap()
}

fn s(s: impl ToString) -> Option<String> {
    Some(s.to_string())
}

fn join_span(start: Span, end: Span) -> Span {
    start.start..end.end
}

/// Re-encodes a descriptor into the prost_types representation. Both types
/// have the same wire format, so this cannot fail; extension options are
/// dropped since prost_types has no field for them.
pub(crate) fn transcode_file(
    file: &types::FileDescriptorProto,
) -> prost_types::FileDescriptorProto {
    let buf = file.encode_to_vec();
    prost_types::FileDescriptorProto::decode(buf.as_slice())
        .expect("descriptor failed to round-trip through the wire format")
}

#[cfg(test)]
fn with_current_dir(path: impl AsRef<Path>, f: impl FnOnce()) {
    use std::{
        env::{current_dir, set_current_dir},
        sync::Mutex,
    };

    use once_cell::sync::Lazy;
    use scopeguard::defer;

    static CURRENT_DIR_LOCK: Lazy<Mutex<()>> = Lazy::new(Default::default);

    let _lock = CURRENT_DIR_LOCK
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let prev_dir = current_dir().unwrap();
    defer!({
        let _ = set_current_dir(prev_dir);
    });

    set_current_dir(path).unwrap();
    f();
}
