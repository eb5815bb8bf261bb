use logos::Span;
use miette::Diagnostic;
use thiserror::Error;

mod generate;
mod interpret;
mod known;
mod names;
#[cfg(test)]
mod tests;

pub(crate) use self::generate::generate;
pub(crate) use self::interpret::interpret;
pub(crate) use self::names::TypeIndex;

pub(crate) const MAX_MESSAGE_FIELD_NUMBER: i32 = 536_870_911;

#[derive(Error, Clone, Debug, Diagnostic, PartialEq)]
pub(crate) enum CheckError {
    #[error("the name '{name}' is defined twice")]
    DuplicateName {
        name: String,
        #[label("defined again here")]
        span: Span,
    },
    #[error("the type name '{name}' was not found")]
    TypeNameNotFound {
        name: String,
        #[label("used here")]
        span: Span,
    },
    #[error("the extension name '{name}' was not found")]
    ExtensionNameNotFound {
        name: String,
        #[label("used here")]
        span: Span,
    },
    #[error("extendee type '{name}' is not a message")]
    InvalidExtendeeTypeName {
        name: String,
        #[label("used here")]
        span: Span,
    },
    #[error("method {kind} type '{name}' is not a message")]
    InvalidMethodTypeName {
        name: String,
        kind: &'static str,
        #[label("used here")]
        span: Span,
    },
    #[error("message numbers must be between 1 and {}", MAX_MESSAGE_FIELD_NUMBER)]
    InvalidMessageNumber {
        #[label("defined here")]
        span: Span,
    },
    #[error("enum numbers must be between {} and {}", i32::MIN, i32::MAX)]
    InvalidEnumNumber {
        #[label("defined here")]
        span: Span,
    },
    #[error("fields must have a label with proto2 syntax (expected one of 'optional', 'repeated' or 'required')")]
    Proto2FieldMissingLabel {
        #[label("field defined here")]
        span: Span,
    },
    #[error("groups are not allowed in proto3 syntax")]
    Proto3GroupField {
        #[label("defined here")]
        span: Span,
    },
    #[error("required fields are not allowed in proto3 syntax")]
    Proto3RequiredField {
        #[label("defined here")]
        span: Span,
    },
    #[error("{kind} fields are not allowed in a oneof")]
    InvalidOneofFieldKind {
        kind: &'static str,
        #[label("defined here")]
        span: Span,
    },
    #[error("{kind} fields are not allowed in extensions")]
    InvalidExtendFieldKind {
        kind: &'static str,
        #[label("defined here")]
        span: Span,
    },
    #[error("{kind} fields may not have default values")]
    InvalidDefault {
        kind: &'static str,
        #[label("defined here")]
        span: Span,
    },
    #[error("default values are not allowed in proto3")]
    Proto3DefaultValue {
        #[label("defined here")]
        span: Span,
    },
    #[error("the 'weak' option is not supported")]
    WeakNotSupported {
        #[label("defined here")]
        span: Span,
    },
    #[error("option value is out of range for a 64-bit integer")]
    OptionIntegerOutOfRange {
        #[label("defined here")]
        span: Span,
    },
    #[error("array values are only allowed inside aggregate values")]
    OptionArrayValue {
        #[label("defined here")]
        span: Span,
    },
    #[error("expected value to be {expected}, but found '{actual}'")]
    OptionValueInvalidType {
        expected: String,
        actual: String,
        #[label("defined here")]
        span: Span,
    },
    #[error("'{value_name}' is not a value of enum '{enum_name}'")]
    InvalidEnumValue {
        value_name: String,
        enum_name: String,
        #[label("defined here")]
        span: Span,
    },
    #[error("the option '{name}' could not be resolved")]
    OptionNotFound { name: String },
    #[error("unknown field '{part}' of '{namespace}' for option '{name}'")]
    OptionUnknownField {
        name: String,
        part: String,
        namespace: String,
    },
    #[error("cannot set a field of the non-message option '{name}'")]
    OptionScalarFieldAccess { name: String },
    #[error("the extension '{extension}' does not extend '{expected}'")]
    OptionWrongExtendee {
        extension: String,
        expected: String,
    },
    #[error("expected the value of option '{name}' to be {expected}, but found '{actual}'")]
    OptionInvalidValue {
        name: String,
        expected: String,
        actual: String,
    },
    #[error("'{value_name}' is not a value of enum '{enum_name}' for option '{name}'")]
    OptionInvalidEnumValue {
        name: String,
        value_name: String,
        enum_name: String,
    },
    #[error("failed to parse the aggregate value of option '{name}': {reason}")]
    OptionTextFormatError { name: String, reason: String },
}
