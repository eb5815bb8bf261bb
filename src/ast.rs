use std::{convert::TryInto, fmt};

use logos::Span;

use crate::fmt::HexEscaped;
use crate::join_span;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct File {
    pub syntax: Syntax,
    pub package: std::option::Option<Package>,
    pub imports: Vec<Import>,
    pub options: Vec<OptionBody>,
    pub items: Vec<FileItem>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FileItem {
    Message(Message),
    Enum(Enum),
    Service(Service),
    Extend(Extend),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Syntax {
    Proto2,
    Proto3,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Ident {
    pub value: String,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FullIdent {
    pub parts: Vec<Ident>,
}

/// A reference to a message or enum, optionally absolute.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TypeName {
    pub leading_dot: std::option::Option<Span>,
    pub name: FullIdent,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Int {
    pub negative: bool,
    pub value: u64,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Float {
    pub value: f64,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct StringLit {
    pub value: Vec<u8>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Import {
    pub kind: std::option::Option<ImportKind>,
    pub value: StringLit,
    pub span: Span,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum ImportKind {
    Weak,
    Public,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Package {
    pub name: FullIdent,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct OptionBody {
    pub name: Vec<OptionNamePart>,
    pub value: OptionValue,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum OptionNamePart {
    Ident(Ident),
    // The parenthesized path of an extension option, e.g. `(foo.bar)`.
    Extension(TypeName, Span),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum OptionValue {
    Ident(FullIdent),
    Int(Int),
    Float(Float),
    String(StringLit),
    Aggregate(TextMessage, Span),
    Array(Vec<OptionValue>, Span),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Message {
    pub name: Ident,
    pub body: MessageBody,
    pub span: Span,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct MessageBody {
    pub items: Vec<MessageItem>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum MessageItem {
    Field(Field),
    Message(Message),
    Enum(Enum),
    Option(OptionBody),
    Oneof(Oneof),
    Extend(Extend),
    Reserved(Reserved),
    Extensions(Extensions),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Field {
    pub label: std::option::Option<(FieldLabel, Span)>,
    pub kind: FieldKind,
    pub span: Span,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum FieldLabel {
    Optional,
    Required,
    Repeated,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FieldKind {
    Direct {
        ty: Ty,
        name: Ident,
        number: Int,
        options: Vec<OptionBody>,
    },
    Group {
        name: Ident,
        number: Int,
        body: MessageBody,
        options: Vec<OptionBody>,
    },
    Map {
        key_ty: KeyTy,
        value_ty: Ty,
        name: Ident,
        number: Int,
        options: Vec<OptionBody>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Ty {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Named(TypeName),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum KeyTy {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Oneof {
    pub name: Ident,
    pub items: Vec<OneofItem>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum OneofItem {
    Field(Field),
    Option(OptionBody),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Extend {
    pub extendee: TypeName,
    pub fields: Vec<Field>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Reserved {
    pub kind: ReservedKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ReservedKind {
    Ranges(Vec<ReservedRange>),
    Names(Vec<Ident>),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ReservedRange {
    pub start: Int,
    pub end: ReservedRangeEnd,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum ReservedRangeEnd {
    None,
    Int(Int),
    Max(Span),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Extensions {
    pub ranges: Vec<ReservedRange>,
    pub options: Vec<OptionBody>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Enum {
    pub name: Ident,
    pub values: Vec<EnumValue>,
    pub options: Vec<OptionBody>,
    pub reserved: Vec<Reserved>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct EnumValue {
    pub name: Ident,
    pub number: Int,
    pub options: Vec<OptionBody>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Service {
    pub name: Ident,
    pub methods: Vec<Method>,
    pub options: Vec<OptionBody>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Method {
    pub name: Ident,
    pub input_ty: TypeName,
    pub output_ty: TypeName,
    pub client_streaming: bool,
    pub server_streaming: bool,
    pub options: Vec<OptionBody>,
    pub span: Span,
}

/// The body of an aggregate option value, in protobuf text format.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TextMessage {
    pub fields: Vec<TextField>,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TextField {
    pub name: TextFieldName,
    pub value: TextValue,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TextFieldName {
    Ident(Ident),
    Extension(FullIdent, Span),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TextValue {
    Ident {
        negative: bool,
        ident: Ident,
    },
    Int(Int),
    Float(Float),
    String(StringLit),
    Message(TextMessage, Span),
    List(Vec<TextValue>, Span),
}

impl Default for Syntax {
    fn default() -> Self {
        Syntax::Proto2
    }
}

impl Default for File {
    fn default() -> Self {
        File {
            syntax: Syntax::Proto2,
            package: None,
            imports: vec![],
            options: vec![],
            items: vec![],
        }
    }
}

impl Ident {
    pub fn new(value: impl Into<String>, span: Span) -> Self {
        Ident {
            value: value.into(),
            span,
        }
    }
}

impl FullIdent {
    pub fn span(&self) -> Span {
        join_span(
            self.parts.first().expect("empty full ident").span.clone(),
            self.parts.last().expect("empty full ident").span.clone(),
        )
    }
}

impl From<Ident> for FullIdent {
    fn from(value: Ident) -> Self {
        FullIdent { parts: vec![value] }
    }
}

impl From<Vec<Ident>> for FullIdent {
    fn from(parts: Vec<Ident>) -> Self {
        debug_assert!(!parts.is_empty());
        FullIdent { parts }
    }
}

impl TypeName {
    pub fn span(&self) -> Span {
        match &self.leading_dot {
            Some(dot) => join_span(dot.clone(), self.name.span()),
            None => self.name.span(),
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.leading_dot.is_some()
    }
}

impl Int {
    pub fn as_i32(&self) -> std::option::Option<i32> {
        self.as_i64().and_then(|value| value.try_into().ok())
    }

    pub fn as_i64(&self) -> std::option::Option<i64> {
        if self.negative {
            if self.value <= i64::MAX as u64 + 1 {
                Some((self.value as i64).wrapping_neg())
            } else {
                None
            }
        } else {
            self.value.try_into().ok()
        }
    }

    pub fn as_u64(&self) -> std::option::Option<u64> {
        if self.negative {
            None
        } else {
            Some(self.value)
        }
    }
}

impl Field {
    pub fn name(&self) -> &Ident {
        match &self.kind {
            FieldKind::Direct { name, .. }
            | FieldKind::Group { name, .. }
            | FieldKind::Map { name, .. } => name,
        }
    }

    pub fn number(&self) -> &Int {
        match &self.kind {
            FieldKind::Direct { number, .. }
            | FieldKind::Group { number, .. }
            | FieldKind::Map { number, .. } => number,
        }
    }

    pub fn options(&self) -> &[OptionBody] {
        match &self.kind {
            FieldKind::Direct { options, .. }
            | FieldKind::Group { options, .. }
            | FieldKind::Map { options, .. } => options,
        }
    }
}

impl OptionBody {
    /// Whether this option's name is the single plain identifier `name`.
    pub fn is(&self, name: &str) -> bool {
        matches!(self.name.as_slice(), [OptionNamePart::Ident(ident)] if ident.value == name)
    }
}

impl OptionNamePart {
    pub fn span(&self) -> Span {
        match self {
            OptionNamePart::Ident(ident) => ident.span.clone(),
            OptionNamePart::Extension(_, span) => span.clone(),
        }
    }
}

impl OptionValue {
    pub fn span(&self) -> Span {
        match self {
            OptionValue::Ident(ident) => ident.span(),
            OptionValue::Int(int) => int.span.clone(),
            OptionValue::Float(float) => float.span.clone(),
            OptionValue::String(string) => string.span.clone(),
            OptionValue::Aggregate(_, span) | OptionValue::Array(_, span) => span.clone(),
        }
    }

    pub fn as_bool(&self) -> std::option::Option<bool> {
        match self {
            OptionValue::Ident(ident) => match ident.to_string().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syntax::Proto2 => write!(f, "proto2"),
            Syntax::Proto3 => write!(f, "proto3"),
        }
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl fmt::Display for FullIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts[0])?;
        for part in &self.parts[1..] {
            write!(f, ".{}", part)?;
        }
        Ok(())
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.leading_dot.is_some() {
            write!(f, ".")?;
        }
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "{}", self.value)
    }
}

impl fmt::Display for Float {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value == f64::INFINITY {
            write!(f, "inf")
        } else if self.value == f64::NEG_INFINITY {
            write!(f, "-inf")
        } else {
            write!(f, "{}", self.value)
        }
    }
}

/// The canonical string form of an option value, as stored in the
/// `default_value` field of a field descriptor: booleans and identifiers
/// verbatim, numbers without trailing zeros, strings unquoted.
impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Ident(ident) => write!(f, "{}", ident),
            OptionValue::Int(int) => write!(f, "{}", int),
            OptionValue::Float(float) => write!(f, "{}", float),
            OptionValue::String(string) => {
                write!(f, "{}", String::from_utf8_lossy(&string.value))
            }
            OptionValue::Aggregate(message, _) => write!(f, "{}", message),
            OptionValue::Array(values, _) => {
                write!(f, "[")?;
                for (index, value) in values.iter().enumerate() {
                    if index != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl TextMessage {
    fn fmt_fields(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        for (index, field) in self.fields.iter().enumerate() {
            if index != 0 {
                writeln!(f)?;
            }
            field.fmt_indented(f, indent)?;
        }
        Ok(())
    }
}

impl TextField {
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.name, indent = indent)?;
        match &self.value {
            TextValue::Message(message, _) => {
                if message.fields.is_empty() {
                    write!(f, " {{}}")
                } else {
                    writeln!(f, " {{")?;
                    message.fmt_fields(f, indent + 2)?;
                    writeln!(f)?;
                    write!(f, "{:indent$}}}", "", indent = indent)
                }
            }
            value => write!(f, ": {}", value),
        }
    }
}

/// Aggregate values are reformatted canonically, one field per line with
/// two-space indents, for the second compilation phase to reparse.
impl fmt::Display for TextMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_fields(f, 0)
    }
}

impl fmt::Display for TextFieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextFieldName::Ident(ident) => write!(f, "{}", ident),
            TextFieldName::Extension(name, _) => write!(f, "[{}]", name),
        }
    }
}

impl fmt::Display for TextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextValue::Ident { negative, ident } => {
                if *negative {
                    write!(f, "-")?;
                }
                write!(f, "{}", ident)
            }
            TextValue::Int(int) => write!(f, "{}", int),
            TextValue::Float(float) => write!(f, "{}", float),
            TextValue::String(string) => write!(f, "\"{}\"", HexEscaped(&string.value)),
            TextValue::Message(message, _) => {
                if message.fields.is_empty() {
                    write!(f, "{{}}")
                } else {
                    writeln!(f, "{{")?;
                    message.fmt_fields(f, 2)?;
                    writeln!(f)?;
                    write!(f, "}}")
                }
            }
            TextValue::List(values, _) => {
                write!(f, "[")?;
                for (index, value) in values.iter().enumerate() {
                    if index != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
        }
    }
}

