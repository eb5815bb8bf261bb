use std::fmt::Write;

use logos::{Lexer, Logos, Span};
use miette::Diagnostic;
use thiserror::Error;

mod lex;
mod text_format;

use self::lex::Token;
use crate::{ast, join_span};

#[derive(Error, Debug, Diagnostic, PartialEq)]
pub(crate) enum ParseErrorKind {
    #[error("invalid token")]
    InvalidToken {
        #[label("found here")]
        span: Span,
    },
    #[error("integer is too large")]
    IntegerOutOfRange {
        #[label("integer defined here")]
        span: Span,
    },
    #[error("invalid string character")]
    InvalidStringCharacters {
        #[label("invalid characters")]
        span: Span,
    },
    #[error("unterminated string")]
    UnterminatedString {
        #[label("string starts here")]
        span: Span,
    },
    #[error("invalid string escape")]
    InvalidStringEscape {
        #[label("defined here")]
        span: Span,
    },
    #[error("string is not valid utf-8")]
    InvalidUtf8String {
        #[label("defined here")]
        span: Span,
    },
    #[error("unknown syntax '{syntax}'")]
    #[diagnostic(help("possible values are 'proto2' and 'proto3'"))]
    UnknownSyntax {
        syntax: String,
        #[label("defined here")]
        span: Span,
    },
    #[error("multiple package names specified")]
    DuplicatePackage {
        #[label("defined here…")]
        first: Span,
        #[label("…and again here")]
        second: Span,
    },
    #[error("a map field key type must be an integer, boolean or string")]
    InvalidMapFieldKeyType {
        #[label("defined here")]
        span: Span,
    },
    #[error("expected {expected}, but found '{found}'")]
    UnexpectedToken {
        expected: String,
        found: String,
        #[label("found here")]
        span: Span,
    },
    #[error("expected {expected}, but reached end of file")]
    UnexpectedEof { expected: String },
}

pub(crate) fn parse(source: &str) -> Result<ast::File, Vec<ParseErrorKind>> {
    let mut parser = Parser::new(source);
    match parser.parse_file() {
        Ok(file) if parser.lexer.extras.errors.is_empty() => Ok(file),
        _ => Err(parser.lexer.extras.errors),
    }
}

/// Parses a standalone text format message, as stored in the aggregate value
/// of an uninterpreted option.
pub(crate) fn parse_text_format(source: &str) -> Result<ast::TextMessage, Vec<ParseErrorKind>> {
    let mut parser = Parser::new(source);
    match parser.parse_text_format_message(&[]) {
        Ok(message) if parser.lexer.extras.errors.is_empty() => Ok(message),
        _ => Err(parser.lexer.extras.errors),
    }
}

struct Parser<'a> {
    lexer: Lexer<'a, Token<'a>>,
    peek: Vec<(Token<'a>, Span)>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Parser {
            lexer: Token::lexer(source),
            peek: Vec::with_capacity(2),
        }
    }

    fn parse_file(&mut self) -> Result<ast::File, ()> {
        let mut file = ast::File::default();

        if matches!(self.peek(), Some((Token::Ident("syntax"), _)))
            && self.peek2_is(&Token::Equals)
        {
            self.bump();
            self.expect_eq(Token::Equals)?;
            let syntax = self.parse_string()?;
            match syntax.value.as_slice() {
                b"proto2" => file.syntax = ast::Syntax::Proto2,
                b"proto3" => file.syntax = ast::Syntax::Proto3,
                _ => {
                    self.add_error(ParseErrorKind::UnknownSyntax {
                        syntax: String::from_utf8_lossy(&syntax.value).into_owned(),
                        span: syntax.span,
                    });
                    return Err(());
                }
            }
            self.expect_eq(Token::Semicolon)?;
        }

        loop {
            match self.peek() {
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::Ident(ident), span)) => match ident {
                    "package" => {
                        let package = self.parse_package()?;
                        if let Some(first) = &file.package {
                            self.add_error(ParseErrorKind::DuplicatePackage {
                                first: first.span.clone(),
                                second: span,
                            });
                        } else {
                            file.package = Some(package);
                        }
                    }
                    "import" => file.imports.push(self.parse_import()?),
                    "option" => file.options.push(self.parse_option()?),
                    "message" => file.items.push(ast::FileItem::Message(self.parse_message()?)),
                    "enum" => file.items.push(ast::FileItem::Enum(self.parse_enum()?)),
                    "service" => file.items.push(ast::FileItem::Service(self.parse_service()?)),
                    "extend" => file.items.push(ast::FileItem::Extend(self.parse_extend()?)),
                    _ => self.unexpected_token(
                        "'package', 'import', 'option', 'message', 'enum', 'service' or 'extend'",
                    )?,
                },
                None => return Ok(file),
                _ => self.unexpected_token(
                    "'package', 'import', 'option', 'message', 'enum', 'service' or 'extend'",
                )?,
            }
        }
    }

    fn parse_package(&mut self) -> Result<ast::Package, ()> {
        let start = self.expect_eq(Token::PACKAGE)?;
        let name = self.parse_full_ident(&[Token::Semicolon])?;
        let end = self.expect_eq(Token::Semicolon)?;

        Ok(ast::Package {
            name,
            span: join_span(start, end),
        })
    }

    fn parse_import(&mut self) -> Result<ast::Import, ()> {
        let start = self.expect_eq(Token::IMPORT)?;
        let kind = match self.peek() {
            Some((Token::Ident("weak"), _)) => {
                self.bump();
                Some(ast::ImportKind::Weak)
            }
            Some((Token::Ident("public"), _)) => {
                self.bump();
                Some(ast::ImportKind::Public)
            }
            _ => None,
        };

        let value = self.parse_utf8_string()?;
        let end = self.expect_eq(Token::Semicolon)?;

        Ok(ast::Import {
            kind,
            value,
            span: join_span(start, end),
        })
    }

    fn parse_message(&mut self) -> Result<ast::Message, ()> {
        let start = self.expect_eq(Token::MESSAGE)?;
        let name = self.expect_ident()?;

        self.expect_eq(Token::LeftBrace)?;
        let body = self.parse_message_body()?;
        let end = self.expect_eq(Token::RightBrace)?;

        Ok(ast::Message {
            name,
            body,
            span: join_span(start, end),
        })
    }

    fn parse_message_body(&mut self) -> Result<ast::MessageBody, ()> {
        let mut items = Vec::new();

        loop {
            match self.peek() {
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::RightBrace, _)) | None => break,
                Some((Token::Ident("message"), _)) => {
                    items.push(ast::MessageItem::Message(self.parse_message()?))
                }
                Some((Token::Ident("enum"), _)) => {
                    items.push(ast::MessageItem::Enum(self.parse_enum()?))
                }
                Some((Token::Ident("option"), _)) => {
                    items.push(ast::MessageItem::Option(self.parse_option()?))
                }
                Some((Token::Ident("oneof"), _)) => {
                    items.push(ast::MessageItem::Oneof(self.parse_oneof()?))
                }
                Some((Token::Ident("extend"), _)) => {
                    items.push(ast::MessageItem::Extend(self.parse_extend()?))
                }
                Some((Token::Ident("reserved"), _)) => {
                    items.push(ast::MessageItem::Reserved(self.parse_reserved()?))
                }
                Some((Token::Ident("extensions"), _)) => {
                    items.push(ast::MessageItem::Extensions(self.parse_extensions()?))
                }
                _ => items.push(ast::MessageItem::Field(self.parse_field()?)),
            }
        }

        Ok(ast::MessageBody { items })
    }

    fn parse_field(&mut self) -> Result<ast::Field, ()> {
        let label = match self.peek() {
            Some((Token::Ident("optional"), span)) => {
                self.bump();
                Some((ast::FieldLabel::Optional, span))
            }
            Some((Token::Ident("required"), span)) => {
                self.bump();
                Some((ast::FieldLabel::Required, span))
            }
            Some((Token::Ident("repeated"), span)) => {
                self.bump();
                Some((ast::FieldLabel::Repeated, span))
            }
            _ => None,
        };

        self.parse_field_body(label)
    }

    fn parse_field_body(
        &mut self,
        label: Option<(ast::FieldLabel, Span)>,
    ) -> Result<ast::Field, ()> {
        let start = match &label {
            Some((_, span)) => span.clone(),
            None => match self.peek() {
                Some((_, span)) => span,
                None => return self.unexpected_token("a field"),
            },
        };

        match self.peek() {
            Some((Token::Ident("group"), _)) => {
                self.bump();
                let name = self.expect_ident()?;
                self.expect_eq(Token::Equals)?;
                let number = self.parse_signed_int()?;

                let options = match self.peek() {
                    Some((Token::LeftBracket, _)) => self.parse_options_list()?,
                    _ => vec![],
                };

                self.expect_eq(Token::LeftBrace)?;
                let body = self.parse_message_body()?;
                let end = self.expect_eq(Token::RightBrace)?;

                Ok(ast::Field {
                    label,
                    kind: ast::FieldKind::Group {
                        name,
                        number,
                        body,
                        options,
                    },
                    span: join_span(start, end),
                })
            }
            Some((Token::Ident("map"), _)) if self.peek2_is(&Token::LeftAngleBracket) => {
                self.bump();
                self.expect_eq(Token::LeftAngleBracket)?;
                let key_ty = self.parse_map_key_type()?;
                self.expect_eq(Token::Comma)?;
                let value_ty = self.parse_field_type()?;
                self.expect_eq(Token::RightAngleBracket)?;
                let name = self.expect_ident()?;
                self.expect_eq(Token::Equals)?;
                let number = self.parse_signed_int()?;

                let options = match self.peek() {
                    Some((Token::LeftBracket, _)) => self.parse_options_list()?,
                    _ => vec![],
                };

                let end = self.expect_eq(Token::Semicolon)?;

                Ok(ast::Field {
                    label,
                    kind: ast::FieldKind::Map {
                        key_ty,
                        value_ty,
                        name,
                        number,
                        options,
                    },
                    span: join_span(start, end),
                })
            }
            _ => {
                let ty = self.parse_field_type()?;
                let name = self.expect_ident()?;
                self.expect_eq(Token::Equals)?;
                let number = self.parse_signed_int()?;

                let options = match self.peek() {
                    Some((Token::LeftBracket, _)) => self.parse_options_list()?,
                    _ => vec![],
                };

                let end = self.expect_eq(Token::Semicolon)?;

                Ok(ast::Field {
                    label,
                    kind: ast::FieldKind::Direct {
                        ty,
                        name,
                        number,
                        options,
                    },
                    span: join_span(start, end),
                })
            }
        }
    }

    fn parse_field_type(&mut self) -> Result<ast::Ty, ()> {
        match self.peek() {
            Some((Token::Ident(ident), _)) => {
                if let Some(scalar) = scalar_ty(ident) {
                    self.bump();
                    Ok(scalar)
                } else {
                    Ok(ast::Ty::Named(self.parse_type_name(&[])?))
                }
            }
            Some((Token::Dot, _)) => Ok(ast::Ty::Named(self.parse_type_name(&[])?)),
            _ => self.unexpected_token("a field type"),
        }
    }

    fn parse_map_key_type(&mut self) -> Result<ast::KeyTy, ()> {
        match self.peek() {
            Some((Token::Ident(ident), span)) => {
                let key_ty = match ident {
                    "int32" => ast::KeyTy::Int32,
                    "int64" => ast::KeyTy::Int64,
                    "uint32" => ast::KeyTy::Uint32,
                    "uint64" => ast::KeyTy::Uint64,
                    "sint32" => ast::KeyTy::Sint32,
                    "sint64" => ast::KeyTy::Sint64,
                    "fixed32" => ast::KeyTy::Fixed32,
                    "fixed64" => ast::KeyTy::Fixed64,
                    "sfixed32" => ast::KeyTy::Sfixed32,
                    "sfixed64" => ast::KeyTy::Sfixed64,
                    "bool" => ast::KeyTy::Bool,
                    "string" => ast::KeyTy::String,
                    _ => {
                        self.add_error(ParseErrorKind::InvalidMapFieldKeyType { span });
                        return Err(());
                    }
                };
                self.bump();
                Ok(key_ty)
            }
            _ => self.unexpected_token("a map key type"),
        }
    }

    fn parse_oneof(&mut self) -> Result<ast::Oneof, ()> {
        let start = self.expect_eq(Token::ONEOF)?;
        let name = self.expect_ident()?;
        self.expect_eq(Token::LeftBrace)?;

        let mut items = Vec::new();
        let end;
        loop {
            match self.peek() {
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::Ident("option"), _)) => {
                    items.push(ast::OneofItem::Option(self.parse_option()?))
                }
                Some((Token::RightBrace, _)) => {
                    end = self.bump().1;
                    break;
                }
                Some(_) => items.push(ast::OneofItem::Field(self.parse_field_body(None)?)),
                None => return self.unexpected_token("a field, 'option' or '}'"),
            }
        }

        Ok(ast::Oneof {
            name,
            items,
            span: join_span(start, end),
        })
    }

    fn parse_extend(&mut self) -> Result<ast::Extend, ()> {
        let start = self.expect_eq(Token::EXTEND)?;
        let extendee = self.parse_type_name(&[Token::LeftBrace])?;
        self.expect_eq(Token::LeftBrace)?;

        let mut fields = Vec::new();
        let end;
        loop {
            match self.peek() {
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::RightBrace, _)) => {
                    end = self.bump().1;
                    break;
                }
                Some(_) => fields.push(self.parse_field()?),
                None => return self.unexpected_token("a field or '}'"),
            }
        }

        Ok(ast::Extend {
            extendee,
            fields,
            span: join_span(start, end),
        })
    }

    fn parse_enum(&mut self) -> Result<ast::Enum, ()> {
        let start = self.expect_eq(Token::ENUM)?;
        let name = self.expect_ident()?;
        self.expect_eq(Token::LeftBrace)?;

        let mut values = Vec::new();
        let mut options = Vec::new();
        let mut reserved = Vec::new();

        let end;
        loop {
            match self.peek() {
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::RightBrace, _)) => {
                    end = self.bump().1;
                    break;
                }
                // 'option' and 'reserved' may also be value names, so look
                // ahead for the '=' of a value definition.
                Some((Token::Ident("option"), _)) if !self.peek2_is(&Token::Equals) => {
                    options.push(self.parse_option()?);
                }
                Some((Token::Ident("reserved"), _)) if !self.peek2_is(&Token::Equals) => {
                    reserved.push(self.parse_reserved()?);
                }
                Some((Token::Ident(_), _)) => values.push(self.parse_enum_value()?),
                _ => self.unexpected_token("an identifier, 'option', 'reserved' or '}'")?,
            }
        }

        Ok(ast::Enum {
            name,
            values,
            options,
            reserved,
            span: join_span(start, end),
        })
    }

    fn parse_enum_value(&mut self) -> Result<ast::EnumValue, ()> {
        let name = self.expect_ident()?;
        let start = name.span.clone();

        self.expect_eq(Token::Equals)?;
        let number = self.parse_signed_int()?;

        let options = match self.peek() {
            Some((Token::LeftBracket, _)) => self.parse_options_list()?,
            _ => vec![],
        };

        let end = self.expect_eq(Token::Semicolon)?;

        Ok(ast::EnumValue {
            name,
            number,
            options,
            span: join_span(start, end),
        })
    }

    fn parse_service(&mut self) -> Result<ast::Service, ()> {
        let start = self.expect_eq(Token::SERVICE)?;
        let name = self.expect_ident()?;
        self.expect_eq(Token::LeftBrace)?;

        let mut methods = Vec::new();
        let mut options = Vec::new();

        let end;
        loop {
            match self.peek() {
                Some((Token::Semicolon, _)) => {
                    self.bump();
                }
                Some((Token::Ident("rpc"), _)) => methods.push(self.parse_method()?),
                Some((Token::Ident("option"), _)) => options.push(self.parse_option()?),
                Some((Token::RightBrace, _)) => {
                    end = self.bump().1;
                    break;
                }
                _ => self.unexpected_token("'rpc', 'option', '}' or ';'")?,
            }
        }

        Ok(ast::Service {
            name,
            methods,
            options,
            span: join_span(start, end),
        })
    }

    fn parse_method(&mut self) -> Result<ast::Method, ()> {
        let start = self.expect_eq(Token::RPC)?;
        let name = self.expect_ident()?;

        self.expect_eq(Token::LeftParen)?;
        let client_streaming = self.bump_if_eq(Token::STREAM);
        let input_ty = self.parse_type_name(&[Token::RightParen])?;
        self.expect_eq(Token::RightParen)?;

        self.expect_eq(Token::RETURNS)?;
        self.expect_eq(Token::LeftParen)?;
        let server_streaming = self.bump_if_eq(Token::STREAM);
        let output_ty = self.parse_type_name(&[Token::RightParen])?;
        self.expect_eq(Token::RightParen)?;

        let mut options = Vec::new();
        let end;
        match self.peek() {
            Some((Token::Semicolon, _)) => {
                end = self.bump().1;
            }
            Some((Token::LeftBrace, _)) => {
                self.bump();
                loop {
                    match self.peek() {
                        Some((Token::Semicolon, _)) => {
                            self.bump();
                        }
                        Some((Token::Ident("option"), _)) => options.push(self.parse_option()?),
                        Some((Token::RightBrace, _)) => {
                            end = self.bump().1;
                            break;
                        }
                        _ => self.unexpected_token("'option', '}' or ';'")?,
                    }
                }
            }
            _ => return self.unexpected_token("';' or '{'"),
        }

        Ok(ast::Method {
            name,
            input_ty,
            client_streaming,
            output_ty,
            server_streaming,
            options,
            span: join_span(start, end),
        })
    }

    fn parse_reserved(&mut self) -> Result<ast::Reserved, ()> {
        let start = self.expect_eq(Token::RESERVED)?;

        match self.peek() {
            Some((Token::StringLiteral(_), _)) => {
                let mut names = vec![self.parse_utf8_string_as_ident()?];
                loop {
                    match self.peek() {
                        Some((Token::Comma, _)) => {
                            self.bump();
                            names.push(self.parse_utf8_string_as_ident()?);
                        }
                        Some((Token::Semicolon, _)) => {
                            let end = self.bump().1;
                            return Ok(ast::Reserved {
                                kind: ast::ReservedKind::Names(names),
                                span: join_span(start, end),
                            });
                        }
                        _ => self.unexpected_token("',' or ';'")?,
                    }
                }
            }
            _ => {
                let ranges = self.parse_ranges()?;
                let end = self.expect_eq(Token::Semicolon)?;
                Ok(ast::Reserved {
                    kind: ast::ReservedKind::Ranges(ranges),
                    span: join_span(start, end),
                })
            }
        }
    }

    fn parse_extensions(&mut self) -> Result<ast::Extensions, ()> {
        let start = self.expect_eq(Token::EXTENSIONS)?;
        let ranges = self.parse_ranges()?;

        let options = match self.peek() {
            Some((Token::LeftBracket, _)) => self.parse_options_list()?,
            _ => vec![],
        };

        let end = self.expect_eq(Token::Semicolon)?;

        Ok(ast::Extensions {
            ranges,
            options,
            span: join_span(start, end),
        })
    }

    fn parse_ranges(&mut self) -> Result<Vec<ast::ReservedRange>, ()> {
        let mut ranges = vec![self.parse_range()?];
        while self.bump_if_eq(Token::Comma) {
            ranges.push(self.parse_range()?);
        }
        Ok(ranges)
    }

    fn parse_range(&mut self) -> Result<ast::ReservedRange, ()> {
        let start = self.parse_signed_int()?;

        let end = if self.bump_if_eq(Token::TO) {
            match self.peek() {
                Some((Token::Ident("max"), span)) => {
                    self.bump();
                    ast::ReservedRangeEnd::Max(span)
                }
                _ => ast::ReservedRangeEnd::Int(self.parse_signed_int()?),
            }
        } else {
            ast::ReservedRangeEnd::None
        };

        Ok(ast::ReservedRange { start, end })
    }

    fn parse_options_list(&mut self) -> Result<Vec<ast::OptionBody>, ()> {
        self.expect_eq(Token::LeftBracket)?;

        let mut options = vec![self.parse_option_body(&[Token::Comma, Token::RightBracket])?];
        loop {
            match self.peek() {
                Some((Token::Comma, _)) => {
                    self.bump();
                    options.push(self.parse_option_body(&[Token::Comma, Token::RightBracket])?);
                }
                Some((Token::RightBracket, _)) => {
                    self.bump();
                    break;
                }
                _ => self.unexpected_token("',' or ']'")?,
            }
        }

        Ok(options)
    }

    fn parse_option(&mut self) -> Result<ast::OptionBody, ()> {
        self.expect_eq(Token::OPTION)?;
        let option = self.parse_option_body(&[Token::Semicolon])?;
        self.expect_eq(Token::Semicolon)?;
        Ok(option)
    }

    fn parse_option_body(&mut self, terminators: &[Token]) -> Result<ast::OptionBody, ()> {
        let mut name = vec![self.parse_option_name_part()?];
        let start = name[0].span();

        loop {
            match self.peek() {
                Some((Token::Dot, _)) => {
                    self.bump();
                    name.push(self.parse_option_name_part()?);
                }
                Some((Token::Equals, _)) => {
                    self.bump();
                    break;
                }
                _ => self.unexpected_token("'.' or '='")?,
            }
        }

        let value = self.parse_option_value(terminators)?;
        let span = join_span(start, value.span());

        Ok(ast::OptionBody { name, value, span })
    }

    fn parse_option_name_part(&mut self) -> Result<ast::OptionNamePart, ()> {
        match self.peek() {
            Some((Token::LeftParen, start)) => {
                self.bump();
                let name = self.parse_type_name(&[Token::RightParen])?;
                let end = self.expect_eq(Token::RightParen)?;
                Ok(ast::OptionNamePart::Extension(name, join_span(start, end)))
            }
            Some((Token::Ident(_), _)) => Ok(ast::OptionNamePart::Ident(self.expect_ident()?)),
            _ => self.unexpected_token("an identifier or '('"),
        }
    }

    fn parse_option_value(&mut self, terminators: &[Token]) -> Result<ast::OptionValue, ()> {
        match self.peek() {
            Some((Token::Ident("inf"), _)) => self.parse_int_or_float(false),
            Some((Token::Ident(_), _)) => {
                Ok(ast::OptionValue::Ident(self.parse_full_ident(terminators)?))
            }
            Some((Token::Plus, _)) => {
                self.bump();
                self.parse_int_or_float(false)
            }
            Some((Token::Minus, _)) => {
                self.bump();
                self.parse_int_or_float(true)
            }
            Some((Token::IntLiteral(_) | Token::FloatLiteral(_), _)) => {
                self.parse_int_or_float(false)
            }
            Some((Token::StringLiteral(_), _)) => {
                Ok(ast::OptionValue::String(self.parse_string()?))
            }
            Some((Token::LeftBrace, start)) => {
                self.bump();
                let message = self.parse_text_format_message(&[Token::RightBrace])?;
                let end = self.expect_eq(Token::RightBrace)?;
                Ok(ast::OptionValue::Aggregate(message, join_span(start, end)))
            }
            Some((Token::LeftBracket, start)) => {
                self.bump();
                let mut values = Vec::new();
                let end;
                loop {
                    match self.peek() {
                        Some((Token::RightBracket, _)) => {
                            end = self.bump().1;
                            break;
                        }
                        Some((Token::Comma, _)) if !values.is_empty() => {
                            self.bump();
                        }
                        _ => values
                            .push(self.parse_option_value(&[Token::Comma, Token::RightBracket])?),
                    }
                }
                Ok(ast::OptionValue::Array(values, join_span(start, end)))
            }
            _ => self.unexpected_token("a constant"),
        }
    }

    fn parse_int_or_float(&mut self, negative: bool) -> Result<ast::OptionValue, ()> {
        match self.peek() {
            Some((Token::IntLiteral(value), span)) => {
                self.bump();
                Ok(ast::OptionValue::Int(ast::Int {
                    negative,
                    value,
                    span,
                }))
            }
            Some((Token::FloatLiteral(value), span)) => {
                self.bump();
                Ok(ast::OptionValue::Float(ast::Float {
                    value: if negative { -value } else { value },
                    span,
                }))
            }
            Some((Token::Ident("inf"), span)) => {
                self.bump();
                Ok(ast::OptionValue::Float(ast::Float {
                    value: if negative {
                        f64::NEG_INFINITY
                    } else {
                        f64::INFINITY
                    },
                    span,
                }))
            }
            _ => self.unexpected_token("a numeric literal"),
        }
    }

    fn parse_signed_int(&mut self) -> Result<ast::Int, ()> {
        let (negative, start) = match self.peek() {
            Some((Token::Minus, span)) => {
                self.bump();
                (true, Some(span))
            }
            _ => (false, None),
        };

        match self.peek() {
            Some((Token::IntLiteral(value), span)) => {
                self.bump();
                let span = match start {
                    Some(start) => join_span(start, span),
                    None => span,
                };
                Ok(ast::Int {
                    negative,
                    value,
                    span,
                })
            }
            _ => self.unexpected_token("an integer"),
        }
    }

    fn parse_type_name(&mut self, terminators: &[Token]) -> Result<ast::TypeName, ()> {
        let leading_dot = match self.peek() {
            Some((Token::Dot, span)) => {
                self.bump();
                Some(span)
            }
            Some((Token::Ident(_), _)) => None,
            _ => self.unexpected_token("a type name")?,
        };

        let name = self.parse_full_ident(terminators)?;

        Ok(ast::TypeName { leading_dot, name })
    }

    /// Parses a dotted identifier. With an empty terminator list, the
    /// identifier ends at the first token that does not continue it.
    fn parse_full_ident(&mut self, terminators: &[Token]) -> Result<ast::FullIdent, ()> {
        let mut result = vec![self.expect_ident()?];

        loop {
            match self.peek() {
                Some((Token::Dot, _)) => {
                    self.bump();
                }
                Some((tok, _)) if terminators.contains(&tok) => {
                    return Ok(result.into());
                }
                _ if terminators.is_empty() => {
                    return Ok(result.into());
                }
                _ => self.unexpected_token(fmt_expected(
                    std::iter::once(&Token::Dot).chain(terminators.iter()),
                ))?,
            }

            result.push(self.expect_ident()?);
        }
    }

    fn parse_utf8_string_as_ident(&mut self) -> Result<ast::Ident, ()> {
        let string = self.parse_utf8_string()?;
        let value =
            String::from_utf8(string.value).expect("parse_utf8_string returned invalid utf-8");
        Ok(ast::Ident::new(value, string.span))
    }

    fn parse_utf8_string(&mut self) -> Result<ast::StringLit, ()> {
        let string = self.parse_string()?;
        if std::str::from_utf8(&string.value).is_err() {
            self.add_error(ParseErrorKind::InvalidUtf8String {
                span: string.span.clone(),
            });
            return Err(());
        }
        Ok(string)
    }

    /// Parses a string literal. Adjacent string literals are concatenated:
    /// `"a" "b"` is equivalent to `"ab"`.
    fn parse_string(&mut self) -> Result<ast::StringLit, ()> {
        let (mut value, mut span) = match self.peek() {
            Some((Token::StringLiteral(value), span)) => {
                self.bump();
                (value.into_owned(), span)
            }
            _ => return self.unexpected_token("a string"),
        };

        while let Some((Token::StringLiteral(next), next_span)) = self.peek() {
            self.bump();
            value.extend_from_slice(&next);
            span = join_span(span, next_span);
        }

        Ok(ast::StringLit { value, span })
    }

    fn expect_ident(&mut self) -> Result<ast::Ident, ()> {
        match self.peek() {
            Some((Token::Ident(value), span)) => {
                self.bump();
                Ok(ast::Ident::new(value, span))
            }
            _ => self.unexpected_token("an identifier"),
        }
    }

    fn expect_eq(&mut self, t: Token) -> Result<Span, ()> {
        match self.peek() {
            Some((tok, span)) if tok == t => {
                self.bump();
                Ok(span)
            }
            _ => self.unexpected_token(format!("'{}'", t))?,
        }
    }

    fn bump_if_eq(&mut self, t: Token) -> bool {
        match self.peek() {
            Some((tok, _)) if tok == t => {
                self.bump();
                true
            }
            _ => false,
        }
    }

    fn bump(&mut self) -> (Token<'a>, Span) {
        if self.peek.is_empty() {
            panic!("called bump without peek returning Some()");
        }
        self.peek.remove(0)
    }

    fn peek(&mut self) -> Option<(Token<'a>, Span)> {
        self.peek_nth(0)
    }

    fn peek2_is(&mut self, t: &Token) -> bool {
        matches!(self.peek_nth(1), Some((tok, _)) if &tok == t)
    }

    fn peek_nth(&mut self, n: usize) -> Option<(Token<'a>, Span)> {
        while self.peek.len() <= n {
            match self.next_token() {
                Some(tok) => self.peek.push(tok),
                None => return None,
            }
        }
        Some(self.peek[n].clone())
    }

    fn next_token(&mut self) -> Option<(Token<'a>, Span)> {
        match self.lexer.next() {
            Some(Token::Error) => {
                self.lexer.extras.errors.push(ParseErrorKind::InvalidToken {
                    span: self.lexer.span(),
                });
                Some((Token::Error, self.lexer.span()))
            }
            Some(tok) => Some((tok, self.lexer.span())),
            None => None,
        }
    }

    fn unexpected_token<T>(&mut self, expected: impl ToString) -> Result<T, ()> {
        match self.peek() {
            Some((Token::Error, _)) => Err(()),
            Some((found, span)) => {
                self.add_error(ParseErrorKind::UnexpectedToken {
                    expected: expected.to_string(),
                    found: found.to_string(),
                    span,
                });
                Err(())
            }
            None => {
                self.add_error(ParseErrorKind::UnexpectedEof {
                    expected: expected.to_string(),
                });
                Err(())
            }
        }
    }

    fn add_error(&mut self, err: ParseErrorKind) {
        self.lexer.extras.errors.push(err);
    }
}

fn scalar_ty(ident: &str) -> Option<ast::Ty> {
    match ident {
        "double" => Some(ast::Ty::Double),
        "float" => Some(ast::Ty::Float),
        "int32" => Some(ast::Ty::Int32),
        "int64" => Some(ast::Ty::Int64),
        "uint32" => Some(ast::Ty::Uint32),
        "uint64" => Some(ast::Ty::Uint64),
        "sint32" => Some(ast::Ty::Sint32),
        "sint64" => Some(ast::Ty::Sint64),
        "fixed32" => Some(ast::Ty::Fixed32),
        "fixed64" => Some(ast::Ty::Fixed64),
        "sfixed32" => Some(ast::Ty::Sfixed32),
        "sfixed64" => Some(ast::Ty::Sfixed64),
        "bool" => Some(ast::Ty::Bool),
        "string" => Some(ast::Ty::String),
        "bytes" => Some(ast::Ty::Bytes),
        _ => None,
    }
}

fn fmt_expected<'a, 'b>(ts: impl Iterator<Item = &'b Token<'a>>) -> String
where
    'a: 'b,
{
    let ts: Vec<_> = ts.collect();

    let mut s = String::with_capacity(32);
    write!(s, "'{}'", ts[0]).unwrap();
    if ts.len() > 1 {
        for t in &ts[1..ts.len() - 1] {
            write!(s, ", '{}'", t).unwrap();
        }
        write!(s, " or '{}'", ts[ts.len() - 1]).unwrap();
    }
    s
}
