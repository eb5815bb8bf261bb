use super::*;

impl<'a> Parser<'a> {
    /// Parses a sequence of text format fields, up to one of `terminators` or
    /// the end of the input.
    pub(super) fn parse_text_format_message(
        &mut self,
        terminators: &[Token],
    ) -> Result<ast::TextMessage, ()> {
        let mut fields = Vec::new();

        loop {
            match self.peek() {
                Some((Token::Ident(_) | Token::LeftBracket, _)) => {
                    fields.push(self.parse_text_format_field()?)
                }
                Some((tok, _)) if terminators.contains(&tok) => break,
                None if terminators.is_empty() => break,
                _ => self.unexpected_token("a field name or '['")?,
            }
        }

        Ok(ast::TextMessage { fields })
    }

    fn parse_text_format_field(&mut self) -> Result<ast::TextField, ()> {
        let name = self.parse_text_format_field_name()?;

        let value = match self.peek() {
            Some((Token::Colon, _)) => {
                self.bump();
                self.parse_text_format_value()?
            }
            // The colon is optional before a message value.
            Some((Token::LeftBrace | Token::LeftAngleBracket, _)) => {
                self.parse_text_format_value()?
            }
            _ => self.unexpected_token("':' or a message value")?,
        };

        // Fields may be separated by commas or semicolons.
        if !self.bump_if_eq(Token::Comma) {
            self.bump_if_eq(Token::Semicolon);
        }

        Ok(ast::TextField { name, value })
    }

    fn parse_text_format_field_name(&mut self) -> Result<ast::TextFieldName, ()> {
        match self.peek() {
            Some((Token::Ident(_), _)) => Ok(ast::TextFieldName::Ident(self.expect_ident()?)),
            Some((Token::LeftBracket, start)) => {
                self.bump();
                let name = self.parse_full_ident(&[Token::RightBracket])?;
                let end = self.expect_eq(Token::RightBracket)?;
                Ok(ast::TextFieldName::Extension(name, join_span(start, end)))
            }
            _ => self.unexpected_token("a field name or '['"),
        }
    }

    fn parse_text_format_value(&mut self) -> Result<ast::TextValue, ()> {
        match self.peek() {
            Some((Token::Minus, _)) => {
                self.bump();
                match self.peek() {
                    Some((Token::Ident(_), _)) => {
                        let ident = self.expect_ident()?;
                        Ok(ast::TextValue::Ident {
                            negative: true,
                            ident,
                        })
                    }
                    Some((Token::IntLiteral(value), span)) => {
                        self.bump();
                        Ok(ast::TextValue::Int(ast::Int {
                            negative: true,
                            value,
                            span,
                        }))
                    }
                    Some((Token::FloatLiteral(value), span)) => {
                        self.bump();
                        Ok(ast::TextValue::Float(ast::Float {
                            value: -value,
                            span,
                        }))
                    }
                    _ => self.unexpected_token("an identifier or number"),
                }
            }
            Some((Token::Ident(_), _)) => {
                let ident = self.expect_ident()?;
                Ok(ast::TextValue::Ident {
                    negative: false,
                    ident,
                })
            }
            Some((Token::IntLiteral(value), span)) => {
                self.bump();
                Ok(ast::TextValue::Int(ast::Int {
                    negative: false,
                    value,
                    span,
                }))
            }
            Some((Token::FloatLiteral(value), span)) => {
                self.bump();
                Ok(ast::TextValue::Float(ast::Float { value, span }))
            }
            Some((Token::StringLiteral(_), _)) => {
                Ok(ast::TextValue::String(self.parse_string()?))
            }
            Some((Token::LeftBrace | Token::LeftAngleBracket, _)) => {
                self.parse_text_format_message_value()
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
                        _ => values.push(self.parse_text_format_value()?),
                    }
                }
                Ok(ast::TextValue::List(values, join_span(start, end)))
            }
            _ => self.unexpected_token("an identifier, string, number, message or array"),
        }
    }

    fn parse_text_format_message_value(&mut self) -> Result<ast::TextValue, ()> {
        let (terminator, start) = match self.peek() {
            Some((Token::LeftBrace, span)) => (Token::RightBrace, span),
            Some((Token::LeftAngleBracket, span)) => (Token::RightAngleBracket, span),
            _ => return self.unexpected_token("'{' or '<'"),
        };
        self.bump();

        let message = self.parse_text_format_message(std::slice::from_ref(&terminator))?;
        let end = self.expect_eq(terminator)?;

        Ok(ast::TextValue::Message(message, join_span(start, end)))
    }
}
