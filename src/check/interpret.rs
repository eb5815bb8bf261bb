use prost_types as pb;

use prost_types::field_descriptor_proto::{Label, Type};

use crate::{
    ast,
    options::{OptionSet, Value},
    parse,
    registry::Registry,
    types::{DescriptorProto, EnumDescriptorProto, FileDescriptorProto},
};

use super::CheckError;

/// Resolves the uninterpreted options left behind by descriptor generation
/// into extension values, using a registry over the complete descriptor set
/// (including transitive imports).
///
/// Options were recorded against descriptors which no longer carry source
/// positions, so failures name the offending option instead.
pub(crate) fn interpret(
    file: &mut FileDescriptorProto,
    registry: &Registry,
) -> Result<(), Vec<CheckError>> {
    let mut context = Context {
        registry,
        errors: Vec::new(),
    };

    context.interpret_file(file);

    if context.errors.is_empty() {
        Ok(())
    } else {
        Err(context.errors)
    }
}

struct Context<'a, 'b> {
    registry: &'a Registry<'b>,
    errors: Vec<CheckError>,
}

impl<'a, 'b> Context<'a, 'b> {
    fn interpret_file(&mut self, file: &mut FileDescriptorProto) {
        self.interpret_options(&mut file.options, "google.protobuf.FileOptions");

        for message in &mut file.message_type {
            self.interpret_message(message);
        }
        for enu in &mut file.enum_type {
            self.interpret_enum(enu);
        }
        for service in &mut file.service {
            self.interpret_options(&mut service.options, "google.protobuf.ServiceOptions");
            for method in &mut service.method {
                self.interpret_options(&mut method.options, "google.protobuf.MethodOptions");
            }
        }
        for extension in &mut file.extension {
            self.interpret_options(&mut extension.options, "google.protobuf.FieldOptions");
        }
    }

    fn interpret_message(&mut self, message: &mut DescriptorProto) {
        self.interpret_options(&mut message.options, "google.protobuf.MessageOptions");

        for field in &mut message.field {
            self.interpret_options(&mut field.options, "google.protobuf.FieldOptions");
        }
        for extension in &mut message.extension {
            self.interpret_options(&mut extension.options, "google.protobuf.FieldOptions");
        }
        for oneof in &mut message.oneof_decl {
            self.interpret_options(&mut oneof.options, "google.protobuf.OneofOptions");
        }
        for range in &mut message.extension_range {
            self.interpret_options(&mut range.options, "google.protobuf.ExtensionRangeOptions");
        }
        for enu in &mut message.enum_type {
            self.interpret_enum(enu);
        }
        for nested in &mut message.nested_type {
            self.interpret_message(nested);
        }
    }

    fn interpret_enum(&mut self, enu: &mut EnumDescriptorProto) {
        self.interpret_options(&mut enu.options, "google.protobuf.EnumOptions");
        for value in &mut enu.value {
            self.interpret_options(&mut value.options, "google.protobuf.EnumValueOptions");
        }
    }

    fn interpret_options(&mut self, options: &mut Option<OptionSet>, namespace: &str) {
        if let Some(set) = options {
            let uninterpreted = set.take_uninterpreted();
            for option in &uninterpreted {
                // Failures are recorded; the option is dropped rather than
                // left uninterpreted.
                let _ = self.interpret_option(set, namespace, option);
            }
        }
    }

    fn interpret_option(
        &mut self,
        set: &mut OptionSet,
        namespace: &str,
        option: &pb::UninterpretedOption,
    ) -> Result<(), ()> {
        let option_name = fmt_option_name(&option.name);

        let mut message_name = namespace.to_owned();
        let mut dest = set;

        for (index, part) in option.name.iter().enumerate() {
            let last = index + 1 == option.name.len();

            let field = if part.is_extension {
                let extension = match self.registry.find_extension_by_name(&part.name_part) {
                    Some(extension) => extension,
                    None => {
                        self.errors.push(CheckError::OptionNotFound { name: option_name });
                        return Err(());
                    }
                };

                let extendee = extension.extendee().trim_start_matches('.');
                if extendee != message_name {
                    self.errors.push(CheckError::OptionWrongExtendee {
                        extension: part.name_part.trim_start_matches('.').to_owned(),
                        expected: message_name,
                    });
                    return Err(());
                }

                extension
            } else {
                let message = match self.registry.find_message_by_name(&message_name) {
                    Some(message) => message,
                    None => {
                        self.errors.push(CheckError::OptionNotFound { name: option_name });
                        return Err(());
                    }
                };

                match message
                    .field
                    .iter()
                    .find(|field| field.name() == part.name_part)
                {
                    Some(field) => field,
                    None => {
                        self.errors.push(CheckError::OptionUnknownField {
                            name: option_name,
                            part: part.name_part.clone(),
                            namespace: message_name,
                        });
                        return Err(());
                    }
                }
            };

            let number = field.number() as u32;
            if last {
                let value = self.option_value(field, option, &option_name)?;
                if field.label() == Label::Repeated {
                    dest.push(number, value);
                } else {
                    dest.set(number, value);
                }
            } else {
                if !matches!(field.r#type(), Type::Message | Type::Group) {
                    self.errors
                        .push(CheckError::OptionScalarFieldAccess { name: option_name });
                    return Err(());
                }

                let group = field.r#type() == Type::Group;
                message_name = field.type_name().trim_start_matches('.').to_owned();
                dest = if field.label() == Label::Repeated {
                    // Each access of a repeated message field appends a new
                    // element.
                    dest.push_message(number, group)
                } else {
                    dest.message_mut(number, group)
                };
            }
        }

        Ok(())
    }

    fn option_value(
        &mut self,
        field: &pb::FieldDescriptorProto,
        option: &pb::UninterpretedOption,
        name: &str,
    ) -> Result<Value, ()> {
        match field.r#type() {
            Type::Bool => match option.identifier_value.as_deref() {
                Some("true") => Ok(Value::Bool(true)),
                Some("false") => Ok(Value::Bool(false)),
                _ => self.invalid_value(name, "either 'true' or 'false'", option_actual(option)),
            },
            Type::Float | Type::Double => {
                let value = if let Some(double) = option.double_value {
                    double
                } else if let Some(int) = option_int(option) {
                    int as f64
                } else if option.identifier_value.as_deref() == Some("inf") {
                    f64::INFINITY
                } else {
                    return self.invalid_value(name, "a number", option_actual(option));
                };

                if field.r#type() == Type::Float {
                    Ok(Value::Float(value as f32))
                } else {
                    Ok(Value::Double(value))
                }
            }
            Type::String => match &option.string_value {
                Some(bytes) => match String::from_utf8(bytes.clone()) {
                    Ok(string) => Ok(Value::String(string)),
                    Err(_) => self.invalid_value(name, "a utf-8 string", option_actual(option)),
                },
                None => self.invalid_value(name, "a string", option_actual(option)),
            },
            Type::Bytes => match &option.string_value {
                Some(bytes) => Ok(Value::Bytes(bytes.clone())),
                None => self.invalid_value(name, "a string", option_actual(option)),
            },
            Type::Enum => {
                if let Some(ident) = &option.identifier_value {
                    self.enum_value(field, ident, name)
                } else if let Some(int) = option_int(option) {
                    let number = self.int_in_range(name, int, i32::MIN as i128, i32::MAX as i128, "a signed 32-bit integer")?;
                    Ok(Value::Enum(number as i32))
                } else {
                    self.invalid_value(name, "an enum value identifier", option_actual(option))
                }
            }
            Type::Message | Type::Group => {
                let aggregate = match &option.aggregate_value {
                    Some(aggregate) => aggregate,
                    None => {
                        return self.invalid_value(name, "an aggregate value", option_actual(option))
                    }
                };

                let text = match parse::parse_text_format(aggregate) {
                    Ok(text) => text,
                    Err(errors) => {
                        let reason = errors
                            .first()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "syntax error".to_owned());
                        self.errors.push(CheckError::OptionTextFormatError {
                            name: name.to_owned(),
                            reason,
                        });
                        return Err(());
                    }
                };

                let value = self.message_value(field, &text, name)?;
                if field.r#type() == Type::Group {
                    match value {
                        Value::Message(set) => Ok(Value::Group(set)),
                        value => Ok(value),
                    }
                } else {
                    Ok(value)
                }
            }
            scalar => {
                let int = match option_int(option) {
                    Some(int) => int,
                    None => return self.invalid_value(name, "an integer", option_actual(option)),
                };
                self.int_of_kind(scalar, int, name)
            }
        }
    }

    fn text_value(
        &mut self,
        field: &pb::FieldDescriptorProto,
        value: &ast::TextValue,
        name: &str,
    ) -> Result<Value, ()> {
        match field.r#type() {
            Type::Bool => match value {
                ast::TextValue::Ident {
                    negative: false,
                    ident,
                } if ident.value == "true" => Ok(Value::Bool(true)),
                ast::TextValue::Ident {
                    negative: false,
                    ident,
                } if ident.value == "false" => Ok(Value::Bool(false)),
                _ => self.invalid_value(name, "either 'true' or 'false'", value.to_string()),
            },
            Type::Float | Type::Double => {
                let float = match value {
                    ast::TextValue::Float(float) => float.value,
                    ast::TextValue::Int(int) => int_to_i128(int) as f64,
                    ast::TextValue::Ident { negative, ident } if ident.value == "inf" => {
                        if *negative {
                            f64::NEG_INFINITY
                        } else {
                            f64::INFINITY
                        }
                    }
                    _ => return self.invalid_value(name, "a number", value.to_string()),
                };

                if field.r#type() == Type::Float {
                    Ok(Value::Float(float as f32))
                } else {
                    Ok(Value::Double(float))
                }
            }
            Type::String => match value {
                ast::TextValue::String(string) => match String::from_utf8(string.value.clone()) {
                    Ok(string) => Ok(Value::String(string)),
                    Err(_) => self.invalid_value(name, "a utf-8 string", value.to_string()),
                },
                _ => self.invalid_value(name, "a string", value.to_string()),
            },
            Type::Bytes => match value {
                ast::TextValue::String(string) => Ok(Value::Bytes(string.value.clone())),
                _ => self.invalid_value(name, "a string", value.to_string()),
            },
            Type::Enum => match value {
                ast::TextValue::Ident {
                    negative: false,
                    ident,
                } => self.enum_value(field, &ident.value, name),
                ast::TextValue::Int(int) => {
                    let number = self.int_in_range(
                        name,
                        int_to_i128(int),
                        i32::MIN as i128,
                        i32::MAX as i128,
                        "a signed 32-bit integer",
                    )?;
                    Ok(Value::Enum(number as i32))
                }
                _ => self.invalid_value(name, "an enum value identifier", value.to_string()),
            },
            Type::Message | Type::Group => match value {
                ast::TextValue::Message(message, _) => {
                    let result = self.message_value(field, message, name)?;
                    if field.r#type() == Type::Group {
                        match result {
                            Value::Message(set) => Ok(Value::Group(set)),
                            result => Ok(result),
                        }
                    } else {
                        Ok(result)
                    }
                }
                _ => self.invalid_value(name, "a message value", value.to_string()),
            },
            scalar => match value {
                ast::TextValue::Int(int) => self.int_of_kind(scalar, int_to_i128(int), name),
                _ => self.invalid_value(name, "an integer", value.to_string()),
            },
        }
    }

    /// Converts a parsed text format body into a dynamic message of the
    /// field's type.
    fn message_value(
        &mut self,
        field: &pb::FieldDescriptorProto,
        text: &ast::TextMessage,
        name: &str,
    ) -> Result<Value, ()> {
        let message_name = field.type_name().trim_start_matches('.').to_owned();
        let message = match self.registry.find_message_by_name(&message_name) {
            Some(message) => message,
            None => {
                self.errors.push(CheckError::OptionNotFound {
                    name: name.to_owned(),
                });
                return Err(());
            }
        };

        let set = self.text_message(message, &message_name, text, name)?;
        Ok(Value::Message(set))
    }

    fn text_message(
        &mut self,
        message: &pb::DescriptorProto,
        message_name: &str,
        text: &ast::TextMessage,
        name: &str,
    ) -> Result<OptionSet, ()> {
        let mut set = OptionSet::new();

        for text_field in &text.fields {
            let field = match &text_field.name {
                ast::TextFieldName::Ident(ident) => {
                    match find_text_format_field(message, &ident.value) {
                        Some(field) => field,
                        None => {
                            self.errors.push(CheckError::OptionUnknownField {
                                name: name.to_owned(),
                                part: ident.value.clone(),
                                namespace: message_name.to_owned(),
                            });
                            return Err(());
                        }
                    }
                }
                ast::TextFieldName::Extension(extension_name, _) => {
                    let extension = match self
                        .registry
                        .find_extension_by_name(&extension_name.to_string())
                    {
                        Some(extension) => extension,
                        None => {
                            self.errors.push(CheckError::OptionUnknownField {
                                name: name.to_owned(),
                                part: extension_name.to_string(),
                                namespace: message_name.to_owned(),
                            });
                            return Err(());
                        }
                    };

                    if extension.extendee().trim_start_matches('.') != message_name {
                        self.errors.push(CheckError::OptionWrongExtendee {
                            extension: extension_name.to_string(),
                            expected: message_name.to_owned(),
                        });
                        return Err(());
                    }

                    extension
                }
            };

            let number = field.number() as u32;
            match &text_field.value {
                ast::TextValue::List(values, _) => {
                    if field.label() != Label::Repeated {
                        return self.invalid_value(
                            name,
                            "a single value",
                            text_field.value.to_string(),
                        );
                    }
                    for value in values {
                        let value = self.text_value(field, value, name)?;
                        set.push(number, value);
                    }
                }
                value => {
                    let value = self.text_value(field, value, name)?;
                    if field.label() == Label::Repeated {
                        set.push(number, value);
                    } else {
                        set.set(number, value);
                    }
                }
            }
        }

        Ok(set)
    }

    fn enum_value(
        &mut self,
        field: &pb::FieldDescriptorProto,
        ident: &str,
        name: &str,
    ) -> Result<Value, ()> {
        let enum_name = field.type_name().trim_start_matches('.');
        let enu = match self.registry.find_enum_by_name(enum_name) {
            Some(enu) => enu,
            None => {
                self.errors.push(CheckError::OptionNotFound {
                    name: name.to_owned(),
                });
                return Err(());
            }
        };

        match enu.value.iter().find(|value| value.name() == ident) {
            Some(value) => Ok(Value::Enum(value.number())),
            None => {
                self.errors.push(CheckError::OptionInvalidEnumValue {
                    name: name.to_owned(),
                    value_name: ident.to_owned(),
                    enum_name: enum_name.to_owned(),
                });
                Err(())
            }
        }
    }

    fn int_of_kind(&mut self, kind: Type, int: i128, name: &str) -> Result<Value, ()> {
        match kind {
            Type::Int32 => Ok(Value::Int32(self.int_in_range(
                name,
                int,
                i32::MIN as i128,
                i32::MAX as i128,
                "a signed 32-bit integer",
            )? as i32)),
            Type::Sint32 => Ok(Value::Sint32(self.int_in_range(
                name,
                int,
                i32::MIN as i128,
                i32::MAX as i128,
                "a signed 32-bit integer",
            )? as i32)),
            Type::Sfixed32 => Ok(Value::Sfixed32(self.int_in_range(
                name,
                int,
                i32::MIN as i128,
                i32::MAX as i128,
                "a signed 32-bit integer",
            )? as i32)),
            Type::Int64 => Ok(Value::Int64(self.int_in_range(
                name,
                int,
                i64::MIN as i128,
                i64::MAX as i128,
                "a signed 64-bit integer",
            )? as i64)),
            Type::Sint64 => Ok(Value::Sint64(self.int_in_range(
                name,
                int,
                i64::MIN as i128,
                i64::MAX as i128,
                "a signed 64-bit integer",
            )? as i64)),
            Type::Sfixed64 => Ok(Value::Sfixed64(self.int_in_range(
                name,
                int,
                i64::MIN as i128,
                i64::MAX as i128,
                "a signed 64-bit integer",
            )? as i64)),
            Type::Uint32 => Ok(Value::Uint32(self.int_in_range(
                name,
                int,
                0,
                u32::MAX as i128,
                "an unsigned 32-bit integer",
            )? as u32)),
            Type::Fixed32 => Ok(Value::Fixed32(self.int_in_range(
                name,
                int,
                0,
                u32::MAX as i128,
                "an unsigned 32-bit integer",
            )? as u32)),
            Type::Uint64 => Ok(Value::Uint64(self.int_in_range(
                name,
                int,
                0,
                u64::MAX as i128,
                "an unsigned 64-bit integer",
            )? as u64)),
            Type::Fixed64 => Ok(Value::Fixed64(self.int_in_range(
                name,
                int,
                0,
                u64::MAX as i128,
                "an unsigned 64-bit integer",
            )? as u64)),
            _ => unreachable!("not an integer kind"),
        }
    }

    fn int_in_range(
        &mut self,
        name: &str,
        int: i128,
        min: i128,
        max: i128,
        expected: &str,
    ) -> Result<i128, ()> {
        if (min..=max).contains(&int) {
            Ok(int)
        } else {
            self.errors.push(CheckError::OptionInvalidValue {
                name: name.to_owned(),
                expected: expected.to_owned(),
                actual: int.to_string(),
            });
            Err(())
        }
    }

    fn invalid_value<T>(&mut self, name: &str, expected: &str, actual: String) -> Result<T, ()> {
        self.errors.push(CheckError::OptionInvalidValue {
            name: name.to_owned(),
            expected: expected.to_owned(),
            actual,
        });
        Err(())
    }
}

fn option_int(option: &pb::UninterpretedOption) -> Option<i128> {
    if let Some(positive) = option.positive_int_value {
        Some(positive as i128)
    } else {
        option.negative_int_value.map(|negative| negative as i128)
    }
}

fn option_actual(option: &pb::UninterpretedOption) -> String {
    if let Some(ident) = &option.identifier_value {
        ident.clone()
    } else if let Some(positive) = option.positive_int_value {
        positive.to_string()
    } else if let Some(negative) = option.negative_int_value {
        negative.to_string()
    } else if let Some(double) = option.double_value {
        double.to_string()
    } else if let Some(string) = &option.string_value {
        String::from_utf8_lossy(string).into_owned()
    } else if let Some(aggregate) = &option.aggregate_value {
        aggregate.clone()
    } else {
        String::new()
    }
}

fn int_to_i128(int: &ast::Int) -> i128 {
    if int.negative {
        -(int.value as i128)
    } else {
        int.value as i128
    }
}

/// Text format fields of group type are written with the capitalized name of
/// the group message rather than the field name.
fn find_text_format_field<'a>(
    message: &'a pb::DescriptorProto,
    name: &str,
) -> Option<&'a pb::FieldDescriptorProto> {
    message
        .field
        .iter()
        .find(|field| field.name() == name)
        .or_else(|| {
            message.field.iter().find(|field| {
                field.r#type() == Type::Group
                    && field
                        .type_name()
                        .rsplit('.')
                        .next()
                        .map(|group| group == name)
                        .unwrap_or(false)
            })
        })
}

fn fmt_option_name(name: &[pb::uninterpreted_option::NamePart]) -> String {
    let mut result = String::new();
    for part in name {
        if !result.is_empty() {
            result.push('.');
        }
        if part.is_extension {
            result.push('(');
            result.push_str(part.name_part.trim_start_matches('.'));
            result.push(')');
        } else {
            result.push_str(&part.name_part);
        }
    }
    result
}
