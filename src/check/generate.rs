use prost_types::field_descriptor_proto::{Label, Type};

use crate::{
    ast,
    case::{to_json_name, to_pascal_case},
    fmt::HexEscaped,
    index_to_i32,
    options::{OptionSet, Value},
    s, tag,
    types::{
        descriptor_proto::ExtensionRange, descriptor_proto::ReservedRange,
        enum_descriptor_proto::EnumReservedRange, uninterpreted_option::NamePart, DescriptorProto,
        EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
        MethodDescriptorProto, OneofDescriptorProto, ServiceDescriptorProto, UninterpretedOption,
    },
};

use super::{
    known::{self, KnownKind},
    names::{full_name, DefinitionKind, TypeIndex},
    CheckError, MAX_MESSAGE_FIELD_NUMBER,
};

/// Generates the descriptor for a single parsed file.
///
/// Without a type index, references are left as written and their kinds
/// unset, and extension option names are not resolved.
pub(crate) fn generate(
    ast: &ast::File,
    name: Option<&str>,
    index: Option<&TypeIndex>,
) -> Result<FileDescriptorProto, Vec<CheckError>> {
    let mut context = Context {
        proto3: ast.syntax == ast::Syntax::Proto3,
        index,
        scope: Vec::new(),
        errors: Vec::new(),
    };

    let file = context.generate_file(ast, name);

    debug_assert!(context.scope.is_empty());

    if context.errors.is_empty() {
        Ok(file)
    } else {
        Err(context.errors)
    }
}

struct Context<'a> {
    proto3: bool,
    index: Option<&'a TypeIndex>,
    scope: Vec<String>,
    errors: Vec<CheckError>,
}

impl<'a> Context<'a> {
    fn generate_file(&mut self, ast: &ast::File, name: Option<&str>) -> FileDescriptorProto {
        if let Some(package) = &ast.package {
            for part in &package.name.parts {
                self.scope.push(part.value.clone());
            }
        }

        let package = ast.package.as_ref().map(|p| p.name.to_string());

        let mut dependency = Vec::with_capacity(ast.imports.len());
        let mut public_dependency = Vec::new();
        for (index, import) in ast.imports.iter().enumerate() {
            dependency.push(String::from_utf8_lossy(&import.value.value).into_owned());
            if import.kind == Some(ast::ImportKind::Public) {
                public_dependency.push(index_to_i32(index));
            }
        }

        let options = self.generate_options(&ast.options, known::file_option);

        let mut message_type = Vec::new();
        let mut enum_type = Vec::new();
        let mut service = Vec::new();
        let mut extension = Vec::new();

        for item in &ast.items {
            match item {
                ast::FileItem::Message(message) => {
                    let descriptor = self.generate_message_body(&message.name.value, &message.body);
                    message_type.push(descriptor);
                }
                ast::FileItem::Enum(enu) => enum_type.push(self.generate_enum(enu)),
                ast::FileItem::Service(s) => service.push(self.generate_service(s)),
                ast::FileItem::Extend(extend) => {
                    self.generate_extend(extend, &mut extension, &mut message_type)
                }
            }
        }

        let syntax = if self.proto3 {
            Some(ast::Syntax::Proto3.to_string())
        } else {
            None
        };

        if let Some(package) = &ast.package {
            for _ in &package.name.parts {
                self.scope.pop();
            }
        }

        FileDescriptorProto {
            name: name.map(ToOwned::to_owned),
            package,
            dependency,
            public_dependency,
            weak_dependency: vec![],
            message_type,
            enum_type,
            service,
            extension,
            options,
            syntax,
        }
    }

    fn generate_message_body(&mut self, name: &str, body: &ast::MessageBody) -> DescriptorProto {
        self.scope.push(name.to_owned());

        let mut message = DescriptorProto {
            name: s(name),
            ..Default::default()
        };
        let mut proto3_optional_fields = Vec::new();

        for item in &body.items {
            match item {
                ast::MessageItem::Field(field) => self.generate_message_field(
                    field,
                    None,
                    &mut message,
                    &mut proto3_optional_fields,
                ),
                ast::MessageItem::Message(nested) => {
                    let descriptor = self.generate_message_body(&nested.name.value, &nested.body);
                    message.nested_type.push(descriptor);
                }
                ast::MessageItem::Enum(enu) => message.enum_type.push(self.generate_enum(enu)),
                ast::MessageItem::Option(option) => {
                    let options = message.options.get_or_insert_with(OptionSet::new);
                    self.generate_option_into(options, option, known::message_option);
                }
                ast::MessageItem::Oneof(oneof) => {
                    self.generate_oneof(oneof, &mut message, &mut proto3_optional_fields)
                }
                ast::MessageItem::Extend(extend) => {
                    self.generate_extend(extend, &mut message.extension, &mut message.nested_type)
                }
                ast::MessageItem::Reserved(reserved) => match &reserved.kind {
                    ast::ReservedKind::Ranges(ranges) => message
                        .reserved_range
                        .extend(ranges.iter().map(|range| self.message_reserved_range(range))),
                    ast::ReservedKind::Names(names) => message
                        .reserved_name
                        .extend(names.iter().map(|name| name.value.clone())),
                },
                ast::MessageItem::Extensions(extensions) => {
                    let options = self
                        .generate_options(&extensions.options, known::extension_range_option);
                    message
                        .extension_range
                        .extend(extensions.ranges.iter().map(|range| ExtensionRange {
                            options: options.clone(),
                            ..self.message_extension_range(range)
                        }));
                }
            }
        }

        // Proto3 optional fields are lowered to single-member synthetic
        // oneofs named '_<field>', appended after all declared oneofs.
        for index in proto3_optional_fields {
            let oneof_index = index_to_i32(message.oneof_decl.len());
            let field: &mut FieldDescriptorProto = &mut message.field[index];
            field.oneof_index = Some(oneof_index);
            let oneof_name = format!("_{}", field.name.as_deref().unwrap_or_default());
            message.oneof_decl.push(OneofDescriptorProto {
                name: Some(oneof_name),
                options: None,
            });
        }

        self.scope.pop();
        message
    }

    fn generate_message_field(
        &mut self,
        field: &ast::Field,
        oneof_index: Option<i32>,
        message: &mut DescriptorProto,
        proto3_optional_fields: &mut Vec<usize>,
    ) {
        let descriptor = self.generate_field(field, oneof_index, None);
        let is_proto3_optional = descriptor.proto3_optional == Some(true);
        message.field.push(descriptor);
        if is_proto3_optional {
            proto3_optional_fields.push(message.field.len() - 1);
        }

        match &field.kind {
            ast::FieldKind::Group { name, body, .. } => {
                let nested = self.generate_message_body(&name.value, body);
                message.nested_type.push(nested);
            }
            ast::FieldKind::Map {
                key_ty, value_ty, name, ..
            } => {
                let entry = self.generate_map_entry(*key_ty, value_ty, name);
                message.nested_type.push(entry);
            }
            ast::FieldKind::Direct { .. } => (),
        }
    }

    fn generate_oneof(
        &mut self,
        oneof: &ast::Oneof,
        message: &mut DescriptorProto,
        proto3_optional_fields: &mut Vec<usize>,
    ) {
        let oneof_index = index_to_i32(message.oneof_decl.len());
        let mut options = None;

        message.oneof_decl.push(OneofDescriptorProto {
            name: s(&oneof.name.value),
            options: None,
        });

        for item in &oneof.items {
            match item {
                ast::OneofItem::Field(field) => self.generate_message_field(
                    field,
                    Some(oneof_index),
                    message,
                    proto3_optional_fields,
                ),
                ast::OneofItem::Option(option) => {
                    let set = options.get_or_insert_with(OptionSet::new);
                    self.generate_option_into(set, option, known::oneof_option);
                }
            }
        }

        message.oneof_decl[oneof_index as usize].options = options;
    }

    fn generate_extend(
        &mut self,
        extend: &ast::Extend,
        extensions: &mut Vec<FieldDescriptorProto>,
        messages: &mut Vec<DescriptorProto>,
    ) {
        let (extendee, kind) = self.resolve_type_name(&extend.extendee);
        if matches!(kind, Some(kind) if kind != DefinitionKind::Message) {
            self.errors.push(CheckError::InvalidExtendeeTypeName {
                name: extend.extendee.to_string(),
                span: extend.extendee.span(),
            });
        }

        for field in &extend.fields {
            let descriptor = self.generate_field(field, None, Some(&extendee));
            extensions.push(descriptor);

            if let ast::FieldKind::Group { name, body, .. } = &field.kind {
                let nested = self.generate_message_body(&name.value, body);
                messages.push(nested);
            }
        }
    }

    fn generate_field(
        &mut self,
        field: &ast::Field,
        oneof_index: Option<i32>,
        extendee: Option<&str>,
    ) -> FieldDescriptorProto {
        let name = match &field.kind {
            ast::FieldKind::Direct { name, .. } | ast::FieldKind::Map { name, .. } => {
                name.value.clone()
            }
            // Group fields take the lowercased name of their message.
            ast::FieldKind::Group { name, .. } => name.value.to_ascii_lowercase(),
        };

        let number = self.field_number(field.number());
        let json_name = Some(to_json_name(&name));
        let label = self.field_label(field, oneof_index.is_some(), extendee.is_some());
        let (ty, type_name) = self.field_type(field);
        let (options, default_value) = self.field_options(field, ty);

        let proto3_optional = if self.proto3
            && oneof_index.is_none()
            && matches!(field.kind, ast::FieldKind::Direct { .. })
            && matches!(field.label, Some((ast::FieldLabel::Optional, _)))
        {
            Some(true)
        } else {
            None
        };

        FieldDescriptorProto {
            name: Some(name),
            number,
            label: label.map(|label| label as i32),
            r#type: ty.map(|ty| ty as i32),
            type_name,
            extendee: extendee.map(ToOwned::to_owned),
            default_value,
            oneof_index,
            json_name,
            options,
            proto3_optional,
        }
    }

    fn field_label(&mut self, field: &ast::Field, in_oneof: bool, in_extend: bool) -> Option<Label> {
        let is_map = matches!(field.kind, ast::FieldKind::Map { .. });
        if is_map {
            if in_oneof {
                self.errors.push(CheckError::InvalidOneofFieldKind {
                    kind: "map",
                    span: field.span.clone(),
                });
                return None;
            } else if in_extend {
                self.errors.push(CheckError::InvalidExtendFieldKind {
                    kind: "map",
                    span: field.span.clone(),
                });
                return None;
            }
        }

        if self.proto3 {
            if let ast::FieldKind::Group { .. } = field.kind {
                self.errors.push(CheckError::Proto3GroupField {
                    span: field.span.clone(),
                });
            }
        }

        match &field.label {
            Some((ast::FieldLabel::Required, span)) => {
                if self.proto3 {
                    self.errors.push(CheckError::Proto3RequiredField {
                        span: span.clone(),
                    });
                }
                Some(Label::Required)
            }
            Some((ast::FieldLabel::Repeated, _)) => Some(Label::Repeated),
            Some((ast::FieldLabel::Optional, _)) => Some(Label::Optional),
            // Oneof and map entry fields are unlabelled in both syntaxes.
            None if in_oneof => Some(Label::Optional),
            None if is_map => Some(Label::Repeated),
            None if self.proto3 => Some(Label::Optional),
            None => {
                self.errors.push(CheckError::Proto2FieldMissingLabel {
                    span: field.span.clone(),
                });
                None
            }
        }
    }

    fn field_type(&mut self, field: &ast::Field) -> (Option<Type>, Option<String>) {
        match &field.kind {
            ast::FieldKind::Direct { ty, .. } => self.resolve_type(ty),
            ast::FieldKind::Group { name, .. } => {
                // The group's message was registered in the enclosing scope.
                let type_name = full_name(&self.scope, &name.value);
                (Some(Type::Group), Some(type_name))
            }
            ast::FieldKind::Map { name, .. } => {
                let entry_name = to_pascal_case(&name.value) + "Entry";
                let type_name = full_name(&self.scope, &entry_name);
                (Some(Type::Message), Some(type_name))
            }
        }
    }

    fn resolve_type(&mut self, ty: &ast::Ty) -> (Option<Type>, Option<String>) {
        match ty {
            ast::Ty::Double => (Some(Type::Double), None),
            ast::Ty::Float => (Some(Type::Float), None),
            ast::Ty::Int32 => (Some(Type::Int32), None),
            ast::Ty::Int64 => (Some(Type::Int64), None),
            ast::Ty::Uint32 => (Some(Type::Uint32), None),
            ast::Ty::Uint64 => (Some(Type::Uint64), None),
            ast::Ty::Sint32 => (Some(Type::Sint32), None),
            ast::Ty::Sint64 => (Some(Type::Sint64), None),
            ast::Ty::Fixed32 => (Some(Type::Fixed32), None),
            ast::Ty::Fixed64 => (Some(Type::Fixed64), None),
            ast::Ty::Sfixed32 => (Some(Type::Sfixed32), None),
            ast::Ty::Sfixed64 => (Some(Type::Sfixed64), None),
            ast::Ty::Bool => (Some(Type::Bool), None),
            ast::Ty::String => (Some(Type::String), None),
            ast::Ty::Bytes => (Some(Type::Bytes), None),
            ast::Ty::Named(type_name) => match self.resolve_type_name(type_name) {
                (name, Some(DefinitionKind::Message)) => (Some(Type::Message), Some(name)),
                (name, Some(DefinitionKind::Enum)) => (Some(Type::Enum), Some(name)),
                // References to groups are stored as message-typed fields.
                (name, Some(DefinitionKind::Group)) => (Some(Type::Message), Some(name)),
                (name, None) => (None, Some(name)),
            },
        }
    }

    fn resolve_type_name(&mut self, type_name: &ast::TypeName) -> (String, Option<DefinitionKind>) {
        let name = type_name.to_string();
        match self.index {
            Some(index) => match index.resolve(&name, &self.scope) {
                Some((full_name, kind)) => (full_name, Some(kind)),
                None => {
                    self.errors.push(CheckError::TypeNameNotFound {
                        name: name.clone(),
                        span: type_name.span(),
                    });
                    (name, None)
                }
            },
            None => (name, None),
        }
    }

    fn generate_map_entry(
        &mut self,
        key_ty: ast::KeyTy,
        value_ty: &ast::Ty,
        name: &ast::Ident,
    ) -> DescriptorProto {
        let key = FieldDescriptorProto {
            name: s("key"),
            number: Some(1),
            json_name: s("key"),
            label: Some(Label::Optional as i32),
            r#type: Some(key_type(key_ty) as i32),
            ..Default::default()
        };

        let (value_type, value_type_name) = self.resolve_type(value_ty);
        let value = FieldDescriptorProto {
            name: s("value"),
            number: Some(2),
            json_name: s("value"),
            label: Some(Label::Optional as i32),
            r#type: value_type.map(|ty| ty as i32),
            type_name: value_type_name,
            ..Default::default()
        };

        let mut options = OptionSet::new();
        options.set(tag::message_options::MAP_ENTRY, Value::Bool(true));

        DescriptorProto {
            name: Some(to_pascal_case(&name.value) + "Entry"),
            field: vec![key, value],
            options: Some(options),
            ..Default::default()
        }
    }

    fn generate_enum(&mut self, enu: &ast::Enum) -> EnumDescriptorProto {
        let value = enu
            .values
            .iter()
            .map(|value| self.generate_enum_value(value))
            .collect();

        let mut reserved_range = Vec::new();
        let mut reserved_name = Vec::new();
        for reserved in &enu.reserved {
            match &reserved.kind {
                ast::ReservedKind::Ranges(ranges) => reserved_range.extend(
                    ranges.iter().map(|range| self.enum_reserved_range(range)),
                ),
                ast::ReservedKind::Names(names) => {
                    reserved_name.extend(names.iter().map(|name| name.value.clone()))
                }
            }
        }

        let options = self.generate_options(&enu.options, known::enum_option);

        EnumDescriptorProto {
            name: s(&enu.name.value),
            value,
            options,
            reserved_range,
            reserved_name,
        }
    }

    fn generate_enum_value(&mut self, value: &ast::EnumValue) -> EnumValueDescriptorProto {
        let number = self.enum_number(&value.number);
        let options = self.generate_options(&value.options, known::enum_value_option);

        EnumValueDescriptorProto {
            name: s(&value.name.value),
            number,
            options,
        }
    }

    fn generate_service(&mut self, service: &ast::Service) -> ServiceDescriptorProto {
        let method = service
            .methods
            .iter()
            .map(|method| self.generate_method(method))
            .collect();

        let options = self.generate_options(&service.options, known::service_option);

        ServiceDescriptorProto {
            name: s(&service.name.value),
            method,
            options,
        }
    }

    fn generate_method(&mut self, method: &ast::Method) -> MethodDescriptorProto {
        let (input_type, kind) = self.resolve_type_name(&method.input_ty);
        if !matches!(
            kind,
            None | Some(DefinitionKind::Message) | Some(DefinitionKind::Group)
        ) {
            self.errors.push(CheckError::InvalidMethodTypeName {
                name: method.input_ty.to_string(),
                kind: "input",
                span: method.input_ty.span(),
            })
        }

        let (output_type, kind) = self.resolve_type_name(&method.output_ty);
        if !matches!(
            kind,
            None | Some(DefinitionKind::Message) | Some(DefinitionKind::Group)
        ) {
            self.errors.push(CheckError::InvalidMethodTypeName {
                name: method.output_ty.to_string(),
                kind: "output",
                span: method.output_ty.span(),
            })
        }

        let options = self.generate_options(&method.options, known::method_option);

        MethodDescriptorProto {
            name: s(&method.name.value),
            input_type: Some(input_type),
            output_type: Some(output_type),
            options,
            // Streaming flags are only recorded when set, like the reference
            // compiler.
            client_streaming: if method.client_streaming {
                Some(true)
            } else {
                None
            },
            server_streaming: if method.server_streaming {
                Some(true)
            } else {
                None
            },
        }
    }

    fn message_reserved_range(&mut self, range: &ast::ReservedRange) -> ReservedRange {
        let (start, end) = self.message_range(range);
        ReservedRange { start, end }
    }

    fn message_extension_range(&mut self, range: &ast::ReservedRange) -> ExtensionRange {
        let (start, end) = self.message_range(range);
        ExtensionRange {
            start,
            end,
            options: None,
        }
    }

    /// Message ranges are stored half-open: `5` becomes [5, 6), `5 to 7`
    /// becomes [5, 8) and `5 to max` becomes [5, 2^29).
    fn message_range(&mut self, range: &ast::ReservedRange) -> (Option<i32>, Option<i32>) {
        let start = self.range_number(&range.start);
        let end = match &range.end {
            ast::ReservedRangeEnd::None => start.map(|start| start + 1),
            ast::ReservedRangeEnd::Int(end) => self.range_number(end).map(|end| end + 1),
            ast::ReservedRangeEnd::Max(_) => Some(MAX_MESSAGE_FIELD_NUMBER + 1),
        };
        (start, end)
    }

    /// Enum reserved ranges are stored inclusive, with `max` as `i32::MAX`.
    fn enum_reserved_range(&mut self, range: &ast::ReservedRange) -> EnumReservedRange {
        let start = self.enum_number(&range.start);
        let end = match &range.end {
            ast::ReservedRangeEnd::None => start,
            ast::ReservedRangeEnd::Int(end) => self.enum_number(end),
            ast::ReservedRangeEnd::Max(_) => Some(i32::MAX),
        };
        EnumReservedRange { start, end }
    }

    fn field_number(&mut self, int: &ast::Int) -> Option<i32> {
        match int.as_i32() {
            Some(number @ 1..=MAX_MESSAGE_FIELD_NUMBER) => Some(number),
            _ => {
                self.errors.push(CheckError::InvalidMessageNumber {
                    span: int.span.clone(),
                });
                None
            }
        }
    }

    fn range_number(&mut self, int: &ast::Int) -> Option<i32> {
        match int.as_i32() {
            Some(number) => Some(number),
            None => {
                self.errors.push(CheckError::InvalidMessageNumber {
                    span: int.span.clone(),
                });
                None
            }
        }
    }

    fn enum_number(&mut self, int: &ast::Int) -> Option<i32> {
        match int.as_i32() {
            Some(number) => Some(number),
            None => {
                self.errors.push(CheckError::InvalidEnumNumber {
                    span: int.span.clone(),
                });
                None
            }
        }
    }

    fn field_options(
        &mut self,
        field: &ast::Field,
        ty: Option<Type>,
    ) -> (Option<OptionSet>, Option<String>) {
        let mut default_value = None;
        let mut set = OptionSet::new();

        for option in field.options() {
            if option.is("default") {
                // The default is not an option: it becomes the
                // `default_value` string of the field descriptor.
                if self.proto3 {
                    self.errors.push(CheckError::Proto3DefaultValue {
                        span: option.span.clone(),
                    });
                } else if matches!(field.kind, ast::FieldKind::Map { .. }) {
                    self.errors.push(CheckError::InvalidDefault {
                        kind: "map",
                        span: option.span.clone(),
                    });
                } else if ty == Some(Type::Group) {
                    self.errors.push(CheckError::InvalidDefault {
                        kind: "group",
                        span: option.span.clone(),
                    });
                } else if ty == Some(Type::Message) {
                    self.errors.push(CheckError::InvalidDefault {
                        kind: "message",
                        span: option.span.clone(),
                    });
                } else {
                    default_value = Some(default_value_string(ty, &option.value));
                }
                continue;
            }

            self.generate_option_into(&mut set, option, known::field_option);
        }

        let options = if set.is_empty() { None } else { Some(set) };
        (options, default_value)
    }

    fn generate_options(
        &mut self,
        options: &[ast::OptionBody],
        known: fn(&str) -> Option<known::Known>,
    ) -> Option<OptionSet> {
        if options.is_empty() {
            return None;
        }

        let mut set = OptionSet::new();
        for option in options {
            self.generate_option_into(&mut set, option, known);
        }

        if set.is_empty() {
            None
        } else {
            Some(set)
        }
    }

    fn generate_option_into(
        &mut self,
        set: &mut OptionSet,
        option: &ast::OptionBody,
        known: fn(&str) -> Option<known::Known>,
    ) {
        if let [ast::OptionNamePart::Ident(ident)] = option.name.as_slice() {
            if let Some(known) = known(&ident.value) {
                match known.kind {
                    KnownKind::Bool => match option.value.as_bool() {
                        Some(value) => set.set(known.number, Value::Bool(value)),
                        None => self.errors.push(CheckError::OptionValueInvalidType {
                            expected: "either 'true' or 'false'".to_owned(),
                            actual: option.value.to_string(),
                            span: option.value.span(),
                        }),
                    },
                    KnownKind::String => match &option.value {
                        ast::OptionValue::String(string) => {
                            match String::from_utf8(string.value.clone()) {
                                Ok(value) => set.set(known.number, Value::String(value)),
                                Err(_) => self.errors.push(CheckError::OptionValueInvalidType {
                                    expected: "a utf-8 string".to_owned(),
                                    actual: option.value.to_string(),
                                    span: option.value.span(),
                                }),
                            }
                        }
                        _ => self.errors.push(CheckError::OptionValueInvalidType {
                            expected: "a string".to_owned(),
                            actual: option.value.to_string(),
                            span: option.value.span(),
                        }),
                    },
                    KnownKind::Enum(lookup) => match &option.value {
                        ast::OptionValue::Ident(value) if value.parts.len() == 1 => {
                            match lookup(&value.parts[0].value) {
                                Some(number) => set.set(known.number, Value::Enum(number)),
                                None => self.errors.push(CheckError::InvalidEnumValue {
                                    value_name: value.to_string(),
                                    enum_name: ident.value.clone(),
                                    span: option.value.span(),
                                }),
                            }
                        }
                        _ => self.errors.push(CheckError::OptionValueInvalidType {
                            expected: "an enum value identifier".to_owned(),
                            actual: option.value.to_string(),
                            span: option.value.span(),
                        }),
                    },
                    KnownKind::Unsupported => self.errors.push(CheckError::WeakNotSupported {
                        span: option.span.clone(),
                    }),
                }
                return;
            }
        }

        if let Some(uninterpreted) = self.uninterpreted_option(option) {
            set.add_uninterpreted(uninterpreted);
        }
    }

    fn uninterpreted_option(&mut self, option: &ast::OptionBody) -> Option<UninterpretedOption> {
        let mut name = Vec::with_capacity(option.name.len());
        for part in &option.name {
            match part {
                ast::OptionNamePart::Ident(ident) => name.push(NamePart {
                    name_part: ident.value.clone(),
                    is_extension: false,
                }),
                ast::OptionNamePart::Extension(type_name, span) => {
                    // Extension names are resolved to their full name now,
                    // while the scope is known.
                    let resolved = match self.index {
                        Some(index) => {
                            match index.resolve_extension(&type_name.to_string(), &self.scope) {
                                Some(full_name) => full_name,
                                None => {
                                    self.errors.push(CheckError::ExtensionNameNotFound {
                                        name: type_name.to_string(),
                                        span: span.clone(),
                                    });
                                    return None;
                                }
                            }
                        }
                        None => type_name.to_string(),
                    };
                    name.push(NamePart {
                        name_part: resolved,
                        is_extension: true,
                    });
                }
            }
        }

        let mut result = UninterpretedOption {
            name,
            ..Default::default()
        };

        match &option.value {
            ast::OptionValue::String(string) => result.string_value = Some(string.value.clone()),
            ast::OptionValue::Int(int) => {
                if let Some(value) = int.as_u64() {
                    result.positive_int_value = Some(value);
                } else if let Some(value) = int.as_i64() {
                    result.negative_int_value = Some(value);
                } else {
                    self.errors.push(CheckError::OptionIntegerOutOfRange {
                        span: int.span.clone(),
                    });
                    return None;
                }
            }
            ast::OptionValue::Float(float) => result.double_value = Some(float.value),
            ast::OptionValue::Ident(ident) => result.identifier_value = Some(ident.to_string()),
            ast::OptionValue::Aggregate(message, _) => {
                result.aggregate_value = Some(message.to_string())
            }
            ast::OptionValue::Array(_, span) => {
                self.errors.push(CheckError::OptionArrayValue { span: span.clone() });
                return None;
            }
        }

        Some(result)
    }
}

fn key_type(key_ty: ast::KeyTy) -> Type {
    match key_ty {
        ast::KeyTy::Int32 => Type::Int32,
        ast::KeyTy::Int64 => Type::Int64,
        ast::KeyTy::Uint32 => Type::Uint32,
        ast::KeyTy::Uint64 => Type::Uint64,
        ast::KeyTy::Sint32 => Type::Sint32,
        ast::KeyTy::Sint64 => Type::Sint64,
        ast::KeyTy::Fixed32 => Type::Fixed32,
        ast::KeyTy::Fixed64 => Type::Fixed64,
        ast::KeyTy::Sfixed32 => Type::Sfixed32,
        ast::KeyTy::Sfixed64 => Type::Sfixed64,
        ast::KeyTy::Bool => Type::Bool,
        ast::KeyTy::String => Type::String,
    }
}

fn default_value_string(ty: Option<Type>, value: &ast::OptionValue) -> String {
    match (ty, value) {
        // Bytes defaults keep their C-style escaping.
        (Some(Type::Bytes), ast::OptionValue::String(string)) => {
            HexEscaped(&string.value).to_string()
        }
        _ => value.to_string(),
    }
}
