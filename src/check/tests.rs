use prost_types::{
    field_descriptor_proto::{Label, Type},
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, OneofDescriptorProto,
};
use similar_asserts::assert_eq;

use super::*;
use crate::{
    compile::{tests::TestFileResolver, Compiler},
    options::Value,
    parse, s, transcode_file,
};

fn check(source: &str) -> FileDescriptorProto {
    let ast = parse::parse(source).unwrap();
    let mut index = TypeIndex::new();
    index.add_file(&ast).unwrap();
    transcode_file(&generate::generate(&ast, Some("test.proto"), Some(&index)).unwrap())
}

fn check_err(source: &str) -> Vec<CheckError> {
    let ast = parse::parse(source).unwrap();
    let mut index = TypeIndex::new();
    index.add_file(&ast).unwrap();
    generate::generate(&ast, Some("test.proto"), Some(&index)).unwrap_err()
}

fn compile_files(files: &[(&str, &str)], roots: &[&str]) -> Compiler {
    let resolver = TestFileResolver::new(files);
    let mut compiler = Compiler::with_file_resolver(resolver);
    compiler.include_imports(true);
    for root in roots {
        compiler.add_file(root).unwrap();
    }
    compiler
}

#[test]
fn trivial_proto3_message() {
    let actual = check("syntax = \"proto3\"; package a; message M { string s = 1; }");

    assert_eq!(
        actual,
        FileDescriptorProto {
            name: s("test.proto"),
            package: s("a"),
            syntax: s("proto3"),
            message_type: vec![DescriptorProto {
                name: s("M"),
                field: vec![FieldDescriptorProto {
                    name: s("s"),
                    number: Some(1),
                    label: Some(Label::Optional as i32),
                    r#type: Some(Type::String as i32),
                    json_name: s("s"),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    );
}

#[test]
fn proto2_syntax_is_not_emitted() {
    assert_eq!(check("syntax = \"proto2\";").syntax, None);
    assert_eq!(check("").syntax, None);
}

#[test]
fn map_field_synthesizes_entry_type() {
    let actual = check("syntax = \"proto3\"; message M { map<string, int32> by_name = 7; }");

    let message = &actual.message_type[0];
    assert_eq!(
        message.field[0],
        FieldDescriptorProto {
            name: s("by_name"),
            number: Some(7),
            label: Some(Label::Repeated as i32),
            r#type: Some(Type::Message as i32),
            type_name: s(".M.ByNameEntry"),
            json_name: s("byName"),
            ..Default::default()
        }
    );

    let entry = &message.nested_type[0];
    assert_eq!(entry.name(), "ByNameEntry");
    assert_eq!(entry.options.as_ref().unwrap().map_entry, Some(true));
    assert_eq!(
        entry.field,
        vec![
            FieldDescriptorProto {
                name: s("key"),
                number: Some(1),
                label: Some(Label::Optional as i32),
                r#type: Some(Type::String as i32),
                json_name: s("key"),
                ..Default::default()
            },
            FieldDescriptorProto {
                name: s("value"),
                number: Some(2),
                label: Some(Label::Optional as i32),
                r#type: Some(Type::Int32 as i32),
                json_name: s("value"),
                ..Default::default()
            },
        ]
    );
}

#[test]
fn proto3_optional_scalar() {
    let actual = check("syntax = \"proto3\"; message M { optional int32 x = 2; }");

    let message = &actual.message_type[0];
    assert_eq!(
        message.field[0],
        FieldDescriptorProto {
            name: s("x"),
            number: Some(2),
            label: Some(Label::Optional as i32),
            r#type: Some(Type::Int32 as i32),
            json_name: s("x"),
            proto3_optional: Some(true),
            oneof_index: Some(0),
            ..Default::default()
        }
    );
    assert_eq!(
        message.oneof_decl,
        vec![OneofDescriptorProto {
            name: s("_x"),
            ..Default::default()
        }]
    );
}

#[test]
fn synthetic_oneofs_follow_declared_oneofs() {
    let actual = check(
        "syntax = \"proto3\";\n\
         message M {\n\
            optional int32 x = 1;\n\
            oneof choice { int32 a = 2; }\n\
         }",
    );

    let message = &actual.message_type[0];
    let names: Vec<_> = message.oneof_decl.iter().map(|o| o.name()).collect();
    assert_eq!(names, vec!["choice", "_x"]);
    // The synthetic oneof comes last, so 'x' refers to index 1.
    assert_eq!(message.field[0].oneof_index, Some(1));
    assert_eq!(message.field[1].oneof_index, Some(0));
    assert_eq!(message.field[1].proto3_optional, None);
}

#[test]
fn scoped_reference_resolution() {
    let actual = check(
        "package p;\n\
         message Outer {\n\
            message Inner { }\n\
            optional Inner one = 1;\n\
            optional .p.Outer.Inner two = 2;\n\
            optional Outer three = 3;\n\
         }",
    );

    let message = &actual.message_type[0];
    assert_eq!(message.field[0].type_name(), ".p.Outer.Inner");
    assert_eq!(message.field[1].type_name(), ".p.Outer.Inner");
    assert_eq!(message.field[2].type_name(), ".p.Outer");
    for field in &message.field {
        assert_eq!(field.r#type(), Type::Message);
    }
}

#[test]
fn enum_field_resolution() {
    let actual = check(
        "package p;\n\
         enum E { A = 0; }\n\
         message M { optional E e = 1; }",
    );

    let field = &actual.message_type[0].field[0];
    assert_eq!(field.r#type(), Type::Enum);
    assert_eq!(field.type_name(), ".p.E");
}

#[test]
fn type_name_not_found() {
    let errors = check_err("message M { optional Missing m = 1; }");
    assert!(matches!(
        &errors[0],
        CheckError::TypeNameNotFound { name, .. } if name == "Missing"
    ));
}

#[test]
fn group_fields() {
    let actual = check(
        "package p;\n\
         message M {\n\
            optional group Result = 1 {\n\
                optional string url = 2;\n\
            }\n\
            optional Result ref = 3;\n\
         }",
    );

    let message = &actual.message_type[0];

    // The group contributes a field and a nested message sharing its number.
    assert_eq!(
        message.field[0],
        FieldDescriptorProto {
            name: s("result"),
            number: Some(1),
            label: Some(Label::Optional as i32),
            r#type: Some(Type::Group as i32),
            type_name: s(".p.M.Result"),
            json_name: s("result"),
            ..Default::default()
        }
    );
    assert_eq!(message.nested_type[0].name(), "Result");
    assert_eq!(message.nested_type[0].field[0].name(), "url");

    // References to groups are stored as message-typed fields.
    assert_eq!(message.field[1].r#type(), Type::Message);
    assert_eq!(message.field[1].type_name(), ".p.M.Result");
}

#[test]
fn json_names_preserve_mid_word_case() {
    let actual = check(
        "message M {\n\
            optional int32 foo_bar = 1;\n\
            optional int32 FooBar_bAz = 2;\n\
            optional int32 s = 3;\n\
         }",
    );

    let fields = &actual.message_type[0].field;
    assert_eq!(fields[0].json_name(), "fooBar");
    assert_eq!(fields[1].json_name(), "FooBarBAz");
    assert_eq!(fields[2].json_name(), "s");
}

#[test]
fn message_reserved_ranges_are_half_open() {
    let actual = check(
        "message M {\n\
            reserved 5;\n\
            reserved 10 to 20;\n\
            reserved 1000 to max;\n\
            reserved \"foo\", \"bar\";\n\
         }",
    );

    let message = &actual.message_type[0];
    let ranges: Vec<_> = message
        .reserved_range
        .iter()
        .map(|r| (r.start(), r.end()))
        .collect();
    assert_eq!(ranges, vec![(5, 6), (10, 21), (1000, 536_870_912)]);
    assert_eq!(message.reserved_name, vec!["foo", "bar"]);
}

#[test]
fn enum_reserved_ranges_are_inclusive() {
    let actual = check(
        "enum E {\n\
            A = 0;\n\
            reserved 5, 10 to 20, 1000 to max;\n\
         }",
    );

    let ranges: Vec<_> = actual.enum_type[0]
        .reserved_range
        .iter()
        .map(|r| (r.start(), r.end()))
        .collect();
    assert_eq!(ranges, vec![(5, 5), (10, 20), (1000, i32::MAX)]);
}

#[test]
fn extension_ranges() {
    let actual = check("message M { extensions 100 to 199, 300; }");

    let ranges: Vec<_> = actual.message_type[0]
        .extension_range
        .iter()
        .map(|r| (r.start(), r.end()))
        .collect();
    assert_eq!(ranges, vec![(100, 200), (300, 301)]);
}

#[test]
fn field_default_values() {
    let actual = check(
        "message M {\n\
            optional int32 a = 1 [default = -5];\n\
            optional string b = 2 [default = \"hello world\"];\n\
            optional bool c = 3 [default = true];\n\
            optional E e = 4 [default = FIRST];\n\
            optional double d = 5 [default = 1.5];\n\
            optional bytes f = 6 [default = \"\\001\\002\"];\n\
         }\n\
         enum E { FIRST = 0; }",
    );

    let fields = &actual.message_type[0].field;
    assert_eq!(fields[0].default_value(), "-5");
    assert_eq!(fields[1].default_value(), "hello world");
    assert_eq!(fields[2].default_value(), "true");
    assert_eq!(fields[3].default_value(), "FIRST");
    assert_eq!(fields[4].default_value(), "1.5");
    assert_eq!(fields[5].default_value(), "\\001\\002");
    // The default is not recorded as an option.
    assert_eq!(fields[0].options, None);
}

#[test]
fn message_default_is_an_error() {
    let errors = check_err(
        "message M {\n\
            optional N n = 1 [default = \"x\"];\n\
         }\n\
         message N { }",
    );
    assert!(matches!(
        &errors[0],
        CheckError::InvalidDefault { kind: "message", .. }
    ));
}

#[test]
fn proto3_default_is_an_error() {
    let errors =
        check_err("syntax = \"proto3\"; message M { optional int32 a = 1 [default = 5]; }");
    assert!(matches!(&errors[0], CheckError::Proto3DefaultValue { .. }));
}

#[test]
fn proto2_field_requires_label() {
    let errors = check_err("message M { int32 a = 1; }");
    assert!(matches!(&errors[0], CheckError::Proto2FieldMissingLabel { .. }));
}

#[test]
fn proto3_rejects_required_and_groups() {
    let errors = check_err("syntax = \"proto3\"; message M { required int32 a = 1; }");
    assert!(matches!(&errors[0], CheckError::Proto3RequiredField { .. }));

    let errors = check_err("syntax = \"proto3\"; message M { group G = 1 { } }");
    assert!(matches!(&errors[0], CheckError::Proto3GroupField { .. }));
}

#[test]
fn field_number_out_of_range() {
    let errors = check_err("message M { optional int32 a = 536870912; }");
    assert!(matches!(&errors[0], CheckError::InvalidMessageNumber { .. }));
}

#[test]
fn known_file_options() {
    let actual = check(
        "option java_package = \"com.example\";\n\
         option optimize_for = CODE_SIZE;\n\
         option deprecated = true;",
    );

    let options = actual.options.unwrap();
    assert_eq!(options.java_package, s("com.example"));
    assert_eq!(options.optimize_for, Some(2));
    assert_eq!(options.deprecated, Some(true));
    assert_eq!(options.uninterpreted_option, vec![]);
}

#[test]
fn known_field_and_message_options() {
    let actual = check(
        "message M {\n\
            option message_set_wire_format = false;\n\
            optional int32 a = 1 [packed = true, deprecated = true];\n\
         }",
    );

    let message = &actual.message_type[0];
    assert_eq!(
        message.options.as_ref().unwrap().message_set_wire_format,
        Some(false)
    );
    let field_options = message.field[0].options.as_ref().unwrap();
    assert_eq!(field_options.packed, Some(true));
    assert_eq!(field_options.deprecated, Some(true));
}

#[test]
fn known_enum_and_method_options() {
    let actual = check(
        "enum E {\n\
            option allow_alias = true;\n\
            A = 0;\n\
            B = 0 [deprecated = true];\n\
         }\n\
         message Empty { }\n\
         service S {\n\
            rpc Get (Empty) returns (Empty) {\n\
                option idempotency_level = NO_SIDE_EFFECTS;\n\
            }\n\
         }",
    );

    assert_eq!(actual.enum_type[0].options.as_ref().unwrap().allow_alias, Some(true));
    assert_eq!(
        actual.enum_type[0].value[1].options.as_ref().unwrap().deprecated,
        Some(true)
    );
    assert_eq!(
        actual.service[0].method[0]
            .options
            .as_ref()
            .unwrap()
            .idempotency_level,
        Some(1)
    );
}

#[test]
fn streaming_flags_recorded_only_when_set() {
    let actual = check(
        "message Empty { }\n\
         service S {\n\
            rpc A (Empty) returns (stream Empty);\n\
            rpc B (stream Empty) returns (Empty);\n\
         }",
    );

    let methods = &actual.service[0].method;
    assert_eq!(methods[0].client_streaming, None);
    assert_eq!(methods[0].server_streaming, Some(true));
    assert_eq!(methods[1].client_streaming, Some(true));
    assert_eq!(methods[1].server_streaming, None);
}

#[test]
fn weak_field_option_is_rejected() {
    let errors = check_err("message M { optional int32 a = 1 [weak = true]; }");
    assert!(matches!(&errors[0], CheckError::WeakNotSupported { .. }));
}

#[test]
fn unknown_option_is_stored_uninterpreted() {
    let ast = parse::parse("option frobnicate = 5;").unwrap();
    let mut index = TypeIndex::new();
    index.add_file(&ast).unwrap();
    let descriptor = generate::generate(&ast, Some("test.proto"), Some(&index)).unwrap();

    let uninterpreted = descriptor.options.as_ref().unwrap().uninterpreted();
    assert_eq!(uninterpreted.len(), 1);
    assert_eq!(uninterpreted[0].name[0].name_part, "frobnicate");
    assert!(!uninterpreted[0].name[0].is_extension);
    assert_eq!(uninterpreted[0].positive_int_value, Some(5));
}

#[test]
fn public_dependencies_are_indexed() {
    let compiler = compile_files(
        &[
            ("a.proto", "message A { }"),
            ("b.proto", "import public 'a.proto'; import 'c.proto';"),
            ("c.proto", "message C { }"),
        ],
        &["b.proto"],
    );

    let file = compiler.file_descriptor_set().file.pop_if_name("b.proto");
    assert_eq!(file.dependency, vec!["a.proto", "c.proto"]);
    assert_eq!(file.public_dependency, vec![0]);
}

#[test]
fn custom_option_via_extension() {
    let compiler = compile_files(
        &[
            (
                "a.proto",
                "package a;\n\
                 import \"google/protobuf/descriptor.proto\";\n\
                 extend google.protobuf.MessageOptions {\n\
                    optional string tag = 51234;\n\
                 }",
            ),
            (
                "b.proto",
                "import \"a.proto\";\n\
                 message U {\n\
                    option (a.tag) = \"hello\";\n\
                 }",
            ),
        ],
        &["b.proto"],
    );

    let file = compiler
        .file_map()
        .iter()
        .find(|f| f.name == "b.proto")
        .unwrap();
    let options = file.descriptor.message_type[0].options.as_ref().unwrap();
    assert_eq!(options.uninterpreted(), &[]);
    assert_eq!(options.get(51234), Some(&Value::String("hello".to_owned())));
}

#[test]
fn custom_aggregate_option() {
    let compiler = compile_files(
        &[
            (
                "a.proto",
                "package a;\n\
                 import \"google/protobuf/descriptor.proto\";\n\
                 message Meta {\n\
                    optional string name = 1;\n\
                    optional int32 level = 2;\n\
                    repeated int32 ids = 3;\n\
                 }\n\
                 extend google.protobuf.MessageOptions {\n\
                    optional Meta meta = 51235;\n\
                 }",
            ),
            (
                "b.proto",
                "import \"a.proto\";\n\
                 message U {\n\
                    option (a.meta) = { name: \"x\" level: 3 ids: [1, 2] };\n\
                 }",
            ),
        ],
        &["b.proto"],
    );

    let file = compiler
        .file_map()
        .iter()
        .find(|f| f.name == "b.proto")
        .unwrap();
    let options = file.descriptor.message_type[0].options.as_ref().unwrap();
    assert_eq!(options.uninterpreted(), &[]);

    let meta = match options.get(51235) {
        Some(Value::Message(set)) => set,
        value => panic!("unexpected value: {:?}", value),
    };
    assert_eq!(meta.get(1), Some(&Value::String("x".to_owned())));
    assert_eq!(meta.get(2), Some(&Value::Int32(3)));
    assert_eq!(
        meta.get(3),
        Some(&Value::Repeated(vec![Value::Int32(1), Value::Int32(2)]))
    );
}

#[test]
fn repeated_custom_option_appends() {
    let compiler = compile_files(
        &[
            (
                "a.proto",
                "package a;\n\
                 import \"google/protobuf/descriptor.proto\";\n\
                 extend google.protobuf.FileOptions {\n\
                    repeated int32 nums = 51236;\n\
                 }",
            ),
            (
                "b.proto",
                "import \"a.proto\";\n\
                 option (a.nums) = 1;\n\
                 option (a.nums) = 2;",
            ),
        ],
        &["b.proto"],
    );

    let file = compiler
        .file_map()
        .iter()
        .find(|f| f.name == "b.proto")
        .unwrap();
    let options = file.descriptor.options.as_ref().unwrap();
    assert_eq!(
        options.get(51236),
        Some(&Value::Repeated(vec![Value::Int32(1), Value::Int32(2)]))
    );
}

#[test]
fn enum_custom_option() {
    let compiler = compile_files(
        &[
            (
                "a.proto",
                "package a;\n\
                 import \"google/protobuf/descriptor.proto\";\n\
                 enum Level { LOW = 0; HIGH = 5; }\n\
                 extend google.protobuf.MessageOptions {\n\
                    optional Level level = 51237;\n\
                 }",
            ),
            (
                "b.proto",
                "import \"a.proto\";\n\
                 message U {\n\
                    option (a.level) = HIGH;\n\
                 }",
            ),
        ],
        &["b.proto"],
    );

    let file = compiler
        .file_map()
        .iter()
        .find(|f| f.name == "b.proto")
        .unwrap();
    let options = file.descriptor.message_type[0].options.as_ref().unwrap();
    assert_eq!(options.get(51237), Some(&Value::Enum(5)));
}

#[test]
fn custom_option_value_kind_mismatch() {
    let resolver = TestFileResolver::new(&[
        (
            "a.proto",
            "package a;\n\
             import \"google/protobuf/descriptor.proto\";\n\
             extend google.protobuf.MessageOptions {\n\
                optional string tag = 51234;\n\
             }",
        ),
        (
            "b.proto",
            "import \"a.proto\";\n\
             message U {\n\
                option (a.tag) = 42;\n\
             }",
        ),
    ]);
    let mut compiler = Compiler::with_file_resolver(resolver);
    let err = compiler.add_file("b.proto").unwrap_err();
    assert!(err.to_string().contains("(a.tag)"));
}

#[test]
fn unresolved_custom_option_is_an_error() {
    let resolver = TestFileResolver::new(&[("a.proto", "message U { option (no.such) = 1; }")]);
    let mut compiler = Compiler::with_file_resolver(resolver);
    assert!(compiler.add_file("a.proto").is_err());
}

trait PopIfName {
    fn pop_if_name(self, name: &str) -> FileDescriptorProto;
}

impl PopIfName for Vec<FileDescriptorProto> {
    fn pop_if_name(self, name: &str) -> FileDescriptorProto {
        self.into_iter()
            .find(|f| f.name() == name)
            .unwrap_or_else(|| panic!("no file named {}", name))
    }
}
