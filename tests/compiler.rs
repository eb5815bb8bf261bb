use std::fs;

use assert_fs::TempDir;
use prost::Message;
use prost_types::{
    field_descriptor_proto::{Label, Type},
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
};
use similar_asserts::assert_eq;

use protoset::{compile, Compiler, Registry};

fn write_files(dir: &TempDir, files: &[(&str, &str)]) {
    for (name, source) in files {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, source).unwrap();
    }
}

#[test]
fn trivial_proto3_message() {
    let dir = TempDir::new().unwrap();
    write_files(
        &dir,
        &[(
            "root.proto",
            "syntax = \"proto3\"; package a; message M { string s = 1; }",
        )],
    );

    let actual = compile(&["root.proto"], &[dir.path()]).unwrap();

    assert_eq!(
        actual,
        FileDescriptorSet {
            file: vec![FileDescriptorProto {
                name: Some("root.proto".to_owned()),
                package: Some("a".to_owned()),
                syntax: Some("proto3".to_owned()),
                message_type: vec![DescriptorProto {
                    name: Some("M".to_owned()),
                    field: vec![FieldDescriptorProto {
                        name: Some("s".to_owned()),
                        number: Some(1),
                        label: Some(Label::Optional as i32),
                        r#type: Some(Type::String as i32),
                        json_name: Some("s".to_owned()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            }],
        }
    );
}

#[test]
fn transitive_import_ordering() {
    let dir = TempDir::new().unwrap();
    write_files(
        &dir,
        &[
            ("f1.proto", "import 'f2.proto';"),
            ("f2.proto", "import 'f3.proto';"),
            ("f3.proto", ""),
            ("g1.proto", "import 'f3.proto';"),
        ],
    );

    let set = compile(&["f1.proto", "g1.proto"], &[dir.path()]).unwrap();
    let names: Vec<_> = set.file.iter().map(|f| f.name()).collect();
    assert_eq!(names, vec!["f3.proto", "f2.proto", "f1.proto", "g1.proto"]);
}

#[test]
fn custom_option_via_extension() {
    let dir = TempDir::new().unwrap();
    write_files(
        &dir,
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
    );

    let mut compiler = Compiler::new([dir.path()]).unwrap();
    compiler.include_imports(true);
    compiler.add_file("b.proto").unwrap();
    let bytes = compiler.encode_file_descriptor_set();

    // No uninterpreted options survive compilation.
    let set = FileDescriptorSet::decode(bytes.as_slice()).unwrap();
    let message = set
        .file
        .iter()
        .find(|f| f.name() == "b.proto")
        .unwrap()
        .message_type[0]
        .clone();
    assert_eq!(
        message.options.as_ref().map_or(0, |o| o.uninterpreted_option.len()),
        0
    );

    // The extension field 51234 is present with value "hello" in the encoded
    // output, even though prost_types cannot represent it.
    let mut expected = Vec::new();
    prost::encoding::string::encode(51234, &"hello".to_owned(), &mut expected);
    assert!(bytes
        .windows(expected.len())
        .any(|window| window == expected.as_slice()));
}

#[test]
fn deterministic_marshaling() {
    let dir = TempDir::new().unwrap();
    write_files(
        &dir,
        &[(
            "root.proto",
            "syntax = \"proto3\";\n\
             option java_package = \"com.example\";\n\
             message M {\n\
                map<string, int32> by_name = 1;\n\
                optional int32 x = 2;\n\
             }",
        )],
    );

    let encode = || {
        let mut compiler = Compiler::new([dir.path()]).unwrap();
        compiler.add_file("root.proto").unwrap();
        compiler.encode_file_descriptor_set()
    };

    assert_eq!(encode(), encode());
}

#[test]
fn encoded_set_round_trips() {
    let dir = TempDir::new().unwrap();
    write_files(
        &dir,
        &[(
            "root.proto",
            "syntax = \"proto3\";\n\
             package demo;\n\
             message M {\n\
                string name = 1;\n\
                repeated int32 values = 2;\n\
                map<string, M> children = 3;\n\
                oneof kind { bool flag = 4; bytes data = 5; }\n\
             }\n\
             enum E { UNKNOWN = 0; SET = 1; }\n\
             service S { rpc Get (M) returns (stream M); }",
        )],
    );

    let mut compiler = Compiler::new([dir.path()]).unwrap();
    compiler.add_file("root.proto").unwrap();

    let bytes = compiler.encode_file_descriptor_set();
    let decoded = FileDescriptorSet::decode(bytes.as_slice()).unwrap();
    assert_eq!(decoded, compiler.file_descriptor_set());
}

#[test]
fn registry_lookups() {
    let dir = TempDir::new().unwrap();
    write_files(
        &dir,
        &[(
            "root.proto",
            "package pkg;\n\
             message Outer {\n\
                message Inner { }\n\
                extensions 100 to 200;\n\
             }\n\
             extend Outer {\n\
                optional string tag = 100;\n\
             }",
        )],
    );

    let set = compile(&["root.proto"], &[dir.path()]).unwrap();
    let registry = Registry::new(&set);

    assert!(registry.find_message_by_name("pkg.Outer.Inner").is_some());
    assert!(registry
        .find_message_by_url("type.googleapis.com/pkg.Outer")
        .is_some());

    let extension = registry.find_extension_by_name("pkg.tag").unwrap();
    assert_eq!(extension.number(), 100);
    assert_eq!(
        registry
            .find_extension_by_number("pkg.Outer", 100)
            .unwrap()
            .name(),
        "tag"
    );
}

#[test]
fn missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    assert!(compile(&["missing.proto"], &[dir.path()]).is_err());
}

#[test]
fn parse_error_names_position() {
    let dir = TempDir::new().unwrap();
    write_files(&dir, &[("bad.proto", "message 42 { }")]);

    let err = compile(&["bad.proto"], &[dir.path()]).unwrap_err();
    assert!(err.to_string().contains("expected"));
}

#[test]
fn no_required_fields_in_proto3_output() {
    let dir = TempDir::new().unwrap();
    write_files(
        &dir,
        &[(
            "root.proto",
            "syntax = \"proto3\";\n\
             message M { string a = 1; repeated int32 b = 2; }",
        )],
    );

    let set = compile(&["root.proto"], &[dir.path()]).unwrap();
    for message in &set.file[0].message_type {
        for field in &message.field {
            assert_ne!(field.label(), Label::Required);
        }
    }
}
