use std::{collections::HashMap, path::Path};

use assert_fs::TempDir;

use super::*;
use crate::{error::ErrorKind, file::GoogleFileResolver, with_current_dir};

/// Serves files from memory, falling back to the bundled google imports.
pub(crate) struct TestFileResolver {
    files: HashMap<String, String>,
}

impl TestFileResolver {
    pub fn new(files: &[(&str, &str)]) -> Self {
        TestFileResolver {
            files: files
                .iter()
                .map(|(name, source)| (name.to_string(), source.to_string()))
                .collect(),
        }
    }
}

impl FileResolver for TestFileResolver {
    fn open_file(&self, name: &str) -> Result<File, Error> {
        match self.files.get(name) {
            Some(source) => File::from_source(name, source),
            None => GoogleFileResolver::new().open_file(name),
        }
    }
}

fn compile_names(files: &[(&str, &str)], roots: &[&str], include_imports: bool) -> Vec<String> {
    let mut compiler = Compiler::with_file_resolver(TestFileResolver::new(files));
    compiler.include_imports(include_imports);
    for root in roots {
        compiler.add_file(root).unwrap();
    }

    compiler
        .file_descriptor_set()
        .file
        .iter()
        .map(|f| f.name().to_owned())
        .collect()
}

#[test]
fn transitive_import_ordering() {
    let files = &[
        ("f1.proto", "import 'f2.proto';"),
        ("f2.proto", "import 'f3.proto';"),
        ("f3.proto", ""),
        ("g1.proto", "import 'f3.proto';"),
    ];

    assert_eq!(
        compile_names(files, &["f1.proto", "g1.proto"], true),
        vec!["f3.proto", "f2.proto", "f1.proto", "g1.proto"]
    );
}

#[test]
fn imports_precede_importers() {
    let files = &[
        ("f1.proto", "import 'f2.proto';"),
        ("f2.proto", "import 'f3.proto';"),
        ("f3.proto", ""),
        ("g1.proto", "import 'g2.proto'; import 'g3.proto'; import 'f3.proto';"),
        ("g2.proto", ""),
        ("g3.proto", ""),
    ];

    assert_eq!(
        compile_names(files, &["f1.proto", "g1.proto"], true),
        vec![
            "f3.proto", "f2.proto", "f1.proto", "g2.proto", "g3.proto", "g1.proto"
        ]
    );
}

#[test]
fn include_imports_filters_to_roots() {
    let files = &[
        ("f1.proto", "import 'f2.proto';"),
        ("f2.proto", "import 'f3.proto';"),
        ("f3.proto", ""),
    ];

    assert_eq!(
        compile_names(files, &["f1.proto"], false),
        vec!["f1.proto"]
    );
}

#[test]
fn adding_an_import_as_a_root_includes_it() {
    let files = &[("f1.proto", "import 'f2.proto';"), ("f2.proto", "")];

    assert_eq!(
        compile_names(files, &["f1.proto", "f2.proto"], false),
        vec!["f2.proto", "f1.proto"]
    );
}

#[test]
fn circular_imports_are_an_error() {
    let files = &[
        ("f1.proto", "import 'f2.proto';"),
        ("f2.proto", "import 'f1.proto';"),
    ];

    let mut compiler = Compiler::with_file_resolver(TestFileResolver::new(files));
    let err = compiler.add_file("f1.proto").unwrap_err();
    match err.kind() {
        ErrorKind::CircularImport { cycle } => {
            assert_eq!(cycle, "f1.proto -> f2.proto -> f1.proto")
        }
        kind => panic!("unexpected error: {}", kind),
    }
}

#[test]
fn missing_import_is_an_error() {
    let files = &[("f1.proto", "import 'missing.proto';")];

    let mut compiler = Compiler::with_file_resolver(TestFileResolver::new(files));
    let err = compiler.add_file("f1.proto").unwrap_err();
    match err.kind() {
        ErrorKind::ImportNotFound { name, .. } => assert_eq!(name, "missing.proto"),
        kind => panic!("unexpected error: {}", kind),
    }
}

#[test]
fn missing_root_is_an_error() {
    let mut compiler = Compiler::with_file_resolver(TestFileResolver::new(&[]));
    let err = compiler.add_file("missing.proto").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::FileNotIncluded { .. }));
}

#[test]
fn type_references_across_imports() {
    let files = &[
        ("dep.proto", "package dep; message D { }"),
        (
            "root.proto",
            "import 'dep.proto'; message R { optional dep.D d = 1; }",
        ),
    ];

    let mut compiler = Compiler::with_file_resolver(TestFileResolver::new(files));
    compiler.add_file("root.proto").unwrap();

    let set = compiler.file_descriptor_set();
    let root = set.file.iter().find(|f| f.name() == "root.proto").unwrap();
    assert_eq!(root.message_type[0].field[0].type_name(), ".dep.D");
}

#[test]
fn deterministic_output() {
    let files = &[
        (
            "a.proto",
            "package a;\n\
             import \"google/protobuf/descriptor.proto\";\n\
             extend google.protobuf.MessageOptions {\n\
                optional string tag = 51234;\n\
                optional int32 level = 51235;\n\
             }",
        ),
        (
            "b.proto",
            "import 'a.proto';\n\
             message U {\n\
                option (a.level) = 3;\n\
                option (a.tag) = 'hi';\n\
             }",
        ),
    ];

    let encode = || {
        let mut compiler = Compiler::with_file_resolver(TestFileResolver::new(files));
        compiler.include_imports(true);
        compiler.add_file("b.proto").unwrap();
        compiler.encode_file_descriptor_set()
    };

    assert_eq!(encode(), encode());
}

#[test]
fn bundled_descriptor_proto_compiles() {
    let mut compiler = Compiler::with_file_resolver(TestFileResolver::new(&[]));
    compiler.add_file("google/protobuf/descriptor.proto").unwrap();

    let set = compiler.file_descriptor_set();
    let file = &set.file[0];
    assert_eq!(file.package(), "google.protobuf");
    assert!(file
        .message_type
        .iter()
        .any(|m| m.name() == "FileDescriptorProto"));
    assert_eq!(file.options.as_ref().unwrap().optimize_for, Some(1));
}

#[test]
fn abs_include_abs_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("foo.proto"), "message Foo { }").unwrap();

    let mut compiler = Compiler::new([dir.path()]).unwrap();
    compiler.add_file(dir.path().join("foo.proto")).unwrap();

    let set = compiler.file_descriptor_set();
    assert_eq!(set.file[0].name(), "foo.proto");
}

#[test]
fn bare_name_with_include_path() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("foo.proto"), "message Foo { }").unwrap();

    let mut compiler = Compiler::new([dir.path()]).unwrap();
    compiler.add_file("foo.proto").unwrap();

    let set = compiler.file_descriptor_set();
    assert_eq!(set.file[0].name(), "foo.proto");
    assert_eq!(set.file[0].message_type[0].name(), "Foo");
}

#[test]
fn rel_file_under_include() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("nested")).unwrap();
    std::fs::write(dir.path().join("nested/foo.proto"), "").unwrap();

    with_current_dir(&dir, || {
        let mut compiler = Compiler::new(["."]).unwrap();
        compiler.add_file(Path::new("nested").join("foo.proto")).unwrap();

        let set = compiler.file_descriptor_set();
        assert_eq!(set.file[0].name(), "nested/foo.proto");
    });
}

#[test]
fn shadowed_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("a")).unwrap();
    std::fs::create_dir_all(dir.path().join("b")).unwrap();
    std::fs::write(dir.path().join("a/foo.proto"), "").unwrap();
    std::fs::write(dir.path().join("b/foo.proto"), "").unwrap();

    let mut compiler = Compiler::new([dir.path().join("a"), dir.path().join("b")]).unwrap();
    let err = compiler.add_file(dir.path().join("b/foo.proto")).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::FileShadowed { .. }));
}
