//! Built-in options that are interpreted directly into their typed fields
//! during descriptor generation. Anything not listed here is stored as an
//! uninterpreted option and resolved in the second compilation phase.

use crate::tag;

pub(crate) struct Known {
    pub number: u32,
    pub kind: KnownKind,
}

pub(crate) enum KnownKind {
    Bool,
    String,
    Enum(fn(&str) -> Option<i32>),
    // Accepted by the grammar but rejected by the compiler.
    Unsupported,
}

fn known(number: u32, kind: KnownKind) -> Option<Known> {
    Some(Known { number, kind })
}

pub(crate) fn file_option(name: &str) -> Option<Known> {
    use self::tag::file_options::*;
    use self::KnownKind::*;

    match name {
        "java_package" => known(JAVA_PACKAGE, String),
        "java_outer_classname" => known(JAVA_OUTER_CLASSNAME, String),
        "optimize_for" => known(OPTIMIZE_FOR, Enum(optimize_mode)),
        "java_multiple_files" => known(JAVA_MULTIPLE_FILES, Bool),
        "go_package" => known(GO_PACKAGE, String),
        "cc_generic_services" => known(CC_GENERIC_SERVICES, Bool),
        "java_generic_services" => known(JAVA_GENERIC_SERVICES, Bool),
        "py_generic_services" => known(PY_GENERIC_SERVICES, Bool),
        "php_generic_services" => known(PHP_GENERIC_SERVICES, Bool),
        "java_generate_equals_and_hash" => known(JAVA_GENERATE_EQUALS_AND_HASH, Bool),
        "deprecated" => known(DEPRECATED, Bool),
        "java_string_check_utf8" => known(JAVA_STRING_CHECK_UTF8, Bool),
        "cc_enable_arenas" => known(CC_ENABLE_ARENAS, Bool),
        "objc_class_prefix" => known(OBJC_CLASS_PREFIX, String),
        "csharp_namespace" => known(CSHARP_NAMESPACE, String),
        "swift_prefix" => known(SWIFT_PREFIX, String),
        "php_class_prefix" => known(PHP_CLASS_PREFIX, String),
        "php_namespace" => known(PHP_NAMESPACE, String),
        "php_metadata_namespace" => known(PHP_METADATA_NAMESPACE, String),
        "ruby_package" => known(RUBY_PACKAGE, String),
        _ => None,
    }
}

pub(crate) fn message_option(name: &str) -> Option<Known> {
    use self::tag::message_options::*;
    use self::KnownKind::*;

    match name {
        "message_set_wire_format" => known(MESSAGE_SET_WIRE_FORMAT, Bool),
        "no_standard_descriptor_accessor" => known(NO_STANDARD_DESCRIPTOR_ACCESSOR, Bool),
        "deprecated" => known(DEPRECATED, Bool),
        "map_entry" => known(MAP_ENTRY, Bool),
        _ => None,
    }
}

pub(crate) fn field_option(name: &str) -> Option<Known> {
    use self::tag::field_options::*;
    use self::KnownKind::*;

    match name {
        "ctype" => known(CTYPE, Enum(ctype)),
        "packed" => known(PACKED, Bool),
        "jstype" => known(JSTYPE, Enum(jstype)),
        "lazy" => known(LAZY, Bool),
        "deprecated" => known(DEPRECATED, Bool),
        // A weak field is a legacy proto1 feature no longer supported by the
        // reference runtime.
        "weak" => known(WEAK, Unsupported),
        _ => None,
    }
}

pub(crate) fn oneof_option(_name: &str) -> Option<Known> {
    None
}

pub(crate) fn enum_option(name: &str) -> Option<Known> {
    use self::tag::enum_options::*;
    use self::KnownKind::*;

    match name {
        "allow_alias" => known(ALLOW_ALIAS, Bool),
        "deprecated" => known(DEPRECATED, Bool),
        _ => None,
    }
}

pub(crate) fn enum_value_option(name: &str) -> Option<Known> {
    use self::tag::enum_value_options::*;
    use self::KnownKind::*;

    match name {
        "deprecated" => known(DEPRECATED, Bool),
        _ => None,
    }
}

pub(crate) fn service_option(name: &str) -> Option<Known> {
    use self::tag::service_options::*;
    use self::KnownKind::*;

    match name {
        "deprecated" => known(DEPRECATED, Bool),
        _ => None,
    }
}

pub(crate) fn method_option(name: &str) -> Option<Known> {
    use self::tag::method_options::*;
    use self::KnownKind::*;

    match name {
        "idempotency_level" => known(IDEMPOTENCY_LEVEL, Enum(idempotency_level)),
        "deprecated" => known(DEPRECATED, Bool),
        _ => None,
    }
}

pub(crate) fn extension_range_option(_name: &str) -> Option<Known> {
    None
}

fn optimize_mode(name: &str) -> Option<i32> {
    match name {
        "SPEED" => Some(1),
        "CODE_SIZE" => Some(2),
        "LITE_RUNTIME" => Some(3),
        _ => None,
    }
}

fn ctype(name: &str) -> Option<i32> {
    match name {
        "STRING" => Some(0),
        "CORD" => Some(1),
        "STRING_PIECE" => Some(2),
        _ => None,
    }
}

fn jstype(name: &str) -> Option<i32> {
    match name {
        "JS_NORMAL" => Some(0),
        "JS_STRING" => Some(1),
        "JS_NUMBER" => Some(2),
        _ => None,
    }
}

fn idempotency_level(name: &str) -> Option<i32> {
    match name {
        "IDEMPOTENCY_UNKNOWN" => Some(0),
        "NO_SIDE_EFFECTS" => Some(1),
        "IDEMPOTENT" => Some(2),
        _ => None,
    }
}
