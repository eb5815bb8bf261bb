//! Field numbers of the options messages in `google/protobuf/descriptor.proto`.

pub(crate) const UNINTERPRETED_OPTION: u32 = 999;

pub(crate) mod file_options {
    pub(crate) const JAVA_PACKAGE: u32 = 1;
    pub(crate) const JAVA_OUTER_CLASSNAME: u32 = 8;
    pub(crate) const OPTIMIZE_FOR: u32 = 9;
    pub(crate) const JAVA_MULTIPLE_FILES: u32 = 10;
    pub(crate) const GO_PACKAGE: u32 = 11;
    pub(crate) const CC_GENERIC_SERVICES: u32 = 16;
    pub(crate) const JAVA_GENERIC_SERVICES: u32 = 17;
    pub(crate) const PY_GENERIC_SERVICES: u32 = 18;
    pub(crate) const JAVA_GENERATE_EQUALS_AND_HASH: u32 = 20;
    pub(crate) const DEPRECATED: u32 = 23;
    pub(crate) const JAVA_STRING_CHECK_UTF8: u32 = 27;
    pub(crate) const CC_ENABLE_ARENAS: u32 = 31;
    pub(crate) const OBJC_CLASS_PREFIX: u32 = 36;
    pub(crate) const CSHARP_NAMESPACE: u32 = 37;
    pub(crate) const SWIFT_PREFIX: u32 = 39;
    pub(crate) const PHP_CLASS_PREFIX: u32 = 40;
    pub(crate) const PHP_NAMESPACE: u32 = 41;
    pub(crate) const PHP_GENERIC_SERVICES: u32 = 42;
    pub(crate) const PHP_METADATA_NAMESPACE: u32 = 44;
    pub(crate) const RUBY_PACKAGE: u32 = 45;
}

pub(crate) mod message_options {
    pub(crate) const MESSAGE_SET_WIRE_FORMAT: u32 = 1;
    pub(crate) const NO_STANDARD_DESCRIPTOR_ACCESSOR: u32 = 2;
    pub(crate) const DEPRECATED: u32 = 3;
    pub(crate) const MAP_ENTRY: u32 = 7;
}

pub(crate) mod field_options {
    pub(crate) const CTYPE: u32 = 1;
    pub(crate) const PACKED: u32 = 2;
    pub(crate) const DEPRECATED: u32 = 3;
    pub(crate) const LAZY: u32 = 5;
    pub(crate) const JSTYPE: u32 = 6;
    pub(crate) const WEAK: u32 = 10;
}

pub(crate) mod enum_options {
    pub(crate) const ALLOW_ALIAS: u32 = 2;
    pub(crate) const DEPRECATED: u32 = 3;
}

pub(crate) mod enum_value_options {
    pub(crate) const DEPRECATED: u32 = 1;
}

pub(crate) mod service_options {
    pub(crate) const DEPRECATED: u32 = 33;
}

pub(crate) mod method_options {
    pub(crate) const DEPRECATED: u32 = 33;
    pub(crate) const IDEMPOTENCY_LEVEL: u32 = 34;
}
