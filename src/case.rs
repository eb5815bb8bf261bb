/// Converts a field name to its JSON name: underscores are dropped, and the
/// letter following each underscore is uppercased. The case of all other
/// characters is preserved.
pub(crate) fn to_json_name(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut uppercase_next = false;

    for ch in name.chars() {
        if ch == '_' {
            uppercase_next = true
        } else if uppercase_next {
            result.push(ch.to_ascii_uppercase());
            uppercase_next = false;
        } else {
            result.push(ch);
        }
    }

    result
}

/// Converts a field name to the PascalCase name of its synthetic map entry
/// message, e.g. `by_name` becomes `ByName`.
pub(crate) fn to_pascal_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut uppercase_next = true;

    for ch in name.chars() {
        if ch == '_' {
            uppercase_next = true
        } else if uppercase_next {
            result.push(ch.to_ascii_uppercase());
            uppercase_next = false;
        } else {
            result.push(ch);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_names() {
        assert_eq!(to_json_name("foo_bar"), "fooBar");
        assert_eq!(to_json_name("s"), "s");
        assert_eq!(to_json_name("foo_bar_baz"), "fooBarBaz");
        assert_eq!(to_json_name("_foo"), "Foo");
        assert_eq!(to_json_name("foo__bar"), "fooBar");
        // Mid-word capitalization is preserved rather than lowercased.
        assert_eq!(to_json_name("FooBar_bAz"), "FooBarBAz");
    }

    #[test]
    fn json_name_idempotent_on_camel_case() {
        for name in ["fooBar", "fooBarBaz", "a1B2"] {
            assert_eq!(to_json_name(name), name);
        }
    }

    #[test]
    fn pascal_case() {
        assert_eq!(to_pascal_case("by_name"), "ByName");
        assert_eq!(to_pascal_case("foo"), "Foo");
        assert_eq!(to_pascal_case("foo_bAr"), "FooBAr");
    }
}
