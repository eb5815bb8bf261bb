use std::collections::{hash_map, HashMap, HashSet};

use crate::{ast, case::to_pascal_case};

use super::CheckError;

/// A table of all message, enum and group definitions across the loaded
/// files, keyed by their full name (with a leading dot), plus the set of
/// extension field names. Built before any descriptors are generated and
/// read-only afterwards.
#[derive(Debug, Default)]
pub(crate) struct TypeIndex {
    types: HashMap<String, DefinitionKind>,
    extensions: HashSet<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum DefinitionKind {
    Message,
    Enum,
    Group,
}

impl TypeIndex {
    pub fn new() -> Self {
        Default::default()
    }

    /// Records all definitions of `file`. Files must be added in dependency
    /// order, so that when a file's descriptor is generated the index covers
    /// its transitive imports.
    pub fn add_file(&mut self, file: &ast::File) -> Result<(), Vec<CheckError>> {
        let mut scope = Vec::new();
        if let Some(package) = &file.package {
            scope.extend(package.name.parts.iter().map(|part| part.value.clone()));
        }

        let mut errors = Vec::new();
        for item in &file.items {
            match item {
                ast::FileItem::Message(message) => self.add_message(message, &mut scope, &mut errors),
                ast::FileItem::Enum(enu) => self.add(&enu.name, DefinitionKind::Enum, &scope, &mut errors),
                ast::FileItem::Extend(extend) => self.add_extend(extend, &mut scope, &mut errors),
                ast::FileItem::Service(_) => continue,
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Resolves a type reference against the scope at its use site.
    ///
    /// Absolute references (with a leading dot) are looked up verbatim.
    /// Otherwise the reference is tried against each enclosing scope in turn,
    /// from innermost to outermost, and the first match wins.
    pub fn resolve(&self, name: &str, scope: &[String]) -> Option<(String, DefinitionKind)> {
        if name.starts_with('.') {
            return self.types.get(name).map(|&kind| (name.to_owned(), kind));
        }

        for i in (0..=scope.len()).rev() {
            let full_name = full_name(&scope[..i], name);
            if let Some(&kind) = self.types.get(&full_name) {
                return Some((full_name, kind));
            }
        }

        None
    }

    /// Resolves the name of an extension field, using the same scoping rules
    /// as [`resolve`](TypeIndex::resolve).
    pub fn resolve_extension(&self, name: &str, scope: &[String]) -> Option<String> {
        if name.starts_with('.') {
            return self.extensions.get(name).cloned();
        }

        for i in (0..=scope.len()).rev() {
            let full_name = full_name(&scope[..i], name);
            if self.extensions.contains(&full_name) {
                return Some(full_name);
            }
        }

        None
    }

    fn add(
        &mut self,
        name: &ast::Ident,
        kind: DefinitionKind,
        scope: &[String],
        errors: &mut Vec<CheckError>,
    ) {
        let full_name = full_name(scope, &name.value);
        match self.types.entry(full_name) {
            hash_map::Entry::Vacant(entry) => {
                entry.insert(kind);
            }
            hash_map::Entry::Occupied(entry) => errors.push(CheckError::DuplicateName {
                name: entry.key().clone(),
                span: name.span.clone(),
            }),
        }
    }

    fn add_message(
        &mut self,
        message: &ast::Message,
        scope: &mut Vec<String>,
        errors: &mut Vec<CheckError>,
    ) {
        self.add(&message.name, DefinitionKind::Message, scope, errors);
        scope.push(message.name.value.clone());
        self.add_message_body(&message.body, scope, errors);
        scope.pop();
    }

    fn add_message_body(
        &mut self,
        body: &ast::MessageBody,
        scope: &mut Vec<String>,
        errors: &mut Vec<CheckError>,
    ) {
        for item in &body.items {
            match item {
                ast::MessageItem::Message(message) => self.add_message(message, scope, errors),
                ast::MessageItem::Enum(enu) => {
                    self.add(&enu.name, DefinitionKind::Enum, scope, errors)
                }
                ast::MessageItem::Field(field) => self.add_field(field, scope, errors),
                ast::MessageItem::Oneof(oneof) => {
                    for item in &oneof.items {
                        if let ast::OneofItem::Field(field) = item {
                            self.add_field(field, scope, errors);
                        }
                    }
                }
                ast::MessageItem::Extend(extend) => self.add_extend(extend, scope, errors),
                ast::MessageItem::Option(_)
                | ast::MessageItem::Reserved(_)
                | ast::MessageItem::Extensions(_) => continue,
            }
        }
    }

    fn add_field(
        &mut self,
        field: &ast::Field,
        scope: &mut Vec<String>,
        errors: &mut Vec<CheckError>,
    ) {
        match &field.kind {
            ast::FieldKind::Group { name, body, .. } => {
                self.add(name, DefinitionKind::Group, scope, errors);
                scope.push(name.value.clone());
                self.add_message_body(body, scope, errors);
                scope.pop();
            }
            ast::FieldKind::Map { name, .. } => {
                // Map fields synthesize a nested entry message.
                let entry_name = ast::Ident::new(
                    to_pascal_case(&name.value) + "Entry",
                    name.span.clone(),
                );
                self.add(&entry_name, DefinitionKind::Message, scope, errors);
            }
            ast::FieldKind::Direct { .. } => (),
        }
    }

    fn add_extend(
        &mut self,
        extend: &ast::Extend,
        scope: &mut Vec<String>,
        errors: &mut Vec<CheckError>,
    ) {
        for field in &extend.fields {
            let name = match &field.kind {
                ast::FieldKind::Group { name, body, .. } => {
                    self.add(name, DefinitionKind::Group, scope, errors);
                    scope.push(name.value.clone());
                    self.add_message_body(body, scope, errors);
                    scope.pop();

                    ast::Ident::new(name.value.to_ascii_lowercase(), name.span.clone())
                }
                _ => field.name().clone(),
            };

            let full_name = full_name(scope, &name.value);
            if !self.extensions.insert(full_name.clone()) {
                errors.push(CheckError::DuplicateName {
                    name: full_name,
                    span: name.span,
                });
            }
        }
    }
}

/// Composes the full name of `name` declared inside `scope`, with a leading
/// dot.
pub(crate) fn full_name(scope: &[String], name: &str) -> String {
    let mut full_name = String::with_capacity(scope.iter().map(|s| s.len() + 1).sum::<usize>() + name.len() + 1);
    for part in scope {
        full_name.push('.');
        full_name.push_str(part);
    }
    full_name.push('.');
    full_name.push_str(name);
    full_name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn index(source: &str) -> TypeIndex {
        let ast = parse::parse(source).unwrap();
        let mut index = TypeIndex::new();
        index.add_file(&ast).unwrap();
        index
    }

    #[test]
    fn resolves_through_scopes() {
        let index = index(
            "package pkg1.pkg2;\
             message Nest {\
                message Egg {}\
             }\
             message Egg2 {}",
        );

        let scope = vec!["pkg1".to_owned(), "pkg2".to_owned(), "Nest".to_owned()];
        assert_eq!(
            index.resolve("Egg", &scope),
            Some((".pkg1.pkg2.Nest.Egg".to_owned(), DefinitionKind::Message))
        );
        assert_eq!(
            index.resolve("Egg2", &scope),
            Some((".pkg1.pkg2.Egg2".to_owned(), DefinitionKind::Message))
        );
        assert_eq!(
            index.resolve(".pkg1.pkg2.Egg2", &scope),
            Some((".pkg1.pkg2.Egg2".to_owned(), DefinitionKind::Message))
        );
        assert_eq!(index.resolve("Egg3", &scope), None);
    }

    #[test]
    fn inner_scope_shadows_outer() {
        let index = index(
            "package pkg;\
             message Foo {}\
             message Outer {\
                message Foo {}\
                message Inner {}\
             }",
        );

        let inner = vec!["pkg".to_owned(), "Outer".to_owned(), "Inner".to_owned()];
        assert_eq!(
            index.resolve("Foo", &inner),
            Some((".pkg.Outer.Foo".to_owned(), DefinitionKind::Message))
        );

        let outer = vec!["pkg".to_owned()];
        assert_eq!(
            index.resolve("Foo", &outer),
            Some((".pkg.Foo".to_owned(), DefinitionKind::Message))
        );
    }

    #[test]
    fn registers_groups_and_map_entries() {
        let index = index(
            "message Foo {\
                optional group Bar = 1 {}\
                map<string, int32> by_name = 2;\
             }",
        );

        assert_eq!(
            index.resolve("Foo.Bar", &[]),
            Some((".Foo.Bar".to_owned(), DefinitionKind::Group))
        );
        assert_eq!(
            index.resolve("Foo.ByNameEntry", &[]),
            Some((".Foo.ByNameEntry".to_owned(), DefinitionKind::Message))
        );
    }

    #[test]
    fn registers_extensions() {
        let index = index(
            "package pkg;\
             message Options {\
                extensions 100 to 200;\
             }\
             extend Options {\
                optional string tag = 100;\
             }",
        );

        assert_eq!(
            index.resolve_extension("tag", &["pkg".to_owned()]),
            Some(".pkg.tag".to_owned())
        );
        assert_eq!(index.resolve_extension("missing", &["pkg".to_owned()]), None);
    }

    #[test]
    fn duplicate_name_is_an_error() {
        let ast = parse::parse("message Foo {} message Foo {}").unwrap();
        let mut index = TypeIndex::new();
        let errors = index.add_file(&ast).unwrap_err();
        assert!(matches!(
            &errors[0],
            CheckError::DuplicateName { name, .. } if name == ".Foo"
        ));
    }
}
