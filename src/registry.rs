use std::collections::HashMap;

use prost_types::{
    DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    FileDescriptorSet,
};

/// A reflective index over a [`FileDescriptorSet`], for looking up messages,
/// enums and extensions by name, number or type URL.
///
/// The registry borrows the set it was built from and is never mutated once
/// built.
#[derive(Debug)]
pub struct Registry<'a> {
    names: HashMap<String, DescriptorRef<'a>>,
    extensions: Vec<(String, &'a FieldDescriptorProto)>,
}

/// A descriptor found by [`Registry::find_descriptor_by_name`].
#[derive(Debug, Clone, Copy)]
pub enum DescriptorRef<'a> {
    /// A message declaration.
    Message(&'a DescriptorProto),
    /// An enum declaration.
    Enum(&'a EnumDescriptorProto),
    /// A field declared in an `extend` block.
    Extension(&'a FieldDescriptorProto),
}

impl<'a> Registry<'a> {
    /// Builds a registry over all files in the given set.
    pub fn new(set: &'a FileDescriptorSet) -> Self {
        Self::from_files(&set.file)
    }

    pub(crate) fn from_files(files: impl IntoIterator<Item = &'a FileDescriptorProto>) -> Self {
        let mut registry = Registry {
            names: HashMap::new(),
            extensions: Vec::new(),
        };

        for file in files {
            let mut scope = String::new();
            if !file.package().is_empty() {
                scope.push_str(file.package());
            }

            for extension in &file.extension {
                registry.add_extension(&scope, extension);
            }
            for message in &file.message_type {
                registry.add_message(&scope, message);
            }
            for enu in &file.enum_type {
                registry.add_enum(&scope, enu);
            }
        }

        registry
    }

    /// Finds a message, enum or extension declaration by its full name,
    /// without the leading dot.
    pub fn find_descriptor_by_name(&self, name: &str) -> Option<DescriptorRef<'a>> {
        self.names.get(name.strip_prefix('.').unwrap_or(name)).copied()
    }

    /// Finds a message by its full name.
    pub fn find_message_by_name(&self, name: &str) -> Option<&'a DescriptorProto> {
        match self.find_descriptor_by_name(name) {
            Some(DescriptorRef::Message(message)) => Some(message),
            _ => None,
        }
    }

    /// Finds an enum by its full name.
    pub fn find_enum_by_name(&self, name: &str) -> Option<&'a EnumDescriptorProto> {
        match self.find_descriptor_by_name(name) {
            Some(DescriptorRef::Enum(enu)) => Some(enu),
            _ => None,
        }
    }

    /// Finds an extension field by its full name.
    pub fn find_extension_by_name(&self, name: &str) -> Option<&'a FieldDescriptorProto> {
        match self.find_descriptor_by_name(name) {
            Some(DescriptorRef::Extension(extension)) => Some(extension),
            _ => None,
        }
    }

    /// Finds the extension of the message `containing` with the given field
    /// number. Extensions are scanned in the order they were declared across
    /// all files, and the first match is returned.
    pub fn find_extension_by_number(
        &self,
        containing: &str,
        number: i32,
    ) -> Option<&'a FieldDescriptorProto> {
        let containing = containing.strip_prefix('.').unwrap_or(containing);
        self.extensions
            .iter()
            .find(|(extendee, extension)| {
                extendee == containing && extension.number == Some(number)
            })
            .map(|&(_, extension)| extension)
    }

    /// Finds a message by a type URL such as
    /// `type.googleapis.com/my.package.Message`. Only the part after the
    /// final `/` is significant; no network lookup is performed.
    pub fn find_message_by_url(&self, url: &str) -> Option<&'a DescriptorProto> {
        let name = match url.rfind('/') {
            Some(index) => &url[index + 1..],
            None => url,
        };
        self.find_message_by_name(name)
    }

    fn add_message(&mut self, scope: &str, message: &'a DescriptorProto) {
        let full_name = join_name(scope, message.name());
        for extension in &message.extension {
            self.add_extension(&full_name, extension);
        }
        for nested in &message.nested_type {
            self.add_message(&full_name, nested);
        }
        for enu in &message.enum_type {
            self.add_enum(&full_name, enu);
        }
        self.names.insert(full_name, DescriptorRef::Message(message));
    }

    fn add_enum(&mut self, scope: &str, enu: &'a EnumDescriptorProto) {
        let full_name = join_name(scope, enu.name());
        self.names.insert(full_name, DescriptorRef::Enum(enu));
    }

    fn add_extension(&mut self, scope: &str, extension: &'a FieldDescriptorProto) {
        let full_name = join_name(scope, extension.name());
        let extendee = extension
            .extendee()
            .strip_prefix('.')
            .unwrap_or_else(|| extension.extendee())
            .to_owned();
        self.extensions.push((extendee, extension));
        self.names
            .insert(full_name, DescriptorRef::Extension(extension));
    }
}

fn join_name(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_owned()
    } else {
        format!("{}.{}", scope, name)
    }
}
