use std::{
    collections::HashMap,
    fmt::{self, Write},
    path::{Path, PathBuf},
};

use miette::NamedSource;

use crate::{
    ast, check,
    check::TypeIndex,
    error::{Error, ErrorKind},
    file::{
        check_shadow, path_to_file_name, ChainFileResolver, File, FileResolver,
        GoogleFileResolver, IncludeFileResolver,
    },
    registry::Registry,
    transcode_file, types,
};

#[cfg(test)]
pub(crate) mod tests;

/// Options for compiling protobuf files.
pub struct Compiler {
    resolver: Box<dyn FileResolver>,
    index: TypeIndex,
    file_map: ParsedFileMap,
    include_imports: bool,
}

#[derive(Debug)]
pub(crate) struct ParsedFile {
    pub descriptor: types::FileDescriptorProto,
    pub pb: prost_types::FileDescriptorProto,
    pub name: String,
    pub path: Option<PathBuf>,
    pub is_root: bool,
}

#[derive(Debug, Default)]
pub(crate) struct ParsedFileMap {
    files: Vec<ParsedFile>,
    file_names: HashMap<String, usize>,
}

impl Compiler {
    /// Create a new [`Compiler`] with default options and the given set of
    /// include paths.
    ///
    /// In addition to the given include paths, the [`Compiler`] instance will
    /// be able to import `google/protobuf/descriptor.proto`.
    pub fn new<I, P>(includes: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut resolver = ChainFileResolver::new();

        for include in includes {
            resolver.add(IncludeFileResolver::new(include.as_ref().to_owned()));
        }

        resolver.add(GoogleFileResolver::new());

        Ok(Compiler::with_file_resolver(resolver))
    }

    /// Create a new [`Compiler`] with a custom [`FileResolver`] for looking
    /// up imported files.
    pub fn with_file_resolver<R>(resolver: R) -> Self
    where
        R: FileResolver + 'static,
    {
        Compiler {
            resolver: Box::new(resolver),
            index: TypeIndex::new(),
            file_map: Default::default(),
            include_imports: false,
        }
    }

    /// Set whether the output `FileDescriptorSet` should include imported
    /// files.
    ///
    /// By default, only files explicitly added with
    /// [`add_file`](Compiler::add_file) are returned by
    /// [`file_descriptor_set`](Compiler::file_descriptor_set). If this option
    /// is set, imported files are included too.
    pub fn include_imports(&mut self, yes: bool) -> &mut Self {
        self.include_imports = yes;
        self
    }

    /// Compile the file at the given path, and add it to this `Compiler`
    /// instance.
    ///
    /// If the path is absolute, or relative to the current directory, it must
    /// reside under one of the include paths. Otherwise, it is looked up
    /// relative to the given include paths in the same way as `import`
    /// statements.
    ///
    /// Imports are resolved recursively, depth-first, so that every file's
    /// dependencies are compiled before the file itself.
    pub fn add_file(&mut self, relative_path: impl AsRef<Path>) -> Result<&mut Self, Error> {
        let relative_path = relative_path.as_ref();
        // Paths under an include directory are checked against the file the
        // import name actually resolves to; bare import-style names are not.
        let (name, is_resolved) = match self.resolver.resolve_path(relative_path) {
            Some(name) => (name, true),
            None => match path_to_file_name(relative_path) {
                Some(name) => (name, false),
                None => {
                    return Err(Error::from_kind(ErrorKind::FileNotIncluded {
                        path: relative_path.to_owned(),
                    }))
                }
            },
        };

        if let Some(parsed_file) = self.file_map.get_mut(&name) {
            if is_resolved {
                check_shadow(parsed_file.path.as_deref(), relative_path)?;
            }
            parsed_file.is_root = true;
            return Ok(self);
        }

        let file = self.resolver.open_file(&name).map_err(|err| {
            if err.is_file_not_found() {
                Error::from_kind(ErrorKind::FileNotIncluded {
                    path: relative_path.to_owned(),
                })
            } else {
                err
            }
        })?;
        if is_resolved {
            check_shadow(file.path(), relative_path)?;
        }

        let mut import_stack = vec![name.clone()];
        for import in &file.ast.imports {
            self.add_import(import, &name, &file.source, &mut import_stack)?;
        }
        drop(import_stack);

        self.check_file(name, file, true)?;
        Ok(self)
    }

    /// Convert all added files into an instance of
    /// [`FileDescriptorSet`](prost_types::FileDescriptorSet).
    ///
    /// Files are sorted topologically, with dependency files ordered before
    /// the files that import them.
    ///
    /// Note that extension options are not included, since
    /// [`prost_types`] has no static knowledge of their types; use
    /// [`encode_file_descriptor_set`](Compiler::encode_file_descriptor_set)
    /// to retain them.
    pub fn file_descriptor_set(&self) -> prost_types::FileDescriptorSet {
        let file = self
            .file_map
            .files
            .iter()
            .filter(|f| self.include_imports || f.is_root)
            .map(|f| f.pb.clone())
            .collect();

        prost_types::FileDescriptorSet { file }
    }

    /// Convert all added files into a serialized
    /// [`FileDescriptorSet`](prost_types::FileDescriptorSet).
    ///
    /// This is equivalent to `file_descriptor_set().encode_to_vec()`, with
    /// the exception that interpreted extension options are included.
    pub fn encode_file_descriptor_set(&self) -> Vec<u8> {
        use prost::Message;

        let file = self
            .file_map
            .files
            .iter()
            .filter(|f| self.include_imports || f.is_root)
            .map(|f| f.descriptor.clone())
            .collect();

        types::FileDescriptorSet { file }.encode_to_vec()
    }

    fn add_import(
        &mut self,
        import: &ast::Import,
        parent_name: &str,
        parent_source: &str,
        import_stack: &mut Vec<String>,
    ) -> Result<(), Error> {
        let file_name = String::from_utf8_lossy(&import.value.value).into_owned();

        if import_stack.iter().any(|name| name == &file_name) {
            let mut cycle = String::new();
            for import in import_stack {
                write!(&mut cycle, "{} -> ", import).unwrap();
            }
            write!(&mut cycle, "{}", file_name).unwrap();

            return Err(Error::from_kind(ErrorKind::CircularImport { cycle }));
        }

        if self.file_map.file_names.contains_key(&file_name) {
            return Ok(());
        }

        let file = match self.resolver.open_file(&file_name) {
            Ok(file) => file,
            Err(err) => {
                return Err(err.into_import_error(
                    NamedSource::new(parent_name, parent_source.to_owned()),
                    import.value.span.clone(),
                ))
            }
        };

        import_stack.push(file_name.clone());
        for nested_import in &file.ast.imports {
            self.add_import(nested_import, &file_name, &file.source, import_stack)?;
        }
        import_stack.pop();

        self.check_file(file_name, file, false)
    }

    fn check_file(&mut self, name: String, file: File, is_root: bool) -> Result<(), Error> {
        self.index.add_file(&file.ast).map_err(|errors| {
            Error::check_errors(errors, NamedSource::new(name.clone(), file.source.clone()))
        })?;

        let mut descriptor = check::generate(&file.ast, Some(&name), Some(&self.index))
            .map_err(|errors| {
                Error::check_errors(errors, NamedSource::new(name.clone(), file.source.clone()))
            })?;

        // Interpret this file's options against a registry over everything
        // compiled so far, including the file itself. Imports always precede
        // their importers, so all referenced extensions are present.
        let uninterpreted = transcode_file(&descriptor);
        let registry = Registry::from_files(
            self.file_map
                .files
                .iter()
                .map(|f| &f.pb)
                .chain(std::iter::once(&uninterpreted)),
        );
        check::interpret(&mut descriptor, &registry).map_err(|errors| {
            Error::check_errors(errors, NamedSource::new(name.clone(), file.source.clone()))
        })?;
        drop(registry);

        let pb = transcode_file(&descriptor);
        self.file_map.add(ParsedFile {
            descriptor,
            pb,
            name,
            path: file.path,
            is_root,
        });
        Ok(())
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("file_map", &self.file_map)
            .field("include_imports", &self.include_imports)
            .finish_non_exhaustive()
    }
}

impl ParsedFileMap {
    fn add(&mut self, file: ParsedFile) {
        self.file_names.insert(file.name.clone(), self.files.len());
        self.files.push(file);
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut ParsedFile> {
        match self.file_names.get(name).copied() {
            Some(index) => Some(&mut self.files[index]),
            None => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn iter(&self) -> impl Iterator<Item = &ParsedFile> {
        self.files.iter()
    }
}

#[cfg(test)]
impl Compiler {
    pub(crate) fn file_map(&self) -> &ParsedFileMap {
        &self.file_map
    }
}
