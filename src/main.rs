use std::{fs, path::PathBuf};

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use protoset::Compiler;

/// Compiles protobuf source files into a serialized FileDescriptorSet.
#[derive(Debug, Parser)]
pub struct Args {
    #[clap(value_name = "PROTO_FILES", required = true, value_parser)]
    files: Vec<PathBuf>,
    /// Search paths for proto imports.
    #[clap(
        short = 'I',
        long = "proto-path",
        alias = "proto_path",
        value_name = "PATH",
        default_value = ".",
        value_parser
    )]
    includes: Vec<PathBuf>,
    /// FileDescriptorSet output file.
    #[clap(
        short = 'o',
        long = "descriptor-set-out",
        alias = "descriptor_set_out",
        value_name = "PATH",
        required = true,
        value_parser
    )]
    output: PathBuf,
    /// Include all dependencies of the input files so that the set is
    /// self-contained.
    #[clap(long = "include-imports", alias = "include_imports")]
    include_imports: bool,
}

pub fn main() -> Result<()> {
    let args = Args::parse();

    let mut compiler = Compiler::new(&args.includes)?;
    compiler.include_imports(args.include_imports);
    for file in &args.files {
        compiler.add_file(file)?;
    }

    let bytes = compiler.encode_file_descriptor_set();

    // Write through a temporary file so the output appears atomically.
    let tmp = args.output.with_extension("tmp");
    fs::write(&tmp, &bytes).into_diagnostic()?;
    fs::rename(&tmp, &args.output).into_diagnostic()?;
    Ok(())
}
