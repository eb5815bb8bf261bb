//! Debugging tool which reads a serialized FileDescriptorSet and
//! pretty-prints its contents.

use std::{fs, path::PathBuf};

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use prost::Message;
use prost_types::FileDescriptorSet;

#[derive(Debug, Parser)]
pub struct Args {
    /// A serialized FileDescriptorSet file, as produced by protoset.
    #[clap(value_name = "FILE", value_parser)]
    file: PathBuf,
}

pub fn main() -> Result<()> {
    let args = Args::parse();

    let bytes = fs::read(&args.file).into_diagnostic()?;
    let descriptor_set = FileDescriptorSet::decode(bytes.as_slice()).into_diagnostic()?;

    println!("{:#?}", descriptor_set);
    Ok(())
}
