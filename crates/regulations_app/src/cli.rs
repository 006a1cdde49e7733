use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use regulations_core::MetadataField;

/// Upload, search and edit regulation documents stored by the regulations backend.
#[derive(Debug, Parser)]
#[command(name = "regulations", version)]
pub struct Cli {
    /// RON configuration file. Defaults to ./regulations.ron when present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Backend base url, overriding the configuration file.
    #[arg(long, global = true, env = "REGULATIONS_BASE_URL", value_name = "URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload scanned pages with metadata and follow the processing task.
    Upload(UploadArgs),
    /// Search stored regulations.
    Search(SearchArgs),
    /// Open a regulation in the editor.
    Edit(EditArgs),
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    /// Page images or PDFs to upload.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub metadata: MetadataArgs,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Full-text query.
    #[arg(long)]
    pub text: Option<String>,

    #[command(flatten)]
    pub metadata: MetadataArgs,

    /// Write every result as `<exist_name>.json` into this directory.
    #[arg(long, value_name = "DIR")]
    pub handoff_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct EditArgs {
    /// Handoff file written by `search --handoff-dir`.
    #[arg(long, value_name = "FILE")]
    pub handoff: Option<PathBuf>,

    /// Load the original version of a stored regulation by name.
    #[arg(long, value_name = "EXIST_NAME")]
    pub name: Option<String>,
}

#[derive(Debug, Default, Args)]
pub struct MetadataArgs {
    #[arg(long)]
    pub dokumententitel: Option<String>,
    #[arg(long)]
    pub herausgeber: Option<String>,
    #[arg(long)]
    pub verlag: Option<String>,
    #[arg(long)]
    pub erscheinungsort: Option<String>,
    #[arg(long)]
    pub erscheinungsdatum: Option<String>,
    #[arg(long)]
    pub erscheinungsjahr: Option<String>,
    #[arg(long)]
    pub erlassdatum: Option<String>,
    #[arg(long)]
    pub inkrafttreten: Option<String>,
    #[arg(long)]
    pub seitenzahl: Option<String>,
}

impl MetadataArgs {
    /// Fields given on the command line, in form order.
    pub fn values(&self) -> Vec<(MetadataField, String)> {
        [
            (MetadataField::Dokumententitel, &self.dokumententitel),
            (MetadataField::Herausgeber, &self.herausgeber),
            (MetadataField::Verlag, &self.verlag),
            (MetadataField::Erscheinungsort, &self.erscheinungsort),
            (MetadataField::Erscheinungsdatum, &self.erscheinungsdatum),
            (MetadataField::Erscheinungsjahr, &self.erscheinungsjahr),
            (MetadataField::Erlassdatum, &self.erlassdatum),
            (MetadataField::Inkrafttreten, &self.inkrafttreten),
            (MetadataField::Seitenzahl, &self.seitenzahl),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.clone().map(|value| (field, value)))
        .collect()
    }
}
