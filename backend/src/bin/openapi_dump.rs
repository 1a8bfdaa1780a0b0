//! Write the OpenAPI document to stdout or a file.
//!
//! ```text
//! openapi-dump --format yaml --output openapi.yaml
//! ```

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Result, WrapErr};
use timetable::ApiDoc;
use utoipa::OpenApi;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum Format {
    #[default]
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "openapi-dump", about = "Dump the timetable OpenAPI document")]
struct Cli {
    #[arg(long, value_enum, default_value_t)]
    format: Format,
    /// Destination file; stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn render(format: Format) -> Result<String> {
    let doc = ApiDoc::openapi();
    match format {
        Format::Json => doc.to_pretty_json().wrap_err("serialising OpenAPI as JSON"),
        Format::Yaml => doc.to_yaml().wrap_err("serialising OpenAPI as YAML"),
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let rendered = render(cli.format)?;
    match cli.output {
        Some(path) => std::fs::write(&path, rendered)
            .wrap_err_with(|| format!("writing {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
