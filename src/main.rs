use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;

use diagramkit::model::{Diagram, DiagramDoc};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect diagram documents as JSON", long_about = None)]
struct Cli {
    /// Diagram document (.dgk binary or JSON)
    #[arg(value_name = "DIAGRAM_FILE")]
    diagram_file: String,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let path = Utf8PathBuf::from(&cli.diagram_file);

    let diagram: Diagram = if path.extension() == Some("dgk") {
        DiagramDoc::load_from_binary(&path)
            .with_context(|| format!("Failed to load {}", path))?
            .diagram
    } else {
        // Fallback: parse a JSON document
        let text = std::fs::read_to_string(&path).with_context(|| format!("Open {}", path))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path))?
    };

    let json = serde_json::to_string_pretty(&diagram)?;
    println!("{}", json);
    Ok(())
}
