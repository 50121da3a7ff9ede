//! Annotate command - write the CSVW metadata of one file.

use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use csvw_annotator::{fetch, Annotator, AnnotatorConfig, EncodingChoice, UnitIndex};

use super::CommandResult;

pub struct AnnotateArgs {
    pub source: String,
    pub output: Option<PathBuf>,
    pub encoding: String,
    pub separator: String,
    pub header_separator: String,
    pub stdout: bool,
}

impl AnnotateArgs {
    fn config(&self) -> CommandResult<AnnotatorConfig> {
        Ok(AnnotatorConfig::default()
            .with_encoding(EncodingChoice::from(self.encoding.as_str()))
            .with_delimiter(self.separator.parse()?)
            .with_header_delimiter(self.header_separator.parse()?))
    }
}

pub fn run(units: Arc<UnitIndex>, args: AnnotateArgs) -> CommandResult {
    let config = args.config()?;
    let annotator = Annotator::new(units).with_config(config);

    if !args.stdout {
        println!("{} {}", "Annotating".cyan().bold(), args.source.white());
    }

    let source = fetch(&args.source)?;
    let annotation = annotator.annotate(&source)?;
    let json = annotation.document.to_json_pretty()?;

    if args.stdout {
        println!("{}", json);
        return Ok(());
    }

    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&annotation.filename));
    std::fs::write(&output_path, json)?;

    println!(
        "Found {} metadata notes and {} tables",
        annotation.document.notes.len().to_string().white().bold(),
        annotation.document.tables.len().to_string().white().bold()
    );
    for table in &annotation.document.tables {
        println!(
            "  skip {:>4}  header rows {:>2}  columns {:>3}  separator {}",
            table.dialect.skip_rows,
            table.dialect.header_row_count,
            table.table_schema.columns.len(),
            table.dialect.delimiter.yellow()
        );
    }

    println!();
    println!(
        "{} {}",
        "Saved to".green().bold(),
        output_path.display().to_string().white()
    );

    Ok(())
}
