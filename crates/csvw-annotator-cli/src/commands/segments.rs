//! Segments command - print the region table of a file.

use std::sync::Arc;

use colored::Colorize;
use csvw_annotator::{fetch, Annotator, AnnotatorConfig, EncodingChoice, SegmentKind, UnitIndex};

use super::CommandResult;

pub fn run(units: Arc<UnitIndex>, source: String, encoding: String, verbose: bool) -> CommandResult {
    let annotator = Annotator::new(units)
        .with_config(AnnotatorConfig::default().with_encoding(EncodingChoice::from(encoding)));

    let file = fetch(&source)?;
    let segments = annotator.segments(&file)?;

    println!(
        "{} {} ({} regions)",
        "Segments of".cyan().bold(),
        file.name.white(),
        segments.len()
    );
    println!();
    println!("  {:>6} {:>6} {:>10} {:>7}  {}", "start", "end", "separator", "fields", "kind");

    for segment in &segments {
        let delimiter = segment
            .delimiter
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let kind = match segment.kind {
            SegmentKind::Meta => "meta".blue(),
            SegmentKind::Data => "data".green(),
            SegmentKind::Unknown => "unknown".dimmed(),
        };
        if !verbose && segment.kind == SegmentKind::Unknown {
            continue;
        }
        println!(
            "  {:>6} {:>6} {:>10} {:>7}  {}",
            segment.start, segment.end, delimiter, segment.field_count, kind
        );
    }

    if !verbose {
        let hidden = segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Unknown)
            .count();
        if hidden > 0 {
            println!();
            println!("{} unclassified regions hidden, use --verbose to list them", hidden);
        }
    }

    Ok(())
}
