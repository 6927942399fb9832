//! Languages Command
//!
//! List the normalized language tags and each provider's native code.

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::cli::ui::Output;
use crate::language::{Preferences, catalog};
use crate::types::Result;

#[derive(Debug, Serialize)]
struct LanguageRow {
    id: &'static str,
    name: &'static str,
    preferred: bool,
    statistical: bool,
    tencent: Option<&'static str>,
    baidu: Option<&'static str>,
    apple: Option<&'static str>,
}

fn rows(preferences: &Preferences) -> Vec<LanguageRow> {
    catalog::LANGUAGES
        .iter()
        .map(|info| LanguageRow {
            id: info.id,
            name: info.name,
            preferred: preferences.is_preferred(info.id),
            statistical: info.whatlang.is_some(),
            tencent: info.tencent,
            baidu: info.baidu,
            apple: info.apple,
        })
        .collect()
}

pub fn run(preferences: &Preferences, format: OutputFormat) -> Result<()> {
    let rows = rows(preferences);

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let output = Output::new();
    output.section("Languages");
    println!(
        "  {:<8} {:<22} {:<8} {:<8} {:<8}",
        "TAG", "NAME", "TENCENT", "BAIDU", "APPLE"
    );
    for row in &rows {
        println!(
            "{} {:<8} {:<22} {:<8} {:<8} {:<8}",
            if row.preferred { "*" } else { " " },
            row.id,
            row.name,
            row.tencent.unwrap_or("-"),
            row.baidu.unwrap_or("-"),
            row.apple.unwrap_or("-"),
        );
    }
    println!();
    output.info(&format!(
        "* preferred: {}",
        preferences.languages().join(", ")
    ));

    Ok(())
}
