//! Languages command - show the language profile table

use anyhow::Result;
use codemood::languages::{self, LanguageProfile};
use console::style;
use serde::Serialize;

#[derive(Serialize)]
struct LanguageRow<'a> {
    #[serde(flatten)]
    profile: &'a LanguageProfile,
    category: languages::LanguageCategory,
}

pub fn run(format: &str) -> Result<()> {
    let rows: Vec<LanguageRow> = languages::supported()
        .iter()
        .map(|profile| LanguageRow {
            profile,
            category: languages::category(profile.id),
        })
        .collect();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "\n  {:<17} {:<18} {:>6} {:>6}  {:<14} {}",
        style("ID").bold(),
        style("Name").bold(),
        style("Weight").bold(),
        style("Bonus").bold(),
        style("Category").bold(),
        style("Extensions").bold()
    );
    for row in &rows {
        let p = row.profile;
        println!(
            "  {:<17} {:<18} {:>6.1} {:>6}  {:<14} {}",
            style(p.id).cyan(),
            p.display_name,
            p.diagnostic_weight,
            format!("+{}", p.quality_bonus),
            row.category.to_string(),
            style(languages::file_extensions(p.id).join(" ")).dim()
        );
    }
    println!(
        "\n  {} Unknown languages score with weight {:.1} and bonus +{}\n",
        style("→").dim(),
        languages::DEFAULT_WEIGHT,
        languages::DEFAULT_BONUS
    );
    Ok(())
}
