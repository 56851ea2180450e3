//! CLI command handlers

use anyhow::{bail, Result};

use medqcm_core::{bank, Config, DataStore, Generator, Module};

/// Print the content tree
pub fn list(store: &DataStore, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(store)?);
        return Ok(());
    }

    for year in &store.years {
        println!("{}  [{}]", year.name, year.id);
        for semester in &year.semesters {
            println!("  {}  [{}]", semester.name, semester.id);
            if semester.modules.is_empty() {
                println!("    (aucun module)");
            }
            for module in &semester.modules {
                println!(
                    "    {}  [{}]  {} questions, {} PDF",
                    module.name,
                    module.id,
                    module.questions.len(),
                    module.pdfs.len()
                );
            }
        }
    }
    Ok(())
}

/// Call the generation service for a module and print the questions
pub async fn generate(
    config: &Config,
    store: &DataStore,
    module: &str,
    count: usize,
    json: bool,
) -> Result<()> {
    let Some(module) = resolve_module(store, module) else {
        bail!("Module not found: {}", module);
    };

    let generator = Generator::from_config(config)?;
    let questions = generator
        .generate(&module.name, module.description.as_deref(), count)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&questions)?);
        return Ok(());
    }

    if questions.is_empty() {
        println!("The service returned no questions.");
        return Ok(());
    }

    println!("{} questions for {}:\n", questions.len(), module.name);
    for (i, question) in questions.iter().enumerate() {
        println!("{}. {}", i + 1, question.text);
        for (j, option) in question.options.iter().enumerate() {
            let marker = if question.correct.contains(&j) { "*" } else { " " };
            println!("   {} {}) {}", marker, option_letter(j), option);
        }
        if let Some(explanation) = &question.explanation {
            println!("   → {}", explanation);
        }
        println!();
    }
    Ok(())
}

/// Resolve a module by id first, then by case-insensitive name
fn resolve_module<'a>(store: &'a DataStore, needle: &str) -> Option<&'a Module> {
    bank::find_module(store, needle).or_else(|| {
        store
            .years
            .iter()
            .flat_map(|y| &y.semesters)
            .flat_map(|s| &s.modules)
            .find(|m| m.name.eq_ignore_ascii_case(needle))
    })
}

fn option_letter(index: usize) -> char {
    (b'a' + (index % 26) as u8) as char
}
