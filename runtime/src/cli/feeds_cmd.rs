//! `filings feeds`: list the feed catalog.

use super::output;
use crate::feeds::catalog;
use anyhow::Result;

pub fn run() -> Result<()> {
    if output::is_json() {
        let feeds: Vec<serde_json::Value> = catalog()
            .map(|spec| {
                serde_json::json!({
                    "id": spec.id,
                    "title": spec.title,
                    "transport": spec.transport,
                    "date_rule": spec.date_rule,
                    "url": spec.url_template,
                    "mandatory": spec.mandatory_keys().collect::<Vec<_>>(),
                })
            })
            .collect();
        output::print_json(&serde_json::Value::Array(feeds));
        return Ok(());
    }

    println!("{:<20} {:<12} {:<19} URL", "FEED", "TRANSPORT", "DATES");
    for spec in catalog() {
        println!(
            "{:<20} {:<12} {:<19} {}",
            spec.id.as_str(),
            spec.transport.to_string(),
            spec.date_rule.to_string(),
            spec.url_template
        );
    }
    Ok(())
}
