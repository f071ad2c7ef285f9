//! Survey catalog listing.

use skylayer::source::SurveySource;

use crate::error::CliError;
use crate::runner::{load_config, GlobalOptions};

/// List every survey in the configured catalog.
pub fn run(options: &GlobalOptions) -> Result<(), CliError> {
    let config = load_config(options)?;
    let catalog = config.catalog()?;
    let selected = options.source.as_deref().unwrap_or(&config.survey.source);

    println!("Surveys ({})", catalog.len());
    println!("==========");
    for source in catalog.iter() {
        let marker = if source.id == selected || source.title == selected { "*" } else { " " };
        println!("{} {}", marker, describe(source));
    }
    Ok(())
}

fn describe(source: &SurveySource) -> String {
    format!(
        "{}\n    {}\n    order {}, {}px {}, {} frame\n    {}",
        source.id,
        source.title,
        source.max_level,
        source.tile_width,
        source.format.extension(),
        source.frame.as_str(),
        source.base_url
    )
}
