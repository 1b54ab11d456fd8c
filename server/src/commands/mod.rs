use std::path::PathBuf;

use clap::Subcommand;

use crate::Result;

pub(crate) mod import;
pub(crate) mod serve;

#[derive(Subcommand, Default)]
pub(crate) enum Command {
    /// Apply migrations and run the HTTP API
    #[default]
    Serve,
    /// Apply migrations and exit
    Migrate,
    /// Load a JSON array of `{"name", "measurement_unit"}` objects
    ImportIngredients { path: PathBuf },
    /// Load a JSON array of `{"name", "color", "slug"}` objects
    ImportTags { path: PathBuf },
}

impl Command {
    pub(crate) async fn run(&self) -> Result<()> {
        match &self {
            Command::Serve => serve::serve().await,
            Command::Migrate => serve::migrate().await,
            Command::ImportIngredients { path } => import::import_ingredients(path).await,
            Command::ImportTags { path } => import::import_tags(path).await,
        }
    }
}
