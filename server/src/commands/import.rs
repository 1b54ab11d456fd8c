use std::path::Path;

use color_eyre::eyre::{bail, Context};
use db::cooking::{Ingredient, Tag};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{info, warn};

use crate::{http_server::validation, Result};

#[derive(Debug, Deserialize, PartialEq)]
pub(crate) struct IngredientFixture {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Deserialize, PartialEq)]
pub(crate) struct TagFixture {
    pub name: String,
    pub color: String,
    pub slug: String,
}

pub(crate) async fn read_fixture<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("Couldn't read {}", path.display()))?;

    serde_json::from_str(&contents).wrap_err_with(|| format!("{} is not valid JSON", path.display()))
}

pub(crate) async fn import_ingredients(path: &Path) -> Result<()> {
    let fixtures: Vec<IngredientFixture> = read_fixture(path).await?;
    let pool = db::setup_db_pool().await?;
    db::migrate(&pool).await?;

    let mut inserted = 0;
    for fixture in &fixtures {
        if fixture.name.trim().is_empty() || fixture.measurement_unit.trim().is_empty() {
            warn!(?fixture, "Skipping ingredient with a blank name or unit");
            continue;
        }

        if Ingredient::create(&pool, &fixture.name, &fixture.measurement_unit)
            .await?
            .is_some()
        {
            inserted += 1;
        }
    }

    info!(inserted, total = fixtures.len(), "Imported ingredients");
    println!("Imported {inserted} of {} ingredients", fixtures.len());

    Ok(())
}

pub(crate) async fn import_tags(path: &Path) -> Result<()> {
    let fixtures: Vec<TagFixture> = read_fixture(path).await?;

    for fixture in &fixtures {
        if let Err(e) = validation::validate_tag(&fixture.name, &fixture.color, &fixture.slug) {
            bail!("Tag {:?} is invalid: {e}", fixture.name);
        }
    }

    let pool = db::setup_db_pool().await?;
    db::migrate(&pool).await?;

    let mut inserted = 0;
    for fixture in &fixtures {
        if Tag::create(&pool, &fixture.name, &fixture.color, &fixture.slug)
            .await?
            .is_some()
        {
            inserted += 1;
        } else {
            warn!(slug = %fixture.slug, "Tag already exists, skipping");
        }
    }

    info!(inserted, total = fixtures.len(), "Imported tags");
    println!("Imported {inserted} of {} tags", fixtures.len());

    Ok(())
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::*;

    #[tokio::test]
    async fn reads_ingredient_fixtures() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"name": "абрикосовое варенье", "measurement_unit": "г"}},
                {{"name": "Flour", "measurement_unit": "g"}}
            ]"#
        )
        .unwrap();

        let fixtures: Vec<IngredientFixture> = read_fixture(file.path()).await.unwrap();

        assert_eq!(
            fixtures,
            vec![
                IngredientFixture {
                    name: "абрикосовое варенье".to_string(),
                    measurement_unit: "г".to_string(),
                },
                IngredientFixture {
                    name: "Flour".to_string(),
                    measurement_unit: "g".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn malformed_fixture_names_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "not an array"}}"#).unwrap();

        let err = read_fixture::<TagFixture>(file.path()).await.unwrap_err();

        assert!(err.to_string().contains("is not valid JSON"));
    }

    #[tokio::test]
    async fn missing_fixture_is_an_error() {
        let result = read_fixture::<TagFixture>(Path::new("/definitely/not/here.json")).await;

        assert!(result.is_err());
    }
}
