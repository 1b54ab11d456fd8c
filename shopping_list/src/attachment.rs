use std::fmt::Write as _;

use crate::AggregatedLine;

/// First line of every shopping list.
pub const HEADER: &str = "Список покупок для приготовления:\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeRef {
    pub id: i64,
    pub name: String,
}

/// A rendered shopping list, ready to be served as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub body: String,
}

/// Renders the shopping list for `owner_label`.
///
/// The owner label goes into the file name untouched; escaping it for a
/// header value is the transport's job.
pub fn format(owner_label: &str, recipes: &[RecipeRef], lines: &[AggregatedLine]) -> Attachment {
    let file_name = format!("{owner_label}_ingredients.txt");

    let recipe_names = recipes
        .iter()
        .map(|recipe| recipe.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let mut body = String::from(HEADER);
    body.push_str(&recipe_names);
    for line in lines {
        // Writing into a String can't fail
        let _ = write!(
            body,
            "\n{}: {}, {}",
            line.ingredient_name, line.total_amount, line.measurement_unit
        );
    }

    Attachment { file_name, body }
}
