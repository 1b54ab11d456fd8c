//! Shopping list generation for a user's queued recipes.
//!
//! Two steps, both pure: [`aggregate`] folds per-recipe ingredient usages into
//! one line per `(ingredient name, measurement unit)` pair, and [`format`]
//! renders those lines together with the recipe titles into an [`Attachment`]
//! the HTTP layer can hand out as a text download.

mod aggregate;
mod attachment;

pub use aggregate::{aggregate, AggregatedLine, IngredientUsage};
pub use attachment::{format, Attachment, RecipeRef, HEADER};
