use std::collections::HashMap;

use db::{
    cooking::{Favorite, Ingredient, Recipe, RecipeIngredient, RecipeTag, ShoppingCartEntry, Tag},
    subscriptions::Subscription,
    users::User,
    PgPool,
};
use serde::Serialize;

use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct UserView {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserView {
    pub(crate) fn new(user: User, is_subscribed: bool) -> Self {
        Self {
            email: user.email,
            id: user.user_id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }
}

/// What registration echoes back. No subscription flag since nobody can
/// follow an account that didn't exist a moment ago.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct NewUserView {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for NewUserView {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            id: user.user_id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct TagView {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<Tag> for TagView {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.tag_id,
            name: tag.name,
            color: tag.color,
            slug: tag.slug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct IngredientView {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientView {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            id: ingredient.ingredient_id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RecipeIngredientView {
    pub id: i64,
    pub name: String,
    pub measurement_unit: String,
    pub amount: f64,
}

impl From<RecipeIngredient> for RecipeIngredientView {
    fn from(row: RecipeIngredient) -> Self {
        Self {
            id: row.ingredient_id,
            name: row.name,
            measurement_unit: row.measurement_unit,
            amount: row.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RecipeView {
    pub id: i64,
    pub tags: Vec<TagView>,
    pub author: UserView,
    pub ingredients: Vec<RecipeIngredientView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct ShortRecipeView {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<Recipe> for ShortRecipeView {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.recipe_id,
            name: recipe.name,
            image: recipe.image,
            cooking_time: recipe.cooking_time,
        }
    }
}

/// An author as seen from the subscriptions page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SubscriptionView {
    #[serde(flatten)]
    pub author: UserView,
    pub recipes: Vec<ShortRecipeView>,
    pub recipes_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct SubscribeView {
    pub id: i64,
    pub user: i64,
    pub author: i64,
}

impl From<Subscription> for SubscribeView {
    fn from(subscription: Subscription) -> Self {
        Self {
            id: subscription.subscription_id,
            user: subscription.user_id,
            author: subscription.author_id,
        }
    }
}

/// A favorite or a shopping cart entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct MembershipView {
    pub id: i64,
    pub user: i64,
    pub recipe: i64,
}

impl From<Favorite> for MembershipView {
    fn from(favorite: Favorite) -> Self {
        Self {
            id: favorite.favorite_id,
            user: favorite.user_id,
            recipe: favorite.recipe_id,
        }
    }
}

impl From<ShoppingCartEntry> for MembershipView {
    fn from(entry: ShoppingCartEntry) -> Self {
        Self {
            id: entry.shopping_cart_entry_id,
            user: entry.user_id,
            recipe: entry.recipe_id,
        }
    }
}

/// Resolves `is_subscribed` for every user in one query.
pub(crate) async fn user_views(
    pool: &PgPool,
    viewer: Option<i64>,
    users: Vec<User>,
) -> Result<Vec<UserView>> {
    let followed = match viewer {
        Some(viewer) => {
            let ids: Vec<i64> = users.iter().map(|user| user.user_id).collect();
            Subscription::followed_among(pool, viewer, &ids).await?
        }
        None => Default::default(),
    };

    Ok(users
        .into_iter()
        .map(|user| {
            let is_subscribed = followed.contains(&user.user_id);
            UserView::new(user, is_subscribed)
        })
        .collect())
}

pub(crate) async fn user_view(pool: &PgPool, viewer: Option<i64>, user: User) -> Result<UserView> {
    let mut views = user_views(pool, viewer, vec![user]).await?;

    views
        .pop()
        .ok_or_else(|| color_eyre::eyre::eyre!("user view went missing"))
}

/// Builds full recipe views with a fixed number of queries no matter how
/// many recipes are on the page. Input order is preserved.
#[tracing::instrument(skip_all, fields(recipes = recipes.len()))]
pub(crate) async fn recipe_views(
    pool: &PgPool,
    viewer: Option<i64>,
    recipes: Vec<Recipe>,
) -> Result<Vec<RecipeView>> {
    let recipe_ids: Vec<i64> = recipes.iter().map(|recipe| recipe.recipe_id).collect();

    let mut author_ids: Vec<i64> = recipes.iter().map(|recipe| recipe.author_user_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors = User::get_by_ids(pool, &author_ids).await?;
    let authors: HashMap<i64, UserView> = user_views(pool, viewer, authors)
        .await?
        .into_iter()
        .map(|view| (view.id, view))
        .collect();

    let mut tags: HashMap<i64, Vec<TagView>> = HashMap::new();
    for row in RecipeTag::for_recipes(pool, &recipe_ids).await? {
        tags.entry(row.recipe_id).or_default().push(row.tag.into());
    }

    let mut ingredients: HashMap<i64, Vec<RecipeIngredientView>> = HashMap::new();
    for row in RecipeIngredient::for_recipes(pool, &recipe_ids).await? {
        ingredients.entry(row.recipe_id).or_default().push(row.into());
    }

    let (favorited, queued) = match viewer {
        Some(viewer) => (
            Favorite::favorited_among(pool, viewer, &recipe_ids).await?,
            ShoppingCartEntry::queued_among(pool, viewer, &recipe_ids).await?,
        ),
        None => Default::default(),
    };

    recipes
        .into_iter()
        .map(|recipe| {
            let author = authors.get(&recipe.author_user_id).cloned().ok_or_else(|| {
                color_eyre::eyre::eyre!("author {} of recipe {} not found", recipe.author_user_id, recipe.recipe_id)
            })?;

            Ok(RecipeView {
                id: recipe.recipe_id,
                tags: tags.remove(&recipe.recipe_id).unwrap_or_default(),
                author,
                ingredients: ingredients.remove(&recipe.recipe_id).unwrap_or_default(),
                is_favorited: favorited.contains(&recipe.recipe_id),
                is_in_shopping_cart: queued.contains(&recipe.recipe_id),
                name: recipe.name,
                image: recipe.image,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
            })
        })
        .collect()
}

pub(crate) async fn recipe_view(pool: &PgPool, viewer: Option<i64>, recipe: Recipe) -> Result<RecipeView> {
    let mut views = recipe_views(pool, viewer, vec![recipe]).await?;

    views
        .pop()
        .ok_or_else(|| color_eyre::eyre::eyre!("recipe view went missing"))
}

/// Every author on the page with at most `recipes_limit` of their newest
/// recipes. The viewer follows all of them by construction.
pub(crate) async fn subscription_views(
    pool: &PgPool,
    authors: Vec<User>,
    recipes_limit: Option<i64>,
) -> Result<Vec<SubscriptionView>> {
    let author_ids: Vec<i64> = authors.iter().map(|author| author.user_id).collect();

    let counts = Recipe::count_by_authors(pool, &author_ids).await?;

    let mut recipes: HashMap<i64, Vec<ShortRecipeView>> = HashMap::new();
    for recipe in Recipe::latest_by_authors(pool, &author_ids, recipes_limit).await? {
        recipes
            .entry(recipe.author_user_id)
            .or_default()
            .push(recipe.into());
    }

    Ok(authors
        .into_iter()
        .map(|author| {
            let author_id = author.user_id;

            SubscriptionView {
                author: UserView::new(author, true),
                recipes: recipes.remove(&author_id).unwrap_or_default(),
                recipes_count: counts.get(&author_id).copied().unwrap_or(0),
            }
        })
        .collect())
}
