pub mod favorites;
pub mod ingredients;
pub mod recipe;
pub mod shopping_cart;
pub mod tags;

pub use favorites::Favorite;
pub use ingredients::{Ingredient, RecipeIngredient};
pub use recipe::{NewRecipeIngredient, Recipe, RecipeChanges, RecipeFields, RecipeFilter};
pub use shopping_cart::{CartContents, ShoppingCartEntry};
pub use tags::{RecipeTag, Tag};

#[cfg(test)]
mod test {
    use sqlx::PgPool;

    use super::*;
    use crate::users::{NewUser, User};

    async fn user(pool: &PgPool, username: &str) -> User {
        User::create(
            pool,
            NewUser {
                email: format!("{username}@example.com"),
                username: username.to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                password_hash: "not-a-real-hash".to_string(),
            },
        )
        .await
        .unwrap()
        .unwrap()
    }

    async fn recipe(
        pool: &PgPool,
        author: &User,
        name: &str,
        ingredients: &[(&Ingredient, f64)],
        tag: &Tag,
    ) -> Recipe {
        Recipe::create(
            pool,
            author.user_id,
            RecipeFields {
                name: name.to_string(),
                image: "data:image/png;base64,AA==".to_string(),
                text: "Mix and cook".to_string(),
                cooking_time: 10,
                ingredients: ingredients
                    .iter()
                    .map(|(ingredient, amount)| NewRecipeIngredient {
                        ingredient_id: ingredient.ingredient_id,
                        amount: *amount,
                    })
                    .collect(),
                tag_ids: vec![tag.tag_id],
            },
        )
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn cart_contents_are_flat_and_ordered(pool: PgPool) {
        let alice = user(&pool, "alice").await;
        let breakfast = Tag::create(&pool, "Breakfast", "#E26C2D", "breakfast")
            .await
            .unwrap()
            .unwrap();
        let flour = Ingredient::create(&pool, "Flour", "g").await.unwrap().unwrap();
        let sugar = Ingredient::create(&pool, "Sugar", "g").await.unwrap().unwrap();

        let pancakes = recipe(
            &pool,
            &alice,
            "Pancakes",
            &[(&flour, 200.0), (&sugar, 100.0)],
            &breakfast,
        )
        .await;
        let waffles = recipe(&pool, &alice, "Waffles", &[(&flour, 50.0)], &breakfast).await;

        ShoppingCartEntry::add(&pool, alice.user_id, pancakes.recipe_id)
            .await
            .unwrap()
            .unwrap();
        ShoppingCartEntry::add(&pool, alice.user_id, waffles.recipe_id)
            .await
            .unwrap()
            .unwrap();

        let contents = ShoppingCartEntry::contents(&pool, alice.user_id)
            .await
            .unwrap();

        let names: Vec<&str> = contents.recipes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Pancakes", "Waffles"]);

        let usages: Vec<(&str, f64)> = contents
            .usages
            .iter()
            .map(|u| (u.ingredient_name.as_str(), u.amount))
            .collect();
        assert_eq!(
            usages,
            vec![("Flour", 200.0), ("Sugar", 100.0), ("Flour", 50.0)]
        );
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn adding_twice_is_reported(pool: PgPool) {
        let alice = user(&pool, "alice").await;
        let tag = Tag::create(&pool, "Lunch", "#49B64E", "lunch")
            .await
            .unwrap()
            .unwrap();
        let salt = Ingredient::create(&pool, "Salt", "g").await.unwrap().unwrap();
        let soup = recipe(&pool, &alice, "Soup", &[(&salt, 5.0)], &tag).await;

        assert!(Favorite::add(&pool, alice.user_id, soup.recipe_id)
            .await
            .unwrap()
            .is_some());
        assert!(Favorite::add(&pool, alice.user_id, soup.recipe_id)
            .await
            .unwrap()
            .is_none());

        assert!(Favorite::remove(&pool, alice.user_id, soup.recipe_id)
            .await
            .unwrap());
        assert!(!Favorite::remove(&pool, alice.user_id, soup.recipe_id)
            .await
            .unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn recipe_filters(pool: PgPool) {
        let alice = user(&pool, "alice").await;
        let bob = user(&pool, "bob").await;
        let breakfast = Tag::create(&pool, "Breakfast", "#E26C2D", "breakfast")
            .await
            .unwrap()
            .unwrap();
        let dinner = Tag::create(&pool, "Dinner", "#8775D2", "dinner")
            .await
            .unwrap()
            .unwrap();
        let egg = Ingredient::create(&pool, "Egg", "pcs").await.unwrap().unwrap();

        let omelette = recipe(&pool, &alice, "Omelette", &[(&egg, 3.0)], &breakfast).await;
        let _stew = recipe(&pool, &bob, "Stew", &[(&egg, 1.0)], &dinner).await;

        let by_tag = RecipeFilter {
            tag_slugs: vec!["breakfast".to_string()],
            ..Default::default()
        };
        let found = Recipe::list(&pool, &by_tag, 10, 0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].recipe_id, omelette.recipe_id);
        assert_eq!(Recipe::count(&pool, &by_tag).await.unwrap(), 1);

        let by_author = RecipeFilter {
            author_user_id: Some(bob.user_id),
            ..Default::default()
        };
        assert_eq!(Recipe::count(&pool, &by_author).await.unwrap(), 1);

        Favorite::add(&pool, bob.user_id, omelette.recipe_id)
            .await
            .unwrap();
        let favorites = RecipeFilter {
            favorited_by: Some(bob.user_id),
            ..Default::default()
        };
        let found = Recipe::list(&pool, &favorites, 10, 0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Omelette");
    }
}
