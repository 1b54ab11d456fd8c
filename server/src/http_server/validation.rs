use std::{
    collections::{BTreeMap, HashSet},
    sync::LazyLock,
};

use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

pub(crate) const USERNAME_MAX: usize = 150;
pub(crate) const PERSON_NAME_MAX: usize = 150;
pub(crate) const EMAIL_MAX: usize = 254;
pub(crate) const CATALOG_NAME_MAX: usize = 200;
pub(crate) const MIN_AMOUNT: f64 = 1.0;
pub(crate) const MAX_AMOUNT: f64 = 1_000_000.0;
pub(crate) const MIN_COOKING_TIME: i32 = 1;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid"));
static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("slug pattern is valid"));
static COLOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("color pattern is valid"));

#[derive(Debug, Error, Clone, PartialEq)]
pub(crate) enum FieldError {
    #[error("Обязательное поле.")]
    Required,
    #[error("Это поле не может быть пустым.")]
    Blank,
    #[error("Убедитесь, что это значение содержит не более {max} символов.")]
    TooLong { max: usize },
    #[error("Введите правильный адрес электронной почты.")]
    InvalidEmail,
    #[error("В логине допустимы только буквы и цифры")]
    InvalidUsername,
    #[error("Невалидный логин.")]
    ReservedUsername,
    #[error("Пользователь с таким username уже существует.")]
    UsernameTaken,
    #[error("Пользователь с таким email уже существует.")]
    EmailTaken,
    #[error("В слаге допустимы только буквы и цифры")]
    InvalidSlug,
    #[error("Цвет должен быть в формате #RRGGBB.")]
    InvalidColor,
    #[error("Время обязательно больше 1 минуты.")]
    CookingTimeTooShort,
    #[error("Количество ингредиента должно быть не меньше 1.")]
    AmountTooSmall,
    #[error("Количество ингредиента должно быть не больше 1000000.")]
    AmountTooLarge,
    #[error("Для рецепта необходим хотя бы один ингредиент")]
    NoIngredients,
    #[error("Для рецепта необходим хотя бы один тег")]
    NoTags,
    #[error("Ингредиенты не должны повторяться.")]
    DuplicateIngredient,
    #[error("Недопустимый первичный ключ \"{0}\" - объект не существует.")]
    UnknownId(i64),
    #[error("Загрузите правильное изображение.")]
    InvalidImage,
    #[error("Неверный текущий пароль.")]
    WrongPassword,
    #[error("Невозможно войти с предоставленными учетными данными.")]
    InvalidCredentials,
}

/// Field errors collected across a whole request body.
///
/// Serializes as `{"<field>": ["<message>", ...]}`.
#[derive(Debug, Default, Clone, PartialEq, Error, Serialize)]
#[error("Request failed validation")]
#[serde(transparent)]
pub(crate) struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub(crate) fn single(field: &'static str, error: &FieldError) -> Self {
        let mut errors = Self::default();
        errors.add(field, error);
        errors
    }

    pub(crate) fn add(&mut self, field: &'static str, error: &FieldError) {
        self.0.entry(field).or_default().push(error.to_string());
    }

    /// Records the error, if any, under `field`.
    pub(crate) fn check(&mut self, field: &'static str, result: Result<(), FieldError>) {
        if let Err(error) = result {
            self.add(field, &error);
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn fields(&self) -> Vec<&'static str> {
        self.0.keys().copied().collect()
    }

    pub(crate) fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn not_blank(value: &str) -> Result<(), FieldError> {
    if value.trim().is_empty() {
        return Err(FieldError::Blank);
    }

    Ok(())
}

fn max_chars(value: &str, max: usize) -> Result<(), FieldError> {
    if value.chars().count() > max {
        return Err(FieldError::TooLong { max });
    }

    Ok(())
}

/// Non-blank text of at most `max` characters.
pub(crate) fn validate_text(value: &str, max: usize) -> Result<(), FieldError> {
    not_blank(value)?;
    max_chars(value, max)
}

/// Word characters plus `.@+-`, and never `me` in any case.
pub(crate) fn validate_username(username: &str) -> Result<(), FieldError> {
    validate_text(username, USERNAME_MAX)?;

    if username.to_lowercase() == "me" {
        return Err(FieldError::ReservedUsername);
    }

    if !USERNAME_PATTERN.is_match(username) {
        return Err(FieldError::InvalidUsername);
    }

    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<(), FieldError> {
    validate_text(email, EMAIL_MAX)?;

    let Some((local, domain)) = email.rsplit_once('@') else {
        return Err(FieldError::InvalidEmail);
    };

    if local.is_empty()
        || domain.is_empty()
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(FieldError::InvalidEmail);
    }

    Ok(())
}

pub(crate) fn validate_slug(slug: &str) -> Result<(), FieldError> {
    validate_text(slug, CATALOG_NAME_MAX)?;

    if !SLUG_PATTERN.is_match(slug) {
        return Err(FieldError::InvalidSlug);
    }

    Ok(())
}

/// `#RRGGBB`, either case.
pub(crate) fn validate_color(color: &str) -> Result<(), FieldError> {
    if !COLOR_PATTERN.is_match(color) {
        return Err(FieldError::InvalidColor);
    }

    Ok(())
}

pub(crate) fn validate_tag(name: &str, color: &str, slug: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();

    errors.check("name", validate_text(name, CATALOG_NAME_MAX));
    errors.check("color", validate_color(color));
    errors.check("slug", validate_slug(slug));

    errors.into_result()
}

/// `data:image/<ext>;base64,<payload>` with a payload that decodes to
/// something non-empty.
pub(crate) fn validate_image(image: &str) -> Result<(), FieldError> {
    let Some(rest) = image.strip_prefix("data:image/") else {
        return Err(FieldError::InvalidImage);
    };
    let Some((extension, payload)) = rest.split_once(";base64,") else {
        return Err(FieldError::InvalidImage);
    };

    if extension.is_empty()
        || !extension
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '.' || c == '-')
    {
        return Err(FieldError::InvalidImage);
    }

    match general_purpose::STANDARD.decode(payload) {
        Ok(bytes) if !bytes.is_empty() => Ok(()),
        _ => Err(FieldError::InvalidImage),
    }
}

pub(crate) fn validate_cooking_time(minutes: i32) -> Result<(), FieldError> {
    if minutes < MIN_COOKING_TIME {
        return Err(FieldError::CookingTimeTooShort);
    }

    Ok(())
}

/// Checks the `(ingredient_id, amount)` pairs of a recipe body against the
/// ids known to the catalog.
pub(crate) fn validate_recipe_ingredients(
    ingredients: &[(i64, f64)],
    known_ids: &HashSet<i64>,
) -> Result<(), FieldError> {
    if ingredients.is_empty() {
        return Err(FieldError::NoIngredients);
    }

    let mut seen = HashSet::new();
    for &(id, amount) in ingredients {
        if !known_ids.contains(&id) {
            return Err(FieldError::UnknownId(id));
        }
        if !seen.insert(id) {
            return Err(FieldError::DuplicateIngredient);
        }
        if !amount.is_finite() || amount < MIN_AMOUNT {
            return Err(FieldError::AmountTooSmall);
        }
        if amount > MAX_AMOUNT {
            return Err(FieldError::AmountTooLarge);
        }
    }

    Ok(())
}

/// Repeated tag ids are allowed and collapse to one.
pub(crate) fn validate_recipe_tags(tag_ids: &[i64], known_ids: &HashSet<i64>) -> Result<(), FieldError> {
    if tag_ids.is_empty() {
        return Err(FieldError::NoTags);
    }

    if let Some(unknown) = tag_ids.iter().find(|id| !known_ids.contains(id)) {
        return Err(FieldError::UnknownId(*unknown));
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn usernames() {
        assert_eq!(validate_username("alice.b+c@d-e_f"), Ok(()));
        assert_eq!(validate_username("Алиса"), Ok(()));
        assert_eq!(validate_username("ёжик_2024"), Ok(()));
        assert_eq!(validate_username("Ünïcødé.cook"), Ok(()));
        assert_eq!(validate_username("emoji🍕"), Err(FieldError::InvalidUsername));
        assert_eq!(validate_username("me"), Err(FieldError::ReservedUsername));
        assert_eq!(validate_username("ME"), Err(FieldError::ReservedUsername));
        assert_eq!(validate_username("meme"), Ok(()));
        assert_eq!(validate_username("has space"), Err(FieldError::InvalidUsername));
        assert_eq!(validate_username("semi;colon"), Err(FieldError::InvalidUsername));
        assert_eq!(validate_username(""), Err(FieldError::Blank));
        assert_eq!(
            validate_username(&"a".repeat(151)),
            Err(FieldError::TooLong { max: 150 })
        );
        assert_eq!(validate_username(&"a".repeat(150)), Ok(()));
    }

    #[test]
    fn emails() {
        assert_eq!(validate_email("alice@example.com"), Ok(()));
        assert_eq!(validate_email("alice"), Err(FieldError::InvalidEmail));
        assert_eq!(validate_email("@example.com"), Err(FieldError::InvalidEmail));
        assert_eq!(validate_email("alice@localhost"), Err(FieldError::InvalidEmail));
        assert_eq!(validate_email("a@b"), Err(FieldError::InvalidEmail));
        assert_eq!(validate_email("a@b."), Err(FieldError::InvalidEmail));
        assert_eq!(validate_email("a@.b"), Err(FieldError::InvalidEmail));
        assert_eq!(validate_email("a@b.c"), Ok(()));
        assert_eq!(validate_email("a lice@example.com"), Err(FieldError::InvalidEmail));
        assert_eq!(validate_email("  "), Err(FieldError::Blank));
    }

    #[test]
    fn slugs_and_colors() {
        assert_eq!(validate_slug("breakfast_2-go"), Ok(()));
        assert_eq!(validate_slug("завтрак"), Err(FieldError::InvalidSlug));
        assert_eq!(validate_slug("with space"), Err(FieldError::InvalidSlug));

        assert_eq!(validate_color("#E26C2D"), Ok(()));
        assert_eq!(validate_color("#e26c2d"), Ok(()));
        assert_eq!(validate_color("E26C2D"), Err(FieldError::InvalidColor));
        assert_eq!(validate_color("#E26C2"), Err(FieldError::InvalidColor));
        assert_eq!(validate_color("#GGGGGG"), Err(FieldError::InvalidColor));
        assert_eq!(validate_color("#E26C2D0"), Err(FieldError::InvalidColor));
    }

    #[test]
    fn tags_collect_every_field() {
        let errors = validate_tag("", "red", "ok").unwrap_err();

        assert_eq!(errors.fields(), vec!["color", "name"]);
    }

    #[test]
    fn images() {
        assert_eq!(validate_image("data:image/png;base64,iVBORw0KGgo="), Ok(()));
        assert_eq!(validate_image("data:image/svg+xml;base64,PHN2Zz4="), Ok(()));
        assert_eq!(validate_image("data:image/png;base64,"), Err(FieldError::InvalidImage));
        assert_eq!(validate_image("data:image/png;base64,!!!"), Err(FieldError::InvalidImage));
        assert_eq!(validate_image("data:text/plain;base64,aGk="), Err(FieldError::InvalidImage));
        assert_eq!(validate_image("https://example.com/cat.png"), Err(FieldError::InvalidImage));
        assert_eq!(validate_image("data:image/;base64,aGk="), Err(FieldError::InvalidImage));
    }

    #[test]
    fn recipe_ingredients() {
        let known: HashSet<i64> = [1, 2, 3].into_iter().collect();

        assert_eq!(validate_recipe_ingredients(&[(1, 1.0), (2, 250.0)], &known), Ok(()));
        assert_eq!(validate_recipe_ingredients(&[], &known), Err(FieldError::NoIngredients));
        assert_eq!(
            validate_recipe_ingredients(&[(1, 5.0), (1, 6.0)], &known),
            Err(FieldError::DuplicateIngredient)
        );
        assert_eq!(
            validate_recipe_ingredients(&[(9, 5.0)], &known),
            Err(FieldError::UnknownId(9))
        );
        assert_eq!(
            validate_recipe_ingredients(&[(1, 0.5)], &known),
            Err(FieldError::AmountTooSmall)
        );
        assert_eq!(
            validate_recipe_ingredients(&[(1, f64::NAN)], &known),
            Err(FieldError::AmountTooSmall)
        );
        assert_eq!(
            validate_recipe_ingredients(&[(1, MAX_AMOUNT)], &known),
            Ok(())
        );
        assert_eq!(
            validate_recipe_ingredients(&[(1, 1e308)], &known),
            Err(FieldError::AmountTooLarge)
        );
    }

    #[test]
    fn recipe_tags() {
        let known: HashSet<i64> = [1, 2].into_iter().collect();

        assert_eq!(validate_recipe_tags(&[1, 1, 2], &known), Ok(()));
        assert_eq!(validate_recipe_tags(&[], &known), Err(FieldError::NoTags));
        assert_eq!(validate_recipe_tags(&[1, 7], &known), Err(FieldError::UnknownId(7)));
    }

    #[test]
    fn cooking_time() {
        assert_eq!(validate_cooking_time(1), Ok(()));
        assert_eq!(validate_cooking_time(0), Err(FieldError::CookingTimeTooShort));
    }

    #[test]
    fn errors_serialize_as_field_lists() {
        let mut errors = ValidationErrors::single("name", &FieldError::Blank);
        errors.add("name", &FieldError::TooLong { max: 200 });

        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({
                "name": [
                    "Это поле не может быть пустым.",
                    "Убедитесь, что это значение содержит не более 200 символов."
                ]
            })
        );
    }
}
