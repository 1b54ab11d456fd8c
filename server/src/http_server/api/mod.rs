pub(crate) mod catalog;
pub(crate) mod membership;
pub(crate) mod recipes;
pub(crate) mod representations;
pub(crate) mod subscriptions;
pub(crate) mod tokens;
pub(crate) mod users;
