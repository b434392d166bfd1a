//! HomePantry add-on backend.
//!
//! Serves a small kitchen inventory web app from inside Home Assistant.
//! All data lives in one JSON document with four collections
//! (`preparedMeals`, `pantry`, `shoppingList`, `recipes`), next to a
//! directory of uploaded images. Everything is mounted under the Home
//! Assistant Ingress base path, which is resolved once at startup.

pub mod backup;
pub mod collections;
pub mod config;
pub mod images;
pub mod ingress;
pub mod models;
pub mod server;
pub mod store;
