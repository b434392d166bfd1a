mod collection;
mod document;

pub use collection::DefaultCollection;
pub use document::{item_id, Document, Item, CREATED_AT_FIELD, ID_FIELD};
