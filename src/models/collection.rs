use std::fmt;
use std::str::FromStr;

/// The collections every document carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultCollection {
    PreparedMeals,
    Pantry,
    ShoppingList,
    Recipes,
}

impl DefaultCollection {
    pub const ALL: [DefaultCollection; 4] = [
        DefaultCollection::PreparedMeals,
        DefaultCollection::Pantry,
        DefaultCollection::ShoppingList,
        DefaultCollection::Recipes,
    ];

    /// Returns the key used for this collection in the document.
    pub fn as_str(&self) -> &'static str {
        match self {
            DefaultCollection::PreparedMeals => "preparedMeals",
            DefaultCollection::Pantry => "pantry",
            DefaultCollection::ShoppingList => "shoppingList",
            DefaultCollection::Recipes => "recipes",
        }
    }
}

impl fmt::Display for DefaultCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DefaultCollection {
    type Err = String;

    // Keys are case-sensitive: `Pantry` and `pantry` are different collections.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DefaultCollection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Unknown collection '{}'. Default collections: preparedMeals, pantry, shoppingList, recipes",
                    s
                )
            })
    }
}
