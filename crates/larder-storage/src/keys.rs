// SPDX-FileCopyrightText: 2026 Larder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The fixed key schema of the persistence store.

/// Every key the store reads or writes. Values are JSON documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Profile,
    Preferences,
    Credentials,
    LastProvider,
    RecipeHistory,
    ChatHistory,
    Pantry,
    ShoppingList,
    RecipeIdeas,
}

impl StoreKey {
    pub const ALL: [StoreKey; 9] = [
        StoreKey::Profile,
        StoreKey::Preferences,
        StoreKey::Credentials,
        StoreKey::LastProvider,
        StoreKey::RecipeHistory,
        StoreKey::ChatHistory,
        StoreKey::Pantry,
        StoreKey::ShoppingList,
        StoreKey::RecipeIdeas,
    ];

    /// Key as written to the medium.
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKey::Profile => "larder.profile",
            StoreKey::Preferences => "larder.preferences",
            StoreKey::Credentials => "larder.credentials",
            StoreKey::LastProvider => "larder.last-provider",
            StoreKey::RecipeHistory => "larder.recipe-history",
            StoreKey::ChatHistory => "larder.chat-history",
            StoreKey::Pantry => "larder.pantry",
            StoreKey::ShoppingList => "larder.shopping-list",
            StoreKey::RecipeIdeas => "larder.recipe-ideas",
        }
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
