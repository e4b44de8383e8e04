use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The fixed voting topics. Adding one means extending this enum and the
/// metadata table below; there is no dynamic registration.
#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug, Deserialize, Serialize)]
pub enum Category {
    #[serde(rename = "melhor-saque")]
    MelhorSaque,
    #[serde(rename = "mais-reclamao")]
    MaisReclamao,
    #[serde(rename = "mais-gente-boa")]
    MaisGenteBoa,
}

pub const ALL_CATEGORIES: [Category; 3] = [
    Category::MelhorSaque,
    Category::MaisReclamao,
    Category::MaisGenteBoa,
];

#[derive(Clone, Debug)]
pub struct CategoryInfo {
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

lazy_static! {
    pub static ref CATEGORY_INFO: HashMap<Category, CategoryInfo> = {
        let mut info = HashMap::new();
        info.insert(
            Category::MelhorSaque,
            CategoryInfo {
                title: "Melhor Saque",
                description: "Quem tem o saque mais poderoso?",
                icon: "🏐",
            },
        );
        info.insert(
            Category::MaisReclamao,
            CategoryInfo {
                title: "Mais Reclamão",
                description: "Quem reclama de tudo? 😅",
                icon: "😤",
            },
        );
        info.insert(
            Category::MaisGenteBoa,
            CategoryInfo {
                title: "Mais Gente Boa",
                description: "Quem é o mais parceiro?",
                icon: "😊",
            },
        );
        info
    };
}

impl Category {
    pub fn slug(&self) -> &'static str {
        match self {
            Category::MelhorSaque => "melhor-saque",
            Category::MaisReclamao => "mais-reclamao",
            Category::MaisGenteBoa => "mais-gente-boa",
        }
    }

    /// Display name; unknown entries fall back to the slug.
    pub fn title(&self) -> &'static str {
        CATEGORY_INFO
            .get(self)
            .map(|info| info.title)
            .unwrap_or_else(|| self.slug())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
