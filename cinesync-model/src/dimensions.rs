use std::fmt;

/// The four flat relationship categories a content record links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DimensionKind {
    Genre,
    Country,
    Tag,
    Actor,
}

impl DimensionKind {
    pub const ALL: [DimensionKind; 4] = [
        DimensionKind::Genre,
        DimensionKind::Country,
        DimensionKind::Tag,
        DimensionKind::Actor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DimensionKind::Genre => "genre",
            DimensionKind::Country => "country",
            DimensionKind::Tag => "tag",
            DimensionKind::Actor => "actor",
        }
    }

    /// Dimension table holding the natural-key rows.
    pub fn table(self) -> &'static str {
        match self {
            DimensionKind::Genre => "genres",
            DimensionKind::Country => "countries",
            DimensionKind::Tag => "tags",
            DimensionKind::Actor => "actors",
        }
    }

    /// Join table linking content rows to this dimension.
    pub fn link_table(self) -> &'static str {
        match self {
            DimensionKind::Genre => "content_genres",
            DimensionKind::Country => "content_countries",
            DimensionKind::Tag => "content_tags",
            DimensionKind::Actor => "content_actors",
        }
    }

    /// Foreign-key column of the join table.
    pub fn link_column(self) -> &'static str {
        match self {
            DimensionKind::Genre => "genre_id",
            DimensionKind::Country => "country_id",
            DimensionKind::Tag => "tag_id",
            DimensionKind::Actor => "actor_id",
        }
    }
}

impl fmt::Display for DimensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One upstream item to be resolved and linked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkItem {
    pub name: String,
    /// Tags only.
    pub slug: Option<String>,
    /// Actors only: local photo locator, if one was stored.
    pub photo: Option<String>,
    /// Actors only: character played.
    pub role: Option<String>,
}

impl LinkItem {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn tag(name: impl Into<String>) -> Self {
        let name = name.into();
        let slug = slugify(&name);
        Self {
            name,
            slug: Some(slug),
            ..Self::default()
        }
    }

    pub fn actor(
        name: impl Into<String>,
        photo: Option<String>,
        role: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            slug: None,
            photo,
            role,
        }
    }

    /// Name with surrounding whitespace removed, or `None` when blank.
    pub fn resolvable_name(&self) -> Option<&str> {
        let trimmed = self.name.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// The full upstream list for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CategoryLinks {
    pub kind: DimensionKind,
    pub items: Vec<LinkItem>,
}

impl CategoryLinks {
    pub fn new(kind: DimensionKind, items: Vec<LinkItem>) -> Self {
        Self { kind, items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Lowercase, with whitespace runs collapsed to a single `-`.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}
