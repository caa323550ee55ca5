use std::fmt;

const KNOWN_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];
const DEFAULT_EXTENSION: &str = "jpg";

/// Storage bucket an asset lives in. Also the directory under the asset root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    Posters,
    Backdrops,
    Actors,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 3] = [
        AssetCategory::Posters,
        AssetCategory::Backdrops,
        AssetCategory::Actors,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetCategory::Posters => "posters",
            AssetCategory::Backdrops => "backdrops",
            AssetCategory::Actors => "actors",
        }
    }

    /// Prefix of every file name in this category.
    pub fn file_prefix(self) -> &'static str {
        match self {
            AssetCategory::Posters => "poster",
            AssetCategory::Backdrops => "backdrop",
            AssetCategory::Actors => "actor",
        }
    }

    pub fn from_dir(dir: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == dir)
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keeps ASCII alphanumerics, `-` and `_`; everything else becomes `_`.
pub fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// Extension of the remote reference's last path segment, ignoring any
/// query string. Unknown or missing extensions become `jpg`.
pub fn infer_extension(remote: &str) -> &'static str {
    let path = remote.split(['?', '#']).next().unwrap_or(remote);
    let last = path.rsplit('/').next().unwrap_or(path);
    let Some((_, ext)) = last.rsplit_once('.') else {
        return DEFAULT_EXTENSION;
    };
    KNOWN_EXTENSIONS
        .into_iter()
        .find(|known| known.eq_ignore_ascii_case(ext))
        .unwrap_or(DEFAULT_EXTENSION)
}

/// `<prefix>-<sanitized key>.<ext>`, stable across imports of the same
/// record so a refresh overwrites rather than accumulates.
pub fn asset_filename(category: AssetCategory, key: &str, remote: &str) -> String {
    format!(
        "{}-{}.{}",
        category.file_prefix(),
        sanitize_key(key),
        infer_extension(remote)
    )
}
