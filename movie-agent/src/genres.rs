use std::collections::HashMap;

/// TMDB genre ID for "Drama", the fallback when mood inference yields nothing
/// usable.
pub const DRAMA_GENRE_ID: u32 = 18;

/// Mapping from lower-cased genre name to TMDB genre ID. Built once at process
/// startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct GenreTable {
    by_name: HashMap<String, u32>,
}

impl GenreTable {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, u32)>) -> Self {
        Self {
            by_name: pairs
                .into_iter()
                .map(|(name, id)| (name.to_lowercase(), id))
                .collect(),
        }
    }

    /// Hardcoded table used when the startup genre fetch fails.
    pub fn builtin() -> Self {
        Self::from_pairs(
            [
                ("action", 28),
                ("adventure", 12),
                ("animation", 16),
                ("comedy", 35),
                ("crime", 80),
                ("documentary", 99),
                ("drama", 18),
                ("family", 10751),
                ("fantasy", 14),
                ("history", 36),
                ("horror", 27),
                ("music", 10402),
                ("mystery", 9648),
                ("romance", 10749),
                ("science fiction", 878),
                ("tv movie", 10770),
                ("thriller", 53),
                ("war", 10752),
                ("western", 37),
            ]
            .map(|(name, id)| (name.to_string(), id)),
        )
    }

    pub fn id_of(&self, name: &str) -> Option<u32> {
        self.by_name.get(&name.trim().to_lowercase()).copied()
    }

    pub fn drama_id(&self) -> u32 {
        self.id_of("drama").unwrap_or(DRAMA_GENRE_ID)
    }

    /// Sorted genre names, used to constrain the inference prompt.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
