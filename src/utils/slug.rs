use serde::Serialize;
use std::fmt;

/// Prefix used when a title has no sluggable characters at all.
pub const SLUG_PLACEHOLDER: &str = "untitled";

/// Independent slug namespaces. Uniqueness is only enforced within one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlugKind {
    JobPost,
    AvailabilityPost,
    Project,
    ArtistProfile,
}

impl SlugKind {
    pub const ALL: [SlugKind; 4] = [
        SlugKind::JobPost,
        SlugKind::AvailabilityPost,
        SlugKind::Project,
        SlugKind::ArtistProfile,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            SlugKind::JobPost => "job_posts",
            SlugKind::AvailabilityPost => "availability_posts",
            SlugKind::Project => "projects",
            SlugKind::ArtistProfile => "artist_profiles",
        }
    }

    /// Name of the unique constraint guarding this namespace.
    pub fn constraint(&self) -> &'static str {
        match self {
            SlugKind::JobPost => "job_posts_slug_unique",
            SlugKind::AvailabilityPost => "availability_posts_slug_unique",
            SlugKind::Project => "projects_slug_unique",
            SlugKind::ArtistProfile => "artist_profiles_slug_unique",
        }
    }

    pub fn from_constraint(name: &str) -> Option<SlugKind> {
        SlugKind::ALL.into_iter().find(|kind| kind.constraint() == name)
    }
}

impl fmt::Display for SlugKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Normalizes a title into its base slug.
///
/// Lowercases, drops everything outside `[a-z0-9\s_-]`, collapses runs of
/// whitespace, underscores and hyphens into one hyphen and trims hyphens from
/// both ends. May return an empty string.
pub fn compute_base_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_separator = false;

    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(ch);
        } else if ch.is_whitespace() || ch == '_' || ch == '-' {
            pending_separator = true;
        }
    }

    slug
}

/// The `counter`-th candidate for `base`: the base itself, then `base-1`, `base-2`, ...
pub fn numbered_slug(base: &str, counter: u32) -> String {
    if counter == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_titles() {
        assert_eq!(compute_base_slug("Character Sheet Commission"), "character-sheet-commission");
        assert_eq!(compute_base_slug("  Logo -- design__v2  "), "logo-design-v2");
        assert_eq!(compute_base_slug("Fan Art!!! (NSFW?)"), "fan-art-nsfw");
        assert_eq!(compute_base_slug("---edge---"), "edge");
    }

    #[test]
    fn stripped_characters_do_not_introduce_separators() {
        assert_eq!(compute_base_slug("Rock'n'Roll"), "rocknroll");
        assert_eq!(compute_base_slug("Café Mural"), "caf-mural");
    }

    #[test]
    fn titles_without_valid_characters_yield_empty_base() {
        assert_eq!(compute_base_slug(""), "");
        assert_eq!(compute_base_slug("!!! ???"), "");
        assert_eq!(compute_base_slug("日本語"), "");
    }

    #[test]
    fn numbered_candidates_start_at_the_base() {
        assert_eq!(numbered_slug("logo", 0), "logo");
        assert_eq!(numbered_slug("logo", 3), "logo-3");
    }

    #[test]
    fn constraints_map_back_to_kinds() {
        for kind in SlugKind::ALL {
            assert_eq!(SlugKind::from_constraint(kind.constraint()), Some(kind));
        }
        assert_eq!(SlugKind::from_constraint("applications_artist_job_unique"), None);
    }
}
