use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::profile::Role;
use crate::models::ParseEnumError;

string_enum! {
    pub enum Category {
        Illustration => "illustration",
        CharacterDesign => "character_design",
        ConceptArt => "concept_art",
        Animation => "animation",
        GraphicDesign => "graphic_design",
        Modeling3d => "3d_modeling",
        PixelArt => "pixel_art",
        Other => "other",
    }
}

string_enum! {
    pub enum JobStatus {
        Open => "open",
        InProgress => "in_progress",
        Completed => "completed",
        Cancelled => "cancelled",
        Closed => "closed",
    }
}

string_enum! {
    pub enum AvailabilityStatus {
        Active => "active",
        Paused => "paused",
        Closed => "closed",
        Draft => "draft",
    }
}

string_enum! {
    pub enum PostKind {
        /// Work wanted, authored by a client.
        Job => "job",
        /// Work offered, authored by an artist.
        Availability => "availability",
    }
}

impl PostKind {
    pub fn owner_role(&self) -> Role {
        match self {
            PostKind::Job => Role::Client,
            PostKind::Availability => Role::Artist,
        }
    }
}

/// Reference to exactly one post of either variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PostRef {
    Job(Uuid),
    Availability(Uuid),
}

impl PostRef {
    pub fn new(kind: PostKind, id: Uuid) -> Self {
        match kind {
            PostKind::Job => PostRef::Job(id),
            PostKind::Availability => PostRef::Availability(id),
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            PostRef::Job(id) | PostRef::Availability(id) => *id,
        }
    }

    pub fn kind(&self) -> PostKind {
        match self {
            PostRef::Job(_) => PostKind::Job,
            PostRef::Availability(_) => PostKind::Availability,
        }
    }

    pub fn job_post_id(&self) -> Option<Uuid> {
        match self {
            PostRef::Job(id) => Some(*id),
            PostRef::Availability(_) => None,
        }
    }

    pub fn availability_post_id(&self) -> Option<Uuid> {
        match self {
            PostRef::Availability(id) => Some(*id),
            PostRef::Job(_) => None,
        }
    }
}

impl fmt::Display for PostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostRef::Job(id) => write!(f, "job post {}", id),
            PostRef::Availability(id) => write!(f, "availability post {}", id),
        }
    }
}

/// Status of a post, tagged with its variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PostStatus {
    Job(JobStatus),
    Availability(AvailabilityStatus),
}

impl PostStatus {
    pub fn parse(kind: PostKind, raw: &str) -> Result<Self, ParseEnumError> {
        match kind {
            PostKind::Job => raw.parse().map(PostStatus::Job),
            PostKind::Availability => raw.parse().map(PostStatus::Availability),
        }
    }

    pub fn kind(&self) -> PostKind {
        match self {
            PostStatus::Job(_) => PostKind::Job,
            PostStatus::Availability(_) => PostKind::Availability,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Job(status) => status.as_str(),
            PostStatus::Availability(status) => status.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPost {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub category: Category,
    pub budget: Decimal,
    pub deadline: Option<DateTime<Utc>>,
    pub status: JobStatus,
    pub view_count: i64,
    pub application_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityPost {
    pub id: Uuid,
    pub artist_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub category: Category,
    pub budget: Decimal,
    pub status: AvailabilityStatus,
    pub view_count: i64,
    pub application_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Post {
    Job(JobPost),
    Availability(AvailabilityPost),
}

impl Post {
    pub fn post_ref(&self) -> PostRef {
        match self {
            Post::Job(post) => PostRef::Job(post.id),
            Post::Availability(post) => PostRef::Availability(post.id),
        }
    }

    pub fn kind(&self) -> PostKind {
        self.post_ref().kind()
    }

    pub fn title(&self) -> &str {
        match self {
            Post::Job(post) => &post.title,
            Post::Availability(post) => &post.title,
        }
    }

    pub fn slug(&self) -> &str {
        match self {
            Post::Job(post) => &post.slug,
            Post::Availability(post) => &post.slug,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Post::Job(post) => &post.description,
            Post::Availability(post) => &post.description,
        }
    }

    pub fn budget(&self) -> Decimal {
        match self {
            Post::Job(post) => post.budget,
            Post::Availability(post) => post.budget,
        }
    }

    pub fn status(&self) -> PostStatus {
        match self {
            Post::Job(post) => PostStatus::Job(post.status),
            Post::Availability(post) => PostStatus::Availability(post.status),
        }
    }

    /// Profile id of the author: a client for jobs, an artist for availability.
    pub fn owner_id(&self) -> Uuid {
        match self {
            Post::Job(post) => post.client_id,
            Post::Availability(post) => post.artist_id,
        }
    }

    pub fn owner_role(&self) -> Role {
        self.kind().owner_role()
    }

    pub fn application_count(&self) -> i64 {
        match self {
            Post::Job(post) => post.application_count,
            Post::Availability(post) => post.application_count,
        }
    }

    pub fn view_count(&self) -> i64 {
        match self {
            Post::Job(post) => post.view_count,
            Post::Availability(post) => post.view_count,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewJobPost {
    pub client_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub category: Category,
    pub budget: Decimal,
    pub deadline: Option<DateTime<Utc>>,
    pub status: JobStatus,
}

#[derive(Debug, Clone)]
pub struct NewAvailabilityPost {
    pub artist_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub category: Category,
    pub budget: Decimal,
    pub status: AvailabilityStatus,
}

/// Attribute changes for either post variant. `deadline` only applies to jobs.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub budget: Option<Decimal>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub category: Option<Category>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostDeletion {
    Deleted,
    NotFound,
    /// Pending, accepted or converted applications still reference the post.
    Blocked,
}
