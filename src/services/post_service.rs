use std::sync::Arc;

use crate::dto::post_dto::{
    CreateAvailabilityPostPayload, CreateJobPostPayload, PostListQuery, UpdatePostPayload,
};
use crate::error::{Error, Result};
use crate::models::post::{
    AvailabilityPost, AvailabilityStatus, Category, JobPost, JobStatus, NewAvailabilityPost,
    NewJobPost, Post, PostChanges, PostDeletion, PostFilter, PostKind, PostRef, PostStatus,
};
use crate::models::profile::{Identity, Role};
use crate::services::profile_service::ProfileService;
use crate::services::slug_service::SlugService;
use crate::store::{MarketStore, Page, PageRequest};
use crate::utils::slug::SlugKind;
use crate::utils::validation::ensure_non_negative;

fn slug_kind(kind: PostKind) -> SlugKind {
    match kind {
        PostKind::Job => SlugKind::JobPost,
        PostKind::Availability => SlugKind::AvailabilityPost,
    }
}

#[derive(Clone)]
pub struct PostService {
    store: Arc<dyn MarketStore>,
    profiles: ProfileService,
    slugs: SlugService,
}

impl PostService {
    pub fn new(store: Arc<dyn MarketStore>, profiles: ProfileService, slugs: SlugService) -> Self {
        Self {
            store,
            profiles,
            slugs,
        }
    }

    pub async fn create_job(&self, identity: &Identity, payload: CreateJobPostPayload) -> Result<JobPost> {
        ensure_non_negative("budget", Some(payload.budget))?;
        let client = self.profiles.resolve_actor(identity, Role::Client, None).await?;
        let client_id = client.profile_id();

        let post = self
            .slugs
            .write_with_slug(SlugKind::JobPost, &payload.title, None, |slug| {
                let store = self.store.clone();
                let new = NewJobPost {
                    client_id,
                    title: payload.title.clone(),
                    slug,
                    description: payload.description.clone(),
                    category: payload.category,
                    budget: payload.budget,
                    deadline: payload.deadline,
                    status: JobStatus::Open,
                };
                async move { store.insert_job_post(new).await }
            })
            .await?;

        tracing::info!(job_post_id = %post.id, client_id = %client_id, slug = %post.slug, "job post created");
        Ok(post)
    }

    pub async fn create_availability(
        &self,
        identity: &Identity,
        payload: CreateAvailabilityPostPayload,
    ) -> Result<AvailabilityPost> {
        ensure_non_negative("budget", Some(payload.budget))?;
        let artist = self.profiles.resolve_actor(identity, Role::Artist, None).await?;
        let artist_id = artist.profile_id();

        let post = self
            .slugs
            .write_with_slug(SlugKind::AvailabilityPost, &payload.title, None, |slug| {
                let store = self.store.clone();
                let new = NewAvailabilityPost {
                    artist_id,
                    title: payload.title.clone(),
                    slug,
                    description: payload.description.clone(),
                    category: payload.category,
                    budget: payload.budget,
                    status: AvailabilityStatus::Active,
                };
                async move { store.insert_availability_post(new).await }
            })
            .await?;

        tracing::info!(availability_post_id = %post.id, artist_id = %artist_id, slug = %post.slug, "availability post created");
        Ok(post)
    }

    pub async fn get(&self, post: PostRef) -> Result<Post> {
        self.store
            .get_post(post)
            .await?
            .ok_or(Error::PostNotFound(post))
    }

    pub async fn get_by_slug(&self, kind: PostKind, slug: &str) -> Result<Post> {
        self.store
            .find_post_by_slug(kind, slug)
            .await?
            .ok_or_else(|| Error::NotFound(format!("{} post with slug {:?}", kind, slug)))
    }

    pub async fn list(&self, kind: PostKind, query: PostListQuery) -> Result<Page<Post>> {
        let status = query
            .status
            .as_deref()
            .map(|raw| PostStatus::parse(kind, raw))
            .transpose()
            .map_err(|e| Error::InvalidStatus(e.to_string()))?;
        let category = query
            .category
            .as_deref()
            .map(str::parse::<Category>)
            .transpose()
            .map_err(|e| Error::BadRequest(e.to_string()))?;

        let filter = PostFilter {
            status,
            category,
            owner_id: query.owner_id,
        };
        let page = PageRequest::new(query.page, query.per_page);
        Ok(self.store.list_posts(kind, &filter, page).await?)
    }

    pub async fn update(&self, identity: &Identity, post: PostRef, payload: UpdatePostPayload) -> Result<Post> {
        ensure_non_negative("budget", payload.budget)?;
        let current = self.get(post).await?;
        self.ensure_owner(identity, &current).await?;

        let changes = PostChanges {
            title: payload.title.clone(),
            slug: None,
            description: payload.description,
            category: payload.category,
            budget: payload.budget,
            deadline: payload.deadline,
        };

        let updated = match payload.title.as_deref() {
            Some(title) if title != current.title() => {
                self.slugs
                    .write_with_slug(slug_kind(post.kind()), title, Some(post.id()), |slug| {
                        let store = self.store.clone();
                        let changes = PostChanges {
                            slug: Some(slug),
                            ..changes.clone()
                        };
                        async move { store.update_post(post, changes).await }
                    })
                    .await?
            }
            _ => self.store.update_post(post, changes).await?,
        };

        updated.ok_or(Error::PostNotFound(post))
    }

    pub async fn set_status(&self, identity: &Identity, post: PostRef, raw_status: &str) -> Result<Post> {
        let status = PostStatus::parse(post.kind(), raw_status)
            .map_err(|e| Error::InvalidStatus(e.to_string()))?;
        let current = self.get(post).await?;
        self.ensure_owner(identity, &current).await?;

        let updated = self
            .store
            .set_post_status(post, status)
            .await?
            .ok_or(Error::PostNotFound(post))?;
        tracing::info!(post = %post, status = status.as_str(), "post status changed");
        Ok(updated)
    }

    pub async fn record_view(&self, post: PostRef) -> Result<()> {
        if self.store.increment_view_count(post).await? {
            Ok(())
        } else {
            Err(Error::PostNotFound(post))
        }
    }

    pub async fn delete(&self, identity: &Identity, post: PostRef) -> Result<()> {
        let current = self.get(post).await?;
        self.ensure_owner(identity, &current).await?;

        match self.store.delete_post(post).await? {
            PostDeletion::Deleted => {
                tracing::info!(post = %post, "post deleted");
                Ok(())
            }
            PostDeletion::NotFound => Err(Error::PostNotFound(post)),
            PostDeletion::Blocked => Err(Error::ApplicationLocked(format!(
                "{} still has open applications",
                post
            ))),
        }
    }

    async fn ensure_owner(&self, identity: &Identity, post: &Post) -> Result<()> {
        if self.profiles.owns(identity, post.owner_role(), post.owner_id()).await? {
            Ok(())
        } else {
            Err(Error::Forbidden(format!("only the owner may modify {}", post.post_ref())))
        }
    }
}
