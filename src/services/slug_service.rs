use std::future::Future;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::store::{MarketStore, StoreError, StoreResult};
use crate::utils::slug::{compute_base_slug, numbered_slug, SlugKind, SLUG_PLACEHOLDER};
use crate::utils::token::random_suffix;

/// How many times a write is retried after losing a slug to a concurrent writer.
pub const MAX_SLUG_ATTEMPTS: usize = 5;
const PLACEHOLDER_SUFFIX_LEN: usize = 8;

#[derive(Clone)]
pub struct SlugService {
    store: Arc<dyn MarketStore>,
}

impl SlugService {
    pub fn new(store: Arc<dyn MarketStore>) -> Self {
        Self { store }
    }

    /// First free slug for `title` within `kind`: the base slug itself, then
    /// `base-1`, `base-2` and so on. `exclude` is the row being renamed.
    pub async fn assign(&self, kind: SlugKind, title: &str, exclude: Option<Uuid>) -> Result<String> {
        let mut base = compute_base_slug(title);
        if base.is_empty() {
            base = format!("{}-{}", SLUG_PLACEHOLDER, random_suffix(PLACEHOLDER_SUFFIX_LEN));
        }

        let mut counter = 0;
        loop {
            let candidate = numbered_slug(&base, counter);
            if !self.store.slug_taken(kind, &candidate, exclude).await? {
                return Ok(candidate);
            }
            counter += 1;
        }
    }

    /// Runs `write` with a freshly assigned slug, assigning again whenever
    /// the unique index reports that a concurrent write took it first.
    pub async fn write_with_slug<T, F, Fut>(
        &self,
        kind: SlugKind,
        title: &str,
        exclude: Option<Uuid>,
        mut write: F,
    ) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let slug = self.assign(kind, title, exclude).await?;
            match write(slug.clone()).await {
                Ok(value) => return Ok(value),
                Err(StoreError::SlugConflict(conflict)) if conflict == kind => {
                    tracing::debug!(%kind, %slug, attempt, "slug taken concurrently, reassigning");
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(%kind, title, "gave up assigning a slug");
        Err(Error::Storage(StoreError::SlugConflict(kind)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::post::{Category, JobStatus, NewJobPost};
    use crate::models::profile::NewClientProfile;
    use crate::store::{MemoryStore, PostStore, ProfileStore};
    use rust_decimal::Decimal;

    async fn seeded() -> (Arc<MemoryStore>, Uuid) {
        let store = Arc::new(MemoryStore::new());
        let client = store
            .insert_client_profile(NewClientProfile {
                user_id: Uuid::new_v4(),
                company_name: None,
            })
            .await
            .unwrap();
        (store, client.id)
    }

    fn job(client_id: Uuid, title: &str, slug: String) -> NewJobPost {
        NewJobPost {
            client_id,
            title: title.to_string(),
            slug,
            description: "Need art".to_string(),
            category: Category::Illustration,
            budget: Decimal::new(100, 0),
            deadline: None,
            status: JobStatus::Open,
        }
    }

    #[tokio::test]
    async fn identical_titles_get_numbered_slugs() {
        let (store, client_id) = seeded().await;
        let slugs = SlugService::new(store.clone());

        let mut assigned = Vec::new();
        for _ in 0..4 {
            let post = slugs
                .write_with_slug(SlugKind::JobPost, "Dragon Mural!", None, |slug| {
                    let store = store.clone();
                    let new = job(client_id, "Dragon Mural!", slug);
                    async move { store.insert_job_post(new).await }
                })
                .await
                .unwrap();
            assigned.push(post.slug);
        }

        assert_eq!(
            assigned,
            vec!["dragon-mural", "dragon-mural-1", "dragon-mural-2", "dragon-mural-3"]
        );
    }

    #[tokio::test]
    async fn renaming_keeps_own_slug_available() {
        let (store, client_id) = seeded().await;
        let slugs = SlugService::new(store.clone());
        let post = store
            .insert_job_post(job(client_id, "Logo", "logo".to_string()))
            .await
            .unwrap();

        let slug = slugs
            .assign(SlugKind::JobPost, "logo", Some(post.id))
            .await
            .unwrap();
        assert_eq!(slug, "logo");
        let slug = slugs.assign(SlugKind::JobPost, "logo", None).await.unwrap();
        assert_eq!(slug, "logo-1");
    }

    #[tokio::test]
    async fn symbol_only_titles_fall_back_to_placeholder() {
        let (store, _) = seeded().await;
        let slugs = SlugService::new(store);

        let first = slugs.assign(SlugKind::Project, "!!!", None).await.unwrap();
        let second = slugs.assign(SlugKind::Project, "???", None).await.unwrap();
        assert!(first.starts_with("untitled-"));
        assert_eq!(first.len(), "untitled-".len() + PLACEHOLDER_SUFFIX_LEN);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn namespaces_are_independent() {
        let (store, client_id) = seeded().await;
        let slugs = SlugService::new(store.clone());
        store
            .insert_job_post(job(client_id, "Portrait", "portrait".to_string()))
            .await
            .unwrap();

        let slug = slugs
            .assign(SlugKind::AvailabilityPost, "Portrait", None)
            .await
            .unwrap();
        assert_eq!(slug, "portrait");
    }
}
