//! Postgres [`MarketStore`](super::MarketStore) backend.
//!
//! Compound operations run in one transaction with the post row locked
//! `FOR UPDATE`, which serializes concurrent accepts and conversions on the
//! same post. Unique-index violations are classified into slug conflicts and
//! named constraint violations so callers can retry or report them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{
    AcceptanceOutcome, ApplicationStore, ConversionOutcome, ConversionPlan, NotificationStore, Page,
    PageRequest, PostStore, ProfileStore, ProjectSource, ProjectStore, SlugStore, StoreError,
    StoreResult,
};
use crate::models::application::{Application, ApplicationFilter, ApplicationStatus, ApplicationType, NewApplication};
use crate::models::notification::{NewNotification, Notification};
use crate::models::post::{
    AvailabilityPost, JobPost, NewAvailabilityPost, NewJobPost, Post, PostChanges, PostDeletion,
    PostFilter, PostKind, PostRef, PostStatus,
};
use crate::models::profile::{ArtistProfile, ClientProfile, NewArtistProfile, NewClientProfile, Role};
use crate::models::project::{NewProject, Project, ProjectChanges, ProjectFilter};
use crate::utils::slug::SlugKind;

const ARTIST_COLUMNS: &str = "id, user_id, display_name, slug, created_at";
const CLIENT_COLUMNS: &str = "id, user_id, company_name, created_at";
const JOB_POST_COLUMNS: &str = "id, client_id, title, slug, description, category, budget, deadline, status, view_count, application_count, created_at, updated_at";
const AVAILABILITY_POST_COLUMNS: &str = "id, artist_id, title, slug, description, category, budget, status, view_count, application_count, created_at, updated_at";
const APPLICATION_COLUMNS: &str = "id, application_type, job_post_id, availability_post_id, artist_id, client_id, message, proposed_budget, proposed_deadline, status, project_id, created_at, updated_at";
const PROJECT_COLUMNS: &str = "id, client_id, artist_id, job_post_id, application_id, title, slug, description, budget, deadline, status, payment_status, created_at, updated_at";
const NOTIFICATION_COLUMNS: &str = "id, user_id, from_user_id, notification_type, title, message, link, project_id, application_id, priority, is_read, read_at, created_at";

#[derive(FromRow)]
struct ArtistProfileRow {
    id: Uuid,
    user_id: Uuid,
    display_name: String,
    slug: String,
    created_at: DateTime<Utc>,
}

impl From<ArtistProfileRow> for ArtistProfile {
    fn from(row: ArtistProfileRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            display_name: row.display_name,
            slug: row.slug,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct ClientProfileRow {
    id: Uuid,
    user_id: Uuid,
    company_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ClientProfileRow> for ClientProfile {
    fn from(row: ClientProfileRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            company_name: row.company_name,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct JobPostRow {
    id: Uuid,
    client_id: Uuid,
    title: String,
    slug: String,
    description: String,
    category: String,
    budget: Decimal,
    deadline: Option<DateTime<Utc>>,
    status: String,
    view_count: i64,
    application_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<JobPostRow> for JobPost {
    type Error = StoreError;

    fn try_from(row: JobPostRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            client_id: row.client_id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            category: row.category.parse()?,
            budget: row.budget,
            deadline: row.deadline,
            status: row.status.parse()?,
            view_count: row.view_count,
            application_count: row.application_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct AvailabilityPostRow {
    id: Uuid,
    artist_id: Uuid,
    title: String,
    slug: String,
    description: String,
    category: String,
    budget: Decimal,
    status: String,
    view_count: i64,
    application_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AvailabilityPostRow> for AvailabilityPost {
    type Error = StoreError;

    fn try_from(row: AvailabilityPostRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            artist_id: row.artist_id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            category: row.category.parse()?,
            budget: row.budget,
            status: row.status.parse()?,
            view_count: row.view_count,
            application_count: row.application_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ApplicationRow {
    id: i64,
    application_type: String,
    job_post_id: Option<Uuid>,
    availability_post_id: Option<Uuid>,
    artist_id: Uuid,
    client_id: Uuid,
    message: String,
    proposed_budget: Option<Decimal>,
    proposed_deadline: Option<DateTime<Utc>>,
    status: String,
    project_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = StoreError;

    fn try_from(row: ApplicationRow) -> StoreResult<Self> {
        let application_type: ApplicationType = row.application_type.parse()?;
        let post = match (application_type, row.job_post_id, row.availability_post_id) {
            (ApplicationType::ArtistToJob, Some(id), None) => PostRef::Job(id),
            (ApplicationType::ClientToService, None, Some(id)) => PostRef::Availability(id),
            _ => {
                return Err(StoreError::Corrupt(format!(
                    "application {} does not reference exactly one post",
                    row.id
                )))
            }
        };
        Ok(Self {
            id: row.id,
            application_type,
            post,
            artist_id: row.artist_id,
            client_id: row.client_id,
            message: row.message,
            proposed_budget: row.proposed_budget,
            proposed_deadline: row.proposed_deadline,
            status: row.status.parse()?,
            project_id: row.project_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct ProjectRow {
    id: Uuid,
    client_id: Uuid,
    artist_id: Option<Uuid>,
    job_post_id: Option<Uuid>,
    application_id: Option<i64>,
    title: String,
    slug: String,
    description: String,
    budget: Decimal,
    deadline: Option<DateTime<Utc>>,
    status: String,
    payment_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            client_id: row.client_id,
            artist_id: row.artist_id,
            job_post_id: row.job_post_id,
            application_id: row.application_id,
            title: row.title,
            slug: row.slug,
            description: row.description,
            budget: row.budget,
            deadline: row.deadline,
            status: row.status.parse()?,
            payment_status: row.payment_status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct NotificationRow {
    id: Uuid,
    user_id: Uuid,
    from_user_id: Option<Uuid>,
    notification_type: String,
    title: String,
    message: String,
    link: Option<String>,
    project_id: Option<Uuid>,
    application_id: Option<i64>,
    priority: String,
    is_read: bool,
    read_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = StoreError;

    fn try_from(row: NotificationRow) -> StoreResult<Self> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            from_user_id: row.from_user_id,
            notification_type: row.notification_type.parse()?,
            title: row.title,
            message: row.message,
            link: row.link,
            project_id: row.project_id,
            application_id: row.application_id,
            priority: row.priority.parse()?,
            is_read: row.is_read,
            read_at: row.read_at,
            created_at: row.created_at,
        })
    }
}

fn collect_rows<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Turns unique violations into [`StoreError::SlugConflict`] or
/// [`StoreError::UniqueViolation`]; everything else stays a database error.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23505") {
            let constraint = db.constraint().unwrap_or_default().to_string();
            return match SlugKind::from_constraint(&constraint) {
                Some(kind) => StoreError::SlugConflict(kind),
                None => StoreError::UniqueViolation(constraint),
            };
        }
    }
    StoreError::Database(err)
}

fn post_table(kind: PostKind) -> &'static str {
    match kind {
        PostKind::Job => "job_posts",
        PostKind::Availability => "availability_posts",
    }
}

/// Column on `applications` pointing at a post of this kind.
fn post_column(kind: PostKind) -> &'static str {
    match kind {
        PostKind::Job => "job_post_id",
        PostKind::Availability => "availability_post_id",
    }
}

fn owner_column(kind: PostKind) -> &'static str {
    match kind {
        PostKind::Job => "client_id",
        PostKind::Availability => "artist_id",
    }
}

fn push_post_filter(qb: &mut QueryBuilder<'_, Postgres>, kind: PostKind, filter: &PostFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(owner_id) = filter.owner_id {
        qb.push(format!(" AND {} = ", owner_column(kind)))
            .push_bind(owner_id);
    }
}

fn push_application_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ApplicationFilter) {
    if let Some(post) = filter.post {
        qb.push(format!(" AND {} = ", post_column(post.kind())))
            .push_bind(post.id());
    }
    if let Some(artist_id) = filter.artist_id {
        qb.push(" AND artist_id = ").push_bind(artist_id);
    }
    if let Some(client_id) = filter.client_id {
        qb.push(" AND client_id = ").push_bind(client_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(application_type) = filter.application_type {
        qb.push(" AND application_type = ")
            .push_bind(application_type.as_str());
    }
}

fn push_project_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProjectFilter) {
    if let Some(client_id) = filter.client_id {
        qb.push(" AND client_id = ").push_bind(client_id);
    }
    if let Some(artist_id) = filter.artist_id {
        qb.push(" AND artist_id = ").push_bind(artist_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
}

async fn fetch_post(conn: &mut PgConnection, post: PostRef, lock: bool) -> StoreResult<Option<Post>> {
    let suffix = if lock { " FOR UPDATE" } else { "" };
    match post {
        PostRef::Job(id) => {
            let sql = format!("SELECT {} FROM job_posts WHERE id = $1{}", JOB_POST_COLUMNS, suffix);
            let row = sqlx::query_as::<_, JobPostRow>(&sql)
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
            row.map(|r| JobPost::try_from(r).map(Post::Job)).transpose()
        }
        PostRef::Availability(id) => {
            let sql = format!(
                "SELECT {} FROM availability_posts WHERE id = $1{}",
                AVAILABILITY_POST_COLUMNS, suffix
            );
            let row = sqlx::query_as::<_, AvailabilityPostRow>(&sql)
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
            row.map(|r| AvailabilityPost::try_from(r).map(Post::Availability))
                .transpose()
        }
    }
}

async fn fetch_application(conn: &mut PgConnection, id: i64, lock: bool) -> StoreResult<Option<Application>> {
    let sql = format!(
        "SELECT {} FROM applications WHERE id = $1{}",
        APPLICATION_COLUMNS,
        if lock { " FOR UPDATE" } else { "" }
    );
    let row = sqlx::query_as::<_, ApplicationRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    row.map(Application::try_from).transpose()
}

async fn write_post_status(conn: &mut PgConnection, post: PostRef, status: PostStatus) -> StoreResult<Option<Post>> {
    if status.kind() != post.kind() {
        return Err(StoreError::Corrupt(format!(
            "status {} does not apply to {}",
            status.as_str(),
            post
        )));
    }
    match post {
        PostRef::Job(id) => {
            let sql = format!(
                "UPDATE job_posts SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
                JOB_POST_COLUMNS
            );
            let row = sqlx::query_as::<_, JobPostRow>(&sql)
                .bind(id)
                .bind(status.as_str())
                .fetch_optional(&mut *conn)
                .await?;
            row.map(|r| JobPost::try_from(r).map(Post::Job)).transpose()
        }
        PostRef::Availability(id) => {
            let sql = format!(
                "UPDATE availability_posts SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
                AVAILABILITY_POST_COLUMNS
            );
            let row = sqlx::query_as::<_, AvailabilityPostRow>(&sql)
                .bind(id)
                .bind(status.as_str())
                .fetch_optional(&mut *conn)
                .await?;
            row.map(|r| AvailabilityPost::try_from(r).map(Post::Availability))
                .transpose()
        }
    }
}

async fn write_new_project(conn: &mut PgConnection, project: NewProject) -> StoreResult<Project> {
    let sql = format!(
        r#"
        INSERT INTO projects (
            id, client_id, artist_id, job_post_id, application_id, title, slug,
            description, budget, deadline, status, payment_status
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'unpaid')
        RETURNING {}
        "#,
        PROJECT_COLUMNS
    );
    let row = sqlx::query_as::<_, ProjectRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(project.client_id)
        .bind(project.artist_id)
        .bind(project.job_post_id)
        .bind(project.application_id)
        .bind(&project.title)
        .bind(&project.slug)
        .bind(&project.description)
        .bind(project.budget)
        .bind(project.deadline)
        .bind(project.status.as_str())
        .fetch_one(&mut *conn)
        .await
        .map_err(classify)?;
    Project::try_from(row)
}

async fn write_project_changes(
    conn: &mut PgConnection,
    id: Uuid,
    changes: ProjectChanges,
) -> StoreResult<Option<Project>> {
    let sql = format!(
        r#"
        UPDATE projects
        SET
            title = COALESCE($2, title),
            slug = COALESCE($3, slug),
            description = COALESCE($4, description),
            budget = COALESCE($5, budget),
            deadline = COALESCE($6, deadline),
            artist_id = COALESCE($7, artist_id),
            application_id = COALESCE($8, application_id),
            status = COALESCE($9, status),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {}
        "#,
        PROJECT_COLUMNS
    );
    let row = sqlx::query_as::<_, ProjectRow>(&sql)
        .bind(id)
        .bind(changes.title)
        .bind(changes.slug)
        .bind(changes.description)
        .bind(changes.budget)
        .bind(changes.deadline)
        .bind(changes.artist_id)
        .bind(changes.application_id)
        .bind(changes.status.map(|s| s.as_str()))
        .fetch_optional(&mut *conn)
        .await
        .map_err(classify)?;
    row.map(Project::try_from).transpose()
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_page<R, T, F>(
        &self,
        table: &str,
        columns: &str,
        order_by: &str,
        page: PageRequest,
        filter: F,
    ) -> StoreResult<Page<T>>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        T: TryFrom<R, Error = StoreError> + Send,
        F: Fn(&mut QueryBuilder<'_, Postgres>) + Send + Sync,
    {
        let mut items_query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM {} WHERE TRUE",
            columns, table
        ));
        filter(&mut items_query);
        items_query
            .push(format!(" ORDER BY {} LIMIT ", order_by))
            .push_bind(page.per_page)
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = items_query.build_query_as::<R>().fetch_all(&self.pool).await?;

        let mut total_query =
            QueryBuilder::<Postgres>::new(format!("SELECT COUNT(*) FROM {} WHERE TRUE", table));
        filter(&mut total_query);
        let total = total_query
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(collect_rows(rows)?, total, page))
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn upsert_user(&self, user_id: Uuid) -> StoreResult<()> {
        sqlx::query("INSERT INTO users (id) VALUES ($1) ON CONFLICT (id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_profile_id(&self, user_id: Uuid, role: Role) -> StoreResult<Option<Uuid>> {
        let table = match role {
            Role::Artist => "artist_profiles",
            Role::Client => "client_profiles",
            Role::Admin => return Ok(None),
        };
        let sql = format!("SELECT id FROM {} WHERE user_id = $1", table);
        let id = sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn profile_user_id(&self, role: Role, profile_id: Uuid) -> StoreResult<Option<Uuid>> {
        let table = match role {
            Role::Artist => "artist_profiles",
            Role::Client => "client_profiles",
            Role::Admin => return Ok(None),
        };
        let sql = format!("SELECT user_id FROM {} WHERE id = $1", table);
        let user_id = sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(profile_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user_id)
    }

    async fn insert_artist_profile(&self, profile: NewArtistProfile) -> StoreResult<ArtistProfile> {
        let sql = format!(
            "INSERT INTO artist_profiles (id, user_id, display_name, slug) VALUES ($1, $2, $3, $4) RETURNING {}",
            ARTIST_COLUMNS
        );
        let row = sqlx::query_as::<_, ArtistProfileRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(profile.user_id)
            .bind(&profile.display_name)
            .bind(&profile.slug)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        Ok(row.into())
    }

    async fn insert_client_profile(&self, profile: NewClientProfile) -> StoreResult<ClientProfile> {
        let sql = format!(
            "INSERT INTO client_profiles (id, user_id, company_name) VALUES ($1, $2, $3) RETURNING {}",
            CLIENT_COLUMNS
        );
        let row = sqlx::query_as::<_, ClientProfileRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(profile.user_id)
            .bind(&profile.company_name)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        Ok(row.into())
    }

    async fn get_artist_profile(&self, id: Uuid) -> StoreResult<Option<ArtistProfile>> {
        let sql = format!("SELECT {} FROM artist_profiles WHERE id = $1", ARTIST_COLUMNS);
        let row = sqlx::query_as::<_, ArtistProfileRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }
}

#[async_trait]
impl SlugStore for PgStore {
    async fn slug_taken(&self, kind: SlugKind, slug: &str, exclude: Option<Uuid>) -> StoreResult<bool> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE slug = $1 AND ($2::uuid IS NULL OR id <> $2))",
            kind.table()
        );
        let taken = sqlx::query_scalar::<_, bool>(&sql)
            .bind(slug)
            .bind(exclude)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }
}

#[async_trait]
impl PostStore for PgStore {
    async fn insert_job_post(&self, post: NewJobPost) -> StoreResult<JobPost> {
        let sql = format!(
            r#"
            INSERT INTO job_posts (id, client_id, title, slug, description, category, budget, deadline, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            JOB_POST_COLUMNS
        );
        let row = sqlx::query_as::<_, JobPostRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(post.client_id)
            .bind(&post.title)
            .bind(&post.slug)
            .bind(&post.description)
            .bind(post.category.as_str())
            .bind(post.budget)
            .bind(post.deadline)
            .bind(post.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        JobPost::try_from(row)
    }

    async fn insert_availability_post(&self, post: NewAvailabilityPost) -> StoreResult<AvailabilityPost> {
        let sql = format!(
            r#"
            INSERT INTO availability_posts (id, artist_id, title, slug, description, category, budget, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            AVAILABILITY_POST_COLUMNS
        );
        let row = sqlx::query_as::<_, AvailabilityPostRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(post.artist_id)
            .bind(&post.title)
            .bind(&post.slug)
            .bind(&post.description)
            .bind(post.category.as_str())
            .bind(post.budget)
            .bind(post.status.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        AvailabilityPost::try_from(row)
    }

    async fn get_post(&self, post: PostRef) -> StoreResult<Option<Post>> {
        let mut conn = self.pool.acquire().await?;
        fetch_post(&mut conn, post, false).await
    }

    async fn find_post_by_slug(&self, kind: PostKind, slug: &str) -> StoreResult<Option<Post>> {
        match kind {
            PostKind::Job => {
                let sql = format!("SELECT {} FROM job_posts WHERE slug = $1", JOB_POST_COLUMNS);
                let row = sqlx::query_as::<_, JobPostRow>(&sql)
                    .bind(slug)
                    .fetch_optional(&self.pool)
                    .await?;
                row.map(|r| JobPost::try_from(r).map(Post::Job)).transpose()
            }
            PostKind::Availability => {
                let sql = format!(
                    "SELECT {} FROM availability_posts WHERE slug = $1",
                    AVAILABILITY_POST_COLUMNS
                );
                let row = sqlx::query_as::<_, AvailabilityPostRow>(&sql)
                    .bind(slug)
                    .fetch_optional(&self.pool)
                    .await?;
                row.map(|r| AvailabilityPost::try_from(r).map(Post::Availability))
                    .transpose()
            }
        }
    }

    async fn list_posts(&self, kind: PostKind, filter: &PostFilter, page: PageRequest) -> StoreResult<Page<Post>> {
        match kind {
            PostKind::Job => {
                let page: Page<JobPost> = self
                    .fetch_page::<JobPostRow, _, _>(
                        post_table(kind),
                        JOB_POST_COLUMNS,
                        "created_at DESC",
                        page,
                        |qb| push_post_filter(qb, kind, filter),
                    )
                    .await?;
                Ok(page.map(Post::Job))
            }
            PostKind::Availability => {
                let page: Page<AvailabilityPost> = self
                    .fetch_page::<AvailabilityPostRow, _, _>(
                        post_table(kind),
                        AVAILABILITY_POST_COLUMNS,
                        "created_at DESC",
                        page,
                        |qb| push_post_filter(qb, kind, filter),
                    )
                    .await?;
                Ok(page.map(Post::Availability))
            }
        }
    }

    async fn update_post(&self, post: PostRef, changes: PostChanges) -> StoreResult<Option<Post>> {
        match post {
            PostRef::Job(id) => {
                let sql = format!(
                    r#"
                    UPDATE job_posts
                    SET
                        title = COALESCE($2, title),
                        slug = COALESCE($3, slug),
                        description = COALESCE($4, description),
                        category = COALESCE($5, category),
                        budget = COALESCE($6, budget),
                        deadline = COALESCE($7, deadline),
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING {}
                    "#,
                    JOB_POST_COLUMNS
                );
                let row = sqlx::query_as::<_, JobPostRow>(&sql)
                    .bind(id)
                    .bind(changes.title)
                    .bind(changes.slug)
                    .bind(changes.description)
                    .bind(changes.category.map(|c| c.as_str()))
                    .bind(changes.budget)
                    .bind(changes.deadline)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(classify)?;
                row.map(|r| JobPost::try_from(r).map(Post::Job)).transpose()
            }
            PostRef::Availability(id) => {
                let sql = format!(
                    r#"
                    UPDATE availability_posts
                    SET
                        title = COALESCE($2, title),
                        slug = COALESCE($3, slug),
                        description = COALESCE($4, description),
                        category = COALESCE($5, category),
                        budget = COALESCE($6, budget),
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING {}
                    "#,
                    AVAILABILITY_POST_COLUMNS
                );
                let row = sqlx::query_as::<_, AvailabilityPostRow>(&sql)
                    .bind(id)
                    .bind(changes.title)
                    .bind(changes.slug)
                    .bind(changes.description)
                    .bind(changes.category.map(|c| c.as_str()))
                    .bind(changes.budget)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(classify)?;
                row.map(|r| AvailabilityPost::try_from(r).map(Post::Availability))
                    .transpose()
            }
        }
    }

    async fn set_post_status(&self, post: PostRef, status: PostStatus) -> StoreResult<Option<Post>> {
        let mut conn = self.pool.acquire().await?;
        write_post_status(&mut conn, post, status).await
    }

    async fn increment_view_count(&self, post: PostRef) -> StoreResult<bool> {
        let sql = format!(
            "UPDATE {} SET view_count = view_count + 1 WHERE id = $1",
            post_table(post.kind())
        );
        let result = sqlx::query(&sql).bind(post.id()).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_post(&self, post: PostRef) -> StoreResult<PostDeletion> {
        let mut tx = self.pool.begin().await?;
        if fetch_post(&mut tx, post, true).await?.is_none() {
            return Ok(PostDeletion::NotFound);
        }

        let column = post_column(post.kind());
        let sql = format!(
            "SELECT COUNT(*) FROM applications WHERE {} = $1 AND status <> 'rejected'",
            column
        );
        let blocking: i64 = sqlx::query_scalar(&sql)
            .bind(post.id())
            .fetch_one(&mut *tx)
            .await?;
        if blocking > 0 {
            return Ok(PostDeletion::Blocked);
        }

        let sql = format!("DELETE FROM applications WHERE {} = $1", column);
        sqlx::query(&sql).bind(post.id()).execute(&mut *tx).await?;
        let sql = format!("DELETE FROM {} WHERE id = $1", post_table(post.kind()));
        sqlx::query(&sql).bind(post.id()).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(PostDeletion::Deleted)
    }
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn get_application(&self, id: i64) -> StoreResult<Option<Application>> {
        let mut conn = self.pool.acquire().await?;
        fetch_application(&mut conn, id, false).await
    }

    async fn list_applications(&self, filter: &ApplicationFilter, page: PageRequest) -> StoreResult<Page<Application>> {
        self.fetch_page::<ApplicationRow, _, _>(
            "applications",
            APPLICATION_COLUMNS,
            "created_at DESC, id DESC",
            page,
            |qb| push_application_filter(qb, filter),
        )
        .await
    }

    async fn find_artist_application(&self, job_post_id: Uuid, artist_id: Uuid) -> StoreResult<Option<Application>> {
        let sql = format!(
            r#"
            SELECT {} FROM applications
            WHERE application_type = 'artist_to_job' AND job_post_id = $1 AND artist_id = $2
            "#,
            APPLICATION_COLUMNS
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(job_post_id)
            .bind(artist_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Application::try_from).transpose()
    }

    async fn insert_application(&self, application: NewApplication) -> StoreResult<Application> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            r#"
            INSERT INTO applications (
                application_type, job_post_id, availability_post_id, artist_id, client_id,
                message, proposed_budget, proposed_deadline, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'pending')
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(application.application_type.as_str())
            .bind(application.post.job_post_id())
            .bind(application.post.availability_post_id())
            .bind(application.artist_id)
            .bind(application.client_id)
            .bind(&application.message)
            .bind(application.proposed_budget)
            .bind(application.proposed_deadline)
            .fetch_one(&mut *tx)
            .await
            .map_err(classify)?;

        let sql = format!(
            "UPDATE {} SET application_count = application_count + 1 WHERE id = $1",
            post_table(application.post.kind())
        );
        let bumped = sqlx::query(&sql)
            .bind(application.post.id())
            .execute(&mut *tx)
            .await?;
        if bumped.rows_affected() == 0 {
            return Err(StoreError::Corrupt(format!(
                "application references missing {}",
                application.post
            )));
        }

        tx.commit().await?;
        Application::try_from(row)
    }

    async fn transition_application(
        &self,
        id: i64,
        from: ApplicationStatus,
        to: ApplicationStatus,
    ) -> StoreResult<Option<Application>> {
        let sql = format!(
            "UPDATE applications SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2 RETURNING {}",
            APPLICATION_COLUMNS
        );
        let row = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(id)
            .bind(from.as_str())
            .bind(to.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Application::try_from).transpose()
    }

    async fn apply_acceptance(&self, id: i64) -> StoreResult<Option<AcceptanceOutcome>> {
        let mut tx = self.pool.begin().await?;

        let Some(current) = fetch_application(&mut tx, id, false).await? else {
            return Ok(None);
        };
        // Serializes competing accepts on the same post.
        fetch_post(&mut tx, current.post, true).await?;

        // A post has at most one winner, including offers made after the first accept.
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM applications WHERE {} = $1 AND status IN ('accepted', 'converted_to_project'))",
            post_column(current.post.kind())
        );
        let has_winner: bool = sqlx::query_scalar(&sql)
            .bind(current.post.id())
            .fetch_one(&mut *tx)
            .await?;
        if has_winner {
            return Ok(None);
        }

        let sql = format!(
            "UPDATE applications SET status = 'accepted', updated_at = NOW() WHERE id = $1 AND status = 'pending' RETURNING {}",
            APPLICATION_COLUMNS
        );
        let Some(row) = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        let accepted = Application::try_from(row)?;

        let sql = format!(
            r#"
            UPDATE applications SET status = 'rejected', updated_at = NOW()
            WHERE {} = $1 AND id <> $2 AND status = 'pending'
            RETURNING {}
            "#,
            post_column(accepted.post.kind()),
            APPLICATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(accepted.post.id())
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
        let rejected = collect_rows(rows)?;

        let project = match accepted.post {
            PostRef::Job(job_post_id) => {
                let sql = format!(
                    r#"
                    UPDATE projects SET artist_id = $2, status = 'in_progress', updated_at = NOW()
                    WHERE id = (
                        SELECT id FROM projects
                        WHERE job_post_id = $1 AND status = 'open'
                        ORDER BY created_at
                        LIMIT 1
                    )
                    RETURNING {}
                    "#,
                    PROJECT_COLUMNS
                );
                let row = sqlx::query_as::<_, ProjectRow>(&sql)
                    .bind(job_post_id)
                    .bind(accepted.artist_id)
                    .fetch_optional(&mut *tx)
                    .await?;
                row.map(Project::try_from).transpose()?
            }
            PostRef::Availability(_) => None,
        };

        tx.commit().await?;
        Ok(Some(AcceptanceOutcome {
            accepted,
            rejected,
            project,
        }))
    }

    async fn apply_conversion(&self, plan: ConversionPlan) -> StoreResult<Option<ConversionOutcome>> {
        let mut tx = self.pool.begin().await?;

        fetch_post(&mut tx, plan.post, true).await?;
        match fetch_application(&mut tx, plan.application_id, true).await? {
            Some(app) if app.status == ApplicationStatus::Accepted => {}
            _ => return Ok(None),
        }

        let project = match plan.project {
            ProjectSource::Create(project) => write_new_project(&mut tx, project).await?,
            ProjectSource::Adopt { project_id, changes } => write_project_changes(&mut tx, project_id, changes)
                .await?
                .ok_or_else(|| StoreError::Corrupt(format!("adopting missing project {}", project_id)))?,
        };

        let post = write_post_status(&mut tx, plan.post, plan.post_status)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("conversion of missing {}", plan.post)))?;

        let sql = format!(
            r#"
            UPDATE applications
            SET status = 'converted_to_project', project_id = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'accepted'
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        );
        let Some(row) = sqlx::query_as::<_, ApplicationRow>(&sql)
            .bind(plan.application_id)
            .bind(project.id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };
        let application = Application::try_from(row)?;

        tx.commit().await?;
        Ok(Some(ConversionOutcome {
            application,
            project,
            post,
        }))
    }

    async fn delete_application(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            "DELETE FROM applications WHERE id = $1 AND status IN ('pending', 'rejected')",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn insert_project(&self, project: NewProject) -> StoreResult<Project> {
        let mut conn = self.pool.acquire().await?;
        write_new_project(&mut conn, project).await
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let sql = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Project::try_from).transpose()
    }

    async fn find_project_for_job(&self, job_post_id: Uuid) -> StoreResult<Option<Project>> {
        let sql = format!(
            "SELECT {} FROM projects WHERE job_post_id = $1 ORDER BY created_at LIMIT 1",
            PROJECT_COLUMNS
        );
        let row = sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(job_post_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Project::try_from).transpose()
    }

    async fn list_projects(&self, filter: &ProjectFilter, page: PageRequest) -> StoreResult<Page<Project>> {
        self.fetch_page::<ProjectRow, _, _>(
            "projects",
            PROJECT_COLUMNS,
            "created_at DESC",
            page,
            |qb| push_project_filter(qb, filter),
        )
        .await
    }

    async fn update_project(&self, id: Uuid, changes: ProjectChanges) -> StoreResult<Option<Project>> {
        let mut conn = self.pool.acquire().await?;
        write_project_changes(&mut conn, id, changes).await
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn recipient_exists(&self, user_id: Uuid) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_notification(&self, notification: NewNotification) -> StoreResult<Notification> {
        let sql = format!(
            r#"
            INSERT INTO notifications (
                id, user_id, from_user_id, notification_type, title, message,
                link, project_id, application_id, priority
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        );
        let row = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(notification.user_id)
            .bind(notification.from_user_id)
            .bind(notification.notification_type.as_str())
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(&notification.link)
            .bind(notification.project_id)
            .bind(notification.application_id)
            .bind(notification.priority.as_str())
            .fetch_one(&self.pool)
            .await?;
        Notification::try_from(row)
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: PageRequest,
    ) -> StoreResult<Page<Notification>> {
        self.fetch_page::<NotificationRow, _, _>(
            "notifications",
            NOTIFICATION_COLUMNS,
            "created_at DESC",
            page,
            |qb| {
                qb.push(" AND user_id = ").push_bind(user_id);
                if unread_only {
                    qb.push(" AND is_read = FALSE");
                }
            },
        )
        .await
    }

    async fn unread_count(&self, user_id: Uuid) -> StoreResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Notification>> {
        let sql = format!(
            r#"
            UPDATE notifications
            SET is_read = TRUE, read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            NOTIFICATION_COLUMNS
        );
        let row = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Notification::try_from).transpose()
    }

    async fn mark_all_read(&self, user_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW() WHERE user_id = $1 AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
