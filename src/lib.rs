pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod utils;

use std::sync::Arc;

use crate::services::{
    application_service::ApplicationService, conversion_service::ConversionService,
    notification_service::NotificationService, post_service::PostService,
    profile_service::ProfileService, project_service::ProjectService, slug_service::SlugService,
};
use crate::store::{MarketStore, NotificationStore};

#[derive(Clone)]
pub struct AppState {
    pub profile_service: ProfileService,
    pub post_service: PostService,
    pub application_service: ApplicationService,
    pub conversion_service: ConversionService,
    pub project_service: ProjectService,
    pub notification_service: NotificationService,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, jwt_secret: &str) -> Self
    where
        S: MarketStore + 'static,
    {
        let notification_store: Arc<dyn NotificationStore> = store.clone();
        let store: Arc<dyn MarketStore> = store;

        let slugs = SlugService::new(store.clone());
        let notification_service = NotificationService::new(notification_store);
        let profile_service = ProfileService::new(store.clone(), slugs.clone());
        let post_service = PostService::new(store.clone(), profile_service.clone(), slugs.clone());
        let application_service = ApplicationService::new(
            store.clone(),
            profile_service.clone(),
            notification_service.clone(),
        );
        let conversion_service = ConversionService::new(
            store.clone(),
            profile_service.clone(),
            slugs.clone(),
            notification_service.clone(),
        );
        let project_service = ProjectService::new(store, profile_service.clone(), slugs);

        Self {
            profile_service,
            post_service,
            application_service,
            conversion_service,
            project_service,
            notification_service,
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}
