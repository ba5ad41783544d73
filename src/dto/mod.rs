pub mod application_dto;
pub mod notification_dto;
pub mod post_dto;
pub mod profile_dto;
pub mod project_dto;

use serde::{Deserialize, Serialize};

use crate::store::Page;

/// Paged envelope shared by every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<M, T: From<M>> From<Page<M>> for ListResponse<T> {
    fn from(page: Page<M>) -> Self {
        let page = page.map(T::from);
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
        }
    }
}
