pub mod application_service;
pub mod conversion_service;
pub mod notification_service;
pub mod post_service;
pub mod profile_service;
pub mod project_service;
pub mod slug_service;
