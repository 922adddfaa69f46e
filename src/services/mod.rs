pub mod search_service;
pub mod storage_service;
pub mod vacancy_manager;
