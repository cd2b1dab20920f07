pub mod ai_service;
pub mod candidature_service;
pub mod chatbot_service;
pub mod mail_service;
pub mod providers;
pub mod scraper;
pub mod stats_service;
