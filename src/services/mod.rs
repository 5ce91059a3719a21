pub mod content_service;
pub mod deal_service;
pub mod enquiry_service;
pub mod geocode;
pub mod property_service;
