pub mod agent;
pub mod chat_log;
pub mod deal;
pub mod enquiry;
pub mod post;
pub mod price_history;
pub mod property;
pub mod submission;

pub use agent::{AgentProfile, AgentRole};
pub use chat_log::ChatLog;
pub use deal::Deal;
pub use enquiry::{Enquiry, EnquiryStatus};
pub use post::{Post, PostStatus};
pub use price_history::{PriceChangeType, PriceHistory};
pub use property::{Freshness, ListingType, Property, PropertyStatus, VerificationSource};
pub use submission::{PropertySubmission, SubmissionStatus};
