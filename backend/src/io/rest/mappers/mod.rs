//! Conversions between domain models and the shared wire DTOs

pub mod contact_mapper;
pub mod conversation_mapper;
pub mod metrics_mapper;
pub mod user_mapper;

pub use contact_mapper::ContactMapper;
pub use conversation_mapper::ConversationMapper;
pub use metrics_mapper::MetricsMapper;
pub use user_mapper::UserMapper;
