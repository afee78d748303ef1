//! # Domain Module
//!
//! Business logic of the companion backend. Every service owns an
//! `Arc<dyn DocumentStore>` and is cheap to clone into request handlers.
//!
//! - `directory_service` and `thread_counter` hold the two transactional
//!   documents: the patient-ID directory and the per-user thread counters
//! - `conversation_service` numbers threads and appends messages
//! - `account_service`, `contact_service`, `metrics_service` and
//!   `profile_service` are plain reads and writes over the user's documents
//! - `call_service` triggers emergency calls through a `CallProvider`

pub mod account_service;
pub mod call_service;
pub mod clock;
pub mod contact_service;
pub mod conversation_service;
pub mod directory_service;
pub mod error;
pub mod metrics_service;
pub mod models;
pub mod password;
pub mod profile_service;
pub mod thread_counter;

pub use account_service::{AccountService, SignupCommand};
pub use call_service::{voice_response, CallService};
pub use clock::{Clock, SystemClock};
pub use contact_service::ContactService;
pub use conversation_service::ConversationService;
pub use directory_service::PatientDirectory;
pub use error::{ServiceError, ServiceResult};
pub use metrics_service::MetricsService;
pub use profile_service::ProfileService;
pub use thread_counter::ThreadCounter;
