//! Where each kind of record lives in the document store.
//!
//! ```text
//! users/{username}
//!     feedback/thread_counter
//!     feedback/thread{N}
//!     contacts/{autoId}
//!     pressureData/{autoId}
//!     glucoseData/{autoId}
//!     meals/{autoId}
//!     personal-metrics/personal-info
//! system_data/idmap
//! ```

use super::paths::{CollectionPath, DocPath};
use super::traits::StoreResult;

pub const USERS: &str = "users";
pub const SYSTEM_DATA: &str = "system_data";
pub const PATIENT_ID_MAP: &str = "idmap";

pub const FEEDBACK: &str = "feedback";
pub const THREAD_COUNTER: &str = "thread_counter";
pub const THREAD_PREFIX: &str = "thread";
pub const CONTACTS: &str = "contacts";
pub const PRESSURE_DATA: &str = "pressureData";
pub const GLUCOSE_DATA: &str = "glucoseData";
pub const MEALS: &str = "meals";
pub const PERSONAL_METRICS: &str = "personal-metrics";
pub const PERSONAL_INFO: &str = "personal-info";

pub fn users() -> CollectionPath {
    CollectionPath::root(USERS)
}

pub fn user(username: &str) -> StoreResult<DocPath> {
    users().doc(username)
}

pub fn patient_id_map() -> DocPath {
    CollectionPath::root(SYSTEM_DATA).fixed(PATIENT_ID_MAP)
}

pub fn feedback(username: &str) -> StoreResult<CollectionPath> {
    Ok(user(username)?.collection(FEEDBACK))
}

pub fn thread_counter(username: &str) -> StoreResult<DocPath> {
    Ok(feedback(username)?.fixed(THREAD_COUNTER))
}

pub fn thread(username: &str, key: &str) -> StoreResult<DocPath> {
    feedback(username)?.doc(key)
}

pub fn contacts(username: &str) -> StoreResult<CollectionPath> {
    Ok(user(username)?.collection(CONTACTS))
}

pub fn pressure_data(username: &str) -> StoreResult<CollectionPath> {
    Ok(user(username)?.collection(PRESSURE_DATA))
}

pub fn glucose_data(username: &str) -> StoreResult<CollectionPath> {
    Ok(user(username)?.collection(GLUCOSE_DATA))
}

pub fn meals(username: &str) -> StoreResult<CollectionPath> {
    Ok(user(username)?.collection(MEALS))
}

pub fn personal_info(username: &str) -> StoreResult<DocPath> {
    Ok(user(username)?.collection(PERSONAL_METRICS).fixed(PERSONAL_INFO))
}
