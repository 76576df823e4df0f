// handlers/mod.rs - HTTP handlers grouped by resource
//
// Handlers stay thin: extract, call the service, shape the response.
// Authorization decisions live in `crate::policy`, reached through
// `crate::services::CatService`.

pub mod cats;
pub mod system;
pub mod users;
