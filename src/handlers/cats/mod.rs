// handlers/cats - /cats endpoints
//
// Public reads: list, area, get
// Principal required: list_owned, create
// Owner only: record_put, record_delete
// Admin only: admin_put, admin_delete

pub mod admin;
pub mod collection;
pub mod record;

pub use collection::{create, list, list_area, list_owned};

pub use record::delete as record_delete;
pub use record::get as record_get;
pub use record::put as record_put;

pub use admin::delete as admin_delete;
pub use admin::put as admin_put;
