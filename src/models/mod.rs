pub mod cat;
pub mod geo;
pub mod user;
pub mod validation;

pub use cat::{Cat, CatDraft, CatPatch, CatWithOwner, CreateCatBody, NewCat, UpdateCatBody};
pub use geo::{BoundingBox, CoordinateError, GeoPoint};
pub use user::{OwnerView, Role, User};
pub use validation::ValidationErrors;
