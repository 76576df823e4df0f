use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::context::RequestContext;
use crate::database::{CatRepository, UserRepository};
use crate::error::ApiError;
use crate::middleware::Principal;
use crate::models::{BoundingBox, Cat, CatWithOwner, CreateCatBody, OwnerView, UpdateCatBody, ValidationErrors};
use crate::policy::{can_act, Action, DenyReason};

/// Cat commands. Each call validates its input, asks the policy, then runs
/// exactly one store operation; the first failing stage ends the request.
#[derive(Clone)]
pub struct CatService {
    cats: Arc<dyn CatRepository>,
    users: Arc<dyn UserRepository>,
}

impl CatService {
    pub fn new(cats: Arc<dyn CatRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { cats, users }
    }

    pub async fn list_all(&self, ctx: &RequestContext) -> Result<Vec<CatWithOwner>, ApiError> {
        authorize(ctx, Action::ListAll, None)?;
        let cats = self.cats.list_all().await?;
        self.with_owners(cats).await
    }

    pub async fn get(&self, ctx: &RequestContext, id: &str) -> Result<CatWithOwner, ApiError> {
        let id = parse_id(id)?;
        authorize(ctx, Action::GetById, None)?;
        let cat = self.cats.get_by_id(id).await?;
        let mut populated = self.with_owners(vec![cat]).await?;
        populated
            .pop()
            .ok_or_else(|| ApiError::internal_server_error("An error occurred while processing your request"))
    }

    pub async fn list_owned(&self, ctx: &RequestContext) -> Result<Vec<CatWithOwner>, ApiError> {
        let principal = authorize_own(ctx, Action::ListOwned)?;
        let cats = self.cats.list_by_owner(principal.id).await?;
        self.with_owners(cats).await
    }

    pub async fn list_by_area(
        &self,
        ctx: &RequestContext,
        bottom_left: Option<&str>,
        top_right: Option<&str>,
    ) -> Result<Vec<CatWithOwner>, ApiError> {
        let (Some(bottom_left), Some(top_right)) = (bottom_left, top_right) else {
            return Err(ApiError::bad_request(
                "Query parameters topRight and bottomLeft are required (lon,lat)",
            ));
        };
        let area = BoundingBox::parse(bottom_left, top_right)?;

        authorize(ctx, Action::ListByBoundingBox, None)?;
        let cats = self.cats.list_by_bounding_box(area).await?;
        self.with_owners(cats).await
    }

    /// The owner is always the caller; any owner in the body was already dropped by deserialization.
    pub async fn create(&self, ctx: &RequestContext, body: CreateCatBody) -> Result<Cat, ApiError> {
        let upload = ctx
            .upload
            .as_ref()
            .ok_or_else(|| ApiError::bad_request("An image upload is required to create a cat"))?;
        let draft = body.validate(&upload.filename, upload.coords)?;

        let principal = authorize_own(ctx, Action::Create)?;
        if !self.users.exists(principal.id).await? {
            return Err(ValidationErrors::single("owner", format!("User {} does not exist", principal.id)).into());
        }

        let cat = self.cats.create(draft.owned_by(principal.id)).await?;
        tracing::info!("Cat {} ({}) added by {}", cat.id, cat.name, principal.id);
        Ok(cat)
    }

    /// Owner path: matches on id and caller together, never changes ownership.
    pub async fn update_owned(
        &self,
        ctx: &RequestContext,
        id: &str,
        body: UpdateCatBody,
    ) -> Result<Cat, ApiError> {
        let id = parse_id(id)?;
        let mut patch = body.validate()?;

        let principal = authorize_own(ctx, Action::Update)?;

        if patch.owner.take().is_some() {
            tracing::debug!("Dropping owner change on owner-scoped update of cat {}", id);
        }
        Ok(self.cats.update_owned(id, principal.id, patch).await?)
    }

    /// Admin path: matches on id alone and may reassign the owner.
    pub async fn update_any(
        &self,
        ctx: &RequestContext,
        id: &str,
        body: UpdateCatBody,
    ) -> Result<Cat, ApiError> {
        let id = parse_id(id)?;
        let patch = body.validate()?;

        authorize(ctx, Action::UpdateAny, None)?;

        if let Some(new_owner) = patch.owner {
            authorize(ctx, Action::ReassignOwner, None)?;
            if !self.users.exists(new_owner).await? {
                return Err(ValidationErrors::single("owner", format!("User {} does not exist", new_owner)).into());
            }
            tracing::info!("Reassigning cat {} to {}", id, new_owner);
        }
        Ok(self.cats.update_by_id(id, patch).await?)
    }

    pub async fn delete_owned(&self, ctx: &RequestContext, id: &str) -> Result<Cat, ApiError> {
        let id = parse_id(id)?;
        let principal = authorize_own(ctx, Action::Delete)?;
        Ok(self.cats.delete_owned(id, principal.id).await?)
    }

    pub async fn delete_any(&self, ctx: &RequestContext, id: &str) -> Result<Cat, ApiError> {
        let id = parse_id(id)?;
        authorize(ctx, Action::DeleteAny, None)?;
        Ok(self.cats.delete_by_id(id).await?)
    }

    /// Embed each cat's owner, resolved with one user lookup per call.
    async fn with_owners(&self, cats: Vec<Cat>) -> Result<Vec<CatWithOwner>, ApiError> {
        let mut ids: Vec<Uuid> = cats.iter().map(|c| c.owner).collect();
        ids.sort();
        ids.dedup();

        let owners: HashMap<Uuid, OwnerView> = self
            .users
            .find_many(&ids)
            .await?
            .iter()
            .map(|u| (u.id, OwnerView::from(u)))
            .collect();

        Ok(cats
            .into_iter()
            .map(|cat| {
                let owner = owners.get(&cat.owner).cloned();
                cat.with_owner(owner)
            })
            .collect())
    }
}

/// Ids that cannot exist are reported exactly like ids that do not.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Cat not found"))
}

fn authorize(ctx: &RequestContext, action: Action, resource_owner: Option<Uuid>) -> Result<(), ApiError> {
    can_act(ctx.principal.as_ref(), action, resource_owner)
        .check()
        .map_err(|reason| {
            tracing::warn!("Denied {:?} for {:?}: {:?}", action, ctx.principal_id(), reason);
            ApiError::from(reason)
        })
}

/// Authorize an action on the caller's own records and hand back the caller.
/// Ownership itself is enforced by the store's combined id and owner match.
fn authorize_own(ctx: &RequestContext, action: Action) -> Result<&Principal, ApiError> {
    authorize(ctx, action, ctx.principal_id())?;
    ctx.principal
        .as_ref()
        .ok_or_else(|| DenyReason::Unauthenticated.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{InMemoryCatRepository, InMemoryUserRepository};
    use crate::middleware::UploadedAsset;
    use crate::models::{GeoPoint, Role, User};
    use serde_json::json;

    struct Fixture {
        service: CatService,
        u1: User,
        u2: User,
        admin: User,
    }

    fn fixture() -> Fixture {
        let u1 = User::new("u1", "u1@example.com", Role::User);
        let u2 = User::new("u2", "u2@example.com", Role::User);
        let admin = User::new("root", "root@example.com", Role::Admin);
        let users = InMemoryUserRepository::with_users([u1.clone(), u2.clone(), admin.clone()]);
        let service = CatService::new(Arc::new(InMemoryCatRepository::new()), Arc::new(users));
        Fixture { service, u1, u2, admin }
    }

    fn as_user(user: &User) -> RequestContext {
        RequestContext::for_principal(Principal { id: user.id, role: user.role })
    }

    fn with_photo(ctx: RequestContext, lon: f64, lat: f64) -> RequestContext {
        ctx.with_upload(UploadedAsset {
            filename: "photo.jpg".into(),
            coords: Some(GeoPoint::new(lon, lat).unwrap()),
        })
    }

    fn create_body(value: serde_json::Value) -> CreateCatBody {
        serde_json::from_value(value).unwrap()
    }

    fn update_body(value: serde_json::Value) -> UpdateCatBody {
        serde_json::from_value(value).unwrap()
    }

    async fn create_tom(f: &Fixture) -> Cat {
        f.service
            .create(
                &with_photo(as_user(&f.u1), 10.0, 20.0),
                create_body(json!({ "name": "Tom", "weight": 4, "birthdate": "2020-01-01" })),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_delete_scenario() {
        let f = fixture();
        let tom = create_tom(&f).await;
        assert_eq!(tom.owner, f.u1.id);
        assert_eq!(tom.location.coordinates, [10.0, 20.0]);

        let id = tom.id.to_string();
        let err = f.service.delete_owned(&as_user(&f.u2), &id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);

        let deleted = f.service.delete_owned(&as_user(&f.u1), &id).await.unwrap();
        assert_eq!(deleted.id, tom.id);

        let err = f.service.get(&RequestContext::anonymous(), &id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn create_forces_owner_to_caller() {
        let f = fixture();
        let cat = f
            .service
            .create(
                &with_photo(as_user(&f.u1), 1.0, 1.0),
                create_body(json!({ "name": "Felix", "weight": 3, "birthdate": "2019-05-05", "owner": f.u2.id })),
            )
            .await
            .unwrap();
        assert_eq!(cat.owner, f.u1.id);
    }

    #[tokio::test]
    async fn create_requires_upload_and_principal() {
        let f = fixture();
        let body = || create_body(json!({ "name": "Tom", "weight": 4, "birthdate": "2020-01-01" }));

        let err = f.service.create(&as_user(&f.u1), body()).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = f
            .service
            .create(&with_photo(RequestContext::anonymous(), 1.0, 1.0), body())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn create_without_geotag_is_a_validation_error() {
        let f = fixture();
        let ctx = as_user(&f.u1).with_upload(UploadedAsset { filename: "x.jpg".into(), coords: None });
        let err = f
            .service
            .create(&ctx, create_body(json!({ "name": "Tom", "weight": 4, "birthdate": "2020-01-01" })))
            .await
            .unwrap_err();
        match err {
            ApiError::ValidationError { field_errors: Some(fields), .. } => assert!(fields.contains_key("location")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn duplicate_name_is_conflict() {
        let f = fixture();
        create_tom(&f).await;
        let err = f
            .service
            .create(
                &with_photo(as_user(&f.u2), 0.0, 0.0),
                create_body(json!({ "name": "Tom", "weight": 2, "birthdate": "2021-01-01" })),
            )
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn non_owner_update_looks_like_missing_record() {
        let f = fixture();
        let tom = create_tom(&f).await;

        let foreign = f
            .service
            .update_owned(&as_user(&f.u2), &tom.id.to_string(), update_body(json!({ "weight": 9 })))
            .await
            .unwrap_err();
        let missing = f
            .service
            .update_owned(&as_user(&f.u2), &Uuid::new_v4().to_string(), update_body(json!({ "weight": 9 })))
            .await
            .unwrap_err();
        assert_eq!(foreign.to_json(), missing.to_json());
        assert_eq!(foreign.status_code(), 404);
    }

    #[tokio::test]
    async fn owner_cannot_reassign_on_owner_path() {
        let f = fixture();
        let tom = create_tom(&f).await;

        let updated = f
            .service
            .update_owned(
                &as_user(&f.u1),
                &tom.id.to_string(),
                update_body(json!({ "owner": f.u2.id.to_string(), "weight": 5 })),
            )
            .await
            .unwrap();
        assert_eq!(updated.owner, f.u1.id);
        assert_eq!(updated.weight, 5.0);

        // Even an admin cannot reassign through the owner path
        let admin_cat = f
            .service
            .create(
                &with_photo(as_user(&f.admin), 0.0, 0.0),
                create_body(json!({ "name": "Boss", "weight": 7, "birthdate": "2018-02-02" })),
            )
            .await
            .unwrap();
        let updated = f
            .service
            .update_owned(
                &as_user(&f.admin),
                &admin_cat.id.to_string(),
                update_body(json!({ "owner": f.u2.id.to_string() })),
            )
            .await
            .unwrap();
        assert_eq!(updated.owner, f.admin.id);
    }

    #[tokio::test]
    async fn admin_may_reassign_to_existing_user_only() {
        let f = fixture();
        let tom = create_tom(&f).await;
        let id = tom.id.to_string();

        let updated = f
            .service
            .update_any(&as_user(&f.admin), &id, update_body(json!({ "owner": f.u2.id.to_string() })))
            .await
            .unwrap();
        assert_eq!(updated.owner, f.u2.id);

        let err = f
            .service
            .update_any(&as_user(&f.admin), &id, update_body(json!({ "owner": Uuid::new_v4().to_string() })))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn admin_endpoints_reject_regular_users_with_401() {
        let f = fixture();
        let tom = create_tom(&f).await;
        let id = tom.id.to_string();

        let err = f.service.delete_any(&as_user(&f.u1), &id).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert_eq!(err.status_code(), 401);

        let err = f
            .service
            .update_any(&RequestContext::anonymous(), &id, update_body(json!({ "weight": 1 })))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        assert_eq!(f.service.delete_any(&as_user(&f.admin), &id).await.unwrap().id, tom.id);
        let err = f.service.delete_any(&as_user(&f.admin), &id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn listing_by_owner_and_area() {
        let f = fixture();
        create_tom(&f).await;
        let anon = RequestContext::anonymous();

        assert_eq!(f.service.list_owned(&as_user(&f.u1)).await.unwrap().len(), 1);
        assert!(f.service.list_owned(&as_user(&f.u2)).await.unwrap().is_empty());
        assert_eq!(f.service.list_owned(&anon).await.unwrap_err().status_code(), 401);

        let found = f.service.list_by_area(&anon, Some("0,0"), Some("10,20")).await.unwrap();
        assert_eq!(found.len(), 1);
        let none = f.service.list_by_area(&anon, Some("0,0"), Some("9,9")).await.unwrap();
        assert!(none.is_empty());

        for (bl, tr) in [(Some("0,0"), Some("abc")), (None, Some("1,1")), (Some("1"), Some("2,2"))] {
            let err = f.service.list_by_area(&anon, bl, tr).await.unwrap_err();
            assert_eq!(err.status_code(), 400, "{:?} {:?}", bl, tr);
        }
    }

    #[tokio::test]
    async fn malformed_id_is_not_found() {
        let f = fixture();
        let err = f.service.get(&RequestContext::anonymous(), "not-an-id").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        let err = f.service.delete_owned(&as_user(&f.u1), "42").await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn create_by_unknown_user_is_rejected() {
        let cats = Arc::new(InMemoryCatRepository::new());
        let service = CatService::new(cats.clone(), Arc::new(InMemoryUserRepository::new()));
        let ghost = Principal { id: Uuid::new_v4(), role: Role::User };

        let err = service
            .create(
                &with_photo(RequestContext::for_principal(ghost), 1.0, 1.0),
                create_body(json!({ "name": "Stray", "weight": 3, "birthdate": "2020-01-01" })),
            )
            .await
            .unwrap_err();
        match err {
            ApiError::ValidationError { field_errors: Some(fields), .. } => assert!(fields.contains_key("owner")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(cats.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reads_embed_owner_without_role() {
        let f = fixture();
        let tom = create_tom(&f).await;
        let anon = RequestContext::anonymous();

        let cat = f.service.get(&anon, &tom.id.to_string()).await.unwrap();
        let owner = cat.owner.expect("owner should be embedded");
        assert_eq!(owner, OwnerView::from(&f.u1));

        let value = serde_json::to_value(f.service.list_all(&anon).await.unwrap()).unwrap();
        assert_eq!(value[0]["owner"]["user_name"], "u1");
        assert!(value[0]["owner"].get("role").is_none());

        let owned = f.service.list_owned(&as_user(&f.u1)).await.unwrap();
        assert_eq!(owned[0].owner.as_ref().map(|o| o.id), Some(f.u1.id));
        let area = f.service.list_by_area(&anon, Some("0,0"), Some("10,20")).await.unwrap();
        assert_eq!(area[0].owner.as_ref().map(|o| o.email.as_str()), Some("u1@example.com"));
    }
}
