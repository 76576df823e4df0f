use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::geo::{GeoPoint, PointKind};
use super::user::OwnerView;
use super::validation::ValidationErrors;

pub const MIN_NAME_LENGTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cat {
    pub id: Uuid,
    pub name: String,
    pub weight: f64,
    pub birthdate: NaiveDate,
    pub location: GeoPoint,
    pub owner: Uuid,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

/// A cat as returned by the read endpoints, with its owner embedded.
/// `owner` is null when the owning user no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatWithOwner {
    pub id: Uuid,
    pub name: String,
    pub weight: f64,
    pub birthdate: NaiveDate,
    pub location: GeoPoint,
    pub owner: Option<OwnerView>,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

impl Cat {
    pub fn with_owner(self, owner: Option<OwnerView>) -> CatWithOwner {
        CatWithOwner {
            id: self.id,
            name: self.name,
            weight: self.weight,
            birthdate: self.birthdate,
            location: self.location,
            owner,
            filename: self.filename,
            created_at: self.created_at,
        }
    }
}

/// Raw `cats` row; the location is stored as two columns.
#[derive(Debug, sqlx::FromRow)]
pub struct CatRow {
    pub id: Uuid,
    pub name: String,
    pub weight: f64,
    pub birthdate: NaiveDate,
    pub longitude: f64,
    pub latitude: f64,
    pub owner: Uuid,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

impl From<CatRow> for Cat {
    fn from(row: CatRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            weight: row.weight,
            birthdate: row.birthdate,
            location: GeoPoint {
                kind: PointKind::Point,
                coordinates: [row.longitude, row.latitude],
            },
            owner: row.owner,
            filename: row.filename,
            created_at: row.created_at,
        }
    }
}

/// Validated fields of a cat that has no owner assigned yet.
#[derive(Debug, Clone, PartialEq)]
pub struct CatDraft {
    pub name: String,
    pub weight: f64,
    pub birthdate: NaiveDate,
    pub location: GeoPoint,
    pub filename: String,
}

impl CatDraft {
    pub fn owned_by(self, owner: Uuid) -> NewCat {
        NewCat {
            name: self.name,
            weight: self.weight,
            birthdate: self.birthdate,
            location: self.location,
            owner,
            filename: self.filename,
        }
    }
}

/// A cat ready to be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCat {
    pub name: String,
    pub weight: f64,
    pub birthdate: NaiveDate,
    pub location: GeoPoint,
    pub owner: Uuid,
    pub filename: String,
}

impl NewCat {
    pub fn into_cat(self) -> Cat {
        Cat {
            id: Uuid::new_v4(),
            name: self.name,
            weight: self.weight,
            birthdate: self.birthdate,
            location: self.location,
            owner: self.owner,
            filename: self.filename,
            created_at: Utc::now(),
        }
    }
}

/// Request body for `POST /cats`.
///
/// Any `owner` or `location` in the body is ignored: the owner is the caller
/// and the location comes from the upload's geotag.
#[derive(Debug, Default, Deserialize)]
pub struct CreateCatBody {
    #[serde(alias = "cat_name")]
    pub name: Option<String>,
    pub weight: Option<Value>,
    pub birthdate: Option<String>,
}

impl CreateCatBody {
    pub fn validate(
        self,
        filename: &str,
        location: Option<GeoPoint>,
    ) -> Result<CatDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = errors.check("name", required(self.name.as_deref(), "Cat name").and_then(parse_name));
        let weight = errors.check("weight", required(self.weight.as_ref(), "Weight").and_then(parse_weight));
        let birthdate = errors.check(
            "birthdate",
            required(self.birthdate.as_deref(), "Birthdate").and_then(parse_birthdate),
        );
        let location = errors.check("location", location.ok_or_else(|| "Location is required.".to_string()));
        let filename = errors.check("filename", parse_filename(filename));

        match (name, weight, birthdate, location, filename) {
            (Some(name), Some(weight), Some(birthdate), Some(location), Some(filename)) if errors.is_empty() => {
                Ok(CatDraft { name, weight, birthdate, location, filename })
            }
            _ => Err(errors),
        }
    }
}

/// Request body for `PUT /cats/:id` and `PUT /cats/admin/:id`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateCatBody {
    #[serde(alias = "cat_name")]
    pub name: Option<String>,
    pub weight: Option<Value>,
    pub birthdate: Option<String>,
    pub location: Option<Value>,
    pub owner: Option<String>,
    pub filename: Option<String>,
}

impl UpdateCatBody {
    pub fn validate(self) -> Result<CatPatch, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let patch = CatPatch {
            name: self.name.as_deref().and_then(|v| errors.check("name", parse_name(v))),
            weight: self.weight.as_ref().and_then(|v| errors.check("weight", parse_weight(v))),
            birthdate: self
                .birthdate
                .as_deref()
                .and_then(|v| errors.check("birthdate", parse_birthdate(v))),
            location: self.location.and_then(|v| errors.check("location", parse_location(v))),
            owner: self.owner.as_deref().and_then(|v| errors.check("owner", parse_owner(v))),
            filename: self.filename.as_deref().and_then(|v| errors.check("filename", parse_filename(v))),
        };

        if errors.is_empty() {
            Ok(patch)
        } else {
            Err(errors)
        }
    }
}

/// Validated partial update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatPatch {
    pub name: Option<String>,
    pub weight: Option<f64>,
    pub birthdate: Option<NaiveDate>,
    pub location: Option<GeoPoint>,
    pub owner: Option<Uuid>,
    pub filename: Option<String>,
}

impl CatPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.weight.is_none()
            && self.birthdate.is_none()
            && self.location.is_none()
            && self.owner.is_none()
            && self.filename.is_none()
    }

    pub fn apply_to(&self, cat: &mut Cat) {
        if let Some(name) = &self.name {
            cat.name = name.clone();
        }
        if let Some(weight) = self.weight {
            cat.weight = weight;
        }
        if let Some(birthdate) = self.birthdate {
            cat.birthdate = birthdate;
        }
        if let Some(location) = self.location {
            cat.location = location;
        }
        if let Some(owner) = self.owner {
            cat.owner = owner;
        }
        if let Some(filename) = &self.filename {
            cat.filename = filename.clone();
        }
    }
}

fn required<T>(value: Option<T>, label: &str) -> Result<T, String> {
    value.ok_or_else(|| format!("{} is required.", label))
}

fn parse_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.chars().count() < MIN_NAME_LENGTH {
        return Err(format!("Cat name must be at least {} characters.", MIN_NAME_LENGTH));
    }
    Ok(name.to_string())
}

// Form submissions send numbers as strings.
fn parse_weight(raw: &Value) -> Result<f64, String> {
    let weight = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|w| w.is_finite())
    .ok_or_else(|| "Weight must be a number.".to_string())?;

    if weight < 0.0 {
        return Err("Weight must be a positive number.".to_string());
    }
    Ok(weight)
}

fn parse_birthdate(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
        .ok_or_else(|| "Birthdate must be a valid date (YYYY-MM-DD).".to_string())
}

fn parse_location(raw: Value) -> Result<GeoPoint, String> {
    serde_json::from_value::<GeoPoint>(raw)
        .map_err(|_| "Location must be a GeoJSON Point with [longitude, latitude] coordinates.".to_string())?
        .validated()
        .map_err(|e| e.to_string())
}

fn parse_owner(raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|_| format!("Invalid owner id: {}", raw))
}

fn parse_filename(raw: &str) -> Result<String, String> {
    let filename = raw.trim();
    if filename.is_empty() {
        return Err("Filename must not be empty.".to_string());
    }
    Ok(filename.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> CreateCatBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn create_body_accepts_legacy_name_and_string_weight() {
        let draft = body(json!({ "cat_name": "Tom", "weight": "4.5", "birthdate": "2020-01-01" }))
            .validate("tom.jpg", Some(GeoPoint::new(10.0, 20.0).unwrap()))
            .unwrap();
        assert_eq!(draft.name, "Tom");
        assert_eq!(draft.weight, 4.5);
        assert_eq!(draft.birthdate, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(draft.location.coordinates, [10.0, 20.0]);
    }

    #[test]
    fn create_body_reports_every_failing_field() {
        let errors = body(json!({ "name": "Al", "weight": -1, "birthdate": "yesterday" }))
            .validate("", None)
            .unwrap_err();
        for field in ["name", "weight", "birthdate", "location", "filename"] {
            assert!(errors.contains(field), "missing error for {}: {:?}", field, errors);
        }
    }

    #[test]
    fn create_body_requires_fields() {
        let errors = body(json!({})).validate("a.jpg", Some(GeoPoint::new(0.0, 0.0).unwrap())).unwrap_err();
        let fields = errors.into_fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["birthdate"], "Birthdate is required.");
    }

    #[test]
    fn create_body_ignores_owner() {
        let owner = Uuid::new_v4();
        let draft = body(json!({ "name": "Tom", "weight": 4, "birthdate": "2020-01-01", "owner": Uuid::new_v4() }))
            .validate("tom.jpg", Some(GeoPoint::new(10.0, 20.0).unwrap()))
            .unwrap();
        assert_eq!(draft.owned_by(owner).owner, owner);
    }

    #[test]
    fn birthdate_accepts_rfc3339() {
        assert_eq!(
            parse_birthdate("2020-01-01T00:00:00.000Z").unwrap(),
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
    }

    #[test]
    fn update_body_validates_present_fields_only() {
        let body: UpdateCatBody = serde_json::from_value(json!({ "weight": 6 })).unwrap();
        let patch = body.validate().unwrap();
        assert_eq!(patch.weight, Some(6.0));
        assert!(patch.name.is_none());

        let body: UpdateCatBody = serde_json::from_value(json!({
            "name": "x",
            "location": { "type": "Point", "coordinates": [200, 0] },
            "owner": "not-a-uuid"
        }))
        .unwrap();
        let errors = body.validate().unwrap_err();
        assert!(errors.contains("name"));
        assert!(errors.contains("location"));
        assert!(errors.contains("owner"));
    }

    #[test]
    fn patch_applies_only_set_fields() {
        let mut cat = NewCat {
            name: "Tom".into(),
            weight: 4.0,
            birthdate: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            location: GeoPoint::new(10.0, 20.0).unwrap(),
            owner: Uuid::new_v4(),
            filename: "tom.jpg".into(),
        }
        .into_cat();
        let before = cat.clone();

        CatPatch { weight: Some(5.5), ..Default::default() }.apply_to(&mut cat);
        assert_eq!(cat.weight, 5.5);
        assert_eq!(cat.name, before.name);
        assert_eq!(cat.owner, before.owner);
        assert!(CatPatch::default().is_empty());
    }
}
