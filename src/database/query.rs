use chrono::NaiveDate;
use sqlx::{postgres::PgArguments, FromRow, Postgres};
use uuid::Uuid;

use crate::models::{BoundingBox, Cat};

/// Which cat records an operation targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CatMatch {
    All,
    Id(Uuid),
    Owner(Uuid),
    /// Both id and owner must match
    Owned { id: Uuid, owner: Uuid },
    Within(BoundingBox),
}

/// Positional parameter for a rendered SQL statement
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Uuid(Uuid),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlPredicate {
    pub clause: String,
    pub params: Vec<QueryParam>,
}

impl CatMatch {
    pub fn matches(&self, cat: &Cat) -> bool {
        match self {
            CatMatch::All => true,
            CatMatch::Id(id) => cat.id == *id,
            CatMatch::Owner(owner) => cat.owner == *owner,
            CatMatch::Owned { id, owner } => cat.id == *id && cat.owner == *owner,
            CatMatch::Within(area) => area.contains(&cat.location),
        }
    }

    /// Render as a `WHERE` clause. Placeholders start at `$1`.
    pub fn to_sql(&self) -> SqlPredicate {
        let (clause, params) = match self {
            CatMatch::All => ("TRUE".to_string(), vec![]),
            CatMatch::Id(id) => ("id = $1".to_string(), vec![QueryParam::Uuid(*id)]),
            CatMatch::Owner(owner) => ("owner = $1".to_string(), vec![QueryParam::Uuid(*owner)]),
            CatMatch::Owned { id, owner } => (
                "id = $1 AND owner = $2".to_string(),
                vec![QueryParam::Uuid(*id), QueryParam::Uuid(*owner)],
            ),
            // `<@` on point/box is inclusive and served by the GiST location index
            CatMatch::Within(area) => (
                "point(longitude, latitude) <@ box(point($1, $2), point($3, $4))".to_string(),
                vec![
                    QueryParam::Float(area.bottom_left.longitude()),
                    QueryParam::Float(area.bottom_left.latitude()),
                    QueryParam::Float(area.top_right.longitude()),
                    QueryParam::Float(area.top_right.latitude()),
                ],
            ),
        };
        SqlPredicate { clause, params }
    }
}

pub fn bind_param<'q, O>(
    q: sqlx::query::QueryAs<'q, Postgres, O, PgArguments>,
    p: &'q QueryParam,
) -> sqlx::query::QueryAs<'q, Postgres, O, PgArguments>
where
    O: for<'r> FromRow<'r, sqlx::postgres::PgRow>,
{
    match p {
        QueryParam::Uuid(v) => q.bind(*v),
        QueryParam::Float(v) => q.bind(*v),
        QueryParam::Text(v) => q.bind(v.as_str()),
        QueryParam::Date(v) => q.bind(*v),
    }
}
