use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::ingredients::repo::Ingredient;
use crate::tags::repo::Tag;

/// Upper bound from the NUMERIC(5,2) price column.
const MAX_PRICE: Decimal = Decimal::from_parts(99999, 0, 0, false, 2);

#[derive(Debug, Deserialize)]
pub struct CreateRecipeRequest {
    #[serde(default)]
    pub title: String,
    pub price: Option<Decimal>,
    pub time_minutes: Option<i32>,
    pub link: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    #[serde(default)]
    pub ingredient_ids: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRecipeRequest {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub time_minutes: Option<i32>,
    pub link: Option<String>,
    pub tag_ids: Option<Vec<i64>>,
    pub ingredient_ids: Option<Vec<i64>>,
}

#[derive(Debug, Deserialize)]
pub struct RecipeListQuery {
    /// Comma-separated tag ids; recipes must carry at least one of them.
    pub tags: Option<String>,
    /// Comma-separated ingredient ids.
    pub ingredients: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    100
}

/// List representation: associations as bare ids.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub time_minutes: i32,
    pub tags: Vec<i64>,
    pub ingredients: Vec<i64>,
    pub link: Option<String>,
}

/// Detail representation: associations expanded to `{id, name}` objects.
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub title: String,
    pub price: Decimal,
    pub time_minutes: i32,
    pub tags: Vec<Tag>,
    pub ingredients: Vec<Ingredient>,
    pub link: Option<String>,
}

pub fn validate_price(price: Decimal) -> Result<Decimal, ApiError> {
    if price.is_sign_negative() {
        return Err(ApiError::validation("price must not be negative"));
    }
    if price > MAX_PRICE {
        return Err(ApiError::validation("price must not exceed 999.99"));
    }
    if price.scale() > 2 {
        return Err(ApiError::validation(
            "price must have at most 2 decimal places",
        ));
    }
    Ok(price)
}

pub fn validate_time_minutes(time_minutes: i32) -> Result<i32, ApiError> {
    if time_minutes < 0 {
        return Err(ApiError::validation("time_minutes must not be negative"));
    }
    Ok(time_minutes)
}

/// Parse a `?tags=1,2,3` style filter value.
pub fn parse_id_csv(raw: &str) -> Result<Vec<i64>, ApiError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .map_err(|_| ApiError::validation(format!("invalid id in filter: {s}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn price_accepts_in_range_values() {
        assert!(validate_price(dec("5.00")).is_ok());
        assert!(validate_price(dec("0")).is_ok());
        assert!(validate_price(dec("999.99")).is_ok());
        assert!(validate_price(dec("0.5")).is_ok());
    }

    #[test]
    fn price_rejects_negative() {
        assert!(validate_price(dec("-1")).is_err());
        assert!(validate_price(dec("-0.01")).is_err());
    }

    #[test]
    fn price_rejects_too_large() {
        assert!(validate_price(dec("1000.00")).is_err());
    }

    #[test]
    fn price_rejects_more_than_two_decimal_places() {
        assert!(validate_price(dec("5.001")).is_err());
    }

    #[test]
    fn time_minutes_rejects_negative() {
        assert!(validate_time_minutes(-1).is_err());
        assert_eq!(validate_time_minutes(0).unwrap(), 0);
        assert_eq!(validate_time_minutes(10).unwrap(), 10);
    }

    #[test]
    fn id_csv_parses_and_trims() {
        assert_eq!(parse_id_csv("1,2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_id_csv(" 4 , 5 ").unwrap(), vec![4, 5]);
        assert_eq!(parse_id_csv("").unwrap(), Vec::<i64>::new());
    }

    #[test]
    fn id_csv_rejects_junk() {
        assert!(parse_id_csv("1,abc").is_err());
    }

    #[test]
    fn price_serializes_as_fixed_point_string() {
        let summary = RecipeSummary {
            id: 1,
            title: "Sample Recipe".into(),
            price: dec("5.00"),
            time_minutes: 10,
            tags: vec![],
            ingredients: vec![],
            link: None,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains(r#""price":"5.00""#));
    }

    #[test]
    fn create_request_defaults_empty_associations() {
        let req: CreateRecipeRequest =
            serde_json::from_str(r#"{"title": "Soup", "price": "3.50", "time_minutes": 5}"#)
                .unwrap();
        assert!(req.tag_ids.is_empty());
        assert!(req.ingredient_ids.is_empty());
        assert_eq!(req.price.unwrap(), dec("3.50"));
    }
}
