use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::{CategoryEntity, Winners},
    dto::validation::validate_not_blank,
};

/// Award category with its nominees.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CategoryDto {
    pub name: String,
    #[serde(default)]
    pub nominees: Vec<String>,
}

impl From<CategoryEntity> for CategoryDto {
    fn from(category: CategoryEntity) -> Self {
        Self {
            name: category.name,
            nominees: category.nominees,
        }
    }
}

impl From<CategoryDto> for CategoryEntity {
    fn from(category: CategoryDto) -> Self {
        CategoryEntity::new(category.name, category.nominees)
    }
}

/// Whether the categories are usable for voting.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConfiguredResponse {
    pub configured: bool,
}

/// Announce a winner.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct WinnerRequest {
    #[validate(custom(function = "validate_not_blank"))]
    pub category: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub nominee: String,
}

/// Announced winners keyed by category.
#[derive(Debug, Serialize, ToSchema)]
#[schema(value_type = Object)]
#[serde(transparent)]
pub struct WinnersResponse(pub Winners);

/// Winner of a category after a toggle.
#[derive(Debug, Serialize, ToSchema)]
pub struct ToggleWinnerResponse {
    pub category: String,
    /// `null` when the announcement was withdrawn.
    pub winner: Option<String>,
}

/// Set or clear the show date.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShowDateRequest {
    /// RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` (UTC) or `YYYY-MM-DD`; empty to unset.
    #[serde(default)]
    pub show_date: String,
}

/// Stored show date and the countdown derived from it.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShowDateResponse {
    pub show_date: String,
    pub days_until_show: Option<i64>,
}
