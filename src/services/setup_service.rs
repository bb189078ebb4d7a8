//! Shared party configuration: categories, announced winners and the show date.
//!
//! Each of the three fields is persisted under its own cache key and forwarded to
//! the remote store as a single-field [`ConfigPatch`], so concurrent edits of
//! different fields never overwrite each other.

use std::collections::HashSet;

use time::{
    Date, OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339,
    macros::format_description,
};
use tracing::debug;

use crate::{
    dao::{
        local_cache::Collection,
        models::{CategoryEntity, ConfigPatch, Winners},
    },
    error::{ServiceError, ValidationError},
    services::defaults,
    state::{AppState, SyncKind, SyncPayload},
};

const MILLIS_PER_DAY: i128 = 86_400_000;

/// Configured categories, empty when none were saved.
pub fn get_categories(state: &AppState) -> Vec<CategoryEntity> {
    state
        .cache()
        .read::<Vec<CategoryEntity>>(Collection::Categories)
        .unwrap_or_default()
}

/// Built-in category list.
pub fn default_categories() -> Vec<CategoryEntity> {
    defaults::default_categories()
}

/// Configured categories, or the built-in list when nothing was configured yet.
pub fn categories_or_default(state: &AppState) -> Vec<CategoryEntity> {
    let categories = get_categories(state);
    if categories.is_empty() {
        default_categories()
    } else {
        categories
    }
}

/// Whether at least one configured category has nominees.
pub fn categories_configured(state: &AppState) -> bool {
    get_categories(state).iter().any(CategoryEntity::has_nominees)
}

/// Trim names and nominees, drop blank nominees and nameless categories.
fn clean_categories(
    categories: Vec<CategoryEntity>,
) -> Result<Vec<CategoryEntity>, ValidationError> {
    let mut seen = HashSet::new();
    let mut cleaned = Vec::with_capacity(categories.len());
    for category in categories {
        let name = category.name.trim();
        if name.is_empty() {
            continue;
        }
        if !seen.insert(name.to_string()) {
            return Err(ValidationError::DuplicateCategory {
                name: name.to_string(),
            });
        }
        let nominees = category
            .nominees
            .iter()
            .map(|nominee| nominee.trim())
            .filter(|nominee| !nominee.is_empty());
        cleaned.push(CategoryEntity::new(name, nominees));
    }
    Ok(cleaned)
}

/// Replace the whole category list.
pub fn save_categories(
    state: &AppState,
    categories: Vec<CategoryEntity>,
) -> Result<Vec<CategoryEntity>, ServiceError> {
    let categories = clean_categories(categories)?;
    state.cache().write(Collection::Categories, &categories);
    debug!(count = categories.len(), "categories saved");

    state
        .events()
        .publish(SyncKind::CategoriesUpdated, SyncPayload::default());
    state
        .sync()
        .push_config(ConfigPatch::categories(categories.clone()));
    Ok(categories)
}

/// Announced winners keyed by category.
pub fn get_winners(state: &AppState) -> Winners {
    state
        .cache()
        .read::<Winners>(Collection::Winners)
        .unwrap_or_default()
}

/// Announce `nominee` as the winner of `category`.
///
/// The category must be configured and list the nominee.
pub fn set_winner(
    state: &AppState,
    category: &str,
    nominee: &str,
) -> Result<Winners, ServiceError> {
    let categories = get_categories(state);
    let Some(configured) = categories.iter().find(|c| c.name == category) else {
        return Err(ValidationError::UnknownCategory {
            category: category.to_string(),
        }
        .into());
    };
    if !configured.nominees.iter().any(|n| n == nominee) {
        return Err(ValidationError::UnknownNominee {
            category: category.to_string(),
            nominee: nominee.to_string(),
        }
        .into());
    }

    let winners = {
        let _gate = state.cache().lock();
        let mut winners = get_winners(state);
        winners.insert(category.to_string(), nominee.to_string());
        state.cache().write(Collection::Winners, &winners);
        winners
    };

    state.events().publish(
        SyncKind::WinnersUpdated,
        SyncPayload::winner(category, Some(nominee.to_string())),
    );
    state.sync().push_config(ConfigPatch::winners(winners.clone()));
    Ok(winners)
}

/// Withdraw the announcement for `category`; unknown categories are a no-op write.
pub fn clear_winner(state: &AppState, category: &str) -> Winners {
    let winners = {
        let _gate = state.cache().lock();
        let mut winners = get_winners(state);
        winners.shift_remove(category);
        state.cache().write(Collection::Winners, &winners);
        winners
    };

    state
        .events()
        .publish(SyncKind::WinnersUpdated, SyncPayload::winner(category, None));
    state.sync().push_config(ConfigPatch::winners(winners.clone()));
    winners
}

/// Clear the winner when `nominee` already holds it, otherwise announce it.
///
/// Returns the winner of the category after the change.
pub fn toggle_winner(
    state: &AppState,
    category: &str,
    nominee: &str,
) -> Result<Option<String>, ServiceError> {
    let current = get_winners(state).get(category).cloned();
    if current.as_deref() == Some(nominee) {
        clear_winner(state, category);
        Ok(None)
    } else {
        set_winner(state, category, nominee)?;
        Ok(Some(nominee.to_string()))
    }
}

/// Stored show date, empty when unset.
pub fn get_show_date(state: &AppState) -> String {
    state
        .cache()
        .read::<String>(Collection::ShowDate)
        .unwrap_or_default()
}

/// Store the show date. An empty value unsets it.
pub fn set_show_date(state: &AppState, value: &str) -> Result<String, ServiceError> {
    let value = value.trim().to_string();
    if !value.is_empty() && parse_show_date(&value).is_none() {
        return Err(ValidationError::InvalidShowDate { value }.into());
    }
    state.cache().write(Collection::ShowDate, &value);

    state
        .events()
        .publish(SyncKind::ShowDateUpdated, SyncPayload::default());
    state.sync().push_config(ConfigPatch::show_date(value.clone()));
    Ok(value)
}

/// Whole days until the show, rounded up; `None` when no usable date is stored.
pub fn days_until_show(state: &AppState) -> Option<i64> {
    days_until(&get_show_date(state), OffsetDateTime::now_utc())
}

/// Ceiling of the days between `now` and `show_date`.
pub fn days_until(show_date: &str, now: OffsetDateTime) -> Option<i64> {
    if show_date.is_empty() {
        return None;
    }
    let show = parse_show_date(show_date)?;
    let millis = (show - now).whole_milliseconds();
    let mut days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) != 0 {
        days += 1;
    }
    i64::try_from(days).ok()
}

/// Accepts RFC 3339, a bare `YYYY-MM-DDTHH:MM[:SS]` taken as UTC, or a
/// `YYYY-MM-DD` date meaning UTC midnight.
pub fn parse_show_date(value: &str) -> Option<OffsetDateTime> {
    if let Ok(at) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(at);
    }
    let with_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let without_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    if let Ok(at) = PrimitiveDateTime::parse(value, with_seconds)
        .or_else(|_| PrimitiveDateTime::parse(value, without_seconds))
    {
        return Some(at.assume_utc());
    }
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}
