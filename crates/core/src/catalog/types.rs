use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::CatalogError;

/// Timestamp format used by the portal.
pub const PORTAL_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A bookable activity from the portal's listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Activity {
    /// Opaque activity id.
    #[serde(rename = "WID")]
    pub id: String,
    /// Display name.
    #[serde(rename = "JZMC", default)]
    pub name: String,
    /// When reservations open, `YYYY-MM-DD HH:MM:SS` in portal time.
    #[serde(rename = "YYKSSJ", default)]
    pub opens_at_raw: String,
}

impl Activity {
    /// The instant reservations open, interpreting the raw timestamp at `offset`.
    pub fn opens_at(&self, offset: FixedOffset) -> Result<DateTime<Utc>, CatalogError> {
        let invalid = || CatalogError::InvalidTimestamp {
            id: self.id.clone(),
            value: self.opens_at_raw.clone(),
        };
        let naive = NaiveDateTime::parse_from_str(self.opens_at_raw.trim(), PORTAL_TIME_FORMAT)
            .map_err(|_| invalid())?;
        offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(invalid)
    }

    /// Online activities are flagged with this marker in their name.
    pub fn is_online(&self) -> bool {
        self.name.contains("线上")
    }
}

/// One page of the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPage {
    #[serde(default)]
    pub datas: Vec<Activity>,
    pub page_index: u64,
    #[serde(default)]
    pub page_size: u64,
    pub total: u64,
}

/// All activities of one fetch, unique by id, in listing order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    activities: Vec<Activity>,
    ids: HashSet<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add activities, skipping ids already present. Returns how many were added.
    pub fn extend(&mut self, activities: impl IntoIterator<Item = Activity>) -> usize {
        let before = self.activities.len();
        for activity in activities {
            if self.ids.insert(activity.id.clone()) {
                self.activities.push(activity);
            }
        }
        self.activities.len() - before
    }

    pub fn get(&self, id: &str) -> Option<&Activity> {
        if !self.ids.contains(id) {
            return None;
        }
        self.activities.iter().find(|a| a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Activity> {
        self.activities.iter()
    }

    pub fn len(&self) -> usize {
        self.activities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activities.is_empty()
    }
}

impl FromIterator<Activity> for Catalog {
    fn from_iter<I: IntoIterator<Item = Activity>>(iter: I) -> Self {
        let mut catalog = Catalog::new();
        catalog.extend(iter);
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(id: &str, name: &str, opens: &str) -> Activity {
        Activity {
            id: id.to_string(),
            name: name.to_string(),
            opens_at_raw: opens.to_string(),
        }
    }

    #[test]
    fn test_deserialize_activity() {
        let json = r#"{"WID":"a1b2","JZMC":"线上讲座: Rust","YYKSSJ":"2030-01-01 00:00:00","JZDD":"ignored"}"#;
        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.id, "a1b2");
        assert_eq!(activity.opens_at_raw, "2030-01-01 00:00:00");
        assert!(activity.is_online());
    }

    #[test]
    fn test_deserialize_page() {
        let json = r#"{"datas":[{"WID":"1","JZMC":"x","YYKSSJ":"2030-01-01 00:00:00"}],"pageIndex":1,"pageSize":10,"total":31}"#;
        let page: ActivityPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.datas.len(), 1);
        assert_eq!(page.page_index, 1);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.total, 31);
    }

    #[test]
    fn test_opens_at_applies_offset() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let opens = activity("1", "x", "2030-01-01 08:00:00")
            .opens_at(offset)
            .unwrap();
        assert_eq!(opens, Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_opens_at_rejects_bad_timestamp() {
        let offset = FixedOffset::east_opt(0).unwrap();
        let err = activity("1", "x", "2030/01/01")
            .opens_at(offset)
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_catalog_dedupes_by_id() {
        let mut catalog = Catalog::new();
        assert_eq!(catalog.extend(vec![activity("1", "a", ""), activity("2", "b", "")]), 2);
        assert_eq!(catalog.extend(vec![activity("2", "b'", ""), activity("3", "c", "")]), 1);

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("2").unwrap().name, "b");
        assert!(catalog.get("4").is_none());
        let ids: Vec<_> = catalog.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }
}
