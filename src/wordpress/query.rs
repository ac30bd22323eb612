// Query-string construction for content API requests.

use chrono::{Datelike, NaiveDate};
use serde_json::{json, Map, Value};

use crate::config::PaginationConfig;
use crate::error::{ContentError, ContentResult};

use super::types::Relation;

/// Fields requested for post listings and single posts.
pub const POST_FIELDS: &[&str] = &[
    "id",
    "title",
    "slug",
    "excerpt",
    "date",
    "featured_media",
    "categories",
    "tags",
    "author",
    "_links",
    "_embedded",
    "acf.cooking_time",
    "acf.difficulty",
];

pub const CATEGORY_FIELDS: &[&str] = &["id", "name", "slug", "count"];

pub const TAG_FIELDS: &[&str] = &["id", "name", "slug", "count"];

pub const RECIPE_FIELDS: &[&str] = &[
    "acf.recipe_details",
    "acf.cooking_time",
    "acf.difficulty",
    "acf.servings",
    "acf.ingredients",
    "acf.instructions",
];

/// Just enough to link to a post.
pub const SUMMARY_FIELDS: &[&str] = &["id", "title", "slug"];

/// Relations embedded alongside posts on listing pages.
pub const POST_RELATIONS: &[Relation] =
    &[Relation::Author, Relation::FeaturedMedia, Relation::Term];

/// Taxonomy listings fetch everything in one page.
pub const TAXONOMY_PAGE_SIZE: u32 = 100;

/// Requested page and page size. `per_page: None` means the configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: Option<u32>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: None,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page,
            per_page: Some(per_page),
        }
    }

    pub fn page(page: u32) -> Self {
        Self {
            page,
            ..Default::default()
        }
    }

    /// `(page, per_page)` as sent upstream: page at least 1, page size
    /// within `1..=max_page_size`.
    pub fn effective(&self, limits: &PaginationConfig) -> (u32, u32) {
        let max = limits.max_page_size.max(1);
        let per_page = self.per_page.unwrap_or(limits.default_page_size);
        (self.page.max(1), per_page.clamp(1, max))
    }
}

/// Which related resources to inline under `_embed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Embed {
    All,
    Only(&'static [Relation]),
}

impl Embed {
    pub fn value(&self) -> String {
        match self {
            Embed::All => "true".to_string(),
            Embed::Only(relations) => relations
                .iter()
                .map(Relation::as_str)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Date,
    Relevance,
    CommentCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Order {
    pub by: OrderBy,
    pub direction: Direction,
}

impl Order {
    pub fn newest_first() -> Self {
        Self {
            by: OrderBy::Date,
            direction: Direction::Desc,
        }
    }

    pub fn oldest_first() -> Self {
        Self {
            by: OrderBy::Date,
            direction: Direction::Asc,
        }
    }
}

impl OrderBy {
    fn as_str(&self) -> &'static str {
        match self {
            OrderBy::Date => "date",
            OrderBy::Relevance => "relevance",
            OrderBy::CommentCount => "comment_count",
        }
    }
}

impl Direction {
    fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// Recipe custom-field filters. Every present filter must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaFilter {
    pub cooking_time: Option<String>,
    pub difficulty: Option<String>,
}

impl MetaFilter {
    pub fn is_empty(&self) -> bool {
        self.cooking_time.is_none() && self.difficulty.is_none()
    }

    /// The `meta_query` parameter, or `None` when no filter is set.
    pub fn to_meta_query(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let mut clauses = Map::new();
        clauses.insert("relation".to_string(), Value::from("AND"));
        for (key, value) in [
            ("cooking_time", &self.cooking_time),
            ("difficulty", &self.difficulty),
        ] {
            if let Some(value) = value {
                clauses.insert(
                    key.to_string(),
                    json!({ "key": key, "value": value, "compare": "=" }),
                );
            }
        }
        Some(Value::Object(clauses).to_string())
    }
}

/// Filters accepted by the advanced recipe search.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub query: Option<String>,
    pub categories: Vec<u64>,
    pub tags: Vec<u64>,
    pub meta: MetaFilter,
    pub pagination: Pagination,
}

/// Half-open publish-date window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// A whole month, or the whole year when `month` is `None`.
    pub fn for_period(year: i32, month: Option<u32>) -> ContentResult<Self> {
        let invalid = || {
            ContentError::InvalidQuery(match month {
                Some(m) => format!("no such period: {}-{:02}", year, m),
                None => format!("no such year: {}", year),
            })
        };

        let (start, end) = match month {
            None => (
                NaiveDate::from_ymd_opt(year, 1, 1),
                NaiveDate::from_ymd_opt(year.saturating_add(1), 1, 1),
            ),
            Some(12) => (
                NaiveDate::from_ymd_opt(year, 12, 1),
                NaiveDate::from_ymd_opt(year.saturating_add(1), 1, 1),
            ),
            Some(m) => (
                NaiveDate::from_ymd_opt(year, m, 1),
                NaiveDate::from_ymd_opt(year, m.saturating_add(1), 1),
            ),
        };

        match (start, end) {
            (Some(start), Some(end)) => Ok(Self { start, end }),
            _ => Err(invalid()),
        }
    }

    pub fn after(&self) -> String {
        timestamp(self.start)
    }

    pub fn before(&self) -> String {
        timestamp(self.end)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }
}

fn timestamp(date: NaiveDate) -> String {
    format!("{}T00:00:00", date.format("%Y-%m-%d"))
}

/// Multi-value filters travel as one comma-separated parameter.
pub fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Ordered query parameters for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn paginate(self, pagination: Pagination, limits: &PaginationConfig) -> Self {
        let (page, per_page) = pagination.effective(limits);
        self.param("page", page).param("per_page", per_page)
    }

    pub fn per_page(self, per_page: u32) -> Self {
        self.param("per_page", per_page)
    }

    pub fn fields(self, fields: &[&str]) -> Self {
        self.param("_fields", fields.join(","))
    }

    pub fn embed(self, embed: Embed) -> Self {
        self.param("_embed", embed.value())
    }

    /// Skipped entirely when `ids` is empty.
    pub fn ids(self, key: &str, ids: &[u64]) -> Self {
        if ids.is_empty() {
            self
        } else {
            self.param(key, join_ids(ids))
        }
    }

    pub fn order(self, order: Order) -> Self {
        self.param("orderby", order.by.as_str())
            .param("order", order.direction.as_str())
    }

    pub fn date_range(self, range: &DateRange) -> Self {
        self.param("after", range.after())
            .param("before", range.before())
    }

    pub fn meta(self, meta: &MetaFilter) -> Self {
        match meta.to_meta_query() {
            Some(query) => self.param("meta_query", query),
            None => self,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> PaginationConfig {
        PaginationConfig {
            default_page_size: 12,
            max_page_size: 100,
        }
    }

    #[test]
    fn per_page_above_max_is_clamped() {
        for requested in [101, 250, u32::MAX] {
            let (_, per_page) = Pagination::new(1, requested).effective(&limits());
            assert_eq!(per_page, 100);
        }
    }

    #[test]
    fn pagination_defaults_and_lower_bounds() {
        assert_eq!(Pagination::default().effective(&limits()), (1, 12));
        assert_eq!(Pagination::new(0, 0).effective(&limits()), (1, 1));
        assert_eq!(Pagination::new(3, 24).effective(&limits()), (3, 24));
    }

    #[test]
    fn multi_value_filters_are_comma_joined() {
        assert_eq!(join_ids(&[3, 7]), "3,7");
        let query = Query::new().ids("categories", &[3, 7]).ids("tags", &[]);
        assert_eq!(query.get("categories"), Some("3,7"));
        assert_eq!(query.get("tags"), None);
    }

    #[test]
    fn month_range_is_half_open() {
        let range = DateRange::for_period(2024, Some(2)).unwrap();
        assert_eq!(range.after(), "2024-02-01T00:00:00");
        assert_eq!(range.before(), "2024-03-01T00:00:00");
        assert!(range.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
    }

    #[test]
    fn year_range_covers_calendar_year() {
        let range = DateRange::for_period(2024, None).unwrap();
        assert_eq!(range.after(), "2024-01-01T00:00:00");
        assert_eq!(range.before(), "2025-01-01T00:00:00");
        assert_eq!(range.year(), 2024);
    }

    #[test]
    fn december_rolls_into_next_year() {
        let range = DateRange::for_period(2023, Some(12)).unwrap();
        assert_eq!(range.after(), "2023-12-01T00:00:00");
        assert_eq!(range.before(), "2024-01-01T00:00:00");
    }

    #[test]
    fn invalid_month_is_rejected() {
        for month in [0, 13] {
            let err = DateRange::for_period(2024, Some(month)).unwrap_err();
            assert_eq!(err.status(), 400);
        }
    }

    #[test]
    fn meta_filters_are_and_combined() {
        let meta = MetaFilter {
            cooking_time: Some("30".into()),
            difficulty: Some("easy".into()),
        };
        let parsed: Value = serde_json::from_str(&meta.to_meta_query().unwrap()).unwrap();
        assert_eq!(parsed["relation"], "AND");
        assert_eq!(parsed["cooking_time"]["key"], "cooking_time");
        assert_eq!(parsed["cooking_time"]["value"], "30");
        assert_eq!(parsed["difficulty"]["compare"], "=");
    }

    #[test]
    fn single_meta_filter_omits_the_other_clause() {
        let meta = MetaFilter {
            difficulty: Some("hard".into()),
            ..Default::default()
        };
        let parsed: Value = serde_json::from_str(&meta.to_meta_query().unwrap()).unwrap();
        assert!(parsed.get("cooking_time").is_none());
        assert_eq!(parsed["difficulty"]["value"], "hard");
        assert!(MetaFilter::default().to_meta_query().is_none());
    }

    #[test]
    fn embed_and_order_render_wire_values() {
        let query = Query::new()
            .embed(Embed::Only(POST_RELATIONS))
            .order(Order::newest_first())
            .fields(CATEGORY_FIELDS);
        assert_eq!(query.get("_embed"), Some("author,wp:featuredmedia,wp:term"));
        assert_eq!(query.get("orderby"), Some("date"));
        assert_eq!(query.get("order"), Some("desc"));
        assert_eq!(query.get("_fields"), Some("id,name,slug,count"));
        assert_eq!(Embed::All.value(), "true");
    }
}
