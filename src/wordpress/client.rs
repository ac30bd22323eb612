// Async client for the content API.
// One method per resource or query shape. Every call is a single
// outbound request with no retry; failures surface as `ContentError`.

use std::collections::BTreeMap;

use reqwest::{header, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{ApiConfig, Config, PaginationConfig};
use crate::error::{ContentError, ContentResult};

use super::query::{
    DateRange, Direction, Embed, Order, OrderBy, Pagination, Query, SearchFilters,
    CATEGORY_FIELDS, POST_FIELDS, POST_RELATIONS, RECIPE_FIELDS, SUMMARY_FIELDS, TAG_FIELDS,
    TAXONOMY_PAGE_SIZE,
};
use super::types::*;

const TOTAL_HEADER: &str = "X-WP-Total";
const TOTAL_PAGES_HEADER: &str = "X-WP-TotalPages";

/// Custom post types and taxonomies live next to the core ones.
const CUSTOM_CONTENT_BASE: &str = "/wp/v2";

/// Stateless content API client. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct ContentClient {
    api: ApiConfig,
    pagination: PaginationConfig,
    http: reqwest::Client,
}

impl ContentClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_http(config, builder.build()?))
    }

    pub fn with_http(config: &Config, http: reqwest::Client) -> Self {
        Self {
            api: config.api.clone(),
            pagination: config.pagination.clone(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.api.base_url
    }

    // ==================== Posts ====================

    /// Newest posts first, with author, featured image and terms embedded.
    pub async fn posts(&self, pagination: Pagination) -> ContentResult<Vec<Post>> {
        let query = self.post_listing(pagination).order(Order::newest_first());
        self.get_json(&self.api.endpoints.posts, query).await
    }

    pub async fn post(&self, id: u64) -> ContentResult<Post> {
        let query = Query::new()
            .fields(POST_FIELDS)
            .embed(Embed::Only(POST_RELATIONS));
        self.get_one(&self.api.endpoints.posts, id, query, "post").await
    }

    pub async fn post_by_slug(&self, slug: &str) -> ContentResult<Post> {
        let query = Query::new()
            .param("slug", slug)
            .embed(Embed::Only(POST_RELATIONS))
            .fields(POST_FIELDS);
        let posts = self.get_json(&self.api.endpoints.posts, query).await?;
        first_or_not_found(posts, "post", slug)
    }

    /// Recipe custom fields of one post. A post without them yields empty details.
    pub async fn recipe_details(&self, post_id: u64) -> ContentResult<RecipeDetails> {
        let query = Query::new().fields(RECIPE_FIELDS);
        let envelope: AcfEnvelope = self
            .get_one(&self.api.endpoints.posts, post_id, query, "post")
            .await?;
        Ok(envelope.acf.unwrap_or_default())
    }

    /// Free-text search AND-combined with taxonomy and recipe meta filters.
    pub async fn search_with_filters(&self, filters: &SearchFilters) -> ContentResult<Vec<Post>> {
        let mut query = Query::new();
        if let Some(text) = filters.query.as_deref().map(str::trim) {
            if !text.is_empty() {
                query = query.param("search", text);
            }
        }
        let query = query
            .paginate(filters.pagination, &self.pagination)
            .embed(Embed::Only(POST_RELATIONS))
            .fields(POST_FIELDS)
            .ids("categories", &filters.categories)
            .ids("tags", &filters.tags)
            .meta(&filters.meta);
        self.get_json(&self.api.endpoints.posts, query).await
    }

    pub async fn search(&self, text: &str, pagination: Pagination) -> ContentResult<Vec<Post>> {
        let query = Query::new()
            .param("search", text)
            .paginate(pagination, &self.pagination)
            .embed(Embed::All)
            .param("orderby", "relevance");
        self.get_json(&self.api.endpoints.posts, query).await
    }

    pub async fn posts_by_category(
        &self,
        category_id: u64,
        pagination: Pagination,
    ) -> ContentResult<Vec<Post>> {
        let query = Query::new()
            .param("categories", category_id)
            .paginate(pagination, &self.pagination)
            .embed(Embed::All);
        self.get_json(&self.api.endpoints.posts, query).await
    }

    pub async fn posts_by_tag(
        &self,
        tag_id: u64,
        pagination: Pagination,
    ) -> ContentResult<Vec<Post>> {
        let query = Query::new()
            .param("tags", tag_id)
            .paginate(pagination, &self.pagination)
            .embed(Embed::Only(POST_RELATIONS));
        self.get_json(&self.api.endpoints.posts, query).await
    }

    pub async fn posts_by_author(
        &self,
        author_id: u64,
        pagination: Pagination,
    ) -> ContentResult<Vec<Post>> {
        let query = Query::new()
            .param("author", author_id)
            .paginate(pagination, &self.pagination)
            .embed(Embed::All);
        self.get_json(&self.api.endpoints.posts, query).await
    }

    /// Posts published in a month, or in a whole year when `month` is `None`.
    pub async fn posts_by_date(
        &self,
        year: i32,
        month: Option<u32>,
        pagination: Pagination,
    ) -> ContentResult<Vec<Post>> {
        let range = DateRange::for_period(year, month)?;
        let query = Query::new()
            .date_range(&range)
            .paginate(pagination, &self.pagination)
            .embed(Embed::All);
        self.get_json(&self.api.endpoints.posts, query).await
    }

    /// Filter on an arbitrary taxonomy query parameter, e.g. `("cuisine", "12")`.
    pub async fn posts_by_taxonomy(&self, taxonomy: &str, term: &str) -> ContentResult<Vec<Post>> {
        let query = Query::new().param(taxonomy, term).embed(Embed::All);
        self.get_json(&self.api.endpoints.posts, query).await
    }

    pub async fn recent_posts(&self, limit: u32) -> ContentResult<Vec<Post>> {
        let query = Query::new()
            .per_page(self.limit(limit))
            .fields(SUMMARY_FIELDS)
            .order(Order::newest_first());
        self.get_json(&self.api.endpoints.posts, query).await
    }

    /// Posts sharing any of `category_ids`, excluding `post_id` itself.
    pub async fn related_posts(
        &self,
        post_id: u64,
        category_ids: &[u64],
        limit: u32,
    ) -> ContentResult<Vec<Post>> {
        let query = Query::new()
            .ids("categories", category_ids)
            .param("exclude", post_id)
            .per_page(self.limit(limit))
            .embed(Embed::All);
        self.get_json(&self.api.endpoints.posts, query).await
    }

    /// Most commented first.
    pub async fn popular_posts(&self, limit: u32) -> ContentResult<Vec<Post>> {
        let query = Query::new()
            .order(Order {
                by: OrderBy::CommentCount,
                direction: Direction::Desc,
            })
            .per_page(self.limit(limit))
            .embed(Embed::All);
        self.get_json(&self.api.endpoints.posts, query).await
    }

    /// Sticky posts.
    pub async fn featured_posts(&self) -> ContentResult<Vec<Post>> {
        let query = Query::new().param("sticky", "true").embed(Embed::All);
        self.get_json(&self.api.endpoints.posts, query).await
    }

    /// The post published right after `post`, by publish date.
    pub async fn next_post(&self, post: &Post) -> ContentResult<Option<Post>> {
        self.adjacent_post(post, "after", Order::oldest_first()).await
    }

    /// The post published right before `post`, by publish date.
    pub async fn previous_post(&self, post: &Post) -> ContentResult<Option<Post>> {
        self.adjacent_post(post, "before", Order::newest_first()).await
    }

    async fn adjacent_post(
        &self,
        post: &Post,
        bound: &str,
        order: Order,
    ) -> ContentResult<Option<Post>> {
        if post.date.is_empty() {
            return Err(ContentError::InvalidQuery(format!(
                "post {} has no publish date",
                post.id
            )));
        }

        let query = Query::new()
            .param(bound, &post.date)
            .param("exclude", post.id)
            .order(order)
            .per_page(1)
            .embed(Embed::All);
        let posts: Vec<Post> = self.get_json(&self.api.endpoints.posts, query).await?;
        Ok(posts.into_iter().next())
    }

    /// Posts of a custom post type by its REST base, e.g. `"recipes"`.
    pub async fn custom_posts(
        &self,
        post_type: &str,
        pagination: Pagination,
    ) -> ContentResult<Vec<Post>> {
        let query = Query::new()
            .paginate(pagination, &self.pagination)
            .embed(Embed::All);
        self.get_json_at(CUSTOM_CONTENT_BASE, &[post_type], query).await
    }

    pub async fn total_posts(&self) -> ContentResult<u64> {
        self.post_count_header(TOTAL_HEADER).await
    }

    /// Number of pages at a page size of one, as reported upstream.
    pub async fn total_pages(&self) -> ContentResult<u64> {
        self.post_count_header(TOTAL_PAGES_HEADER).await
    }

    async fn post_count_header(&self, name: &str) -> ContentResult<u64> {
        let response = self
            .send_get(&self.api.endpoints.posts, &[], &Query::new().per_page(1))
            .await?;
        Ok(response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0))
    }

    // ==================== Taxonomies ====================

    pub async fn categories(&self) -> ContentResult<Vec<Category>> {
        let query = Query::new()
            .per_page(TAXONOMY_PAGE_SIZE)
            .fields(CATEGORY_FIELDS);
        self.get_json(&self.api.endpoints.categories, query).await
    }

    pub async fn category_by_slug(&self, slug: &str) -> ContentResult<Category> {
        let query = Query::new().param("slug", slug);
        let categories = self.get_json(&self.api.endpoints.categories, query).await?;
        first_or_not_found(categories, "category", slug)
    }

    /// Tags in use by at least one post.
    pub async fn tags(&self) -> ContentResult<Vec<Tag>> {
        let query = Query::new()
            .per_page(TAXONOMY_PAGE_SIZE)
            .fields(TAG_FIELDS)
            .param("hide_empty", "true");
        self.get_json(&self.api.endpoints.tags, query).await
    }

    pub async fn tag_by_slug(&self, slug: &str) -> ContentResult<Tag> {
        let query = Query::new().param("slug", slug);
        let tags = self.get_json(&self.api.endpoints.tags, query).await?;
        first_or_not_found(tags, "tag", slug)
    }

    /// Categories and tags for search filters, fetched concurrently. Both must succeed.
    pub async fn search_facets(&self) -> ContentResult<SearchFacets> {
        let (categories, tags) = tokio::try_join!(self.categories(), self.tags())?;
        Ok(SearchFacets { categories, tags })
    }

    pub async fn taxonomies(&self) -> ContentResult<Vec<Taxonomy>> {
        let taxonomies: ListOrKeyed<Taxonomy> = self
            .get_json(&self.api.endpoints.taxonomies, Query::new())
            .await?;
        Ok(taxonomies.into_vec())
    }

    /// Terms of any taxonomy by its REST base, e.g. `"categories"` or `"cuisine"`.
    pub async fn terms(&self, taxonomy: &str) -> ContentResult<Vec<Term>> {
        self.get_json_at(CUSTOM_CONTENT_BASE, &[taxonomy], Query::new()).await
    }

    // ==================== Pages & media ====================

    pub async fn pages(&self, pagination: Pagination) -> ContentResult<Vec<Page>> {
        let query = Query::new()
            .paginate(pagination, &self.pagination)
            .embed(Embed::All);
        self.get_json(&self.api.endpoints.pages, query).await
    }

    pub async fn page_by_slug(&self, slug: &str) -> ContentResult<Page> {
        let query = Query::new().param("slug", slug).embed(Embed::All);
        let pages = self.get_json(&self.api.endpoints.pages, query).await?;
        first_or_not_found(pages, "page", slug)
    }

    pub async fn media(&self, id: u64) -> ContentResult<Media> {
        self.get_one(&self.api.endpoints.media, id, Query::new(), "media").await
    }

    // ==================== Authors & comments ====================

    pub async fn author(&self, id: u64) -> ContentResult<Author> {
        let query = Query::new().embed(Embed::All);
        self.get_one(&self.api.endpoints.users, id, query, "author").await
    }

    pub async fn author_by_slug(&self, slug: &str) -> ContentResult<Author> {
        let query = Query::new().param("slug", slug).embed(Embed::All);
        let authors = self.get_json(&self.api.endpoints.users, query).await?;
        first_or_not_found(authors, "author", slug)
    }

    /// Comments on one post, flat; threading is left to the caller.
    pub async fn comments(&self, post_id: u64) -> ContentResult<Vec<Comment>> {
        let query = Query::new().param("post", post_id).embed(Embed::All);
        self.get_json(&self.api.endpoints.comments, query).await
    }

    pub async fn recent_comments(&self, limit: u32) -> ContentResult<Vec<Comment>> {
        let query = Query::new().per_page(self.limit(limit)).embed(Embed::All);
        self.get_json(&self.api.endpoints.comments, query).await
    }

    /// Submit a comment and return it as stored upstream. Never retried.
    pub async fn submit_comment(&self, comment: &NewComment) -> ContentResult<Comment> {
        let url = self.url(&self.api.endpoints.comments, &[], &Query::new())?;
        tracing::debug!("POST {}", url);

        let response = self
            .http
            .post(url.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .json(comment)
            .send()
            .await
            .map_err(|e| ContentError::transport(e, url.as_str()))?;

        let response = check_status(response, url.as_str(), "Failed to submit comment")?;
        decode(response, url.as_str()).await
    }

    // ==================== Navigation & site ====================

    pub async fn menus(&self) -> ContentResult<Vec<Menu>> {
        self.get_json(&self.api.endpoints.menus, Query::new()).await
    }

    pub async fn menu_locations(&self) -> ContentResult<BTreeMap<String, MenuLocation>> {
        self.get_json(&self.api.endpoints.menu_locations, Query::new()).await
    }

    pub async fn menu_by_location(&self, location: &str) -> ContentResult<Vec<NavigationItem>> {
        self.get_json_at(&self.api.endpoints.menu_locations, &[location], Query::new()).await
    }

    pub async fn navigation(&self, id: u64) -> ContentResult<Navigation> {
        self.get_one(&self.api.endpoints.navigation, id, Query::new(), "navigation").await
    }

    pub async fn navigation_items(&self, navigation_id: u64) -> ContentResult<Vec<NavigationItem>> {
        let query = Query::new().param("navigation", navigation_id);
        self.get_json(&self.api.endpoints.navigation_items, query).await
    }

    /// Site-wide search across content types (`"post"`, `"page"`, ...).
    pub async fn search_content(
        &self,
        keyword: &str,
        kind: &str,
    ) -> ContentResult<Vec<SearchResult>> {
        let query = Query::new()
            .param("search", keyword)
            .param("type", kind)
            .embed(Embed::All);
        self.get_json(&self.api.endpoints.search, query).await
    }

    pub async fn archive_months(&self) -> ContentResult<Vec<ArchiveMonth>> {
        let query = Query::new().param("type", "monthly");
        self.get_json(&self.api.endpoints.archives, query).await
    }

    /// Name, description and timezone from the API index.
    pub async fn site_info(&self) -> ContentResult<SiteInfo> {
        self.get_json("", Query::new()).await
    }

    pub async fn post_types(&self) -> ContentResult<Vec<PostType>> {
        let types: ListOrKeyed<PostType> =
            self.get_json(&self.api.endpoints.types, Query::new()).await?;
        Ok(types.into_vec())
    }

    // ==================== Transport ====================

    fn post_listing(&self, pagination: Pagination) -> Query {
        Query::new()
            .paginate(pagination, &self.pagination)
            .embed(Embed::Only(POST_RELATIONS))
            .fields(POST_FIELDS)
    }

    fn limit(&self, limit: u32) -> u32 {
        limit.clamp(1, self.pagination.max_page_size.max(1))
    }

    /// `base_url + path`, then each of `segments` percent-encoded as a single
    /// path segment, so `/`, `?` and `#` never escape it.
    fn url(&self, path: &str, segments: &[&str], query: &Query) -> ContentResult<Url> {
        let raw = format!("{}{}", self.api.base_url, path);
        let bad_url =
            |reason: String| ContentError::InvalidQuery(format!("bad URL {}: {}", raw, reason));

        let mut url = Url::parse(&raw).map_err(|e| bad_url(e.to_string()))?;
        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|_| bad_url("cannot hold path segments".to_string()))?
                .pop_if_empty()
                .extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.pairs());
        }
        Ok(url)
    }

    async fn send_get(
        &self,
        path: &str,
        segments: &[&str],
        query: &Query,
    ) -> ContentResult<Response> {
        let url = self.url(path, segments, query)?;
        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ContentError::transport(e, url.as_str()))?;

        check_status(response, url.as_str(), "Content API error")
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: Query) -> ContentResult<T> {
        self.get_json_at(path, &[], query).await
    }

    async fn get_json_at<T: DeserializeOwned>(
        &self,
        path: &str,
        segments: &[&str],
        query: Query,
    ) -> ContentResult<T> {
        let response = self.send_get(path, segments, &query).await?;
        let url = response.url().to_string();
        decode(response, &url).await
    }

    /// Singular lookup at `endpoint/id`: an upstream 404 becomes `NotFound`.
    async fn get_one<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        id: u64,
        query: Query,
        resource: &'static str,
    ) -> ContentResult<T> {
        let id_segment = id.to_string();
        match self.get_json_at(endpoint, &[id_segment.as_str()], query).await {
            Err(ContentError::Upstream { status: 404, .. }) => {
                tracing::warn!("{} {} not found", resource, id);
                Err(ContentError::not_found(resource, id))
            }
            other => other,
        }
    }
}

fn check_status(response: Response, url: &str, context: &str) -> ContentResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    tracing::warn!("{} {} from {}", context, status, url);
    Err(ContentError::Upstream {
        status: status.as_u16(),
        message: format!("{}: {}", context, reason(status)),
        url: url.to_string(),
    })
}

fn reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown status")
}

async fn decode<T: DeserializeOwned>(response: Response, url: &str) -> ContentResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| ContentError::transport(e, url))
}

fn first_or_not_found<T>(items: Vec<T>, resource: &'static str, key: &str) -> ContentResult<T> {
    match items.into_iter().next() {
        Some(item) => Ok(item),
        None => {
            tracing::warn!("{} with slug {:?} not found", resource, key);
            Err(ContentError::not_found(resource, key))
        }
    }
}
