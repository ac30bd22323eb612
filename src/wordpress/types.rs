// Passthrough representations of the content API's resources.
// Listing calls narrow responses with `_fields`, so every struct defaults
// missing fields instead of failing to decode.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Rendered markup as returned by the API. Accepts both `"text"` and
/// `{"rendered": "text", "protected": false}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RenderedRepr")]
pub struct Rendered {
    pub rendered: String,
    pub protected: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RenderedRepr {
    Plain(String),
    Object {
        #[serde(default)]
        rendered: String,
        #[serde(default)]
        protected: bool,
    },
}

impl From<RenderedRepr> for Rendered {
    fn from(repr: RenderedRepr) -> Self {
        match repr {
            RenderedRepr::Plain(rendered) => Rendered {
                rendered,
                protected: false,
            },
            RenderedRepr::Object {
                rendered,
                protected,
            } => Rendered {
                rendered,
                protected,
            },
        }
    }
}

/// Some collection endpoints answer with an object keyed by slug rather than an array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListOrKeyed<T> {
    List(Vec<T>),
    Keyed(BTreeMap<String, T>),
}

impl<T> ListOrKeyed<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            ListOrKeyed::List(items) => items,
            ListOrKeyed::Keyed(map) => map.into_values().collect(),
        }
    }
}

/// Related resources the API can inline under `_embedded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Author,
    FeaturedMedia,
    Term,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::Author => "author",
            Relation::FeaturedMedia => "wp:featuredmedia",
            Relation::Term => "wp:term",
        }
    }
}

/// Side-table of embedded relations, keyed by relation name on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Embedded {
    pub author: Vec<Author>,
    #[serde(rename = "wp:featuredmedia")]
    pub featured_media: Vec<Media>,
    /// One inner list per taxonomy (categories, tags, ...).
    #[serde(rename = "wp:term")]
    pub terms: Vec<Vec<Term>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: u64,
    pub date: String,
    pub modified: String,
    pub slug: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub link: String,
    pub title: Rendered,
    pub content: Rendered,
    pub excerpt: Rendered,
    pub featured_media: u64,
    pub categories: Vec<u64>,
    pub tags: Vec<u64>,
    pub author: u64,
    pub comment_status: String,
    #[serde(deserialize_with = "lenient::object")]
    pub acf: Option<RecipeDetails>,
    pub yoast_head_json: Option<SeoHead>,
    #[serde(rename = "_embedded")]
    pub embedded: Option<Embedded>,
}

impl Post {
    pub fn embedded_author(&self) -> Option<&Author> {
        self.embedded.as_ref()?.author.first()
    }

    pub fn featured_image(&self) -> Option<&Media> {
        self.embedded.as_ref()?.featured_media.first()
    }

    /// Embedded terms of one taxonomy, e.g. `"category"` or `"post_tag"`.
    pub fn embedded_terms<'a>(&'a self, taxonomy: &'a str) -> impl Iterator<Item = &'a Term> {
        self.embedded
            .iter()
            .flat_map(|e| e.terms.iter())
            .flatten()
            .filter(move |t| t.taxonomy == taxonomy)
    }
}

/// Recipe meta stored in the `acf` custom-field block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipeDetails {
    pub recipe_details: Option<serde_json::Value>,
    #[serde(deserialize_with = "lenient::string")]
    pub cooking_time: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub difficulty: Option<String>,
    #[serde(deserialize_with = "lenient::string")]
    pub servings: Option<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub ingredients: Vec<String>,
    #[serde(deserialize_with = "lenient::string_list")]
    pub instructions: Vec<String>,
}

/// `posts/{id}?_fields=acf.*` answers `{"acf": {...}}`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AcfEnvelope {
    #[serde(deserialize_with = "lenient::object")]
    pub acf: Option<RecipeDetails>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoHead {
    pub title: String,
    pub description: String,
    pub og_image: Vec<SeoImage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Page {
    pub id: u64,
    pub date: String,
    pub modified: String,
    pub slug: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub link: String,
    pub title: Rendered,
    pub content: Rendered,
    pub excerpt: Rendered,
    pub featured_media: u64,
    pub parent: u64,
    pub menu_order: i64,
    pub template: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Media {
    pub id: u64,
    pub source_url: String,
    pub alt_text: String,
    pub media_details: MediaDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaDetails {
    pub width: u32,
    pub height: u32,
    pub sizes: BTreeMap<String, MediaSize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaSize {
    pub source_url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Category {
    pub id: u64,
    pub count: u64,
    pub description: String,
    pub link: String,
    pub name: String,
    pub slug: String,
    pub taxonomy: String,
    pub parent: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub id: u64,
    pub count: u64,
    pub description: String,
    pub link: String,
    pub name: String,
    pub slug: String,
    pub taxonomy: String,
}

/// A taxonomy term as embedded in posts or listed per taxonomy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Term {
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub taxonomy: String,
    pub description: String,
    pub count: u64,
    pub parent: u64,
    pub link: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Author {
    pub id: u64,
    pub name: String,
    pub url: String,
    pub description: String,
    pub link: String,
    pub slug: String,
    /// Avatar URLs keyed by pixel size ("24", "48", "96").
    pub avatar_urls: BTreeMap<String, String>,
}

impl Author {
    pub fn avatar(&self, size: u32) -> Option<&str> {
        self.avatar_urls.get(&size.to_string()).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    pub id: u64,
    pub post: u64,
    pub parent: u64,
    pub author: u64,
    pub author_name: String,
    pub author_url: String,
    pub date: String,
    pub content: Rendered,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Payload for submitting a comment.
#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub post: u64,
    pub author_name: String,
    pub author_email: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Menu {
    #[serde(alias = "term_id")]
    pub id: u64,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuItem {
    #[serde(alias = "ID", deserialize_with = "lenient::id")]
    pub id: u64,
    pub title: Rendered,
    pub url: String,
    pub description: String,
    pub menu_order: i64,
    #[serde(alias = "menu_item_parent", deserialize_with = "lenient::id")]
    pub parent: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub type_label: String,
    pub object: String,
    #[serde(deserialize_with = "lenient::id")]
    pub object_id: u64,
    pub target: String,
    #[serde(deserialize_with = "lenient::words")]
    pub classes: Vec<String>,
    pub attr_title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuLocation {
    pub name: String,
    pub description: String,
    pub menu: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Navigation {
    pub id: u64,
    pub title: Rendered,
    pub description: String,
    pub status: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub slug: String,
    pub content: Rendered,
}

/// Block navigation item, or a classic menu item as served per menu location
/// (`ID`, `menu_item_parent`, numeric strings, space-separated `xfn`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationItem {
    #[serde(alias = "ID", deserialize_with = "lenient::id")]
    pub id: u64,
    pub title: Rendered,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    pub url: String,
    pub menu_order: i64,
    pub menus: Vec<u64>,
    #[serde(alias = "menu_item_parent", deserialize_with = "lenient::id")]
    pub parent: u64,
    pub object: String,
    #[serde(deserialize_with = "lenient::id")]
    pub object_id: u64,
    pub target: String,
    pub attr_title: String,
    pub description: String,
    #[serde(deserialize_with = "lenient::words")]
    pub classes: Vec<String>,
    #[serde(deserialize_with = "lenient::words")]
    pub xfn: Vec<String>,
    pub invalid: bool,
    pub meta: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResult {
    pub id: u64,
    pub title: Rendered,
    #[serde(rename = "type")]
    pub kind: String,
    pub subtype: String,
    pub url: String,
    pub excerpt: Rendered,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteInfo {
    pub name: String,
    pub description: String,
    pub url: String,
    pub home: String,
    #[serde(deserialize_with = "lenient::number")]
    pub gmt_offset: f64,
    pub timezone_string: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostType {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub hierarchical: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Taxonomy {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveMonth {
    pub year: i32,
    pub month: u32,
    pub count: u64,
}

/// Categories and tags offered as search filters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchFacets {
    pub categories: Vec<Category>,
    pub tags: Vec<Tag>,
}

/// Deserializers for fields whose shape varies between sites and plugins.
mod lenient {
    use super::*;
    use serde_json::Value;

    /// ACF answers `false` or `[]` when a post has no custom fields.
    pub fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: serde::de::DeserializeOwned,
    {
        match Value::deserialize(deserializer)? {
            value @ Value::Object(_) => Ok(serde_json::from_value(value).ok()),
            _ => Ok(None),
        }
    }

    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) if s.is_empty() => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Value::String(s) if !s.is_empty() => s.lines().map(str::to_string).collect(),
            _ => Vec::new(),
        })
    }

    /// Ids arrive as numbers or as numeric strings (`"42"`).
    pub fn id<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_u64().unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        })
    }

    /// Either a list or one space-separated string; blanks are dropped.
    pub fn words<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    _ => None,
                })
                .collect(),
            Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
            _ => Vec::new(),
        })
    }

    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_f64().unwrap_or_default(),
            Value::String(s) => s.trim().parse().unwrap_or_default(),
            _ => 0.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn post_decodes_embedded_side_table() {
        let post: Post = serde_json::from_value(json!({
            "id": 42,
            "slug": "garlic-noodles",
            "title": { "rendered": "Garlic Noodles" },
            "excerpt": { "rendered": "<p>Quick</p>", "protected": false },
            "categories": [3, 7],
            "author": 2,
            "acf": { "cooking_time": 15, "difficulty": "easy" },
            "_embedded": {
                "author": [{ "id": 2, "name": "Tiffy", "slug": "tiffy",
                             "avatar_urls": { "96": "https://cdn/a96.png" } }],
                "wp:featuredmedia": [{
                    "id": 9,
                    "source_url": "https://cdn/n.jpg",
                    "media_details": { "width": 800, "height": 600, "sizes": {} }
                }],
                "wp:term": [
                    [{ "id": 3, "name": "Noodles", "slug": "noodles", "taxonomy": "category" }],
                    [{ "id": 11, "name": "Quick", "slug": "quick", "taxonomy": "post_tag" }]
                ]
            }
        }))
        .unwrap();

        assert_eq!(post.title.rendered, "Garlic Noodles");
        assert_eq!(post.categories, vec![3, 7]);
        let acf = post.acf.as_ref().unwrap();
        assert_eq!(acf.cooking_time.as_deref(), Some("15"));
        assert_eq!(acf.difficulty.as_deref(), Some("easy"));

        let author = post.embedded_author().unwrap();
        assert_eq!(author.name, "Tiffy");
        assert_eq!(author.avatar(96), Some("https://cdn/a96.png"));
        assert_eq!(post.featured_image().unwrap().media_details.width, 800);

        let tags: Vec<_> = post.embedded_terms("post_tag").map(|t| t.slug.as_str()).collect();
        assert_eq!(tags, vec!["quick"]);
    }

    #[test]
    fn post_without_embedding_or_acf_decodes() {
        let post: Post = serde_json::from_value(json!({
            "id": 1, "title": "Plain title", "acf": []
        }))
        .unwrap();

        assert_eq!(post.title.rendered, "Plain title");
        assert!(post.acf.is_none());
        assert!(post.embedded_author().is_none());
        assert_eq!(post.embedded_terms("category").count(), 0);
    }

    #[test]
    fn keyed_collections_flatten_to_a_list() {
        let types: ListOrKeyed<PostType> = serde_json::from_value(json!({
            "post": { "name": "Posts", "slug": "post", "hierarchical": false },
            "page": { "name": "Pages", "slug": "page", "hierarchical": true }
        }))
        .unwrap();

        let mut slugs: Vec<_> = types.into_vec().into_iter().map(|t| t.slug).collect();
        slugs.sort();
        assert_eq!(slugs, vec!["page", "post"]);
    }

    #[test]
    fn new_comment_omits_missing_parent() {
        let body = serde_json::to_value(NewComment {
            post: 42,
            author_name: "Sam".into(),
            author_email: "sam@example.com".into(),
            content: "Made this twice".into(),
            parent: None,
        })
        .unwrap();

        assert_eq!(body["post"], 42);
        assert!(body.get("parent").is_none());
    }

    #[test]
    fn classic_menu_item_decodes_with_string_ids() {
        let item: NavigationItem = serde_json::from_value(json!({
            "ID": 12,
            "title": "Recipes",
            "url": "https://tiffycooks.com/recipes",
            "menu_order": 1,
            "object": "category",
            "object_id": "42",
            "menu_item_parent": "0",
            "xfn": "nofollow noopener",
            "classes": [""]
        }))
        .unwrap();

        assert_eq!(item.id, 12);
        assert_eq!(item.title.rendered, "Recipes");
        assert_eq!(item.object_id, 42);
        assert_eq!(item.parent, 0);
        assert_eq!(item.xfn, vec!["nofollow", "noopener"]);
        assert!(item.classes.is_empty());

        let item: MenuItem =
            serde_json::from_value(json!({ "id": 5, "object_id": "7", "classes": "nav cta" }))
                .unwrap();
        assert_eq!(item.object_id, 7);
        assert_eq!(item.classes, vec!["nav", "cta"]);
    }

    #[test]
    fn site_info_accepts_string_offset() {
        let info: SiteInfo =
            serde_json::from_value(json!({ "name": "TiffyCooks", "gmt_offset": "-5" })).unwrap();
        assert_eq!(info.gmt_offset, -5.0);
    }
}
