//! Blog schema shared by the integration tests.
//!
//! - Post belongs to an author and an editor (both User), has many comments,
//!   belongs to many tags through `post_tag`, morphs many images and may have
//!   a parent Post
//! - User belongs to a Company, which belongs to a Country
//! - Country has many posts through its users
//! - Supplier has one history row through a user
//! - Note declares no allow-lists at all

#![allow(dead_code)]

use traversify::{MissingConfigPolicy, ModelDef, RelationDef, Schema, Traversal, TraversifyConfig};

pub fn blog_schema() -> Schema {
    Schema::new()
        .with(
            ModelDef::new("Post", "posts")
                .soft_deletes()
                .relation("author", RelationDef::belongs_to("User", "author_id", "id"))
                .relation("editor", RelationDef::belongs_to("User", "editor_id", "id"))
                .relation("parent", RelationDef::belongs_to("Post", "parent_id", "id"))
                .relation(
                    "comments",
                    RelationDef::has_many("Comment", "post_id", "id").where_eq("approved", true),
                )
                .relation("tags", RelationDef::belongs_to_many("Tag", "post_tag", "post_id", "tag_id"))
                .relation("images", RelationDef::morph_many("Image", "imageable", "post", "id"))
                .filters([
                    "status",
                    "author.email",
                    "author.name",
                    "author.company.name",
                    "comments.body",
                    "tags.name",
                    "parent.title",
                    "images.url",
                ])
                .search(["title", "author.name", "id"])
                .sort(["title", "author.name", "editor.name", "author.company.country.name"])
                .range(["price", "published_at", "author.company.founded"])
                .autoload(["author", "tags", "comments"])
                .load_count(["comments", "tags"]),
        )
        .with(
            ModelDef::new("User", "users")
                .soft_deletes()
                .relation("company", RelationDef::belongs_to("Company", "company_id", "id"))
                .relation("posts", RelationDef::has_many("Post", "author_id", "id")),
        )
        .with(
            ModelDef::new("Company", "companies")
                .relation("country", RelationDef::belongs_to("Country", "country_id", "id")),
        )
        .with(
            ModelDef::new("Country", "countries")
                .relation("users", RelationDef::has_many("User", "country_id", "id"))
                .relation(
                    "posts",
                    RelationDef::has_many_through("Post", "User", "country_id", "author_id", "id", "id"),
                )
                .filters(["posts.title", "users.email"])
                .sort(["name"]),
        )
        .with(ModelDef::new("Comment", "comments"))
        .with(ModelDef::new("Tag", "tags"))
        .with(ModelDef::new("Image", "images"))
        .with(
            ModelDef::new("Supplier", "suppliers")
                .relation(
                    "history",
                    RelationDef::has_one_through("History", "User", "supplier_id", "user_id", "id", "id"),
                )
                .filters(["history.status"]),
        )
        .with(ModelDef::new("History", "history"))
        .with(ModelDef::new("Note", "notes"))
}

pub fn strict() -> TraversifyConfig {
    TraversifyConfig::default()
}

pub fn lenient() -> TraversifyConfig {
    TraversifyConfig::default().with_missing_config(MissingConfigPolicy::Lenient)
}

/// Traversal over `model` with default settings
pub fn traversal<'s>(schema: &'s Schema, model: &str) -> Traversal<'s> {
    Traversal::new(schema, model)
        .expect("model is registered")
        .with_config(strict())
}
