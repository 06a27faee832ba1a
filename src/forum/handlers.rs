//! Forum route handlers and their registration.
//!
//! Every handler runs with exclusive access to the [`Database`]; the
//! dispatcher has already checked required body fields.

use axum::http::StatusCode;

use crate::config::ForumConfig;
use crate::forum::index::render_index;
use crate::forum::model::{Database, Post, Topic};
use crate::forum::static_files::StaticFiles;
use crate::http::response::HandlerResult;
use crate::routing::{HandlerContext, RouteError, RouteTable};

type Ctx<'a> = HandlerContext<'a, Database>;

const CREATE_TOPIC_FIELDS: &[(&str, &str)] = &[
    ("user", "The username of the user posting."),
    ("title", "The title of the topic. A string."),
    ("text", "The content of the first post. A string."),
];

const CREATE_POST_FIELDS: &[(&str, &str)] = &[
    ("user", "The username of the user posting."),
    ("text", "The content of the post. A string."),
];

const DELETE_TOPIC_FIELDS: &[(&str, &str)] = &[(
    "user",
    "The username of the logged-in user. Must match the username of the topic creator",
)];

/// Register the forum API, the index page and the static catch-all.
///
/// Order matters: the catch-all OPTIONS and GET routes come last.
pub fn register_routes(
    routes: &mut RouteTable<Database>,
    config: &ForumConfig,
) -> Result<(), RouteError> {
    let unknown_user = StatusCode::from_u16(config.unknown_user_status).unwrap_or(StatusCode::OK);
    let files = StaticFiles::new(&config.static_dir);

    routes
        .get(r"^/?$", index)?
        .get(r"^/api/topics/?$", list_topics)?
        .get(r"^/api/topics/(\d+)/?$", get_topic)?
        .get(r"^/api/topics/(\d+)/posts/?$", list_posts)?
        .get(r"^/api/users/?$", list_users)?
        .get(r"^/api/users/(\w+)/?$", get_user)?
        .get(r"^/api/users/(\w+)/topics/?$", list_user_topics)?
        .post(r"^/api/topics/?$", CREATE_TOPIC_FIELDS, move |db, ctx| {
            create_topic(db, ctx, unknown_user)
        })?
        .post(r"^/api/topics/(\d+)/posts/?$", CREATE_POST_FIELDS, move |db, ctx| {
            create_post(db, ctx, unknown_user)
        })?
        .delete(r"^/api/topics/(\d+)/?$", DELETE_TOPIC_FIELDS, delete_topic)?
        .options("^", |_, _| HandlerResult::empty(StatusCode::OK))?
        .get("^", move |_, ctx| serve_static(&files, ctx))?;

    Ok(())
}

fn no_topic(id: &str) -> HandlerResult {
    HandlerResult::error(StatusCode::NOT_FOUND, format!("No matching topic {id}"))
}

fn no_user(status: StatusCode, username: &str) -> HandlerResult {
    HandlerResult::error(status, format!("No matching user {username}"))
}

fn index(db: &mut Database, ctx: &Ctx<'_>) -> HandlerResult {
    HandlerResult::html(render_index(ctx.routes.routes(), db))
}

fn list_topics(db: &mut Database, _ctx: &Ctx<'_>) -> HandlerResult {
    HandlerResult::json(&db.summaries())
}

fn get_topic(db: &mut Database, ctx: &Ctx<'_>) -> HandlerResult {
    let id = ctx.param(0);
    match db.topic(id) {
        Some(topic) => HandlerResult::json(topic),
        None => no_topic(id),
    }
}

fn list_posts(db: &mut Database, ctx: &Ctx<'_>) -> HandlerResult {
    let id = ctx.param(0);
    match db.topic(id) {
        Some(topic) => HandlerResult::json(&db.authored_posts(topic)),
        None => no_topic(id),
    }
}

fn list_users(db: &mut Database, _ctx: &Ctx<'_>) -> HandlerResult {
    HandlerResult::json(&db.users)
}

fn get_user(db: &mut Database, ctx: &Ctx<'_>) -> HandlerResult {
    let username = ctx.param(0);
    match db.user(username) {
        Some(user) => HandlerResult::json(user),
        None => no_user(StatusCode::NOT_FOUND, username),
    }
}

fn list_user_topics(db: &mut Database, ctx: &Ctx<'_>) -> HandlerResult {
    let username = ctx.param(0);
    if db.user(username).is_none() {
        return no_user(StatusCode::NOT_FOUND, username);
    }
    HandlerResult::json(&db.topics_started_by(username))
}

fn create_topic(db: &mut Database, ctx: &Ctx<'_>, unknown_user: StatusCode) -> HandlerResult {
    let username = ctx.request.json_text("user").unwrap_or_default();
    if db.user(&username).is_none() {
        return no_user(unknown_user, &username);
    }

    let topic = Topic {
        title: ctx.request.json_text("title").unwrap_or_default(),
        user: username.clone(),
        id: db.next_topic_id(),
        posts: vec![Post {
            text: ctx.request.json_text("text").unwrap_or_default(),
            user: username,
        }],
    };
    tracing::info!(topic_id = topic.id, user = %topic.user, "Topic created");

    let result = HandlerResult::with_status(StatusCode::CREATED, &topic);
    db.topics.push(topic);
    result
}

fn create_post(db: &mut Database, ctx: &Ctx<'_>, unknown_user: StatusCode) -> HandlerResult {
    let id = ctx.param(0);
    if db.topic(id).is_none() {
        return no_topic(id);
    }

    let username = ctx.request.json_text("user").unwrap_or_default();
    if db.user(&username).is_none() {
        return no_user(unknown_user, &username);
    }

    let post = Post {
        text: ctx.request.json_text("text").unwrap_or_default(),
        user: username,
    };
    let result = HandlerResult::with_status(StatusCode::CREATED, &post);

    let Some(topic) = db.topic_mut(id) else {
        return no_topic(id);
    };
    tracing::info!(topic_id = topic.id, user = %post.user, "Post created");
    topic.posts.push(post);
    result
}

fn delete_topic(db: &mut Database, ctx: &Ctx<'_>) -> HandlerResult {
    let id = ctx.param(0);
    let Some(topic) = db.topic(id) else {
        return no_topic(id);
    };

    let (topic_id, creator) = (topic.id, topic.user.clone());
    let requester = ctx.request.json_text("user").unwrap_or_default();
    if creator == requester {
        db.remove_topic(topic_id);
        tracing::info!(topic_id, user = %requester, "Topic deleted");
    } else {
        tracing::info!(topic_id, user = %requester, "Delete ignored, user is not the topic creator");
    }

    HandlerResult::empty(StatusCode::NO_CONTENT)
}

fn serve_static(files: &StaticFiles, ctx: &Ctx<'_>) -> HandlerResult {
    match files.load(&ctx.request.path) {
        Ok((bytes, content_type)) => HandlerResult::file(bytes, content_type),
        Err(e) => {
            tracing::debug!(path = %ctx.request.path, error = %e, "Static file not served");
            HandlerResult::with_status(StatusCode::NOT_FOUND, &"No matching route or file")
        }
    }
}
