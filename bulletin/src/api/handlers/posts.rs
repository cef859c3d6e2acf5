use std::collections::HashMap;

use axum::{
    Form,
    extract::{Path, State},
    response::Response,
};
use chrono::Utc;
use tracing::info;

use crate::{
    AppState,
    api::{
        flash::Flashes,
        models::{
            posts::{
                CommentForm, CommentView, DeletePostPage, EditPostPage, IndexPage, NewPostPage, PostForm, PostPage, PostView,
            },
            required,
            users::CurrentUserView,
        },
    },
    auth::current_user::{Authenticated, CurrentIdentity},
    db::{
        errors::DbError,
        handlers::Store,
        models::posts::{CommentCreateDBRequest, Post, PostCreateDBRequest, PostUpdateDBRequest},
    },
    errors::{Error, Result},
    types::{PostId, UserId, abbrev_uuid},
};

/// Display names for the given authors. Authors that no longer exist are left out.
pub(crate) async fn author_names(store: &dyn Store, ids: Vec<UserId>) -> Result<HashMap<UserId, String>> {
    let mut names = HashMap::new();
    for id in ids {
        if names.contains_key(&id) {
            continue;
        }
        if let Some(identity) = store.find_by_id(id).await? {
            names.insert(id, identity.name);
        }
    }
    Ok(names)
}

pub(crate) async fn post_views(store: &dyn Store, posts: Vec<Post>) -> Result<Vec<PostView>> {
    let names = author_names(store, posts.iter().map(|p| p.author_id).collect()).await?;
    Ok(posts
        .into_iter()
        .map(|post| {
            let name = names.get(&post.author_id).cloned();
            PostView::new(post, name)
        })
        .collect())
}

async fn find_post(store: &dyn Store, id: PostId) -> Result<Post> {
    store.get_post(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Post".to_string(),
        id: id.to_string(),
    })
}

/// List all posts
#[utoipa::path(
    get,
    path = "/",
    tag = "posts",
    responses(
        (status = 200, description = "All posts", body = IndexPage),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_posts(State(state): State<AppState>, CurrentIdentity(identity): CurrentIdentity, flashes: Flashes) -> Result<Response> {
    let posts = post_views(state.store.as_ref(), state.store.list_posts().await?).await?;
    Ok(flashes.render(|flashes| IndexPage {
        current_user: identity.as_ref().map(CurrentUserView::from),
        posts,
        flashes,
    }))
}

/// Get a post with its comments
#[utoipa::path(
    get,
    path = "/post/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "The post", body = PostPage),
        (status = 404, description = "No such post"),
    )
)]
#[tracing::instrument(skip_all, fields(post_id = %abbrev_uuid(&id)))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    CurrentIdentity(identity): CurrentIdentity,
    flashes: Flashes,
) -> Result<Response> {
    let store = state.store.as_ref();
    let post = find_post(store, id).await?;
    let comments = store.list_comments(id).await?;

    let author_ids = std::iter::once(post.author_id)
        .chain(comments.iter().map(|c| c.author_id))
        .collect();
    let names = author_names(store, author_ids).await?;
    let post_author = names.get(&post.author_id).cloned();
    let comments = comments
        .into_iter()
        .map(|comment| {
            let name = names.get(&comment.author_id).cloned();
            CommentView::new(comment, name)
        })
        .collect();

    Ok(flashes.render(|flashes| PostPage {
        current_user: identity.as_ref().map(CurrentUserView::from),
        post: PostView::new(post, post_author),
        comments,
        flashes,
    }))
}

/// Comment on a post
#[utoipa::path(
    post,
    path = "/post/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post ID")),
    request_body(content = CommentForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Comment added; redirects back to the post, or to /login when anonymous"),
        (status = 400, description = "Empty comment"),
        (status = 404, description = "No such post"),
    )
)]
#[tracing::instrument(skip_all, fields(post_id = %abbrev_uuid(&id)))]
pub async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    Authenticated(identity): Authenticated,
    flashes: Flashes,
    Form(form): Form<CommentForm>,
) -> Result<Response> {
    let text = required("text", form.text)?;
    find_post(state.store.as_ref(), id).await?;

    state
        .store
        .create_comment(&CommentCreateDBRequest {
            author_id: identity.id,
            post_id: id,
            text,
        })
        .await?;

    Ok(flashes.redirect(&format!("/post/{id}")))
}

/// An empty post form
#[utoipa::path(
    get,
    path = "/new-post",
    tag = "posts",
    responses(
        (status = 200, description = "Empty form", body = NewPostPage),
        (status = 403, description = "Caller is not an executive or director"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn new_post_page(Authenticated(identity): Authenticated, flashes: Flashes) -> Response {
    flashes.render(|flashes| NewPostPage {
        current_user: CurrentUserView::from(&identity),
        form: PostForm::default(),
        flashes,
    })
}

/// Publish a new post, dated today
#[utoipa::path(
    post,
    path = "/new-post",
    tag = "posts",
    request_body(content = PostForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Post created; redirects to /"),
        (status = 400, description = "Invalid form"),
        (status = 403, description = "Caller is not an executive or director"),
        (status = 409, description = "Title already used"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_post(
    State(state): State<AppState>,
    Authenticated(identity): Authenticated,
    flashes: Flashes,
    Form(form): Form<PostForm>,
) -> Result<Response> {
    let post = form.validate()?;

    let created = state
        .store
        .create_post(&PostCreateDBRequest {
            author_id: identity.id,
            title: post.title,
            subtitle: post.subtitle,
            date: Utc::now().format("%B %d, %Y").to_string(),
            body: post.body,
            img_url: post.img_url,
        })
        .await?;

    info!(post_id = %abbrev_uuid(&created.id), author = %abbrev_uuid(&identity.id), "Post created");
    Ok(flashes.redirect("/"))
}

/// The edit form for a post
#[utoipa::path(
    get,
    path = "/edit-post/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Prefilled form", body = EditPostPage),
        (status = 403, description = "Caller is not an executive or director"),
        (status = 404, description = "No such post"),
    )
)]
#[tracing::instrument(skip_all, fields(post_id = %abbrev_uuid(&id)))]
pub async fn edit_post_page(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    Authenticated(identity): Authenticated,
    flashes: Flashes,
) -> Result<Response> {
    let post = find_post(state.store.as_ref(), id).await?;
    Ok(flashes.render(|flashes| EditPostPage {
        current_user: CurrentUserView::from(&identity),
        id,
        form: PostForm::from(&post),
        flashes,
    }))
}

/// Replace a post's content. The editor becomes its author; the date is kept.
#[utoipa::path(
    post,
    path = "/edit-post/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post ID")),
    request_body(content = PostForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Post updated; redirects to the post"),
        (status = 400, description = "Invalid form"),
        (status = 403, description = "Caller is not an executive or director"),
        (status = 404, description = "No such post"),
        (status = 409, description = "Title already used"),
    )
)]
#[tracing::instrument(skip_all, fields(post_id = %abbrev_uuid(&id)))]
pub async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    Authenticated(identity): Authenticated,
    flashes: Flashes,
    Form(form): Form<PostForm>,
) -> Result<Response> {
    let post = form.validate()?;

    let request = PostUpdateDBRequest {
        author_id: identity.id,
        title: post.title,
        subtitle: post.subtitle,
        body: post.body,
        img_url: post.img_url,
    };
    state.store.update_post(id, &request).await.map_err(|e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "Post".to_string(),
            id: id.to_string(),
        },
        e => e.into(),
    })?;

    Ok(flashes.redirect(&format!("/post/{id}")))
}

/// Confirm deleting a post
#[utoipa::path(
    get,
    path = "/delete/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 200, description = "The post to delete", body = DeletePostPage),
        (status = 403, description = "Caller is not an executive"),
        (status = 404, description = "No such post"),
    )
)]
#[tracing::instrument(skip_all, fields(post_id = %abbrev_uuid(&id)))]
pub async fn delete_post_page(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
    Authenticated(identity): Authenticated,
    flashes: Flashes,
) -> Result<Response> {
    let store = state.store.as_ref();
    let post = find_post(store, id).await?;
    let names = author_names(store, vec![post.author_id]).await?;
    let author = names.get(&post.author_id).cloned();

    Ok(flashes.render(|flashes| DeletePostPage {
        current_user: CurrentUserView::from(&identity),
        post: PostView::new(post, author),
        flashes,
    }))
}

/// Delete a post and its comments
#[utoipa::path(
    post,
    path = "/delete/{id}",
    tag = "posts",
    params(("id" = String, Path, description = "Post ID")),
    responses(
        (status = 303, description = "Post deleted; redirects to /"),
        (status = 403, description = "Caller is not an executive"),
        (status = 404, description = "No such post"),
    )
)]
#[tracing::instrument(skip_all, fields(post_id = %abbrev_uuid(&id)))]
pub async fn delete_post(State(state): State<AppState>, Path(id): Path<PostId>, flashes: Flashes) -> Result<Response> {
    if !state.store.delete_post(id).await? {
        return Err(Error::NotFound {
            resource: "Post".to_string(),
            id: id.to_string(),
        });
    }
    info!("Post deleted");
    Ok(flashes.redirect("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::flash::{Flash, FlashLevel, test_support::flashes_in};
    use crate::auth::guard::LOGIN_REQUIRED_MESSAGE;
    use crate::db::models::users::Identity;
    use crate::test_utils::{create_test_server, create_test_state, seed_identity, session_cookie_for};
    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    fn post_form(title: &str) -> [(&'static str, String); 4] {
        [
            ("title", title.to_string()),
            ("subtitle", "A subtitle".to_string()),
            ("body", "<p>Hello</p>".to_string()),
            ("img_url", "https://example.com/header.jpg".to_string()),
        ]
    }

    async fn seed_post(state: &AppState, author: &Identity, title: &str) -> Post {
        state
            .store
            .create_post(&PostCreateDBRequest {
                author_id: author.id,
                title: title.to_string(),
                subtitle: "Sub".to_string(),
                date: "January 01, 2025".to_string(),
                body: "Body".to_string(),
                img_url: "https://example.com/a.jpg".to_string(),
            })
            .await
            .unwrap()
    }

    #[test_log::test(tokio::test)]
    async fn test_director_creates_post() {
        let state = create_test_state();
        let director = seed_identity(&state, "dir@example.com", "3100", "pw", "1234").await;
        let cookie = session_cookie_for(&state, &director).await;
        let server = create_test_server(state.clone());

        let response = server.post("/new-post").add_header("cookie", cookie).form(&post_form("Hello")).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), "/");

        let posts = state.store.list_posts().await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].author_id, director.id);
        assert_eq!(posts[0].date, Utc::now().format("%B %d, %Y").to_string());

        let page: serde_json::Value = server.get("/").await.json();
        assert_eq!(page["posts"][0]["title"], json!("Hello"));
        assert_eq!(page["posts"][0]["author_name"], json!("Test User"));
        assert_eq!(page["current_user"], json!(null));
    }

    #[test_log::test(tokio::test)]
    async fn test_regular_cannot_create_post() {
        let state = create_test_state();
        let regular = seed_identity(&state, "reg@example.com", "7100", "pw", "1234").await;
        let cookie = session_cookie_for(&state, &regular).await;
        let server = create_test_server(state.clone());

        let response = server.post("/new-post").add_header("cookie", cookie).form(&post_form("Hello")).await;
        response.assert_status(StatusCode::FORBIDDEN);
        assert!(state.store.list_posts().await.unwrap().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_anonymous_edit_redirects_to_login() {
        let state = create_test_state();
        let director = seed_identity(&state, "dir@example.com", "3100", "pw", "1234").await;
        let post = seed_post(&state, &director, "Hello").await;
        let server = create_test_server(state);

        let response = server.get(&format!("/edit-post/{}", post.id)).await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), format!("/login?next=%2Fedit-post%2F{}", post.id));
        assert_eq!(flashes_in(&response), vec![Flash::new(FlashLevel::Warning, LOGIN_REQUIRED_MESSAGE)]);
    }

    #[test_log::test(tokio::test)]
    async fn test_guard_target_round_trips_through_login() {
        let state = create_test_state();
        let director = seed_identity(&state, "dir@example.com", "3100", "pw", "1234").await;
        let post = seed_post(&state, &director, "Hello").await;
        let server = create_test_server(state.clone());
        let target = format!("/edit-post/{}", post.id);

        let location = server.get(&target).await.header("location");
        let location = location.to_str().unwrap();
        let next = location.strip_prefix("/login?next=").unwrap();
        let next: String = url::form_urlencoded::parse(format!("next={next}").as_bytes())
            .find(|(key, _)| key == "next")
            .map(|(_, value)| value.into_owned())
            .unwrap();
        assert_eq!(next, target);

        let response = server
            .post("/login")
            .add_query_param("next", &next)
            .form(&[("email", "dir@example.com"), ("password", "pw")])
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), target.as_str());
    }

    /// Follow a guard redirect through `POST /login` and return where login sends the browser.
    async fn login_from(server: &axum_test::TestServer, guard_location: &str, email: &str) -> String {
        let encoded = guard_location.strip_prefix("/login?next=").unwrap();
        let query = format!("next={encoded}");
        let (_, next) = url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "next")
            .unwrap();

        let response = server
            .post("/login")
            .add_query_param("next", next.as_ref())
            .form(&[("email", email), ("password", "pw")])
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        response.header("location").to_str().unwrap().to_string()
    }

    #[test_log::test(tokio::test)]
    async fn test_new_post_deep_link_survives_login() {
        let state = create_test_state();
        let director = seed_identity(&state, "dir@example.com", "3100", "pw", "1234").await;
        let server = create_test_server(state.clone());

        let response = server.get("/new-post").await;
        response.assert_status(StatusCode::SEE_OTHER);
        let guard_location = response.header("location").to_str().unwrap().to_string();
        assert_eq!(guard_location, "/login?next=%2Fnew-post");

        let target = login_from(&server, &guard_location, "dir@example.com").await;
        assert_eq!(target, "/new-post");

        let response = server
            .get(&target)
            .add_header("cookie", session_cookie_for(&state, &director).await)
            .await;
        response.assert_status_ok();
        let page: serde_json::Value = response.json();
        assert_eq!(page["form"]["title"], json!(""));
        assert_eq!(page["current_user"]["category"], json!("director"));
    }

    #[test_log::test(tokio::test)]
    async fn test_delete_deep_link_lands_on_confirmation() {
        let state = create_test_state();
        let executive = seed_identity(&state, "exec@example.com", "1100", "pw", "1234").await;
        let post = seed_post(&state, &executive, "Hello").await;
        let server = create_test_server(state.clone());
        let path = format!("/delete/{}", post.id);

        let guard_location = server.get(&path).await.header("location").to_str().unwrap().to_string();
        let target = login_from(&server, &guard_location, "exec@example.com").await;
        assert_eq!(target, path);

        let cookie = session_cookie_for(&state, &executive).await;
        let page: serde_json::Value = server.get(&target).add_header("cookie", cookie.clone()).await.json();
        assert_eq!(page["post"]["title"], json!("Hello"));
        assert_eq!(page["post"]["author_name"], json!("Test User"));
        // Viewing the confirmation does not delete
        assert!(state.store.get_post(post.id).await.unwrap().is_some());

        server
            .post(&target)
            .add_header("cookie", cookie)
            .await
            .assert_status(StatusCode::SEE_OTHER);
        assert!(state.store.get_post(post.id).await.unwrap().is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_author_names_skips_missing_authors() {
        let state = create_test_state();
        let director = seed_identity(&state, "dir@example.com", "3100", "pw", "1234").await;
        let ghost = Uuid::new_v4();

        let names = author_names(state.store.as_ref(), vec![director.id, ghost, director.id]).await.unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[&director.id], "Test User");
    }

    #[test_log::test(tokio::test)]
    async fn test_edit_post_reassigns_author() {
        let state = create_test_state();
        let director = seed_identity(&state, "dir@example.com", "3100", "pw", "1234").await;
        let executive = seed_identity(&state, "exec@example.com", "1100", "pw", "1234").await;
        let post = seed_post(&state, &director, "Hello").await;
        let cookie = session_cookie_for(&state, &executive).await;
        let server = create_test_server(state.clone());

        let page: serde_json::Value = server
            .get(&format!("/edit-post/{}", post.id))
            .add_header("cookie", cookie.clone())
            .await
            .json();
        assert_eq!(page["form"]["title"], json!("Hello"));

        let response = server
            .post(&format!("/edit-post/{}", post.id))
            .add_header("cookie", cookie)
            .form(&post_form("Hello again"))
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), format!("/post/{}", post.id));

        let updated = state.store.get_post(post.id).await.unwrap().unwrap();
        assert_eq!(updated.title, "Hello again");
        assert_eq!(updated.author_id, executive.id);
        assert_eq!(updated.date, post.date);
    }

    #[test_log::test(tokio::test)]
    async fn test_edit_missing_post_is_not_found() {
        let state = create_test_state();
        let director = seed_identity(&state, "dir@example.com", "3100", "pw", "1234").await;
        let cookie = session_cookie_for(&state, &director).await;
        let server = create_test_server(state);

        let response = server
            .post(&format!("/edit-post/{}", Uuid::new_v4()))
            .add_header("cookie", cookie)
            .form(&post_form("Hello"))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[test_log::test(tokio::test)]
    async fn test_duplicate_title_is_conflict() {
        let state = create_test_state();
        let director = seed_identity(&state, "dir@example.com", "3100", "pw", "1234").await;
        seed_post(&state, &director, "Hello").await;
        let cookie = session_cookie_for(&state, &director).await;
        let server = create_test_server(state.clone());

        let response = server.post("/new-post").add_header("cookie", cookie).form(&post_form("Hello")).await;
        response.assert_status(StatusCode::CONFLICT);
        assert_eq!(state.store.list_posts().await.unwrap().len(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_only_executives_delete() {
        let state = create_test_state();
        let director = seed_identity(&state, "dir@example.com", "3100", "pw", "1234").await;
        let executive = seed_identity(&state, "exec@example.com", "1100", "pw", "1234").await;
        let post = seed_post(&state, &director, "Hello").await;
        let server = create_test_server(state.clone());
        let path = format!("/delete/{}", post.id);

        let response = server
            .post(&path)
            .add_header("cookie", session_cookie_for(&state, &director).await)
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server
            .post(&path)
            .add_header("cookie", session_cookie_for(&state, &executive).await)
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert!(state.store.get_post(post.id).await.unwrap().is_none());

        server.get(&format!("/post/{}", post.id)).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[test_log::test(tokio::test)]
    async fn test_comment_requires_login() {
        let state = create_test_state();
        let director = seed_identity(&state, "dir@example.com", "3100", "pw", "1234").await;
        let post = seed_post(&state, &director, "Hello").await;
        let server = create_test_server(state.clone());

        let response = server
            .post(&format!("/post/{}", post.id))
            .form(&[("text", "Nice post")])
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), format!("/login?next=%2Fpost%2F{}", post.id));
        assert_eq!(
            flashes_in(&response),
            vec![Flash::new(FlashLevel::Warning, "You need to login or register to comment.")]
        );
        assert!(state.store.list_comments(post.id).await.unwrap().is_empty());
    }

    #[test_log::test(tokio::test)]
    async fn test_any_role_can_comment() {
        let state = create_test_state();
        let director = seed_identity(&state, "dir@example.com", "3100", "pw", "1234").await;
        let unknown = seed_identity(&state, "who@example.com", "9100", "pw", "1234").await;
        let post = seed_post(&state, &director, "Hello").await;
        let cookie = session_cookie_for(&state, &unknown).await;
        let server = create_test_server(state.clone());

        let response = server
            .post(&format!("/post/{}", post.id))
            .add_header("cookie", cookie)
            .form(&[("text", "Nice post")])
            .await;
        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("location"), format!("/post/{}", post.id));

        let page: serde_json::Value = server.get(&format!("/post/{}", post.id)).await.json();
        assert_eq!(page["comments"][0]["text"], json!("Nice post"));
        assert_eq!(page["comments"][0]["author_id"], json!(unknown.id));
    }
}
