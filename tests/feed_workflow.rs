use std::path::PathBuf;
use std::time::Duration;

use quill::accounts::{self, SignupInput};
use quill::auth::{AuthContext, Credentials};
use quill::db;
use quill::error::AppError;
use quill::feed::{self, NewPost, PostUpdate};
use quill::notify::{EventAction, EventHub};
use quill::state::DbPool;
use quill::storage;
use tempfile::TempDir;

struct Harness {
    _tmp: TempDir,
    pool: DbPool,
    images_dir: PathBuf,
    hub: EventHub,
    credentials: Credentials,
}

fn setup() -> Harness {
    let tmp = TempDir::new().unwrap();
    let pool = db::create_pool(&tmp.path().join("test.db")).expect("Failed to create test database");
    db::run_migrations(&pool).expect("Failed to run migrations");
    let images_dir = tmp.path().join("images");

    Harness {
        _tmp: tmp,
        pool,
        images_dir,
        hub: EventHub::new(),
        credentials: Credentials::new("test-secret", 4),
    }
}

fn signup_user(h: &Harness, email: &str, name: &str) -> String {
    let conn = h.pool.get().unwrap();
    accounts::signup(
        &conn,
        &h.credentials,
        &SignupInput {
            email: email.into(),
            name: name.into(),
            password: "secret1".into(),
        },
    )
    .unwrap()
}

fn stored_image(h: &Harness, name: &str) -> String {
    storage::store_image(&h.images_dir, name, "image/png", b"png-bytes").unwrap()
}

#[test]
fn create_update_delete_lifecycle() {
    let h = setup();
    let user_id = signup_user(&h, "a@b.com", "Alice");
    let caller = AuthContext::authenticated(user_id.clone());
    let conn = h.pool.get().unwrap();

    // Create
    let first_image = stored_image(&h, "first.png");
    let post = feed::create_post(
        &conn,
        &caller,
        &NewPost {
            title: "Hello World".into(),
            content: "Some body text".into(),
            image_url: first_image.clone(),
        },
        &h.hub,
    )
    .unwrap();
    assert_eq!(post.creator.id, user_id);

    let fetched = feed::get_post(&conn, &post.id).unwrap();
    assert_eq!(fetched.title, "Hello World");

    // Owner link holds both directions
    let user = accounts::load_user(&conn, &user_id).unwrap();
    assert_eq!(user.posts, vec![post.id.clone()]);

    // Update with a new image: the superseded file is removed, the new one kept
    let second_image = stored_image(&h, "second.png");
    let updated = feed::update_post(
        &conn,
        &caller,
        &post.id,
        &PostUpdate {
            title: "Hello Again".into(),
            content: "Rewritten body".into(),
            image_url: Some(second_image.clone()),
        },
        &h.images_dir,
        &h.hub,
    )
    .unwrap();
    assert_eq!(updated.title, "Hello Again");
    assert_eq!(updated.image_url, second_image);
    assert!(!storage::resolve(&h.images_dir, &first_image).unwrap().exists());
    assert!(storage::resolve(&h.images_dir, &second_image).unwrap().exists());

    // Update without an image retains the current reference
    let retained = feed::update_post(
        &conn,
        &caller,
        &post.id,
        &PostUpdate {
            title: "Hello Again".into(),
            content: "Rewritten once more".into(),
            image_url: None,
        },
        &h.images_dir,
        &h.hub,
    )
    .unwrap();
    assert_eq!(retained.image_url, second_image);
    assert!(storage::resolve(&h.images_dir, &second_image).unwrap().exists());

    // Delete removes the post, the owner link, and the stored image
    feed::delete_post(&conn, &caller, &post.id, &h.images_dir, &h.hub).unwrap();
    assert!(matches!(
        feed::get_post(&conn, &post.id),
        Err(AppError::NotFound(_))
    ));
    assert!(accounts::load_user(&conn, &user_id).unwrap().posts.is_empty());
    assert!(!storage::resolve(&h.images_dir, &second_image).unwrap().exists());
}

#[test]
fn anonymous_caller_cannot_mutate() {
    let h = setup();
    let conn = h.pool.get().unwrap();
    let err = feed::create_post(
        &conn,
        &AuthContext::anonymous(),
        &NewPost {
            title: "Hello World".into(),
            content: "Some body text".into(),
            image_url: "images/x.png".into(),
        },
        &h.hub,
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Unauthenticated));
}

#[test]
fn non_creator_mutations_are_forbidden_and_harmless() {
    let h = setup();
    let alice = signup_user(&h, "a@b.com", "Alice");
    let mallory = signup_user(&h, "m@b.com", "Mallory");
    let conn = h.pool.get().unwrap();

    let image = stored_image(&h, "photo.png");
    let post = feed::create_post(
        &conn,
        &AuthContext::authenticated(alice),
        &NewPost {
            title: "Hello World".into(),
            content: "Some body text".into(),
            image_url: image.clone(),
        },
        &h.hub,
    )
    .unwrap();

    let intruder = AuthContext::authenticated(mallory);
    let err = feed::update_post(
        &conn,
        &intruder,
        &post.id,
        &PostUpdate {
            title: "Hijacked post".into(),
            content: "Should never land".into(),
            image_url: None,
        },
        &h.images_dir,
        &h.hub,
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = feed::delete_post(&conn, &intruder, &post.id, &h.images_dir, &h.hub).unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    // The post is unmodified, its image intact
    let unchanged = feed::get_post(&conn, &post.id).unwrap();
    assert_eq!(unchanged.title, "Hello World");
    assert!(storage::resolve(&h.images_dir, &image).unwrap().exists());
}

#[test]
fn missing_post_is_not_found_before_ownership() {
    let h = setup();
    let alice = signup_user(&h, "a@b.com", "Alice");
    let conn = h.pool.get().unwrap();

    let err = feed::delete_post(
        &conn,
        &AuthContext::authenticated(alice),
        "no-such-post",
        &h.images_dir,
        &h.hub,
    )
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[test]
fn create_requires_an_image() {
    let h = setup();
    let alice = signup_user(&h, "a@b.com", "Alice");
    let conn = h.pool.get().unwrap();

    let err = feed::create_post(
        &conn,
        &AuthContext::authenticated(alice),
        &NewPost {
            title: "Hello World".into(),
            content: "Some body text".into(),
            image_url: "".into(),
        },
        &h.hub,
    )
    .unwrap_err();

    match err {
        AppError::Validation(violations) => {
            assert!(violations.iter().any(|v| v.field == "image"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn listing_pages_newest_first() {
    let h = setup();
    let alice = signup_user(&h, "a@b.com", "Alice");
    let caller = AuthContext::authenticated(alice);
    let conn = h.pool.get().unwrap();

    for i in 1..=5 {
        feed::create_post(
            &conn,
            &caller,
            &NewPost {
                title: format!("Post number {}", i),
                content: "Some body text".into(),
                image_url: format!("images/{}.png", i),
            },
            &h.hub,
        )
        .unwrap();
        // Distinct creation timestamps keep the ordering unambiguous
        std::thread::sleep(Duration::from_millis(5));
    }

    let page1 = feed::list_posts(&conn, 1, 2).unwrap();
    assert_eq!(page1.total_items, 5);
    let titles: Vec<_> = page1.posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Post number 5", "Post number 4"]);

    let page3 = feed::list_posts(&conn, 3, 2).unwrap();
    let titles: Vec<_> = page3.posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Post number 1"]);

    // Past the last page: empty, not an error
    let page4 = feed::list_posts(&conn, 4, 2).unwrap();
    assert!(page4.posts.is_empty());
    assert_eq!(page4.total_items, 5);

    // Page 0 is treated as page 1
    let page0 = feed::list_posts(&conn, 0, 2).unwrap();
    assert_eq!(page0.posts[0].title, "Post number 5");
}

#[tokio::test]
async fn mutations_notify_subscribers() {
    let h = setup();
    let alice = signup_user(&h, "a@b.com", "Alice");
    let caller = AuthContext::authenticated(alice);
    let conn = h.pool.get().unwrap();

    let mut rx = h.hub.subscribe();

    let post = feed::create_post(
        &conn,
        &caller,
        &NewPost {
            title: "Hello World".into(),
            content: "Some body text".into(),
            image_url: "images/x.png".into(),
        },
        &h.hub,
    )
    .unwrap();

    feed::update_post(
        &conn,
        &caller,
        &post.id,
        &PostUpdate {
            title: "Hello Again".into(),
            content: "Rewritten body".into(),
            image_url: None,
        },
        &h.images_dir,
        &h.hub,
    )
    .unwrap();

    feed::delete_post(&conn, &caller, &post.id, &h.images_dir, &h.hub).unwrap();

    let created = rx.recv().await.unwrap();
    assert_eq!(created.action, EventAction::Create);
    assert_eq!(created.post["_id"], post.id.as_str());
    assert_eq!(created.post["creator"]["name"], "Alice");

    let updated = rx.recv().await.unwrap();
    assert_eq!(updated.action, EventAction::Update);
    assert_eq!(updated.post["title"], "Hello Again");

    let deleted = rx.recv().await.unwrap();
    assert_eq!(deleted.action, EventAction::Delete);
    assert_eq!(deleted.post, serde_json::json!(post.id));
}

#[test]
fn failed_mutation_emits_no_event() {
    let h = setup();
    let conn = h.pool.get().unwrap();
    let mut rx = h.hub.subscribe();

    let _ = feed::create_post(
        &conn,
        &AuthContext::anonymous(),
        &NewPost {
            title: "Hello World".into(),
            content: "Some body text".into(),
            image_url: "images/x.png".into(),
        },
        &h.hub,
    );

    assert!(rx.try_recv().is_err());
}
