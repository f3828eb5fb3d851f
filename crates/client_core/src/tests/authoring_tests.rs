use shared::domain::UserId;

use super::*;
use crate::test_support::{remote_error, sample_article, MemoryStore, StoreCall};

fn author() -> Session {
    Session::signed_in(
        AuthUser::new("author-1")
            .with_email("ada@example.com")
            .with_username("ada"),
    )
}

fn draft() -> ArticleDraft {
    ArticleDraft {
        title: "Pinning, explained".to_string(),
        content: "<p>Self-referential structs</p>".to_string(),
        tags: "Rust, async ,PIN,rust,".to_string(),
        image: None,
    }
}

fn event_draft() -> EventDraft {
    EventDraft {
        title: "RustFest".to_string(),
        description: "<p>Talks</p>".to_string(),
        price: 25.0,
        start_date: NaiveDate::from_ymd_opt(2024, 9, 1).expect("date"),
        end_date: NaiveDate::from_ymd_opt(2024, 9, 3).expect("date"),
        website_url: "https://rustfest.example".to_string(),
    }
}

fn authoring(store: &Arc<MemoryStore>, status: &StatusBoard) -> Authoring {
    Authoring::new(store.clone(), status.clone())
}

#[test]
fn tags_are_normalized_sorted_and_deduplicated() {
    assert_eq!(draft().tag_list(), vec!["async", "pin", "rust"]);
    let no_tags = ArticleDraft {
        tags: String::new(),
        ..draft()
    };
    assert!(no_tags.tag_list().is_empty());
}

#[tokio::test]
async fn create_article_inserts_author_and_nickname() {
    let store = Arc::new(MemoryStore::default());
    let status = StatusBoard::new();

    authoring(&store, &status)
        .create_article(&author(), &draft())
        .await
        .expect("create");

    let calls = store.calls();
    let [StoreCall::Insert(Collection::Articles, fields)] = calls.as_slice() else {
        panic!("unexpected calls: {calls:?}");
    };
    assert_eq!(fields.author_id, Some(UserId::from("author-1")));
    assert_eq!(fields.nickname.as_deref(), Some("ada"));
    assert_eq!(
        fields.tags.as_deref(),
        Some(["async", "pin", "rust"].map(String::from).as_slice())
    );
    assert!(fields.likes.is_none());
    assert_eq!(status.current(), None);
}

#[tokio::test]
async fn empty_title_blocks_submission_before_any_remote_call() {
    let store = Arc::new(MemoryStore::default());
    let status = StatusBoard::new();
    let empty = ArticleDraft {
        title: "   ".to_string(),
        ..draft()
    };

    let err = authoring(&store, &status)
        .create_article(&author(), &empty)
        .await
        .expect_err("must be rejected");

    assert_eq!(
        err,
        SubmitError::Validation(ValidationError::Empty { field: "title" })
    );
    assert!(store.calls().is_empty());
    assert!(status.current().is_some_and(|s| s.is_error()));
}

#[tokio::test]
async fn signed_out_users_cannot_submit() {
    let store = Arc::new(MemoryStore::default());
    let err = authoring(&store, &StatusBoard::new())
        .create_article(&Session::signed_out(), &draft())
        .await
        .expect_err("signed out");
    assert_eq!(err, SubmitError::SignedOut);
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn remote_rejection_is_shown_verbatim() {
    let store = Arc::new(MemoryStore::with_items([sample_article("abc", "author-1")]));
    store.fail_with(remote_error("value too long for type character varying(120)"));
    let status = StatusBoard::new();

    let err = authoring(&store, &status)
        .update_article(&author(), &ContentId::from("abc"), &draft())
        .await
        .expect_err("rejected");

    assert!(matches!(err, SubmitError::Remote(_)));
    assert_eq!(
        status.current(),
        Some(InteractionStatus::error(
            "value too long for type character varying(120)"
        ))
    );
}

#[tokio::test]
async fn update_event_sends_event_fields() {
    let store = Arc::new(MemoryStore::default());

    authoring(&store, &StatusBoard::new())
        .update_event(&author(), &ContentId::from("ev1"), &event_draft())
        .await
        .expect("update");

    let calls = store.calls();
    let [StoreCall::Update(Collection::Events, id, fields)] = calls.as_slice() else {
        panic!("unexpected calls: {calls:?}");
    };
    assert_eq!(id.as_str(), "ev1");
    let body = serde_json::to_value(fields).expect("json");
    assert_eq!(body["startDate"], "2024-09-01");
    assert_eq!(body["endDate"], "2024-09-03");
    assert_eq!(body["websiteUrl"], "https://rustfest.example");
    assert!(body.get("author_id").is_none());
}

#[test]
fn event_validation_rules() {
    assert!(event_draft().validate().is_ok());

    let bad_url = EventDraft {
        website_url: "javascript:alert(1)".to_string(),
        ..event_draft()
    };
    assert!(matches!(
        bad_url.validate(),
        Err(ValidationError::InvalidUrl { .. })
    ));

    let relative = EventDraft {
        website_url: "rustfest.example".to_string(),
        ..event_draft()
    };
    assert!(relative.validate().is_err());

    let reversed = EventDraft {
        start_date: NaiveDate::from_ymd_opt(2024, 9, 5).expect("date"),
        ..event_draft()
    };
    assert_eq!(reversed.validate(), Err(ValidationError::DateOrder));
}

#[test]
fn only_owners_may_edit() {
    let item = sample_article("abc", "author-1");
    let loaded = Loaded::found(item);
    assert!(can_edit(&author(), &loaded));
    assert!(!can_edit(
        &Session::signed_in(AuthUser::new("intruder")),
        &loaded
    ));
    assert!(!can_edit(&Session::signed_out(), &loaded));
    assert!(!can_edit(&author(), &Loaded::not_found()));
}
