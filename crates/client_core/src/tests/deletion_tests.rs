use super::*;
use crate::test_support::{
    remote_error, sample_article, sample_event, MemoryStore, RecordingNavigator, StoreCall,
};

struct Fixture {
    store: Arc<MemoryStore>,
    navigator: Arc<RecordingNavigator>,
    status: StatusBoard,
}

impl Fixture {
    fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::with_items([
                sample_article("abc", "author-1"),
                sample_event("ev1", "author-1"),
            ])),
            navigator: Arc::new(RecordingNavigator::default()),
            status: StatusBoard::new(),
        }
    }

    fn flow(&self, collection: Collection, id: &str) -> DeletionFlow {
        DeletionFlow::new(
            self.store.clone(),
            collection,
            ContentId::from(id),
            self.status.clone(),
            self.navigator.clone(),
        )
    }
}

#[tokio::test(start_paused = true)]
async fn successful_remove_reports_success_and_redirects_after_delay() {
    let fx = Fixture::new();
    let mut flow = fx.flow(Collection::Articles, "abc");

    let outcome = flow.remove().await;

    assert_eq!(
        outcome,
        DeletionOutcome::Removed {
            redirect: RedirectTarget::Home,
            delay: DEFAULT_REDIRECT_DELAY,
        }
    );
    assert_eq!(
        fx.status.current(),
        Some(InteractionStatus::success(
            "The article was successfully removed"
        ))
    );
    assert!(fx.store.item(Collection::Articles, "abc").is_none());
    assert!(flow.redirect_pending());
    assert!(!flow.can_remove());

    tokio::time::sleep(Duration::from_millis(4_999)).await;
    assert!(fx.navigator.visits().is_empty());

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(fx.navigator.visits(), vec![RedirectTarget::Home]);
    assert!(!flow.redirect_pending());
}

#[tokio::test(start_paused = true)]
async fn teardown_before_the_delay_cancels_navigation() {
    let fx = Fixture::new();
    let mut flow = fx.flow(Collection::Articles, "abc");
    flow.remove().await;

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    drop(flow);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(fx.navigator.visits().is_empty());
}

#[tokio::test(start_paused = true)]
async fn explicit_teardown_cancels_navigation() {
    let fx = Fixture::new();
    let mut flow = fx.flow(Collection::Events, "ev1");
    flow.remove().await;

    flow.teardown();
    assert!(!flow.redirect_pending());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(fx.navigator.visits().is_empty());
}

#[tokio::test]
async fn failed_remove_surfaces_the_store_message_without_navigation() {
    let fx = Fixture::new();
    fx.store
        .fail_with(remote_error("permission denied for table articles"));
    let mut flow = fx
        .flow(Collection::Articles, "abc")
        .with_redirect_delay(Duration::from_millis(1));

    let outcome = flow.remove().await;

    assert!(matches!(outcome, DeletionOutcome::Failed(_)));
    assert_eq!(
        fx.status.current(),
        Some(InteractionStatus::error(
            "permission denied for table articles"
        ))
    );
    assert!(!flow.redirect_pending());
    assert!(flow.can_remove());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(fx.navigator.visits().is_empty());
}

#[tokio::test(start_paused = true)]
async fn events_navigate_back_with_configured_delay() {
    let fx = Fixture::new();
    let mut flow = fx
        .flow(Collection::Events, "ev1")
        .with_redirect_delay(Duration::from_millis(250));

    let outcome = flow.remove().await;
    assert_eq!(
        outcome,
        DeletionOutcome::Removed {
            redirect: RedirectTarget::Back,
            delay: Duration::from_millis(250),
        }
    );
    assert_eq!(
        fx.status.current().map(|s| s.message),
        Some("The event was successfully removed".to_string())
    );

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(fx.navigator.visits(), vec![RedirectTarget::Back]);
}

#[tokio::test(start_paused = true)]
async fn repeated_remove_is_refused_locally() {
    let fx = Fixture::new();
    let mut flow = fx.flow(Collection::Articles, "abc");

    flow.remove().await;
    assert_eq!(flow.remove().await, DeletionOutcome::AlreadyRemoved);

    let deletes = fx
        .store
        .calls()
        .into_iter()
        .filter(|call| matches!(call, StoreCall::Delete(..)))
        .count();
    assert_eq!(deletes, 1);
}
