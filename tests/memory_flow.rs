use chrono::{Duration as ChronoDuration, Utc};
use publish_menu::config::{self, Config};
use publish_menu::model::{ContentItem, DeliveryStatus, PostStatus, SaveIntent, PUBLISHED_AT_FIELD};
use publish_menu::persistence::memory::{DeliveryStep, MemoryPersistence};
use publish_menu::schedule::to_site_time;
use publish_menu::text::Catalog;
use publish_menu::workflow::{
    ConfirmOutcome, Delivery, NotSavedReason, PublishMenu, RetryOutcome, SaveOrigin, SaveOutcome,
};
use publish_menu::WorkflowError;
use std::sync::Arc;

fn example_config() -> Config {
    let cfg: Config = serde_yaml::from_str(config::example()).unwrap();
    config::validate(&cfg).unwrap();
    cfg
}

async fn setup(item: ContentItem) -> (Arc<MemoryPersistence>, PublishMenu) {
    let cfg = example_config();
    let store = Arc::new(MemoryPersistence::from_config(&cfg).unwrap());
    store.insert(item.clone()).await;
    let menu = PublishMenu::new(
        item,
        store.clone(),
        Arc::new(Catalog::new(cfg.text.overrides.clone())),
        cfg.poll_settings(),
    );
    (store, menu)
}

#[tokio::test(start_paused = true)]
async fn publish_with_email_end_to_end() {
    let (store, menu) = setup(ContentItem::draft("Weekly digest")).await;
    store
        .script_deliveries(vec![DeliveryStep::Pending, DeliveryStep::Submitted])
        .await;

    menu.open();
    menu.set_save_type(SaveIntent::Publish);
    menu.set_send_email_when_published(true);
    assert_eq!(
        menu.save(SaveOrigin::Menu).await.unwrap(),
        SaveOutcome::AwaitingConfirmation
    );
    assert_eq!(store.save_calls().await, 0);

    let outcome = menu.confirm_email_send().await.unwrap();
    let ConfirmOutcome::Completed { item, delivery } = outcome else {
        panic!("confirmation aborted");
    };
    assert_eq!(delivery, Delivery::Submitted);
    assert_eq!(item.status, PostStatus::Published);
    assert_eq!(store.save_calls().await, 1);
    assert_eq!(store.reload_calls().await, 2);

    let stored = store.get(item.id).await.unwrap();
    assert_eq!(
        stored.notification.unwrap().delivery_status,
        DeliveryStatus::Submitted
    );
    assert_eq!(menu.success_text(), "Published");
}

#[tokio::test(start_paused = true)]
async fn failed_email_can_be_retried() {
    let (store, menu) = setup(ContentItem::draft("Weekly digest")).await;
    store
        .script_deliveries(vec![
            "failed:bounce".parse().unwrap(),
            DeliveryStep::Submitted,
        ])
        .await;

    menu.set_save_type(SaveIntent::Publish);
    menu.set_send_email_when_published(true);
    menu.save(SaveOrigin::Direct).await.unwrap();
    assert_eq!(
        menu.confirm_email_send().await.unwrap_err(),
        WorkflowError::DeliveryFailed("bounce".into())
    );

    let outcome = menu.retry_email_send().await.unwrap();
    assert!(matches!(
        outcome,
        RetryOutcome::Polled {
            delivery: Delivery::Submitted,
            ..
        }
    ));
    assert_eq!(store.retry_calls().await, 1);
    assert_eq!(store.job_reload_calls().await, 1);
}

#[tokio::test]
async fn scheduling_in_the_past_stays_a_draft() {
    let mut item = ContentItem::draft("Too late");
    let tz = example_config().site_timezone().unwrap();
    item.published_at_blog_tz = Some(to_site_time(Utc::now() - ChronoDuration::hours(2), &tz));
    let (store, menu) = setup(item).await;

    menu.open();
    menu.set_save_type(SaveIntent::Schedule);
    assert_eq!(menu.button_text(), "Schedule");
    assert_eq!(
        menu.save(SaveOrigin::Menu).await.unwrap(),
        SaveOutcome::NotSaved(NotSavedReason::ValidationReported)
    );
    assert_eq!(store.save_calls().await, 0);
    assert_eq!(menu.item().errors[0].property, PUBLISHED_AT_FIELD);

    // closing drops the staged schedule, so re-validation clears the error
    assert!(menu.close(None).await);
    assert!(menu.item().errors.is_empty());
    assert_eq!(menu.item().status, PostStatus::Draft);
}

#[tokio::test]
async fn rescheduling_updates_cached_time() {
    let tz = example_config().site_timezone().unwrap();
    let first = Utc::now() + ChronoDuration::days(1);
    let mut item = ContentItem::draft("Later").with_status(PostStatus::Scheduled);
    item.published_at_utc = Some(first);
    item.published_at_blog_tz = Some(to_site_time(first, &tz));
    let (_store, menu) = setup(item).await;

    menu.open();
    menu.set_save_type(SaveIntent::Schedule);
    assert_eq!(menu.trigger_text(), "Scheduled");
    assert_eq!(menu.button_text(), "Reschedule");

    let second = to_site_time(first + ChronoDuration::days(1), &tz);
    menu.set_scheduled_time(Some(second));
    let SaveOutcome::Saved(saved) = menu.save(SaveOrigin::Menu).await.unwrap() else {
        panic!("reschedule not saved");
    };
    assert_eq!(saved.published_at_blog_tz, Some(second));
    assert_eq!(menu.running_text().as_deref(), Some("Rescheduling"));
    assert_eq!(menu.success_text(), "Rescheduled");

    assert!(menu.close(None).await);
    assert_eq!(menu.item().published_at_blog_tz, Some(second));
}
