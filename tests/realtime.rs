mod common;

use daycare_sdk::backend::to_row;
use daycare_sdk::models::{NewNotification, NotificationType, Role};
use daycare_sdk::{query_key, CareClient};
use std::time::Duration;
use uuid::Uuid;

fn reminder(user_id: Uuid) -> NewNotification {
    NewNotification {
        user_id,
        notification_type: NotificationType::System,
        title: "Reminder".into(),
        message: "Sun hats tomorrow".into(),
        link: None,
    }
}

async fn wait_until_stale(c: &CareClient, user_id: Uuid) -> bool {
    let key = query_key!("notifications", user_id);
    for _ in 0..100 {
        if c.cache().is_stale(&key) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn remote_insert_invalidates_subscribed_users_list() {
    let c = common::client();
    let mum = common::user(&c, "Maria Rivera", Role::Parent).await;
    let sub = c.notifications().subscribe(&mum.id);
    assert_eq!(sub.topic(), format!("notifications:{}", mum.id));

    assert!(c.notifications().list(&mum.id).await.unwrap().is_empty());
    // written behind the service's back, as another client would
    c.backend()
        .insert("notifications", to_row(&reminder(mum.id)).unwrap())
        .await
        .unwrap();

    assert!(wait_until_stale(&c, mum.id).await);
    assert_eq!(c.notifications().list(&mum.id).await.unwrap().len(), 1);
    assert_eq!(c.notifications().unread_count(&mum.id).await.unwrap(), 1);
}

#[tokio::test]
async fn other_users_events_are_ignored() {
    let c = common::client();
    let mum = common::user(&c, "Maria Rivera", Role::Parent).await;
    let dad = common::user(&c, "Luis Rivera", Role::Parent).await;
    let _sub = c.notifications().subscribe(&mum.id);

    c.notifications().list(&mum.id).await.unwrap();
    c.backend()
        .insert("notifications", to_row(&reminder(dad.id)).unwrap())
        .await
        .unwrap();

    assert!(!wait_until_stale(&c, mum.id).await);
}

#[tokio::test]
async fn dropping_the_subscription_stops_invalidation() {
    let c = common::client();
    let mum = common::user(&c, "Maria Rivera", Role::Parent).await;
    let sub = c.notifications().subscribe(&mum.id);
    drop(sub);
    tokio::task::yield_now().await;

    c.notifications().list(&mum.id).await.unwrap();
    c.backend()
        .insert("notifications", to_row(&reminder(mum.id)).unwrap())
        .await
        .unwrap();

    assert!(!wait_until_stale(&c, mum.id).await);
}
