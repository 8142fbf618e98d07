//! Runs against a real PostgreSQL when `DAYCARE_TEST_DATABASE_URL` is set; otherwise each test
//! returns early. Every test works in its own throwaway schema.

use daycare_sdk::models::{NewMessage, NewNotification, NewUser, NotificationType, Role, User};
use daycare_sdk::realtime::PG_CHANNEL;
use daycare_sdk::{ensure_tables, CareClient, ChangeEvent, MemoryStorage, PgBackend, Realtime};
use sqlx::postgres::{PgListener, PgPoolOptions};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

struct TestDb {
    pool: PgPool,
    schema: String,
    client: CareClient,
}

impl TestDb {
    async fn open() -> Option<TestDb> {
        let url = std::env::var("DAYCARE_TEST_DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new().max_connections(4).connect(&url).await.unwrap();
        let schema = format!("daycare_test_{}", uuid::Uuid::new_v4().simple());
        ensure_tables(&pool, &schema).await.unwrap();
        let backend = Arc::new(PgBackend::new(pool.clone(), schema.clone()));
        let client = CareClient::new(backend, Arc::new(MemoryStorage::new()), Realtime::new());
        Some(TestDb { pool, schema, client })
    }

    async fn user(&self, email: &str, role: Role) -> User {
        self.client
            .users()
            .create_profile(&NewUser {
                email: email.into(),
                full_name: email.into(),
                role,
                phone: None,
            })
            .await
            .unwrap()
    }

    async fn close(self) {
        sqlx::query(&format!("DROP SCHEMA \"{}\" CASCADE", self.schema))
            .execute(&self.pool)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn long_messages_survive_the_change_trigger() {
    let Some(db) = TestDb::open().await else {
        return;
    };
    let tess = db.user("tess@example.org", Role::Teacher).await;
    let mum = db.user("maria@example.org", Role::Parent).await;

    for len in [4_500, 9_000] {
        let sent = db
            .client
            .messages()
            .send(&NewMessage {
                sender_id: tess.id,
                recipient_id: mum.id,
                child_id: None,
                content: "a".repeat(len),
            })
            .await
            .unwrap();
        let read = db.client.messages().mark_read(&sent.id).await.unwrap();
        assert!(read.is_read);
        assert_eq!(read.content.len(), len);
    }
    db.close().await;
}

#[tokio::test]
async fn change_notifications_carry_keys_not_content() {
    let Some(db) = TestDb::open().await else {
        return;
    };
    let mum = db.user("maria@example.org", Role::Parent).await;
    let mut listener = PgListener::connect_with(&db.pool).await.unwrap();
    listener.listen(PG_CHANNEL).await.unwrap();

    db.client
        .notifications()
        .create(&NewNotification {
            user_id: mum.id,
            notification_type: NotificationType::Announcement,
            title: "Newsletter".into(),
            message: "b".repeat(9_500),
            link: None,
        })
        .await
        .unwrap();

    // other schemas in the same database share the channel
    let uid = mum.id.to_string();
    let record = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let n = listener.recv().await.unwrap();
            assert!(n.payload().len() < 1_000);
            let ev: ChangeEvent = serde_json::from_str(n.payload()).unwrap();
            if let Some(r) = ev.record.filter(|r| ev.table == "notifications" && r["user_id"] == uid) {
                return r;
            }
        }
    })
    .await
    .unwrap();
    assert!(record.contains_key("id"));
    assert!(!record.contains_key("message"));
    db.close().await;
}
