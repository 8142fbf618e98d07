mod common;

use common::{child, classroom, client, day, user};
use daycare_sdk::models::{
    MealType, NewAnnouncement, NewMealLog, NewMessage, NewNotification, NotificationType, PortionConsumed, Priority,
    Role, TeachingRole, UserPatch,
};
use daycare_sdk::query_key;
use daycare_sdk::service::{AnnouncementFilter, ChildFilter, MealFilter};
use daycare_sdk::AppError;

fn meal(child_id: uuid::Uuid, date: &str, meal_type: MealType, portion: PortionConsumed) -> NewMealLog {
    NewMealLog {
        child_id,
        date: day(date),
        meal_type,
        food_items: vec![" pasta ".into(), "".into(), "peas".into()],
        portion_consumed: portion,
        notes: None,
        logged_by: None,
    }
}

#[tokio::test]
async fn scope_filter_returns_only_rows_for_that_child() {
    let c = client();
    let ava = child(&c, "Ava", None).await;
    let ben = child(&c, "Ben", None).await;
    c.meals().create(&meal(ava.id, "2026-03-02", MealType::Lunch, PortionConsumed::All)).await.unwrap();
    c.meals().create(&meal(ben.id, "2026-03-02", MealType::Lunch, PortionConsumed::Some)).await.unwrap();
    c.meals().create(&meal(ava.id, "2026-03-03", MealType::Breakfast, PortionConsumed::Most)).await.unwrap();

    let filter = MealFilter {
        child_id: Some(ava.id),
        ..Default::default()
    };
    let meals = c.meals().list(&filter).await.unwrap();
    assert_eq!(meals.len(), 2);
    assert!(meals.iter().all(|m| m.child_id == ava.id));
    // newest day first
    assert_eq!(meals[0].date, day("2026-03-03"));
    assert_eq!(meals[0].food_items, vec!["pasta", "peas"]);
}

#[tokio::test]
async fn meal_portion_shows_display_label() {
    let c = client();
    let ava = child(&c, "Ava", None).await;
    let m = c
        .meals()
        .create(&meal(ava.id, "2026-03-02", MealType::Lunch, PortionConsumed::Most))
        .await
        .unwrap();
    assert_eq!(m.portion_consumed.label(), "Ate most");
    assert_eq!(m.summary(), "Lunch: pasta, peas (Ate most)");
}

#[tokio::test]
async fn meal_date_range_must_be_ordered() {
    let c = client();
    let filter = MealFilter {
        from: Some(day("2026-03-05")),
        to: Some(day("2026-03-01")),
        ..Default::default()
    };
    assert!(matches!(c.meals().list(&filter).await, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn mutation_invalidates_cached_list() {
    let c = client();
    let ava = child(&c, "Ava", None).await;
    let filter = MealFilter {
        child_id: Some(ava.id),
        ..Default::default()
    };
    assert!(c.meals().list(&filter).await.unwrap().is_empty());
    let key = query_key!("meals", filter.child_id, filter.date, filter.from, filter.to);
    assert!(c.cache().contains(&key));
    assert!(!c.cache().is_stale(&key));

    c.meals().create(&meal(ava.id, "2026-03-02", MealType::Dinner, PortionConsumed::None)).await.unwrap();
    assert!(c.cache().is_stale(&key));
    assert_eq!(c.meals().list(&filter).await.unwrap().len(), 1);
}

#[tokio::test]
async fn deactivated_child_leaves_lists_but_not_lookup() {
    let c = client();
    let room = classroom(&c, "Acorns", None).await;
    let ava = child(&c, "Ava", Some(room.id)).await;
    child(&c, "Ben", Some(room.id)).await;

    let in_room = ChildFilter {
        classroom_id: Some(room.id),
        include_inactive: false,
    };
    assert_eq!(c.children().list(&in_room).await.unwrap().len(), 2);

    c.children().deactivate(&ava.id).await.unwrap();
    let names: Vec<String> = c
        .children()
        .list(&in_room)
        .await
        .unwrap()
        .into_iter()
        .map(|ch| ch.first_name)
        .collect();
    assert_eq!(names, vec!["Ben"]);

    let fetched = c.children().get(&ava.id).await.unwrap();
    assert!(!fetched.is_active);

    let all = ChildFilter {
        classroom_id: Some(room.id),
        include_inactive: true,
    };
    assert_eq!(c.children().list(&all).await.unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_child_is_not_found() {
    let c = client();
    let err = c.children().get(&uuid::Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn parents_and_children_link_many_to_many() {
    let c = client();
    let mum = user(&c, "Maria Rivera", Role::Parent).await;
    let dad = user(&c, "Luis Rivera", Role::Parent).await;
    let teacher = user(&c, "Tess Teacher", Role::Teacher).await;
    let ava = child(&c, "Ava", None).await;
    let ben = child(&c, "Ben", None).await;

    c.children().link_parent(&ava.id, &mum.id, Some("mother")).await.unwrap();
    c.children().link_parent(&ben.id, &mum.id, Some("mother")).await.unwrap();
    c.children().link_parent(&ava.id, &dad.id, None).await.unwrap();
    // linking twice is a no-op
    let again = c.children().link_parent(&ava.id, &dad.id, None).await.unwrap();
    assert_eq!(again.parent_id, dad.id);

    assert_eq!(c.children().for_parent(&mum.id).await.unwrap().len(), 2);
    assert_eq!(c.children().parents(&ava.id).await.unwrap().len(), 2);

    let err = c.children().link_parent(&ava.id, &teacher.id, None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    assert!(c.children().unlink_parent(&ava.id, &dad.id).await.unwrap());
    assert!(!c.children().unlink_parent(&ava.id, &dad.id).await.unwrap());
    assert_eq!(c.children().parents(&ava.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn teacher_classrooms_are_deduplicated_with_primary_winning() {
    let c = client();
    let tess = user(&c, "Tess Teacher", Role::Teacher).await;
    let bluebells = classroom(&c, "Bluebells", Some(tess.id)).await;
    let acorns = classroom(&c, "Acorns", None).await;
    let closed = classroom(&c, "Closed Room", None).await;

    c.classrooms().assign_teacher(&bluebells.id, &tess.id).await.unwrap();
    c.classrooms().assign_teacher(&acorns.id, &tess.id).await.unwrap();
    c.classrooms().assign_teacher(&closed.id, &tess.id).await.unwrap();
    c.classrooms().deactivate(&closed.id).await.unwrap();

    let mine = c.classrooms().for_teacher(&tess.id).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].classroom.name, "Acorns");
    assert_eq!(mine[0].role, TeachingRole::CoTeacher);
    assert_eq!(mine[1].classroom.id, bluebells.id);
    assert_eq!(mine[1].role, TeachingRole::Primary);
}

#[tokio::test]
async fn mark_all_read_only_touches_that_users_unread_rows() {
    let c = client();
    let a = user(&c, "Alice Parent", Role::Parent).await;
    let b = user(&c, "Bob Parent", Role::Parent).await;
    let note = |user_id| NewNotification {
        user_id,
        notification_type: NotificationType::System,
        title: "Reminder".into(),
        message: "Pick-up at 3pm".into(),
        link: None,
    };
    let first = c.notifications().create(&note(a.id)).await.unwrap();
    c.notifications().create(&note(a.id)).await.unwrap();
    c.notifications().create(&note(a.id)).await.unwrap();
    c.notifications().create(&note(b.id)).await.unwrap();

    c.notifications().mark_read(&first.id).await.unwrap();
    assert_eq!(c.notifications().unread_count(&a.id).await.unwrap(), 2);

    assert_eq!(c.notifications().mark_all_read(&a.id).await.unwrap(), 2);
    assert_eq!(c.notifications().unread_count(&a.id).await.unwrap(), 0);
    assert_eq!(c.notifications().unread_count(&b.id).await.unwrap(), 1);
    // nothing left to change
    assert_eq!(c.notifications().mark_all_read(&a.id).await.unwrap(), 0);
}

#[tokio::test]
async fn deleted_rows_disappear_from_lists() {
    let c = client();
    let a = user(&c, "Alice Parent", Role::Parent).await;
    let n = c
        .notifications()
        .create(&NewNotification {
            user_id: a.id,
            notification_type: NotificationType::Document,
            title: "Form due".into(),
            message: "Please upload the consent form".into(),
            link: Some("/documents".into()),
        })
        .await
        .unwrap();
    assert_eq!(c.notifications().list(&a.id).await.unwrap().len(), 1);
    c.notifications().delete(&n.id).await.unwrap();
    assert!(c.notifications().list(&a.id).await.unwrap().is_empty());
    assert!(matches!(c.notifications().delete(&n.id).await, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn sending_a_message_notifies_the_recipient() {
    let c = client();
    let tess = user(&c, "Tess Teacher", Role::Teacher).await;
    let mum = user(&c, "Maria Rivera", Role::Parent).await;

    let sent = c
        .messages()
        .send(&NewMessage {
            sender_id: tess.id,
            recipient_id: mum.id,
            child_id: None,
            content: "  Ava had a great day!  ".into(),
        })
        .await
        .unwrap();
    assert_eq!(sent.content, "Ava had a great day!");
    c.messages()
        .send(&NewMessage {
            sender_id: mum.id,
            recipient_id: tess.id,
            child_id: None,
            content: "Thank you".into(),
        })
        .await
        .unwrap();

    let convo = c.messages().conversation(&mum.id, &tess.id).await.unwrap();
    assert_eq!(convo.len(), 2);
    assert_eq!(convo[0].id, sent.id);

    let notes = c.notifications().list(&mum.id).await.unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].notification_type, NotificationType::Message);
    assert_eq!(notes[0].title, "New message from Tess Teacher");

    assert_eq!(c.messages().unread_count(&mum.id).await.unwrap(), 1);
    let read = c.messages().mark_read(&sent.id).await.unwrap();
    assert!(read.is_read);
    assert!(read.read_at.is_some());
    assert_eq!(c.messages().unread_count(&mum.id).await.unwrap(), 0);
}

#[tokio::test]
async fn empty_or_self_messages_are_rejected() {
    let c = client();
    let tess = user(&c, "Tess Teacher", Role::Teacher).await;
    let mum = user(&c, "Maria Rivera", Role::Parent).await;
    let blank = NewMessage {
        sender_id: tess.id,
        recipient_id: mum.id,
        child_id: None,
        content: "   ".into(),
    };
    assert!(matches!(c.messages().send(&blank).await, Err(AppError::Validation(_))));
    let to_self = NewMessage {
        recipient_id: tess.id,
        content: "note to self".into(),
        ..blank
    };
    assert!(matches!(c.messages().send(&to_self).await, Err(AppError::Validation(_))));
    assert!(c.notifications().list(&mum.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn classroom_announcement_reaches_only_its_parents() {
    let c = client();
    let tess = user(&c, "Tess Teacher", Role::Teacher).await;
    let mum = user(&c, "Maria Rivera", Role::Parent).await;
    let other = user(&c, "Olga Other", Role::Parent).await;
    let room = classroom(&c, "Acorns", Some(tess.id)).await;
    let ava = child(&c, "Ava", Some(room.id)).await;
    c.children().link_parent(&ava.id, &mum.id, None).await.unwrap();

    let a = c
        .announcements()
        .create(&NewAnnouncement {
            title: "Trip".into(),
            content: "Zoo trip on Friday".into(),
            priority: Priority::High,
            is_pinned: false,
            event_date: Some(day("2026-03-06")),
            classroom_id: Some(room.id),
            author_id: Some(tess.id),
        })
        .await
        .unwrap();
    assert_eq!(c.notifications().list(&mum.id).await.unwrap().len(), 1);
    assert!(c.notifications().list(&other.id).await.unwrap().is_empty());
    assert!(c.notifications().list(&tess.id).await.unwrap().is_empty());

    let school_wide = c
        .announcements()
        .create(&NewAnnouncement {
            title: "Closed Monday".into(),
            content: "Staff training day".into(),
            priority: Priority::Normal,
            is_pinned: false,
            event_date: None,
            classroom_id: None,
            author_id: Some(tess.id),
        })
        .await
        .unwrap();
    assert_eq!(c.notifications().list(&other.id).await.unwrap().len(), 1);

    c.announcements().set_pinned(&a.id, true).await.unwrap();
    let all = c.announcements().list(&AnnouncementFilter::default()).await.unwrap();
    assert_eq!(all[0].id, a.id);
    assert_eq!(all[1].id, school_wide.id);
}

#[tokio::test]
async fn profile_changes_reach_cached_parent_lists() {
    let c = client();
    let mum = user(&c, "Maria Lopez", Role::Parent).await;
    let ava = child(&c, "Ava", None).await;
    c.children().link_parent(&ava.id, &mum.id, None).await.unwrap();
    assert_eq!(c.children().parents(&ava.id).await.unwrap()[0].full_name, "Maria Lopez");

    c.users()
        .update(
            &mum.id,
            &UserPatch {
                full_name: Some("Maria Garcia".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(c.children().parents(&ava.id).await.unwrap()[0].full_name, "Maria Garcia");

    c.users().deactivate(&mum.id).await.unwrap();
    assert!(!c.children().parents(&ava.id).await.unwrap()[0].is_active);
}

#[tokio::test]
async fn profile_changes_reach_cached_co_teacher_lists() {
    let c = client();
    let tess = user(&c, "Tess Teacher", Role::Teacher).await;
    let room = classroom(&c, "Acorns", None).await;
    c.classrooms().assign_teacher(&room.id, &tess.id).await.unwrap();
    assert_eq!(c.classrooms().co_teachers(&room.id).await.unwrap()[0].full_name, "Tess Teacher");
    assert_eq!(c.classrooms().for_teacher(&tess.id).await.unwrap().len(), 1);

    c.users()
        .update(
            &tess.id,
            &UserPatch {
                full_name: Some("Tess Morgan".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(c.classrooms().co_teachers(&room.id).await.unwrap()[0].full_name, "Tess Morgan");

    let key = query_key!("teacher-classrooms", tess.id);
    c.users().set_role(&tess.id, Role::Admin).await.unwrap();
    assert!(c.cache().is_stale(&key));
    let roles: Vec<Role> = c
        .classrooms()
        .co_teachers(&room.id)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.role)
        .collect();
    assert_eq!(roles, vec![Role::Admin]);
}
