#![allow(dead_code)]

use chrono::NaiveDate;
use daycare_sdk::models::{Child, Classroom, NewChild, NewClassroom, NewUser, Role, User};
use daycare_sdk::CareClient;
use uuid::Uuid;

pub fn client() -> CareClient {
    CareClient::in_memory()
}

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub async fn user(client: &CareClient, name: &str, role: Role) -> User {
    let email = format!("{}@example.org", name.to_lowercase().replace(' ', "."));
    client
        .users()
        .create_profile(&NewUser {
            email,
            full_name: name.to_string(),
            role,
            phone: None,
        })
        .await
        .unwrap()
}

pub async fn classroom(client: &CareClient, name: &str, teacher: Option<Uuid>) -> Classroom {
    client
        .classrooms()
        .create(&NewClassroom {
            name: name.to_string(),
            teacher_id: teacher,
            capacity: Some(12),
            age_group: None,
        })
        .await
        .unwrap()
}

pub async fn child(client: &CareClient, first: &str, classroom_id: Option<Uuid>) -> Child {
    client
        .children()
        .create(&NewChild {
            first_name: first.to_string(),
            last_name: "Rivera".to_string(),
            date_of_birth: Some(day("2022-05-10")),
            classroom_id,
            allergies: None,
            medical_notes: None,
            emergency_contact: None,
        })
        .await
        .unwrap()
}
