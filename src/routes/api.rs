//! Resource routes under `/api/v1`.

use crate::handlers::{
    activities, announcements, auth, children, classrooms, documents, meals, messages, notifications, settings,
    users, wellbeing,
};
use crate::state::AppState;
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // auth
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/reset-password", post(auth::reset_password))
        .route("/auth/reset-password/complete", post(auth::complete_reset))
        .route("/auth/password", put(auth::update_password))
        .route("/me", get(users::me))
        // users
        .route("/users", get(users::list).post(users::create))
        .route("/users/:id", get(users::read).patch(users::update))
        .route("/users/:id/role", put(users::set_role))
        .route("/users/:id/deactivate", post(users::deactivate))
        .route("/users/:id/activate", post(users::activate))
        .route("/users/:id/children", get(children::for_parent))
        .route("/users/:id/classrooms", get(classrooms::for_teacher))
        // children
        .route("/children", get(children::list).post(children::create))
        .route(
            "/children/:id",
            get(children::read).patch(children::update).delete(children::deactivate),
        )
        .route("/children/:id/reactivate", post(children::reactivate))
        .route("/children/:id/parents", get(children::parents).post(children::link_parent))
        .route("/children/:id/parents/:parent_id", delete(children::unlink_parent))
        // classrooms
        .route("/classrooms", get(classrooms::list).post(classrooms::create))
        .route(
            "/classrooms/:id",
            get(classrooms::read).patch(classrooms::update).delete(classrooms::deactivate),
        )
        .route(
            "/classrooms/:id/teachers",
            get(classrooms::co_teachers).post(classrooms::assign_teacher),
        )
        .route("/classrooms/:id/teachers/:teacher_id", delete(classrooms::unassign_teacher))
        // meals
        .route("/meals", get(meals::list).post(meals::create))
        .route("/meals/:id", patch(meals::update).delete(meals::delete))
        // activities
        .route("/activities", get(activities::list).post(activities::create))
        .route(
            "/activities/:id",
            get(activities::read).patch(activities::update).delete(activities::delete),
        )
        .route("/activities/:id/acknowledge", post(activities::acknowledge))
        .route(
            "/activities/:id/photos",
            get(activities::photos).post(activities::upload_photo),
        )
        .route("/activities/:id/photos/:photo_id", delete(activities::delete_photo))
        // wellbeing
        .route("/wellbeing", get(wellbeing::list).post(wellbeing::create))
        .route(
            "/wellbeing/:id",
            get(wellbeing::read).patch(wellbeing::update).delete(wellbeing::delete),
        )
        .route("/wellbeing/:id/parent-notified", post(wellbeing::mark_parent_notified))
        // documents
        .route("/documents", get(documents::list).post(documents::create))
        .route(
            "/documents/:id",
            get(documents::read).patch(documents::update).delete(documents::delete),
        )
        .route("/documents/:id/upload", post(documents::upload))
        .route("/documents/:id/review", post(documents::review))
        .route("/documents/:id/url", get(documents::file_url))
        // messages
        .route("/messages", post(messages::send))
        .route("/messages/inbox", get(messages::inbox))
        .route("/messages/sent", get(messages::sent))
        .route("/messages/unread-count", get(messages::unread_count))
        .route("/messages/with/:user_id", get(messages::conversation))
        .route("/messages/with/:user_id/read", post(messages::mark_conversation_read))
        .route("/messages/:id", delete(messages::delete))
        .route("/messages/:id/read", post(messages::mark_read))
        // announcements
        .route("/announcements", get(announcements::list).post(announcements::create))
        .route(
            "/announcements/:id",
            get(announcements::read)
                .patch(announcements::update)
                .delete(announcements::delete),
        )
        .route("/announcements/:id/pin", put(announcements::set_pinned))
        // notifications
        .route("/notifications", get(notifications::list).post(notifications::create))
        .route("/notifications/unread-count", get(notifications::unread_count))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/:id", delete(notifications::delete))
        .route("/notifications/:id/read", post(notifications::mark_read))
        // settings
        .route("/settings", get(settings::read).patch(settings::update))
        .with_state(state)
}
