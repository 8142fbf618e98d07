//! Row models, their create/patch inputs, and display labels for enum columns.

mod activity;
mod announcement;
mod child;
mod classroom;
mod document;
mod meal;
mod message;
mod notification;
mod settings;
mod user;
mod wellbeing;

pub use activity::*;
pub use announcement::*;
pub use child::*;
pub use classroom::*;
pub use document::*;
pub use meal::*;
pub use message::*;
pub use notification::*;
pub use settings::*;
pub use user::*;
pub use wellbeing::*;
