//! Request and response shapes exchanged with the front-end.

pub mod lesson;
pub mod login_object;
pub mod request;
pub mod send_schedule_object;
pub mod simple_response;
pub mod student_info;
pub mod teacher_info;
pub mod upload_response;
pub mod user_info;
pub mod week_view;
