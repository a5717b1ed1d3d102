pub mod achievement;
pub mod announcement;
pub mod aspiration;
pub mod carousel_slide;
pub mod chatbot_rule;
pub mod counseling_booking;
pub mod director;
pub mod download;
pub mod form_field;
pub mod form_setting;
pub mod form_submission;
pub mod id_sequence;
pub mod news;
pub mod news_category;
pub mod organization_profile;
pub mod role;
pub mod role_permission;
pub mod scholarship;
pub mod scholarship_form;
pub mod user;
