pub mod auth;
pub mod chatbot;
pub mod content;
pub mod dashboard;
pub mod form;
pub mod shared;
pub mod student;
