mod auth;
mod chatbot;
mod common;
mod content;
mod forms;
mod student;
mod submission;
