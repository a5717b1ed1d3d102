pub mod chatbot;
pub mod form;
pub mod role;
pub mod sequence;
pub mod status;
pub mod storage;

pub use role::Role;
pub use status::{AspirationStatus, CounselingStatus, OrganizationKind};
