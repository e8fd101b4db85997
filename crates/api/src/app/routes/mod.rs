pub mod auth;
pub mod certificates;
pub mod system;
pub mod users;
pub mod verify;
