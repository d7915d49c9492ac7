pub mod error;
pub mod key_data;
pub mod key_manager;
pub mod key_type_manager;
pub mod message;
pub mod primitive;
