pub mod classifier;
pub mod selector;
pub mod validator;

pub use classifier::classify;
pub use selector::{BackendSelector, DeviceInventory};
pub use validator::validate;
