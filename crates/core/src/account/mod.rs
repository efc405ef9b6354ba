mod types;

pub use types::{AuthMethod, User};
