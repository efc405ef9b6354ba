mod inmemory;

pub use inmemory::{hash_password, InMemoryAccountStore};
