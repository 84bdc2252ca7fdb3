//! Persistent storage (Firestore).

pub mod firestore;

pub use firestore::FirestoreCacheStore;
