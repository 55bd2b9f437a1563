//! Core business logic abstractions

pub mod config;
pub mod converter;
pub mod favorites;
pub mod log;
pub mod rates;

// Re-export main types for cleaner imports
pub use converter::{
    Converter, ConverterState, ConverterView, Notification, NotificationKind, Phase,
};
pub use favorites::{FavoritePair, FavoritesStore};
pub use rates::{ExchangeRateSnapshot, RateClient};
