//! Converter state machine
//!
//! The converter owns the user's selection and the last known rate. Changing
//! the selection issues a [`RateRequest`]; the outcome of a fetch is applied
//! only when it answers the most recently issued request, so a slow response
//! for an old selection can never overwrite a newer rate.

use crate::core::favorites::{FavoritePair, FavoritesStore, dedupe_pairs};
use crate::core::rates::{ExchangeRateSnapshot, RateClient};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, error};

pub const DEFAULT_AMOUNT: f64 = 1.0;
pub const DEFAULT_FROM: &str = "USD";
pub const DEFAULT_TO: &str = "EUR";

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Error { reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Destructive,
}

/// A transient message for the user, shown once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    fn info(title: &str, description: &str) -> Self {
        Self {
            kind: NotificationKind::Info,
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    fn destructive(title: &str, description: &str) -> Self {
        Self {
            kind: NotificationKind::Destructive,
            title: title.to_string(),
            description: description.to_string(),
        }
    }
}

/// Ticket for an issued rate fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateRequest {
    pub seq: u64,
    pub base: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConverterState {
    pub amount: f64,
    pub from_currency: String,
    pub to_currency: String,
    pub exchange_rate: f64,
    pub phase: Phase,
    pub favorites: Vec<FavoritePair>,
}

impl Default for ConverterState {
    fn default() -> Self {
        Self {
            amount: DEFAULT_AMOUNT,
            from_currency: DEFAULT_FROM.to_string(),
            to_currency: DEFAULT_TO.to_string(),
            exchange_rate: 0.0,
            phase: Phase::Idle,
            favorites: Vec::new(),
        }
    }
}

impl ConverterState {
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn current_pair(&self) -> FavoritePair {
        FavoritePair::new(&self.from_currency, &self.to_currency)
    }
}

/// Display strings derived from the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterView {
    pub amount: f64,
    pub from_currency: String,
    pub to_currency: String,
    pub rate: String,
    pub converted: String,
    pub error: Option<String>,
    pub is_favorite: bool,
}

pub struct Converter {
    client: Arc<dyn RateClient>,
    store: Arc<dyn FavoritesStore>,
    state: ConverterState,
    latest_seq: u64,
    notifications: Vec<Notification>,
}

impl Converter {
    /// Creates a converter with default selection and the stored favorites.
    pub fn mount(client: Arc<dyn RateClient>, store: Arc<dyn FavoritesStore>) -> Result<Self> {
        Self::mount_with(client, store, ConverterState::default())
    }

    /// Creates a converter starting from `initial`; its favorites are replaced
    /// by the stored ones.
    pub fn mount_with(
        client: Arc<dyn RateClient>,
        store: Arc<dyn FavoritesStore>,
        initial: ConverterState,
    ) -> Result<Self> {
        let favorites = store.load().context("Failed to load favorites")?;
        debug!(count = favorites.len(), "Loaded favorites");

        Ok(Self {
            client,
            store,
            state: ConverterState {
                favorites,
                phase: Phase::Idle,
                ..initial
            },
            latest_seq: 0,
            notifications: Vec::new(),
        })
    }

    pub fn state(&self) -> &ConverterState {
        &self.state
    }

    pub fn set_amount(&mut self, amount: f64) {
        self.state.amount = amount;
    }

    /// Returns a request when the source currency actually changed.
    pub fn set_from_currency(&mut self, code: &str) -> Option<RateRequest> {
        if self.state.from_currency == code {
            return None;
        }
        self.state.from_currency = code.to_string();
        Some(self.request_rate())
    }

    /// Returns a request when the target currency actually changed.
    pub fn set_to_currency(&mut self, code: &str) -> Option<RateRequest> {
        if self.state.to_currency == code {
            return None;
        }
        self.state.to_currency = code.to_string();
        Some(self.request_rate())
    }

    pub fn swap_currencies(&mut self) -> Option<RateRequest> {
        if self.state.from_currency == self.state.to_currency {
            return None;
        }
        std::mem::swap(&mut self.state.from_currency, &mut self.state.to_currency);
        Some(self.request_rate())
    }

    /// Switches to a favorite pair, issuing at most one request.
    pub fn select_favorite(&mut self, pair: &FavoritePair) -> Option<RateRequest> {
        if self.state.current_pair() == *pair {
            return None;
        }
        self.state.from_currency = pair.from.clone();
        self.state.to_currency = pair.to.clone();
        Some(self.request_rate())
    }

    /// Issues a request for the current selection and enters `Loading`.
    pub fn request_rate(&mut self) -> RateRequest {
        self.latest_seq += 1;
        self.state.phase = Phase::Loading;
        RateRequest {
            seq: self.latest_seq,
            base: self.state.from_currency.clone(),
            target: self.state.to_currency.clone(),
        }
    }

    /// Applies a fetch outcome. Returns `false` when the request was superseded.
    pub fn apply_rates(
        &mut self,
        request: &RateRequest,
        outcome: Result<ExchangeRateSnapshot>,
    ) -> bool {
        if request.seq != self.latest_seq {
            debug!(
                seq = request.seq,
                latest = self.latest_seq,
                "Ignoring stale rate response"
            );
            return false;
        }

        match outcome {
            Ok(snapshot) => {
                self.state.exchange_rate = snapshot.rate_for(&request.target);
                self.state.phase = Phase::Ready;
            }
            Err(e) => {
                error!(base = %request.base, error = %e, "Failed to fetch exchange rates");
                self.state.phase = Phase::Error {
                    reason: e.to_string(),
                };
                self.notifications.push(Notification::destructive(
                    "Uh oh! Something went wrong.",
                    "Failed to fetch exchange rates. Please try again.",
                ));
            }
        }
        true
    }

    /// Runs the rate client for `request` and applies the outcome.
    pub async fn fetch(&mut self, request: RateRequest) -> bool {
        let outcome = self.client.fetch_rates(&request.base).await;
        self.apply_rates(&request, outcome)
    }

    pub async fn refresh(&mut self) -> bool {
        let request = self.request_rate();
        self.fetch(request).await
    }

    pub fn is_favorite(&self) -> bool {
        self.state.favorites.contains(&self.state.current_pair())
    }

    pub fn add_favorite(&mut self) -> Result<()> {
        let pair = FavoritePair::try_new(&self.state.from_currency, &self.state.to_currency)?;
        let mut updated = self.state.favorites.clone();
        updated.push(pair);
        self.persist_favorites(dedupe_pairs(&updated))?;
        self.notifications.push(Notification::info(
            "Currency pair added to favorites.",
            "You can now quickly access this pair from your favorites list.",
        ));
        Ok(())
    }

    pub fn remove_favorite(&mut self) -> Result<()> {
        let pair = self.state.current_pair();
        let updated: Vec<FavoritePair> = self
            .state
            .favorites
            .iter()
            .filter(|p| **p != pair)
            .cloned()
            .collect();
        self.persist_favorites(updated)?;
        self.notifications.push(Notification::info(
            "Currency pair removed from favorites.",
            "This pair has been removed from your favorites list.",
        ));
        Ok(())
    }

    pub fn toggle_favorite(&mut self) -> Result<()> {
        if self.is_favorite() {
            self.remove_favorite()
        } else {
            self.add_favorite()
        }
    }

    fn persist_favorites(&mut self, favorites: Vec<FavoritePair>) -> Result<()> {
        self.store
            .save(&favorites)
            .context("Failed to save favorites")?;
        self.state.favorites = favorites;
        Ok(())
    }

    pub fn converted_amount(&self) -> f64 {
        self.state.amount * self.state.exchange_rate
    }

    /// Takes the queued notifications, oldest first.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn view(&self) -> ConverterView {
        let rate = if self.state.is_loading() {
            "Loading...".to_string()
        } else {
            to_fixed_2(self.state.exchange_rate)
        };
        let error = match &self.state.phase {
            Phase::Error { reason } => Some(reason.clone()),
            _ => None,
        };

        ConverterView {
            amount: self.state.amount,
            from_currency: self.state.from_currency.clone(),
            to_currency: self.state.to_currency.clone(),
            rate,
            converted: format!(
                "{} {}",
                to_fixed_2(self.converted_amount()),
                self.state.to_currency
            ),
            error,
            is_favorite: self.is_favorite(),
        }
    }
}

/// Formats `value` with two decimals, rounding exact ties away from zero.
/// Values not exactly halfway between two cents format as `{:.2}` does.
pub fn to_fixed_2(value: f64) -> String {
    let doubled = (value * 200.0).round();
    let is_tie = value.mul_add(200.0, -doubled) == 0.0 && doubled % 2.0 != 0.0;
    if !is_tie {
        return format!("{:.2}", value);
    }

    let cents = ((doubled.abs() + 1.0) / 2.0) as u64;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryFavoritesStore;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockRateClient {
        responses: HashMap<String, BTreeMap<String, f64>>,
        call_count: AtomicUsize,
    }

    impl MockRateClient {
        /// Each entry is `(base, target, rate)`.
        fn new(quotes: &[(&str, &str, f64)]) -> Self {
            let mut responses: HashMap<String, BTreeMap<String, f64>> = HashMap::new();
            for (base, target, rate) in quotes {
                responses
                    .entry(base.to_string())
                    .or_default()
                    .insert(target.to_string(), *rate);
            }
            Self {
                responses,
                call_count: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RateClient for MockRateClient {
        async fn fetch_rates(&self, base: &str) -> Result<ExchangeRateSnapshot> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            match self.responses.get(base) {
                Some(rates) => Ok(ExchangeRateSnapshot::new(base, rates.clone())),
                None => Err(anyhow!(
                    "HTTP error: 500 Internal Server Error for base currency: {}",
                    base
                )),
            }
        }
    }

    struct FailingStore;

    impl FavoritesStore for FailingStore {
        fn load(&self) -> Result<Vec<FavoritePair>> {
            Ok(Vec::new())
        }

        fn save(&self, _pairs: &[FavoritePair]) -> Result<()> {
            Err(anyhow!("disk full"))
        }
    }

    struct CorruptStore;

    impl FavoritesStore for CorruptStore {
        fn load(&self) -> Result<Vec<FavoritePair>> {
            Err(anyhow!("expected value at line 1 column 1"))
        }

        fn save(&self, _pairs: &[FavoritePair]) -> Result<()> {
            Ok(())
        }
    }

    fn converter_with(client: MockRateClient) -> (Converter, Arc<MockRateClient>) {
        let client = Arc::new(client);
        let store = Arc::new(MemoryFavoritesStore::new());
        let converter = Converter::mount(client.clone(), store).unwrap();
        (converter, client)
    }

    fn snapshot(base: &str, rates: &[(&str, f64)]) -> ExchangeRateSnapshot {
        ExchangeRateSnapshot::new(
            base,
            rates.iter().map(|(c, r)| (c.to_string(), *r)).collect(),
        )
    }

    #[test]
    fn test_mount_defaults() {
        let (converter, client) = converter_with(MockRateClient::new(&[]));
        let state = converter.state();

        assert_eq!(state.amount, 1.0);
        assert_eq!(state.from_currency, "USD");
        assert_eq!(state.to_currency, "EUR");
        assert_eq!(state.exchange_rate, 0.0);
        assert_eq!(state.phase, Phase::Idle);
        assert!(state.favorites.is_empty());
        assert_eq!(client.call_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_mount_reads_stored_favorites() {
        let store = Arc::new(MemoryFavoritesStore::with_pairs(vec![
            FavoritePair::new("USD", "EUR"),
            FavoritePair::new("GBP", "JPY"),
        ]));
        let converter = Converter::mount(Arc::new(MockRateClient::new(&[])), store).unwrap();

        assert_eq!(converter.state().favorites.len(), 2);
        assert!(converter.is_favorite());
    }

    #[test]
    fn test_mount_fails_on_malformed_favorites() {
        let result = Converter::mount(Arc::new(MockRateClient::new(&[])), Arc::new(CorruptStore));
        assert!(result.is_err());
        assert_eq!(
            result.err().unwrap().to_string(),
            "Failed to load favorites"
        );
    }

    #[tokio::test]
    async fn test_scenario_usd_to_eur() {
        let (mut converter, _) = converter_with(MockRateClient::new(&[("USD", "EUR", 0.9)]));
        converter.set_amount(10.0);

        assert!(converter.refresh().await);

        let view = converter.view();
        assert_eq!(view.rate, "0.90");
        assert_eq!(view.converted, "9.00 EUR");
        assert_eq!(converter.state().phase, Phase::Ready);
        assert!(converter.drain_notifications().is_empty());
    }

    #[test]
    fn test_to_fixed_2_rounds_ties_up() {
        assert_eq!(to_fixed_2(0.125), "0.13");
        assert_eq!(to_fixed_2(-0.125), "-0.13");
        assert_eq!(to_fixed_2(1.375), "1.38");
        assert_eq!(to_fixed_2(0.9), "0.90");
        assert_eq!(to_fixed_2(0.0), "0.00");
        assert_eq!(to_fixed_2(141.5), "141.50");
        // Not halfway once stored: 2.675 is 2.67499999...
        assert_eq!(to_fixed_2(2.675), "2.67");
        assert_eq!(to_fixed_2(1.005), "1.00");
    }

    #[tokio::test]
    async fn test_view_rounds_halfway_amounts_up() {
        let (mut converter, _) = converter_with(MockRateClient::new(&[("USD", "EUR", 1.0)]));
        converter.set_amount(0.125);
        converter.refresh().await;

        let view = converter.view();
        assert_eq!(view.rate, "1.00");
        assert_eq!(view.converted, "0.13 EUR");
    }

    #[tokio::test]
    async fn test_missing_target_rate_is_zero() {
        let (mut converter, _) = converter_with(MockRateClient::new(&[
            ("USD", "EUR", 0.9),
            ("GBP", "USD", 1.27),
        ]));
        converter.set_amount(25.0);
        converter.refresh().await;
        assert_eq!(converter.state().exchange_rate, 0.9);

        converter.set_from_currency("GBP");
        let request = converter.set_to_currency("JPY").unwrap();
        converter.fetch(request).await;

        assert_eq!(converter.state().exchange_rate, 0.0);
        assert_eq!(converter.converted_amount(), 0.0);
        assert_eq!(converter.view().converted, "0.00 JPY");
        assert_eq!(converter.state().phase, Phase::Ready);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_previous_rate() {
        let (mut converter, _) = converter_with(MockRateClient::new(&[("USD", "EUR", 0.9)]));
        converter.refresh().await;
        assert_eq!(converter.state().exchange_rate, 0.9);

        let request = converter.set_from_currency("XXX").unwrap();
        assert!(converter.state().is_loading());
        converter.fetch(request).await;

        let state = converter.state();
        assert_eq!(state.exchange_rate, 0.9);
        assert!(!state.is_loading());
        assert_eq!(
            state.phase,
            Phase::Error {
                reason: "HTTP error: 500 Internal Server Error for base currency: XXX".to_string()
            }
        );
        assert_eq!(state.from_currency, "XXX");
        assert_eq!(state.amount, 1.0);

        let notifications = converter.drain_notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Destructive);
        assert_eq!(notifications[0].title, "Uh oh! Something went wrong.");
        assert!(converter.drain_notifications().is_empty());

        let view = converter.view();
        assert_eq!(view.rate, "0.90");
        assert!(view.error.is_some());
    }

    #[tokio::test]
    async fn test_first_fetch_failure_leaves_zero_rate() {
        let (mut converter, _) = converter_with(MockRateClient::new(&[]));
        converter.refresh().await;

        assert_eq!(converter.state().exchange_rate, 0.0);
        assert_eq!(converter.view().converted, "0.00 EUR");
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let (mut converter, _) = converter_with(MockRateClient::new(&[]));

        let first = converter.set_to_currency("GBP").unwrap();
        let second = converter.set_to_currency("JPY").unwrap();
        assert!(second.seq > first.seq);

        assert!(converter.apply_rates(&second, Ok(snapshot("USD", &[("JPY", 150.0)]))));
        assert!(!converter.apply_rates(&first, Ok(snapshot("USD", &[("GBP", 0.8)]))));
        assert_eq!(converter.state().exchange_rate, 150.0);
        assert_eq!(converter.state().phase, Phase::Ready);

        // A stale failure neither changes the phase nor notifies.
        assert!(!converter.apply_rates(&first, Err(anyhow!("connection reset"))));
        assert_eq!(converter.state().phase, Phase::Ready);
        assert!(converter.drain_notifications().is_empty());
    }

    #[test]
    fn test_loading_view() {
        let (mut converter, _) = converter_with(MockRateClient::new(&[]));
        converter.request_rate();

        assert!(converter.state().is_loading());
        assert_eq!(converter.view().rate, "Loading...");
    }

    #[test]
    fn test_converted_amount_is_plain_multiplication() {
        let (mut converter, _) = converter_with(MockRateClient::new(&[]));
        let request = converter.request_rate();

        for (amount, rate) in [(0.0, 0.9), (10.0, 0.0), (3.3, 1.1), (1e9, 151.37)] {
            converter.set_amount(amount);
            converter.apply_rates(&request, Ok(snapshot("USD", &[("EUR", rate)])));
            assert_eq!(converter.converted_amount(), amount * rate);
        }
    }

    #[test]
    fn test_swap_is_involutive() {
        let (mut converter, _) = converter_with(MockRateClient::new(&[]));

        let first = converter.swap_currencies().unwrap();
        assert_eq!(first.base, "EUR");
        assert_eq!(first.target, "USD");
        assert_eq!(converter.state().from_currency, "EUR");
        assert_eq!(converter.state().to_currency, "USD");

        converter.swap_currencies().unwrap();
        assert_eq!(converter.state().from_currency, "USD");
        assert_eq!(converter.state().to_currency, "EUR");
    }

    #[test]
    fn test_unchanged_selection_issues_no_request() {
        let (mut converter, _) = converter_with(MockRateClient::new(&[]));

        assert!(converter.set_from_currency("USD").is_none());
        assert!(converter.set_to_currency("EUR").is_none());
        assert_eq!(converter.state().phase, Phase::Idle);

        converter.set_to_currency("USD");
        assert!(converter.swap_currencies().is_none());
    }

    #[test]
    fn test_set_amount_does_not_fetch() {
        let (mut converter, _) = converter_with(MockRateClient::new(&[]));
        converter.set_amount(42.5);

        assert_eq!(converter.state().amount, 42.5);
        assert_eq!(converter.state().phase, Phase::Idle);
    }

    #[tokio::test]
    async fn test_select_favorite_fetches_once() {
        let (mut converter, client) =
            converter_with(MockRateClient::new(&[("GBP", "JPY", 190.0)]));

        let request = converter
            .select_favorite(&FavoritePair::new("GBP", "JPY"))
            .unwrap();
        converter.fetch(request).await;

        assert_eq!(client.call_count.load(Ordering::SeqCst), 1);
        assert_eq!(converter.state().exchange_rate, 190.0);
        assert!(
            converter
                .select_favorite(&FavoritePair::new("GBP", "JPY"))
                .is_none()
        );
    }

    #[test]
    fn test_add_and_remove_favorite() {
        let store = Arc::new(MemoryFavoritesStore::new());
        let mut converter =
            Converter::mount(Arc::new(MockRateClient::new(&[])), store.clone()).unwrap();

        converter.add_favorite().unwrap();
        assert!(converter.is_favorite());
        assert!(converter.view().is_favorite);
        assert_eq!(store.load().unwrap(), vec![FavoritePair::new("USD", "EUR")]);

        converter.remove_favorite().unwrap();
        assert!(!converter.is_favorite());
        assert!(store.load().unwrap().is_empty());

        let notifications = converter.drain_notifications();
        assert_eq!(notifications.len(), 2);
        assert_eq!(notifications[0].title, "Currency pair added to favorites.");
        assert_eq!(notifications[1].title, "Currency pair removed from favorites.");
        assert!(
            notifications
                .iter()
                .all(|n| n.kind == NotificationKind::Info)
        );
    }

    #[test]
    fn test_add_twice_keeps_single_entry() {
        let (mut converter, _) = converter_with(MockRateClient::new(&[]));

        converter.add_favorite().unwrap();
        converter.add_favorite().unwrap();
        assert_eq!(converter.state().favorites.len(), 1);

        converter.remove_favorite().unwrap();
        assert!(converter.state().favorites.is_empty());
    }

    #[test]
    fn test_toggle_favorite() {
        let (mut converter, _) = converter_with(MockRateClient::new(&[]));

        converter.toggle_favorite().unwrap();
        assert!(converter.is_favorite());
        converter.toggle_favorite().unwrap();
        assert!(!converter.is_favorite());
    }

    #[test]
    fn test_failed_save_leaves_favorites_unchanged() {
        let mut converter =
            Converter::mount(Arc::new(MockRateClient::new(&[])), Arc::new(FailingStore)).unwrap();

        let result = converter.add_favorite();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().to_string(), "Failed to save favorites");
        assert!(!converter.is_favorite());
        assert!(converter.drain_notifications().is_empty());
    }

    #[test]
    fn test_mount_with_initial_selection() {
        let store = Arc::new(MemoryFavoritesStore::with_pairs(vec![FavoritePair::new(
            "CAD", "JPY",
        )]));
        let initial = ConverterState {
            amount: 5.0,
            from_currency: "CAD".to_string(),
            to_currency: "JPY".to_string(),
            favorites: vec![FavoritePair::new("USD", "EUR")],
            ..ConverterState::default()
        };
        let converter =
            Converter::mount_with(Arc::new(MockRateClient::new(&[])), store, initial).unwrap();

        assert_eq!(converter.state().amount, 5.0);
        assert_eq!(
            converter.state().favorites,
            vec![FavoritePair::new("CAD", "JPY")]
        );
        assert!(converter.is_favorite());
    }
}
