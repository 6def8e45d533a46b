//! RateService unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use exchange_rates::{FIXED, FixedRateProvider, ProviderFactory};
    use fx_types::{
        AppError, ConversionResult, CurrencyPolicy, ExchangeRateProvider, HistoricalRates,
        PageRequest, RateError, RateSnapshot,
    };

    use crate::RateService;

    /// Provider whose every fetch fails with a fixed error.
    pub struct FailingProvider {
        error: RateError,
        calls: AtomicU32,
    }

    impl FailingProvider {
        pub fn new(error: RateError) -> Self {
            Self {
                error,
                calls: AtomicU32::new(0),
            }
        }

        pub fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn fail<T>(&self) -> Result<T, RateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(self.error.clone())
        }
    }

    #[async_trait]
    impl ExchangeRateProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn is_supported_currency(&self, _code: &str) -> bool {
            false
        }

        async fn latest_rates(&self, _base: &str) -> Result<Arc<RateSnapshot>, RateError> {
            self.fail()
        }

        async fn historical_rates(
            &self,
            _base: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Arc<HistoricalRates>, RateError> {
            self.fail()
        }

        async fn convert_amount(
            &self,
            _from: &str,
            _to: &str,
            _amount: Decimal,
        ) -> Result<ConversionResult, RateError> {
            self.fail()
        }
    }

    fn service() -> RateService {
        let factory =
            ProviderFactory::new(FIXED).with_provider(Arc::new(FixedRateProvider::default()));
        RateService::new(Arc::new(factory))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_missing_provider_uses_default() {
        let service = service();
        let snapshot = service.latest(None, "usd").await.unwrap();
        assert_eq!(snapshot.base().as_str(), "USD");

        let blank = service.latest(Some("  "), "EUR").await.unwrap();
        assert_eq!(blank.base().as_str(), "EUR");
    }

    #[tokio::test]
    async fn test_unknown_provider_is_bad_request() {
        let err = service().latest(Some("acme"), "USD").await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("acme")));
    }

    #[tokio::test]
    async fn test_convert() {
        let result = service()
            .convert(Some("Fixed"), "EUR", "USD", dec!(10))
            .await
            .unwrap();
        assert_eq!(result.converted_amount, dec!(10.87));
    }

    #[tokio::test]
    async fn test_convert_rejects_excluded_currency() {
        let err = service()
            .convert(None, "USD", "TRY", dec!(10))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg.contains("TRY")));
    }

    #[tokio::test]
    async fn test_historical_pages_over_days() {
        let service = service();
        let page = service
            .historical(
                None,
                "USD",
                date(2024, 1, 1),
                Some(date(2024, 1, 25)),
                PageRequest::new(2, 10).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(page.total_items, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items[0].date, date(2024, 1, 11));
        assert_eq!(page.items[9].date, date(2024, 1, 20));
    }

    #[tokio::test]
    async fn test_historical_page_past_end_is_empty() {
        let page = service()
            .historical(
                None,
                "USD",
                date(2024, 1, 1),
                Some(date(2024, 1, 5)),
                PageRequest::new(3, 10).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_items, 5);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_historical_rejects_inverted_range() {
        let err = service()
            .historical(
                None,
                "USD",
                date(2024, 2, 1),
                Some(date(2024, 1, 1)),
                PageRequest::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_provider_failures_map_to_app_errors() {
        let cases = [
            (
                RateError::Transient("503".into()),
                "service unavailable",
            ),
            (
                RateError::CircuitOpen {
                    dependency: "failing".into(),
                },
                "service unavailable",
            ),
            (RateError::MalformedResponse("{".into()), "bad gateway"),
            (RateError::DeadlineExceeded, "gateway timeout"),
        ];

        for (error, expected) in cases {
            let provider = Arc::new(FailingProvider::new(error));
            let factory = ProviderFactory::new("failing").with_provider(provider.clone());
            let service = RateService::new(Arc::new(factory));

            let err = service.latest(None, "USD").await.unwrap_err();
            let kind = match err {
                AppError::ServiceUnavailable(_) => "service unavailable",
                AppError::BadGateway(_) => "bad gateway",
                AppError::GatewayTimeout(_) => "gateway timeout",
                other => panic!("unexpected error: {other:?}"),
            };
            assert_eq!(kind, expected);
            assert_eq!(provider.calls(), 1);
        }
    }

    #[test]
    fn test_is_supported_normalizes_code() {
        let service = service();
        let ok = service.is_supported(None, " gbp").unwrap();
        assert_eq!(ok.code, "GBP");
        assert!(ok.supported);
        assert!(!service.is_supported(None, "PLN").unwrap().supported);
        assert!(!service.is_supported(None, "GB").unwrap().supported);
    }

    #[test]
    fn test_providers_lists_registry() {
        let factory = ProviderFactory::new(FIXED)
            .with_provider(Arc::new(FixedRateProvider::new(CurrencyPolicy::permissive())));
        let response = RateService::new(Arc::new(factory)).providers();
        assert_eq!(response.default, FIXED);
        assert_eq!(response.providers, vec![FIXED.to_string()]);
    }
}
