pub mod dashboard;
pub mod domain;
pub mod forecast;
pub mod money;
pub mod policy;
pub mod time;
pub mod triage;

pub mod config {
    use anyhow::Context;
    use rust_decimal::Decimal;

    use crate::dashboard::DashboardOptions;
    use crate::money;
    use crate::policy::{
        DEFAULT_BUFFER_RATIO, DEFAULT_MAX_RECOMMENDATIONS, DEFAULT_MONTHLY_EXPENSES,
    };

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub max_recommendations: usize,
        pub buffer_ratio: Decimal,
        pub default_monthly_expenses: Decimal,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
        where
            F: Fn(&str) -> Option<String>,
        {
            let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

            let max_recommendations = match var("CASHLENS_MAX_RECOMMENDATIONS") {
                Some(s) => s
                    .trim()
                    .parse::<usize>()
                    .with_context(|| format!("CASHLENS_MAX_RECOMMENDATIONS is not a number: {s}"))?,
                None => DEFAULT_MAX_RECOMMENDATIONS,
            };
            anyhow::ensure!(
                max_recommendations >= 1,
                "CASHLENS_MAX_RECOMMENDATIONS must be >= 1"
            );

            let buffer_ratio = match var("CASHLENS_BUFFER_RATIO") {
                Some(s) => money::parse_amount(&s)
                    .with_context(|| format!("CASHLENS_BUFFER_RATIO is not a decimal: {s}"))?,
                None => DEFAULT_BUFFER_RATIO,
            };
            anyhow::ensure!(
                (Decimal::ZERO..=Decimal::ONE).contains(&buffer_ratio),
                "CASHLENS_BUFFER_RATIO must be between 0 and 1 (got {buffer_ratio})"
            );

            let default_monthly_expenses = match var("CASHLENS_DEFAULT_MONTHLY_EXPENSES") {
                Some(s) => money::parse_amount(&s).with_context(|| {
                    format!("CASHLENS_DEFAULT_MONTHLY_EXPENSES is not a decimal: {s}")
                })?,
                None => DEFAULT_MONTHLY_EXPENSES,
            };
            anyhow::ensure!(
                default_monthly_expenses >= Decimal::ZERO,
                "CASHLENS_DEFAULT_MONTHLY_EXPENSES must not be negative"
            );

            Ok(Self {
                sentry_dsn: var("SENTRY_DSN"),
                max_recommendations,
                buffer_ratio,
                default_monthly_expenses,
            })
        }

        pub fn dashboard_options(&self) -> DashboardOptions {
            DashboardOptions {
                max_recommendations: self.max_recommendations,
                buffer_ratio: self.buffer_ratio,
                fallback_monthly_expenses: self.default_monthly_expenses,
            }
        }
    }

}
