//! Personalised greetings attached to attendance records.
//!
//! Providers may fail; [`generate_greeting`] never does. Any provider error
//! is replaced with a fixed message for the record's kind.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::attendance::AttendanceKind;
use crate::capture::StillImage;
use crate::config::GreetingConfig;

mod gemini;

pub use gemini::GeminiGreeter;

#[async_trait]
pub trait GreetingProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(
        &self,
        image: &StillImage,
        staff_name: &str,
        kind: AttendanceKind,
    ) -> Result<String>;
}

/// Message used whenever the provider cannot produce one.
pub fn fallback_greeting(staff_name: &str, kind: AttendanceKind) -> String {
    match kind {
        AttendanceKind::ClockIn => format!("Welcome, {}. Have a great day!", staff_name),
        AttendanceKind::ClockOut => format!("Goodbye, {}. See you next time!", staff_name),
    }
}

pub async fn generate_greeting(
    provider: &dyn GreetingProvider,
    image: &StillImage,
    staff_name: &str,
    kind: AttendanceKind,
) -> String {
    match provider.generate(image, staff_name, kind).await {
        Ok(text) if text.trim().is_empty() => {
            debug!("{} returned an empty greeting", provider.name());
            format!("Welcome back, {}!", staff_name)
        }
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            warn!("{} greeting failed: {:#}", provider.name(), e);
            fallback_greeting(staff_name, kind)
        }
    }
}

/// Used when no API key is configured.
pub struct StaticGreeter;

#[async_trait]
impl GreetingProvider for StaticGreeter {
    fn name(&self) -> &'static str {
        "Static"
    }

    async fn generate(
        &self,
        _image: &StillImage,
        staff_name: &str,
        kind: AttendanceKind,
    ) -> Result<String> {
        Ok(fallback_greeting(staff_name, kind))
    }
}

pub fn build_greeter(config: &GreetingConfig) -> Result<Box<dyn GreetingProvider>> {
    match config.api_key.as_deref() {
        Some(key) if !key.is_empty() => Ok(Box::new(GeminiGreeter::new(
            key.to_string(),
            config.model.clone(),
            config.api_endpoint.clone(),
        )?)),
        _ => {
            debug!("No greeting API key configured, using fixed greetings");
            Ok(Box::new(StaticGreeter))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    struct Broken;

    #[async_trait]
    impl GreetingProvider for Broken {
        fn name(&self) -> &'static str {
            "Broken"
        }

        async fn generate(&self, _: &StillImage, _: &str, _: AttendanceKind) -> Result<String> {
            bail!("network unreachable")
        }
    }

    struct Canned(&'static str);

    #[async_trait]
    impl GreetingProvider for Canned {
        fn name(&self) -> &'static str {
            "Canned"
        }

        async fn generate(&self, _: &StillImage, _: &str, _: AttendanceKind) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn image() -> StillImage {
        StillImage::png(vec![1, 2, 3])
    }

    #[tokio::test]
    async fn test_failure_falls_back_per_kind() {
        let greeting =
            generate_greeting(&Broken, &image(), "Alex Chen", AttendanceKind::ClockIn).await;
        assert_eq!(greeting, "Welcome, Alex Chen. Have a great day!");

        let greeting =
            generate_greeting(&Broken, &image(), "Alex Chen", AttendanceKind::ClockOut).await;
        assert_eq!(greeting, "Goodbye, Alex Chen. See you next time!");
    }

    #[tokio::test]
    async fn test_empty_response_gets_default() {
        let greeting =
            generate_greeting(&Canned("  "), &image(), "Alex Chen", AttendanceKind::ClockOut).await;
        assert_eq!(greeting, "Welcome back, Alex Chen!");
    }

    #[tokio::test]
    async fn test_response_is_trimmed() {
        let greeting = generate_greeting(
            &Canned(" Great smile today!\n"),
            &image(),
            "Alex Chen",
            AttendanceKind::ClockIn,
        )
        .await;
        assert_eq!(greeting, "Great smile today!");
    }

    #[test]
    fn test_build_without_key_is_static() {
        let greeter = build_greeter(&GreetingConfig::default()).unwrap();
        assert_eq!(greeter.name(), "Static");
    }
}
