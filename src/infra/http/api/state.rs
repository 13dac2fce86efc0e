use std::sync::Arc;

use crate::application::content::ContentStore;
use crate::config::RuntimeEnvironment;
use crate::domain::language::LanguageCode;

use super::rate_limit::ApiRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<ContentStore>,
    pub rate_limiter: Arc<ApiRateLimiter>,
    /// Languages offered during `Accept-Language` negotiation.
    pub languages: Arc<[LanguageCode]>,
    pub environment: RuntimeEnvironment,
}

impl ApiState {
    pub fn new(
        store: Arc<ContentStore>,
        rate_limiter: Arc<ApiRateLimiter>,
        languages: Vec<LanguageCode>,
        environment: RuntimeEnvironment,
    ) -> Self {
        Self {
            store,
            rate_limiter,
            languages: languages.into(),
            environment,
        }
    }

    pub fn expose_error_detail(&self) -> bool {
        self.environment.is_development()
    }
}
