//! Error type shared by the ports backed by the AI text-generation provider.

use super::define_port_error;

define_port_error! {
    /// Failures reported by AI provider adapters.
    pub enum AiProviderError {
        /// No provider credentials are configured.
        NotConfigured => "AI provider is not configured",
        /// The provider asked the caller to slow down (HTTP 429).
        RateLimited => "AI provider rate limit reached",
        /// The provider account has run out of credits (HTTP 402).
        QuotaExceeded => "AI provider credits exhausted",
        /// The request could not be delivered or timed out.
        Transport { message: String } => "AI provider transport failed: {message}",
        /// The provider answered with another non-success status.
        Upstream { status: u16 } => "AI provider returned status {status}",
        /// The provider answered with content that does not match the schema.
        Decode { message: String } => "AI provider response rejected: {message}",
    }
}
