/// Fixed-window rate limiting middleware and response headers.
pub mod rate_limit;
