mod audit_service_fake;
mod audit_service_impl;
mod auth_service_fake;
mod auth_service_impl;
mod rate_limiter_impl;
mod user_service_fake;
mod user_service_impl;

pub use audit_service_fake::*;
pub use audit_service_impl::*;
pub use auth_service_fake::*;
pub use auth_service_impl::*;
pub use rate_limiter_impl::*;
pub use user_service_fake::*;
pub use user_service_impl::*;
