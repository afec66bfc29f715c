//! Provider response validation.
//!
//! Providers return text. A reply becomes a [`CarePlan`](careguard_core::CarePlan)
//! only if it parses as a JSON object whose sections have the expected shape.
//! Anything else is a malformed response. Replies are never best-effort
//! parsed: no fence stripping, no searching for a JSON substring.

mod validator;

pub use validator::{CarePlanValidator, MalformedResponse};
