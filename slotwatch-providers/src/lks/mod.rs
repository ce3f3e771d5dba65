//! Schedule endpoint of the monitored site.
//!
//! The endpoint returns a list of days, each with a list of groups; every
//! group is one slot. Sessions come from a browser login that is run by an
//! external helper program.

mod login;
pub(crate) mod parser;

pub use login::{parse_helper_output, LoginHelper, DEFAULT_LOGIN_TIMEOUT};
pub use parser::parse_schedule;
