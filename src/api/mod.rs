//! Typed calls for the dashboard screens. Every call goes through
//! [`ApiClient::send`](crate::ApiClient::send) and therefore shares its
//! token refresh behaviour.

mod budget;
mod checklist;
mod events;
mod expenses;
mod team;
