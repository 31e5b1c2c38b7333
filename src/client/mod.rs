//! Salesforce API client and authentication.
//!
//! This module provides the [`SalesforceLogin`] authenticator and the
//! [`SalesforceClient`] connection it produces, along with the
//! [`Authenticator`] and [`Connection`] traits they implement.

mod auth;
mod salesforce;

pub use auth::{Authenticator, SalesforceLogin, Session};
pub use salesforce::{Connection, QueryResponse, SalesforceClient};
