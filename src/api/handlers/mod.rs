//! API handlers for cardkeep.
//!
//! This module organizes the service's route handlers: the OAuth login
//! bridge, session endpoints, card CRUD, the leaderboard, and health.

pub mod auth;
pub mod cards;
pub mod health;
pub mod root;
