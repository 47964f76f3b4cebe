//! Middleware layer.
//!
//! Stages that run between routing and the handler. Today there is one:
//! [`disinfect`], which cleanses query, path parameters and payload.
//! A stage is registered once on the [`Router`](crate::Router) and may be
//! tuned or switched off per route through
//! [`RouteSettings`](crate::RouteSettings).

pub mod disinfect;
