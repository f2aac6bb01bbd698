//! Lifecycle engine for window hosts.
//!
//! A host wraps one backing window and reconciles two independent sources of
//! change: commands from the owning application and asynchronous reports
//! from the windowing system about what actually happened. Clients observe
//! the result as a single ordered stream of lifecycle events; see
//! [`host::WindowHost`] for the state machine, [`registry::BindingRegistry`]
//! for host ownership, and [`event_logic::EventLogicProcess`] for delivery.

pub mod common;
pub mod event_logic;
pub mod host;
pub mod registry;
pub mod sys;
