//! # Event Bus Module
//!
//! Provides the publish/subscribe channel that editor sessions use to
//! notify observers about document, selection, history and export changes.
//!
//! ## Overview
//!
//! - Publishers emit typed events without knowing subscribers
//! - Subscribers filter by [`EventCategory`] and receive events of interest
//! - Supports both sync handlers and async broadcast receivers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use teekit_core::event_bus::{EventBus, EventCategory, EventFilter};
//!
//! let bus: EventBus<EditorEvent> = EventBus::new();
//! let subscription = bus.subscribe(
//!     EventFilter::Categories(vec![EventCategory::Export]),
//!     |event| println!("export event: {}", event.description()),
//! );
//!
//! bus.unsubscribe(subscription);
//! ```

mod bus;
mod events;

pub use bus::*;
pub use events::*;
