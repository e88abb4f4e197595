//! # Motion Core
//!
//! Scroll-driven animation engine with adaptive performance tiers.
//! Host-agnostic: compiles to WASM for the browser host and runs natively
//! for the headless replay tool.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                MotionEngine                 │
//! ├─────────────────────────────────────────────┤
//! │  Governor         │  Scroll Orchestrator    │
//! │  - Device classes │  - Header, parallax     │
//! │  - FPS monitor    │  - Counters, videos     │
//! │  - Tier bundles   │  - Reveals, staggers    │
//! ├─────────────────────────────────────────────┤
//! │  State Registry   │  Viewport Geometry      │
//! │  - One-shot flags │  - Trigger predicates   │
//! │  - Play toggles   │  - Progress, parallax   │
//! └─────────────────────────────────────────────┘
//!          ▲ LayoutSource          │ Mutation
//!          └──────── host ◀────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod counter;
pub mod device;
pub mod element;
pub mod engine;
pub mod error;
pub mod fps;
pub mod geometry;
pub mod governor;
pub mod header;
pub mod headless;
pub mod mutation;
pub mod orchestrator;
pub mod registry;
pub mod tier;
pub mod variant;

pub use config::EngineConfig;
pub use counter::{group_thousands, CounterRamp, CounterScheduler};
pub use device::DeviceSignals;
pub use element::{NodeKey, NodeSnapshot, Roles, TrackId};
pub use engine::MotionEngine;
pub use error::{MotionError, MotionResult};
pub use fps::{FpsMonitor, FpsSample};
pub use geometry::{Axis, Rect, Viewport};
pub use governor::{PerformanceGovernor, TierChange, TierChangeReason};
pub use header::{HeaderEffect, HeaderState, ScrollDirection};
pub use headless::{HeadlessPage, HeadlessSession, NodePresentation};
pub use mutation::{LayoutSource, Mutation, StyleProperty};
pub use orchestrator::ScrollOrchestrator;
pub use registry::{AnimationStateRegistry, StateRecord};
pub use tier::{PerformanceTier, ScrollAttachment, TierPolicy};
pub use variant::{AnimationTiming, AnimationVariant, Easing, Presentation};

/// Motion core version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
