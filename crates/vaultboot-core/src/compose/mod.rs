//! Startup configuration composition
//!
//! Merges defaults, base files, an inline blob and a Vault secret into a
//! single immutable `Configuration`.

mod composer;

pub use composer::{
    plan_secret_request, ComposeError, ComposeResult, ComposedConfiguration, ConfigComposer,
    LayerInfo, LayerKind,
};
