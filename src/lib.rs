//! # Agentflow
//!
//! Agentflow is the core of a workflow editor for AI agent dashboards.
//! It keeps the graph of a workflow consistent while the user edits it,
//! overlays live execution status on top of it, and drafts new workflows
//! from a plain language goal.
//!
//! ## Core Features
//!
//! - **Workflow Graph Store**: Nodes and edges with atomic, validated mutations
//! - **Execution Status Overlay**: Interval or push subscriptions merged with the graph by node id
//! - **AI Suggestions**: Schema-validated skeletons with a deterministic fallback
//! - **Pluggable Storage**: Supports in-memory storage and PostgreSQL
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use agentflow::{NodeDraft, StudioBuilder};
//!
//! let studio = StudioBuilder::new().build()?;
//!
//! let workflow = studio.create_workflow("Support triage", "route tickets");
//! let reader = workflow.graph().add_node(NodeDraft::new("Reader", "reader"));
//! let writer = workflow.graph().add_node(NodeDraft::new("Writer", "writer").at(350.0, 150.0));
//! workflow.graph().add_edge(&reader.id, &writer.id)?;
//! studio.save(&workflow)?;
//!
//! let monitor = studio.status_monitor();
//! let sub = monitor.watch("exec-42");
//! let display = sub.display(&workflow.graph().to_snapshot());
//! ```

mod builder;
mod common;
mod config;
mod error;
pub mod execution;
mod model;
pub mod store;
mod studio;
pub mod suggest;
mod utils;
mod workflow;

use std::sync::{Arc, RwLock};

pub use builder::StudioBuilder;
pub use config::{ChannelType, Config, PostgresConfig, StatusConfig, StoreConfig, StoreType, SuggestionConfig};
pub use error::AgentflowError;
pub use model::*;
pub use studio::Studio;
pub use workflow::{Connector, Workflow, WorkflowGraph};

/// Result type alias for Agentflow operations.
pub type Result<T> = std::result::Result<T, AgentflowError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
