//! mcp-server-chart: chart generation tools over the Model Context Protocol
//!
//! This library exposes a catalog of chart tools (line, area, column, pie,
//! organization chart, pin map) to AI assistants. Tool calls are validated
//! locally and rendered by a remote render service, which returns a chart
//! URL or ready-made content.
//!
//! # Architecture
//!
//! - **Catalog**: every chart type is a typed parameter struct plus a
//!   JSON Schema advertised through `tools/list`
//! - **Dispatch**: one handler call per request, with every failure turned
//!   into an `isError` result
//! - **Transports**: stdio, server-sent events, and stateless HTTP
//!
//! # Modules
//!
//! - [`bootstrap`]: Transport selection and wiring
//! - [`charts`]: Chart tool definitions and validation
//! - [`config`]: Configuration loading and validation
//! - [`error`]: Error types
//! - [`mcp`]: MCP protocol host and transports
//! - [`render`]: Render service client

pub mod bootstrap;
pub mod charts;
pub mod config;
pub mod error;
pub mod mcp;
pub mod render;
