//! Handshake-to-hashcat courier plugin core.
//!
//! Implements the reusable core of a host-agent plugin that converts
//! captured wireless handshakes to hashcat's `.22000` format, queues them
//! until connectivity is available, uploads them to a remote cracking
//! server, and tracks submitted jobs until they finish.
//!
//! The host runtime, display widget, conversion binary and cracking server
//! are all collaborators: the host drives [`plugin::Courier`] through its
//! lifecycle hooks and hands it a [`display::DisplaySurface`] to render on.

pub mod config;
pub mod display;
pub mod models;
pub mod plugin;
pub mod services;
