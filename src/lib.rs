pub mod apply;
pub mod bullets;
pub mod classify;
pub mod config;
pub mod document;
pub mod extract;
pub mod filter;
pub mod host;
pub mod layout;
pub mod patterns;
pub mod pipeline;
pub mod progress;
pub mod remap;
pub mod rtl;
pub mod service;
pub mod structure;
pub mod style;
pub mod textutil;
