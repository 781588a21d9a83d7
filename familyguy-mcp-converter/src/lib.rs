//! Family Guy MCP Converter Library
//!
//! Redraws a caller-supplied image in the Family Guy cartoon style using
//! Gemini image generation, exposed as the `convertToFamilyGuy` MCP tool.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod gemini;
pub mod handler;
pub mod image;
pub mod server;

pub use gemini::{GeminiClient, ImageGenerator};
pub use handler::{ConvertHandler, ConvertParams, ConvertedImage};
pub use image::{DecodedImage, decode_image_data};
pub use server::FamilyGuyServer;
