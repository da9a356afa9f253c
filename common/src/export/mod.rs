//! Export core modules shared by the PDF renderer.

pub mod card_core;
