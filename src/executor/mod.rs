pub mod clipboard;
pub mod delivery;
pub mod input;
pub mod text_input;
