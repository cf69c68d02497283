pub mod csv;
pub mod events;
pub mod text;
