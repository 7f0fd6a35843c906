pub mod error;
pub mod image;
pub mod inst;
pub mod layout;
pub mod line;
pub mod op;
pub mod operand;
pub mod reg;
