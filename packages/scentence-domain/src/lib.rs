pub mod aggregate;
pub mod constraint;
pub mod dialogue;
pub mod relaxation;
pub mod strategy;
