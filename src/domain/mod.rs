pub mod ai;
pub mod entity;
pub mod geometry;
pub mod lighting;
pub mod particle;
pub mod potion;
pub mod tile;
pub mod upgrade;
