//! Houses domain module (houses and their member characters).
//!
//! Plain data plus input validation; no IO, no HTTP, no storage.

pub mod house;

pub use house::{Character, CharacterData, House, HouseData};
