pub mod blacklist;
pub mod burn;
pub mod freeze;
pub mod initialize;
pub mod mint;
pub mod minters;
pub mod pause;
pub mod roles;
pub mod seize;

pub use blacklist::*;
pub use burn::*;
pub use freeze::*;
pub use initialize::*;
pub use mint::*;
pub use minters::*;
pub use pause::*;
pub use roles::*;
pub use seize::*;
