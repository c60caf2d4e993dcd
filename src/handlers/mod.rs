pub mod health;
pub mod moods;
