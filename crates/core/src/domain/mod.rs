pub mod lead;
pub mod run;
pub mod score;
